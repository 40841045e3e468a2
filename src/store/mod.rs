//! Shared game document: the wire protocol spoken with the store relay and the
//! partial-write operations it understands.
//!
//! The relay holds one JSON document. Clients send [`StoreOp`]s; after each applied
//! op every connected client, the writer included, receives the whole document.

pub mod relay;

use crate::squares::{Board, GameState, Participant, Quarter, QuarterAward, Score, fields};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Client → relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum StoreOp {
    /// Set the value at a `/`-separated path. `null` deletes it.
    Set { path: String, value: Value },
    /// Replace the whole document.
    Replace { value: Value },
    /// Merge top-level fields into the document. `null` deletes a field.
    Update { fields: Map<String, Value> },
}

/// Relay → client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RelayMessage {
    Snapshot { doc: Value },
    Error { message: String },
}

#[derive(Debug)]
pub enum StoreError {
    EmptyPath,
    Encode(serde_json::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::EmptyPath => write!(f, "set requires a non-empty path"),
            StoreError::Encode(e) => write!(f, "could not encode store value: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Encode(e)
    }
}

/// Apply one op to the document in place. Fails without touching the document.
pub fn apply_op(doc: &mut Value, op: StoreOp) -> Result<(), StoreError> {
    match op {
        StoreOp::Set { path, value } => {
            let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
            let Some((last, parents)) = segments.split_last() else {
                return Err(StoreError::EmptyPath);
            };

            if value.is_null() {
                remove_at(doc, parents, last);
                return Ok(());
            }

            let mut node = doc;
            for segment in parents {
                node = ensure_object(node)
                    .entry(segment.to_string())
                    .or_insert(Value::Null);
            }
            ensure_object(node).insert(last.to_string(), value);
        }
        StoreOp::Replace { value } => *doc = value,
        StoreOp::Update { fields } => {
            let root = ensure_object(doc);
            for (key, value) in fields {
                if value.is_null() {
                    root.remove(&key);
                } else {
                    root.insert(key, value);
                }
            }
        }
    }
    Ok(())
}

/// Turn `node` into an object if it is anything else, then borrow the map.
fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just made an object"),
    }
}

fn remove_at(doc: &mut Value, parents: &[&str], last: &str) {
    let mut node = doc;
    for segment in parents {
        match node.get_mut(*segment) {
            Some(child) => node = child,
            None => return,
        }
    }
    if let Some(map) = node.as_object_mut() {
        map.remove(last);
    }
}

// ---------------------------------------------------------------------------
// Game-specific writes
// ---------------------------------------------------------------------------

impl StoreOp {
    pub fn set(path: impl Into<String>, value: impl Serialize) -> Result<Self, StoreError> {
        Ok(StoreOp::Set { path: path.into(), value: serde_json::to_value(value)? })
    }

    /// Roster write. An empty roster is stored as `null`.
    pub fn participants(participants: &[Participant]) -> Result<Self, StoreError> {
        if participants.is_empty() {
            return Ok(StoreOp::Set { path: fields::PARTICIPANTS.into(), value: Value::Null });
        }
        StoreOp::set(fields::PARTICIPANTS, participants)
    }

    /// The lock write: grid, both label rows and the lock flag in one update.
    pub fn lock(board: &Board) -> Result<Self, StoreError> {
        let mut update = Map::new();
        update.insert(fields::GRID.into(), serde_json::to_value(board.grid_rows())?);
        update.insert(fields::ROW_LABELS.into(), serde_json::to_value(board.row_labels())?);
        update.insert(fields::COL_LABELS.into(), serde_json::to_value(board.col_labels())?);
        update.insert(fields::IS_LOCKED.into(), Value::Bool(true));
        Ok(StoreOp::Update { fields: update })
    }

    /// Replace the document with the empty default game.
    pub fn reset() -> Result<Self, StoreError> {
        Ok(StoreOp::Replace { value: GameState::default().to_document()? })
    }

    pub fn score(score: &Score) -> Result<Self, StoreError> {
        StoreOp::set(fields::SCORE, score)
    }

    /// Single score field: `"home"`, `"away"` or `"quarter"`.
    pub fn score_field(field: &str, value: u32) -> Result<Self, StoreError> {
        StoreOp::set(format!("{}/{field}", fields::SCORE), value)
    }

    pub fn award(quarter: Quarter, award: &QuarterAward) -> Result<Self, StoreError> {
        StoreOp::set(format!("{}/{}", fields::QUARTER_AWARDS, quarter.number()), award)
    }

    pub fn live_mode(enabled: bool) -> Result<Self, StoreError> {
        StoreOp::set(fields::LIVE_MODE, enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::squares::grid::lock_board;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::json;

    fn apply_all(doc: &mut Value, ops: Vec<StoreOp>) {
        for op in ops {
            apply_op(doc, op).unwrap();
        }
    }

    #[test]
    fn test_ops_use_tagged_wire_format() {
        let op = StoreOp::set("score/home", 7).unwrap();
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({ "op": "set", "path": "score/home", "value": 7 })
        );
        let msg: RelayMessage =
            serde_json::from_str(r#"{"type":"snapshot","doc":{"liveMode":true}}"#).unwrap();
        assert_eq!(msg, RelayMessage::Snapshot { doc: json!({ "liveMode": true }) });
    }

    #[test]
    fn test_set_creates_intermediate_objects() {
        let mut doc = Value::Null;
        apply_op(&mut doc, StoreOp::set("quarterAwards/2/winner", "Ann").unwrap()).unwrap();
        assert_eq!(doc, json!({ "quarterAwards": { "2": { "winner": "Ann" } } }));
    }

    #[test]
    fn test_set_overwrites_only_the_addressed_field() {
        let mut doc = json!({ "score": { "home": 3, "away": 0, "quarter": 1 }, "liveMode": true });
        apply_op(&mut doc, StoreOp::score_field("away", 7).unwrap()).unwrap();
        assert_eq!(doc, json!({ "score": { "home": 3, "away": 7, "quarter": 1 }, "liveMode": true }));
    }

    #[test]
    fn test_set_null_deletes() {
        let mut doc = json!({ "participants": [{ "name": "A", "squares": 1 }], "liveMode": false });
        apply_op(&mut doc, StoreOp::participants(&[]).unwrap()).unwrap();
        assert_eq!(doc, json!({ "liveMode": false }));

        apply_op(&mut doc, StoreOp::set("missing/branch", Value::Null).unwrap()).unwrap();
        assert_eq!(doc, json!({ "liveMode": false }));
    }

    #[test]
    fn test_set_rejects_empty_path_without_touching_document() {
        let mut doc = json!({ "liveMode": true });
        let err = apply_op(&mut doc, StoreOp::Set { path: "//".into(), value: json!(1) });
        assert!(matches!(err, Err(StoreError::EmptyPath)));
        assert_eq!(doc, json!({ "liveMode": true }));
    }

    #[test]
    fn test_update_merges_top_level_fields() {
        let mut doc = json!({ "participants": [], "isLocked": false, "liveMode": true });
        let mut fields = Map::new();
        fields.insert("isLocked".into(), json!(true));
        fields.insert("participants".into(), Value::Null);
        apply_op(&mut doc, StoreOp::Update { fields }).unwrap();
        assert_eq!(doc, json!({ "isLocked": true, "liveMode": true }));
    }

    #[test]
    fn test_lock_update_decodes_as_locked_game() {
        let participants = vec![Participant { name: "Ann".into(), squares: 97 }];
        let mut rng = StdRng::seed_from_u64(5);
        let board = lock_board(&participants, &mut rng).unwrap();

        let mut doc = Value::Null;
        apply_all(
            &mut doc,
            vec![StoreOp::participants(&participants).unwrap(), StoreOp::lock(&board).unwrap()],
        );

        let state = GameState::from_document(&doc).unwrap();
        assert_eq!(state.board.as_ref(), Some(&board));
        assert_eq!(state.participants, participants);
        assert_eq!(state.board.unwrap().open_squares(), 3);
    }

    #[test]
    fn test_award_and_score_writes_decode_back() {
        let award = QuarterAward { winner: "Ben".into(), row: 4, col: 1, score: "Seahawks 3 - Patriots 7".into() };
        let mut doc = Value::Null;
        apply_all(
            &mut doc,
            vec![
                StoreOp::award(Quarter::Q3, &award).unwrap(),
                StoreOp::score(&Score::new(21, 13, 3)).unwrap(),
                StoreOp::live_mode(true).unwrap(),
            ],
        );

        let state = GameState::from_document(&doc).unwrap();
        assert_eq!(state.awards.get(Quarter::Q3), Some(&award));
        assert_eq!(state.score, Score::new(21, 13, 3));
        assert!(state.live_mode);
    }

    #[test]
    fn test_reset_discards_everything() {
        let mut doc = json!({ "isLocked": true, "quarterAwards": { "1": {} }, "liveMode": true });
        apply_op(&mut doc, StoreOp::reset().unwrap()).unwrap();
        assert_eq!(GameState::from_document(&doc).unwrap(), GameState::default());
    }
}
