//! The squares pool: the game document, the grid, and the rules that award it.

pub mod award;
pub mod grid;
pub mod reconcile;
pub mod resolver;
pub mod signup;

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use grid::Board;
pub use resolver::Cell;

/// Rows and columns on the board.
pub const GRID_SIZE: usize = 10;
/// Squares on the board.
pub const TOTAL_SQUARES: u32 = (GRID_SIZE * GRID_SIZE) as u32;
/// Owner label for a square nobody bought.
pub const OPEN_SQUARE: &str = "OPEN";

/// Top-level field names of the shared game document.
pub mod fields {
    pub const PARTICIPANTS: &str = "participants";
    pub const GRID: &str = "grid";
    pub const ROW_LABELS: &str = "rowLabels";
    pub const COL_LABELS: &str = "colLabels";
    pub const IS_LOCKED: &str = "isLocked";
    pub const QUARTER_AWARDS: &str = "quarterAwards";
    pub const SCORE: &str = "score";
    pub const LIVE_MODE: &str = "liveMode";
}

// ---------------------------------------------------------------------------
// Participants and teams
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub squares: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamInfo {
    pub name: String,   // "Patriots"
    pub abbrev: String, // "NE", matched against the score feed
}

impl TeamInfo {
    pub fn new(name: impl Into<String>, abbrev: impl Into<String>) -> Self {
        Self { name: name.into(), abbrev: abbrev.into() }
    }
}

/// The two teams playing. Column digits follow the home score, row digits the away score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Teams {
    pub home: TeamInfo,
    pub away: TeamInfo,
}

impl Default for Teams {
    fn default() -> Self {
        Self {
            home: TeamInfo::new("Patriots", "NE"),
            away: TeamInfo::new("Seahawks", "SEA"),
        }
    }
}

// ---------------------------------------------------------------------------
// Score
// ---------------------------------------------------------------------------

/// Canonical running score. `quarter` is 0 before kickoff, 1–4 during play, 5 once final.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Score {
    pub home: u32,
    pub away: u32,
    pub quarter: u8,
}

pub const FINAL_QUARTER: u8 = 5;

impl Score {
    pub fn new(home: u32, away: u32, quarter: u8) -> Self {
        Self { home, away, quarter: quarter.min(FINAL_QUARTER) }
    }

    pub fn quarter_label(&self) -> &'static str {
        quarter_label(self.quarter)
    }

    /// "Seahawks 17 - Patriots 24": away side first, as the board is read.
    pub fn summary(&self, teams: &Teams) -> String {
        format!(
            "{} {} - {} {}",
            teams.away.name, self.away, teams.home.name, self.home
        )
    }
}

pub fn quarter_label(quarter: u8) -> &'static str {
    match quarter {
        1 => "Q1",
        2 => "Q2",
        3 => "Q3",
        4 => "Q4",
        5 => "Final",
        _ => "Pre-Game",
    }
}

// ---------------------------------------------------------------------------
// Quarters and awards
// ---------------------------------------------------------------------------

/// An awardable quarter. The final whistle shares Q4's prize and is never awarded on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Quarter::Q1),
            2 => Some(Quarter::Q2),
            3 => Some(Quarter::Q3),
            4 => Some(Quarter::Q4),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    fn index(self) -> usize {
        match self {
            Quarter::Q1 => 0,
            Quarter::Q2 => 1,
            Quarter::Q3 => 2,
            Quarter::Q4 => 3,
        }
    }

    /// Share of the pot paid for this quarter.
    pub fn payout_pct(self) -> f64 {
        match self {
            Quarter::Q1 => 0.15,
            Quarter::Q2 => 0.25,
            Quarter::Q3 => 0.15,
            Quarter::Q4 => 0.45,
        }
    }

    pub fn label(self) -> &'static str {
        quarter_label(self.number())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterAward {
    pub winner: String,
    pub row: usize,
    pub col: usize,
    /// Score the award was decided on, formatted by [`Score::summary`].
    pub score: String,
}

/// Write-once award slots, one per quarter. Stored in the document as `{"1": .., "4": ..}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, QuarterAward>",
    into = "BTreeMap<String, QuarterAward>"
)]
pub struct QuarterAwards([Option<QuarterAward>; 4]);

impl QuarterAwards {
    pub fn get(&self, quarter: Quarter) -> Option<&QuarterAward> {
        self.0[quarter.index()].as_ref()
    }

    pub fn contains(&self, quarter: Quarter) -> bool {
        self.get(quarter).is_some()
    }

    /// Record an award. An existing award is never replaced; returns `false` in that case.
    pub fn insert(&mut self, quarter: Quarter, award: QuarterAward) -> bool {
        let slot = &mut self.0[quarter.index()];
        if slot.is_some() {
            return false;
        }
        *slot = Some(award);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (Quarter, &QuarterAward)> {
        Quarter::ALL
            .into_iter()
            .filter_map(|q| self.get(q).map(|award| (q, award)))
    }

    pub fn is_complete(&self) -> bool {
        self.0.iter().all(Option::is_some)
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }

    /// Quarters won by the square at `cell`.
    pub fn won_at(&self, cell: Cell) -> Vec<Quarter> {
        self.iter()
            .filter(|(_, a)| a.row == cell.row && a.col == cell.col)
            .map(|(q, _)| q)
            .collect()
    }
}

impl From<BTreeMap<String, QuarterAward>> for QuarterAwards {
    fn from(map: BTreeMap<String, QuarterAward>) -> Self {
        let mut awards = QuarterAwards::default();
        for (key, award) in map {
            match key.trim().parse::<u8>().ok().and_then(Quarter::from_number) {
                Some(quarter) => {
                    awards.insert(quarter, award);
                }
                None => warn!("ignoring award under unknown quarter key {key:?}"),
            }
        }
        awards
    }
}

impl From<QuarterAwards> for BTreeMap<String, QuarterAward> {
    fn from(awards: QuarterAwards) -> Self {
        Quarter::ALL
            .into_iter()
            .zip(awards.0)
            .filter_map(|(q, award)| award.map(|a| (q.number().to_string(), a)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Game state: the aggregate root mirrored from the shared document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "GameDocument", into = "GameDocument")]
pub struct GameState {
    pub participants: Vec<Participant>,
    /// Present exactly when the board is locked; carries the grid and both label rows.
    pub board: Option<Board>,
    pub awards: QuarterAwards,
    pub score: Score,
    pub live_mode: bool,
}

impl GameState {
    /// Decode a snapshot of the shared document. An empty document is the default state.
    pub fn from_document(doc: &serde_json::Value) -> Result<Self, serde_json::Error> {
        if doc.is_null() {
            return Ok(Self::default());
        }
        GameState::deserialize(doc)
    }

    pub fn to_document(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn is_locked(&self) -> bool {
        self.board.is_some()
    }

    pub fn squares_sold(&self) -> u32 {
        self.participants.iter().fold(0u32, |sold, p| sold.saturating_add(p.squares))
    }

    pub fn squares_remaining(&self) -> u32 {
        TOTAL_SQUARES.saturating_sub(self.squares_sold())
    }

    /// Sign-ups close once the board is locked or every square is taken.
    pub fn signup_open(&self) -> bool {
        !self.is_locked() && self.squares_remaining() > 0
    }

    pub fn pot(&self, square_cost: u32) -> u32 {
        self.squares_sold().saturating_mul(square_cost)
    }

    /// Square highlighted by the current score, if the board is locked.
    pub fn active_cell(&self) -> Option<Cell> {
        let board = self.board.as_ref()?;
        board.cell_for(self.score.home, self.score.away)
    }
}

/// Wire shape of the game document. Every field is optional so partial or
/// freshly reset documents decode without error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GameDocument {
    participants: Option<Vec<Participant>>,
    grid: Option<Vec<Vec<String>>>,
    row_labels: Option<Vec<u8>>,
    col_labels: Option<Vec<u8>>,
    is_locked: bool,
    quarter_awards: Option<QuarterAwards>,
    score: Option<Score>,
    live_mode: bool,
}

impl From<GameDocument> for GameState {
    fn from(doc: GameDocument) -> Self {
        let board = if doc.is_locked {
            let board = match (doc.grid, doc.row_labels, doc.col_labels) {
                (Some(grid), Some(rows), Some(cols)) => Board::from_parts(grid, rows, cols),
                _ => None,
            };
            if board.is_none() {
                warn!("document is marked locked but its grid or labels are malformed; treating as unlocked");
            }
            board
        } else {
            None
        };

        let participants = doc
            .participants
            .unwrap_or_default()
            .into_iter()
            .filter(|p| {
                let in_range = (1..=TOTAL_SQUARES).contains(&p.squares);
                if !in_range {
                    warn!("ignoring participant {:?} with {} squares", p.name, p.squares);
                }
                in_range
            })
            .collect();

        GameState {
            participants,
            board,
            awards: doc.quarter_awards.unwrap_or_default(),
            score: doc.score.unwrap_or_default(),
            live_mode: doc.live_mode,
        }
    }
}

impl From<GameState> for GameDocument {
    fn from(state: GameState) -> Self {
        let (grid, row_labels, col_labels) = match state.board {
            Some(board) => (
                Some(board.grid_rows()),
                Some(board.row_labels().to_vec()),
                Some(board.col_labels().to_vec()),
            ),
            None => (None, None, None),
        };

        GameDocument {
            participants: Some(state.participants),
            is_locked: grid.is_some(),
            grid,
            row_labels,
            col_labels,
            quarter_awards: Some(state.awards),
            score: Some(state.score),
            live_mode: state.live_mode,
        }
    }
}
