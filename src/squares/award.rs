//! Quarter awards: at most one winner per quarter, paid a fixed share of the pot.

use super::{Board, GameState, Quarter, QuarterAward, Score, Teams};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AwardError {
    InvalidQuarter(u8),
    BoardNotReady,
    /// The quarter already has a winner. Nothing was changed.
    AlreadyAwarded(Quarter),
}

impl fmt::Display for AwardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AwardError::InvalidQuarter(_) => write!(f, "Select a valid quarter (Q1-Q4) to award."),
            AwardError::BoardNotReady => write!(f, "Board must be locked first."),
            AwardError::AlreadyAwarded(q) => write!(f, "{} has already been awarded!", q.label()),
        }
    }
}

impl std::error::Error for AwardError {}

/// A decided award, ready to be written under `quarter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Award {
    pub quarter: Quarter,
    pub record: QuarterAward,
    pub amount: u32,
}

/// Prize for `quarter`, rounded to whole units. Rounding means the four prizes can
/// miss the pot by a unit or two.
pub fn prize_amount(pot: u32, quarter: Quarter) -> u32 {
    (f64::from(pot) * quarter.payout_pct()).round() as u32
}

/// Build the award record for the square a score lands on.
pub fn award_for_score(board: &Board, score: Score, teams: &Teams) -> Option<QuarterAward> {
    let cell = board.cell_for(score.home, score.away)?;
    Some(QuarterAward {
        winner: board.owner(cell).to_string(),
        row: cell.row,
        col: cell.col,
        score: score.summary(teams),
    })
}

/// Decide the award for quarter `quarter` from the current score.
///
/// Checks, in order: the quarter is 1–4, the board is locked, the quarter has no
/// winner yet. The state is never touched; the caller writes the returned award.
pub fn award_quarter(
    state: &GameState,
    quarter: u8,
    teams: &Teams,
    square_cost: u32,
) -> Result<Award, AwardError> {
    let q = Quarter::from_number(quarter).ok_or(AwardError::InvalidQuarter(quarter))?;
    let board = state.board.as_ref().ok_or(AwardError::BoardNotReady)?;
    if state.awards.contains(q) {
        return Err(AwardError::AlreadyAwarded(q));
    }

    let record = award_for_score(board, state.score, teams).ok_or(AwardError::BoardNotReady)?;
    Ok(Award {
        quarter: q,
        record,
        amount: prize_amount(state.pot(square_cost), q),
    })
}

impl GameState {
    /// Apply a decided award locally. Returns `false`, leaving state as it was, when
    /// the quarter was already awarded.
    pub fn record_award(&mut self, award: &Award) -> bool {
        self.awards.insert(award.quarter, award.record.clone())
    }

    /// Prize for an awarded or upcoming quarter at the current pot.
    pub fn prize_for(&self, quarter: Quarter, square_cost: u32) -> u32 {
        prize_amount(self.pot(square_cost), quarter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::squares::grid::lock_board;
    use crate::squares::{Participant, TOTAL_SQUARES};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const COST: u32 = 5;

    fn locked_state() -> GameState {
        let participants = vec![
            Participant { name: "Ann".into(), squares: 40 },
            Participant { name: "Ben".into(), squares: 60 },
        ];
        let mut rng = StdRng::seed_from_u64(99);
        let board = lock_board(&participants, &mut rng).unwrap();
        GameState {
            participants,
            board: Some(board),
            score: Score::new(14, 10, 2),
            ..Default::default()
        }
    }

    #[test]
    fn test_prizes_follow_fixed_split() {
        assert_eq!(prize_amount(500, Quarter::Q1), 75);
        assert_eq!(prize_amount(500, Quarter::Q2), 125);
        assert_eq!(prize_amount(500, Quarter::Q3), 75);
        assert_eq!(prize_amount(500, Quarter::Q4), 225);
    }

    #[test]
    fn test_prize_rounding_never_drifts_more_than_one_unit_per_quarter() {
        for pot in 0..=TOTAL_SQUARES * 50 {
            let paid: i64 = Quarter::ALL.iter().map(|&q| i64::from(prize_amount(pot, q))).sum();
            assert!((paid - i64::from(pot)).abs() <= 4, "pot {pot} paid {paid}");
        }
    }

    #[test]
    fn test_award_uses_owner_of_resolved_square() {
        let state = locked_state();
        let award = award_quarter(&state, 2, &Teams::default(), COST).unwrap();
        let board = state.board.as_ref().unwrap();
        let cell = board.cell_for(14, 10).unwrap();

        assert_eq!(award.quarter, Quarter::Q2);
        assert_eq!(award.record.winner, board.owner(cell));
        assert_eq!((award.record.row, award.record.col), (cell.row, cell.col));
        assert_eq!(award.record.score, "Seahawks 10 - Patriots 14");
        assert_eq!(award.amount, 125);
    }

    #[test]
    fn test_preconditions_are_checked_in_order() {
        let unlocked = GameState::default();
        assert_eq!(
            award_quarter(&unlocked, 0, &Teams::default(), COST),
            Err(AwardError::InvalidQuarter(0))
        );
        assert_eq!(
            award_quarter(&unlocked, 5, &Teams::default(), COST),
            Err(AwardError::InvalidQuarter(5))
        );
        assert_eq!(
            award_quarter(&unlocked, 1, &Teams::default(), COST),
            Err(AwardError::BoardNotReady)
        );
    }

    #[test]
    fn test_awarding_twice_changes_state_once() {
        let mut state = locked_state();
        let first = award_quarter(&state, 2, &Teams::default(), COST).unwrap();
        assert!(state.record_award(&first));
        let after_first = state.clone();

        assert_eq!(
            award_quarter(&state, 2, &Teams::default(), COST),
            Err(AwardError::AlreadyAwarded(Quarter::Q2))
        );
        assert_eq!(state, after_first);
    }

    #[test]
    fn test_awarded_quarter_is_immutable_under_later_scores() {
        let mut state = locked_state();
        let first = award_quarter(&state, 1, &Teams::default(), COST).unwrap();
        state.record_award(&first);

        state.score = Score::new(31, 27, 4);
        let mut forged = first.clone();
        forged.record.winner = "Someone Else".into();
        assert!(!state.record_award(&forged));
        assert_eq!(state.awards.get(Quarter::Q1), Some(&first.record));
    }

    #[test]
    fn test_all_four_quarters_complete_the_pool() {
        let mut state = locked_state();
        for q in 1..=4 {
            let award = award_quarter(&state, q, &Teams::default(), COST).unwrap();
            state.record_award(&award);
        }
        assert!(state.awards.is_complete());
        for q in 1..=4 {
            assert!(matches!(
                award_quarter(&state, q, &Teams::default(), COST),
                Err(AwardError::AlreadyAwarded(_))
            ));
        }
    }
}
