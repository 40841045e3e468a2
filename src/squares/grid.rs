//! Grid assignment: who owns which square, and which digit each row and column stands for.

use super::{Cell, GRID_SIZE, GameState, OPEN_SQUARE, Participant, TOTAL_SQUARES};
use rand::Rng;
use rand::seq::SliceRandom;
use std::fmt;

/// A locked board: 100 owner labels laid out row-major plus the two digit permutations.
///
/// Only constructed by [`lock_board`] or by decoding a well-formed document, so the
/// grid is always 10×10 and both label rows are permutations of 0–9.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: Vec<String>,
    row_labels: [u8; GRID_SIZE],
    col_labels: [u8; GRID_SIZE],
}

impl Board {
    /// Rebuild a board from its document fields. Returns `None` unless the grid is
    /// 10×10 and both label rows are permutations of 0–9.
    pub fn from_parts(grid: Vec<Vec<String>>, row_labels: Vec<u8>, col_labels: Vec<u8>) -> Option<Self> {
        if grid.len() != GRID_SIZE || grid.iter().any(|row| row.len() != GRID_SIZE) {
            return None;
        }
        let row_labels = digit_permutation(&row_labels)?;
        let col_labels = digit_permutation(&col_labels)?;
        Some(Self {
            cells: grid.into_iter().flatten().collect(),
            row_labels,
            col_labels,
        })
    }

    pub fn owner(&self, cell: Cell) -> &str {
        &self.cells[cell.row * GRID_SIZE + cell.col]
    }

    /// Row digits, matched against the away team's score.
    pub fn row_labels(&self) -> &[u8; GRID_SIZE] {
        &self.row_labels
    }

    /// Column digits, matched against the home team's score.
    pub fn col_labels(&self) -> &[u8; GRID_SIZE] {
        &self.col_labels
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.cells.chunks(GRID_SIZE)
    }

    pub fn grid_rows(&self) -> Vec<Vec<String>> {
        self.rows().map(<[String]>::to_vec).collect()
    }

    pub fn open_squares(&self) -> usize {
        self.cells.iter().filter(|c| c.as_str() == OPEN_SQUARE).count()
    }

    /// Square for a (home, away) score.
    pub fn cell_for(&self, home: u32, away: u32) -> Option<Cell> {
        super::resolver::resolve_cell(home, away, &self.row_labels, &self.col_labels)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    AlreadyLocked,
    NoSquaresSold,
    TooManySquares(u32),
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockError::AlreadyLocked => write!(f, "Board is already locked."),
            LockError::NoSquaresSold => write!(f, "No squares have been sold yet."),
            LockError::TooManySquares(total) => {
                write!(f, "Too many squares! {total} sold, the board holds {TOTAL_SQUARES}.")
            }
        }
    }
}

impl std::error::Error for LockError {}

/// Check that `participants` can be laid out on one board.
pub fn check_lockable(participants: &[Participant]) -> Result<u32, LockError> {
    let total = participants.iter().fold(0u32, |total, p| total.saturating_add(p.squares));
    if total == 0 {
        return Err(LockError::NoSquaresSold);
    }
    if total > TOTAL_SQUARES {
        return Err(LockError::TooManySquares(total));
    }
    Ok(total)
}

impl GameState {
    /// Squares that would go on the board if it were locked now.
    pub fn lockable(&self) -> Result<u32, LockError> {
        if self.is_locked() {
            return Err(LockError::AlreadyLocked);
        }
        check_lockable(&self.participants)
    }
}

/// Lay the participants out on a freshly shuffled board.
///
/// Each participant's name appears `squares` times; the rest of the 100 squares are
/// [`OPEN_SQUARE`]. Placement and both digit rows are uniform shuffles drawn from `rng`,
/// so two calls never agree: call once per lock.
pub fn lock_board<R: Rng + ?Sized>(participants: &[Participant], rng: &mut R) -> Result<Board, LockError> {
    check_lockable(participants)?;

    let mut cells: Vec<String> = participants
        .iter()
        .flat_map(|p| std::iter::repeat_n(p.name.clone(), p.squares as usize))
        .collect();
    cells.resize(TOTAL_SQUARES as usize, OPEN_SQUARE.to_string());
    cells.shuffle(rng);

    Ok(Board {
        cells,
        row_labels: shuffled_digits(rng),
        col_labels: shuffled_digits(rng),
    })
}

fn shuffled_digits<R: Rng + ?Sized>(rng: &mut R) -> [u8; GRID_SIZE] {
    let mut digits = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9];
    digits.shuffle(rng);
    digits
}

fn digit_permutation(labels: &[u8]) -> Option<[u8; GRID_SIZE]> {
    let labels: [u8; GRID_SIZE] = labels.try_into().ok()?;
    let mut seen = [false; GRID_SIZE];
    for &digit in &labels {
        let slot = seen.get_mut(usize::from(digit))?;
        if *slot {
            return None;
        }
        *slot = true;
    }
    Some(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;

    fn participants(entries: &[(&str, u32)]) -> Vec<Participant> {
        entries.iter()
            .map(|(name, squares)| Participant { name: name.to_string(), squares: *squares })
            .collect()
    }

    fn is_digit_permutation(labels: &[u8; GRID_SIZE]) -> bool {
        let mut sorted = *labels;
        sorted.sort_unstable();
        sorted == [0, 1, 2, 3, 4, 5, 6, 7, 8, 9]
    }

    #[test]
    fn test_huge_square_counts_are_refused_without_overflow() {
        let err = check_lockable(&participants(&[("A", u32::MAX), ("B", 2)])).unwrap_err();
        assert_eq!(err, LockError::TooManySquares(u32::MAX));
    }

    #[test]
    fn test_full_board_has_no_open_squares() {
        let mut rng = StdRng::seed_from_u64(7);
        let board = lock_board(&participants(&[("A", 10), ("B", 5), ("C", 85)]), &mut rng).unwrap();
        assert_eq!(board.open_squares(), 0);
    }

    #[test]
    fn test_partial_board_pads_with_open_squares() {
        let mut rng = StdRng::seed_from_u64(11);
        let board = lock_board(&participants(&[("A", 50), ("B", 47)]), &mut rng).unwrap();
        assert_eq!(board.open_squares(), 3);
    }

    #[test]
    fn test_every_purchased_square_is_placed_exactly_once() {
        let buyers = participants(&[("Ann", 12), ("Ben", 1), ("Cat", 33), ("Ann", 4)]);
        for seed in 0..25 {
            let mut rng = StdRng::seed_from_u64(seed);
            let board = lock_board(&buyers, &mut rng).unwrap();

            let mut counts: HashMap<&str, u32> = HashMap::new();
            for row in board.rows() {
                assert_eq!(row.len(), GRID_SIZE);
                for owner in row {
                    *counts.entry(owner.as_str()).or_default() += 1;
                }
            }
            assert_eq!(counts.get("Ann"), Some(&16));
            assert_eq!(counts.get("Ben"), Some(&1));
            assert_eq!(counts.get("Cat"), Some(&33));
            assert_eq!(counts.get(OPEN_SQUARE), Some(&50));
            assert_eq!(board.rows().count(), GRID_SIZE);
        }
    }

    #[test]
    fn test_labels_are_always_digit_permutations() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let board = lock_board(&participants(&[("A", 1)]), &mut rng).unwrap();
            assert!(is_digit_permutation(board.row_labels()));
            assert!(is_digit_permutation(board.col_labels()));
        }
    }

    #[test]
    fn test_relocking_shuffles_again() {
        let buyers = participants(&[("A", 30), ("B", 30), ("C", 30)]);
        let mut rng = StdRng::seed_from_u64(3);
        let first = lock_board(&buyers, &mut rng).unwrap();
        let second = lock_board(&buyers, &mut rng).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_lock_is_blocked_when_oversold_or_empty() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            lock_board(&participants(&[("A", 60), ("B", 41)]), &mut rng),
            Err(LockError::TooManySquares(101))
        );
        assert_eq!(lock_board(&[], &mut rng), Err(LockError::NoSquaresSold));
    }

    #[test]
    fn test_locked_game_cannot_lock_again() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut state = GameState { participants: participants(&[("A", 5)]), ..Default::default() };
        assert_eq!(state.lockable(), Ok(5));
        state.board = Some(lock_board(&state.participants, &mut rng).unwrap());
        assert_eq!(state.lockable(), Err(LockError::AlreadyLocked));
    }

    #[test]
    fn test_from_parts_rejects_malformed_boards() {
        let grid = vec![vec!["A".to_string(); GRID_SIZE]; GRID_SIZE];
        let digits: Vec<u8> = (0..10).collect();

        assert!(Board::from_parts(grid.clone(), digits.clone(), digits.clone()).is_some());
        assert!(Board::from_parts(grid[..9].to_vec(), digits.clone(), digits.clone()).is_none());
        assert!(Board::from_parts(grid.clone(), vec![0, 0, 1, 2, 3, 4, 5, 6, 7, 8], digits.clone()).is_none());
        assert!(Board::from_parts(grid.clone(), digits.clone(), vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10]).is_none());
        assert!(Board::from_parts(grid, digits, vec![0, 1, 2]).is_none());
    }

    #[test]
    fn test_board_survives_grid_rows_round_trip() {
        let mut rng = StdRng::seed_from_u64(42);
        let board = lock_board(&participants(&[("A", 40), ("B", 2)]), &mut rng).unwrap();
        let rebuilt = Board::from_parts(
            board.grid_rows(),
            board.row_labels().to_vec(),
            board.col_labels().to_vec(),
        );
        assert_eq!(rebuilt, Some(board));
    }
}
