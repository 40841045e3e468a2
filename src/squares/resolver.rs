use super::GRID_SIZE;

/// A square on the board, addressed by row (away digit) and column (home digit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

/// Map a score to the square whose row/column digits match each side's last digit.
///
/// Column digits follow the home score and row digits the away score. With full
/// 0–9 permutations both lookups always succeed; `None` only means the labels are
/// not a permutation.
pub fn resolve_cell(
    home: u32,
    away: u32,
    row_labels: &[u8; GRID_SIZE],
    col_labels: &[u8; GRID_SIZE],
) -> Option<Cell> {
    let col = position_of(col_labels, home)?;
    let row = position_of(row_labels, away)?;
    Some(Cell { row, col })
}

fn position_of(labels: &[u8; GRID_SIZE], score: u32) -> Option<usize> {
    let digit = (score % 10) as u8;
    labels.iter().position(|&d| d == digit)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLS: [u8; 10] = [3, 1, 4, 0, 5, 9, 2, 6, 8, 7];
    const ROWS: [u8; 10] = [0, 2, 4, 6, 8, 7, 1, 3, 5, 9];

    #[test]
    fn test_last_digits_select_row_and_column() {
        // home 23 -> digit 3 at column 0; away 17 -> digit 7 at row 5
        assert_eq!(resolve_cell(23, 17, &ROWS, &COLS), Some(Cell { row: 5, col: 0 }));
    }

    #[test]
    fn test_scores_sharing_last_digits_share_a_square() {
        let a = resolve_cell(7, 3, &ROWS, &COLS);
        let b = resolve_cell(27, 13, &ROWS, &COLS);
        assert_eq!(a, b);
        assert_eq!(a, resolve_cell(7, 3, &ROWS, &COLS));
    }

    #[test]
    fn test_every_score_resolves_on_a_permutation() {
        for home in 0..60 {
            for away in 0..60 {
                let cell = resolve_cell(home, away, &ROWS, &COLS).unwrap();
                assert_eq!(u32::from(COLS[cell.col]), home % 10);
                assert_eq!(u32::from(ROWS[cell.row]), away % 10);
            }
        }
    }

    #[test]
    fn test_missing_digit_is_not_found() {
        let broken = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(resolve_cell(5, 0, &ROWS, &broken), None);
    }
}
