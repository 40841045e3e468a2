use sbsquares::squares::{Board, Cell, GRID_SIZE, OPEN_SQUARE, QuarterAwards};
use tui::buffer::Buffer;
use tui::layout::Rect;
use tui::style::{Color, Modifier, Style};
use tui::widgets::Widget;

// ---------------------------------------------------------------------------
// Layout constants
// ---------------------------------------------------------------------------

/// Columns reserved on the left for the row digit.
pub const LABEL_WIDTH: u16 = 4;

/// Team line + digit header + ten rows.
pub const GRID_HEIGHT: u16 = GRID_SIZE as u16 + 2;

const MIN_CELL_W: u16 = 3;
const MAX_CELL_W: u16 = 12;

/// Mark drawn in front of a square that has won a quarter.
pub const TROPHY: char = '★';

fn accent() -> Style {
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().fg(Color::Indexed(240))
}

fn winner() -> Style {
    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
}

// ---------------------------------------------------------------------------
// SquaresGrid widget
// ---------------------------------------------------------------------------

/// The 10×10 board. Columns follow the home score digit, rows the away score digit.
///
/// ```text
///      NE →
///       7   2   0 ...
/// SEA 4 Ann Bob OPEN
///     1 ...
/// ```
///
/// Before the board is locked every digit shows as `?` and the squares are empty.
pub struct SquaresGrid<'a> {
    pub board: Option<&'a Board>,
    pub awards: &'a QuarterAwards,
    /// Square the current score points at.
    pub active: Option<Cell>,
    pub home_abbrev: &'a str,
    pub away_abbrev: &'a str,
}

impl SquaresGrid<'_> {
    pub fn cell_width(area_width: u16) -> u16 {
        (area_width.saturating_sub(LABEL_WIDTH) / GRID_SIZE as u16).clamp(MIN_CELL_W, MAX_CELL_W)
    }

    fn digit(labels: Option<&[u8; GRID_SIZE]>, index: usize) -> String {
        labels.map_or_else(|| "?".to_string(), |l| l[index].to_string())
    }
}

impl Widget for SquaresGrid<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        let cell_w = Self::cell_width(area.width);
        if area.width < LABEL_WIDTH + cell_w * GRID_SIZE as u16 || area.height < GRID_HEIGHT {
            buf.set_string(area.x, area.y, fit("Enlarge the window to see the board", area.width), dim());
            return;
        }

        let active_row = self.active.map(|c| c.row);
        let active_col = self.active.map(|c| c.col);
        let col_labels = self.board.map(Board::col_labels);
        let row_labels = self.board.map(Board::row_labels);

        buf.set_string(area.x + LABEL_WIDTH, area.y, format!("{} →", self.home_abbrev), accent());
        buf.set_string(area.x, area.y + 1, fit(self.away_abbrev, LABEL_WIDTH - 1), accent());

        for col in 0..GRID_SIZE {
            let x = area.x + LABEL_WIDTH + col as u16 * cell_w;
            let style = if active_col == Some(col) { accent() } else { Style::default() };
            buf.set_string(x, area.y + 1, center(&Self::digit(col_labels, col), cell_w), style);
        }

        for row in 0..GRID_SIZE {
            let y = area.y + 2 + row as u16;
            let label_style = if active_row == Some(row) { accent() } else { Style::default() };
            buf.set_string(area.x + LABEL_WIDTH - 2, y, Self::digit(row_labels, row), label_style);

            for col in 0..GRID_SIZE {
                let x = area.x + LABEL_WIDTH + col as u16 * cell_w;
                let cell = Cell { row, col };
                let (text, mut style) = match self.board {
                    None => ("·".to_string(), dim()),
                    Some(board) => {
                        let owner = board.owner(cell);
                        if !self.awards.won_at(cell).is_empty() {
                            (format!("{TROPHY}{owner}"), winner())
                        } else if owner == OPEN_SQUARE {
                            (owner.to_string(), dim())
                        } else {
                            (owner.to_string(), Style::default())
                        }
                    }
                };
                if self.active == Some(cell) {
                    style = style.bg(Color::Yellow).fg(Color::Black);
                } else if active_row == Some(row) || active_col == Some(col) {
                    style = style.bg(Color::Indexed(236));
                }
                buf.set_string(x, y, fit(&text, cell_w - 1), style);
            }
        }
    }
}

/// Truncate or pad `text` to exactly `width` columns.
pub fn fit(text: &str, width: u16) -> String {
    let width = width as usize;
    let clipped: String = text.chars().take(width).collect();
    format!("{clipped:<width$}")
}

fn center(text: &str, width: u16) -> String {
    let width = width as usize;
    let clipped: String = text.chars().take(width).collect();
    format!("{clipped:^width$}")
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use sbsquares::squares::{Quarter, QuarterAward};

    fn identity_board() -> Board {
        let grid = (0..10)
            .map(|r| (0..10).map(|c| if r == 9 { OPEN_SQUARE.to_string() } else { format!("r{r}c{c}") }).collect())
            .collect();
        let digits: Vec<u8> = (0..10).collect();
        Board::from_parts(grid, digits.clone(), digits).unwrap()
    }

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width).map(|x| buf[(x, y)].symbol().to_string()).collect()
    }

    #[test]
    fn test_fit_pads_and_truncates() {
        assert_eq!(fit("Ann", 5), "Ann  ");
        assert_eq!(fit("Bartholomew", 4), "Bart");
        assert_eq!(fit("", 2), "  ");
    }

    #[test]
    fn test_cell_width_is_clamped() {
        assert_eq!(SquaresGrid::cell_width(20), MIN_CELL_W);
        assert_eq!(SquaresGrid::cell_width(64), 6);
        assert_eq!(SquaresGrid::cell_width(500), MAX_CELL_W);
    }

    #[test]
    fn test_renders_owners_under_their_digits() {
        let board = identity_board();
        let awards = QuarterAwards::default();
        let area = Rect::new(0, 0, 64, GRID_HEIGHT);
        let mut buf = Buffer::empty(area);
        SquaresGrid { board: Some(&board), awards: &awards, active: None, home_abbrev: "NE", away_abbrev: "SEA" }
            .render(area, &mut buf);

        assert!(row_text(&buf, 0).contains("NE →"));
        assert!(row_text(&buf, 1).starts_with("SEA"));
        // Row 3 carries digit 3, and its first square belongs to r3c0.
        let row3 = row_text(&buf, 5);
        assert!(row3.starts_with("  3 r3c0"), "row: {row3:?}");
        assert!(row_text(&buf, 11).contains("OPEN"));
    }

    #[test]
    fn test_unlocked_board_hides_digits() {
        let awards = QuarterAwards::default();
        let area = Rect::new(0, 0, 64, GRID_HEIGHT);
        let mut buf = Buffer::empty(area);
        SquaresGrid { board: None, awards: &awards, active: None, home_abbrev: "NE", away_abbrev: "SEA" }
            .render(area, &mut buf);
        assert!(row_text(&buf, 1).contains('?'));
        assert!(!row_text(&buf, 1).contains('0'));
    }

    #[test]
    fn test_winning_square_gets_trophy_and_active_square_is_highlighted() {
        let board = identity_board();
        let mut awards = QuarterAwards::default();
        awards.insert(Quarter::Q1, QuarterAward { winner: "r3c7".into(), row: 3, col: 7, score: String::new() });
        let active = Cell { row: 0, col: 4 };

        let area = Rect::new(0, 0, 64, GRID_HEIGHT);
        let mut buf = Buffer::empty(area);
        SquaresGrid { board: Some(&board), awards: &awards, active: Some(active), home_abbrev: "NE", away_abbrev: "SEA" }
            .render(area, &mut buf);

        let cell_w = SquaresGrid::cell_width(64);
        let trophy_x = LABEL_WIDTH + 7 * cell_w;
        assert_eq!(buf[(trophy_x, 5)].symbol(), TROPHY.to_string());
        let active_x = LABEL_WIDTH + 4 * cell_w;
        assert_eq!(buf[(active_x, 2)].bg, Color::Yellow);
    }

    #[test]
    fn test_small_area_shows_hint_instead_of_panicking() {
        let awards = QuarterAwards::default();
        let area = Rect::new(0, 0, 20, 5);
        let mut buf = Buffer::empty(area);
        SquaresGrid { board: None, awards: &awards, active: None, home_abbrev: "NE", away_abbrev: "SEA" }
            .render(area, &mut buf);
        assert!(row_text(&buf, 0).starts_with("Enlarge"));
    }
}
