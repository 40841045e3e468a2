pub mod client;
pub mod espn;

use chrono::{DateTime, Utc};

// ---------------------------------------------------------------------------
// Domain types: clean model, independent of ESPN wire format
// ---------------------------------------------------------------------------

/// One game from the scoreboard.
#[derive(Debug, Clone, Default)]
pub struct Game {
    pub id: String,
    pub home: Competitor,
    pub away: Competitor,
    pub state: GameState,
    /// Current period as reported by the feed (0 before kickoff).
    pub period: u8,
    pub clock: Option<String>,
    /// Scheduled kickoff.
    pub start_time: Option<DateTime<Utc>>,
}

impl Game {
    pub fn is_live(&self) -> bool {
        self.state == GameState::InProgress
    }

    pub fn is_final(&self) -> bool {
        self.state == GameState::Final
    }

    /// True when both abbreviations take part in this game, in either home/away order.
    pub fn involves(&self, first: &str, second: &str) -> bool {
        let abbrevs = [self.home.team.abbrev.as_str(), self.away.team.abbrev.as_str()];
        abbrevs.iter().any(|a| a.eq_ignore_ascii_case(first))
            && abbrevs.iter().any(|a| a.eq_ignore_ascii_case(second))
    }

    /// Number of periods both sides have per-period scores for.
    pub fn periods_reported(&self) -> usize {
        self.home.linescores.len().min(self.away.linescores.len())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Competitor {
    pub team: Team,
    /// Cumulative score.
    pub score: u16,
    /// Points scored in each period, in order.
    pub linescores: Vec<u16>,
}

impl Competitor {
    /// Points scored through the end of `period` (1-based), if the feed reported that far.
    pub fn score_through(&self, period: usize) -> Option<u16> {
        if period == 0 || period > self.linescores.len() {
            return None;
        }
        Some(self.linescores[..period].iter().sum())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Team {
    pub id: String,
    pub name: String,   // "New England Patriots"
    pub abbrev: String, // "NE"
}

/// Coarse game state as reported by ESPN's `status.type.state`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GameState {
    #[default]
    Scheduled,
    InProgress,
    Final,
}
