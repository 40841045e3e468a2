/// ESPN API raw wire types: serde shapes for deserializing the NFL scoreboard.
/// These map to our clean domain types via the mapping functions in client.rs.
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Scoreboard  (site v2 API)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ScoreboardResponse {
    pub events: Option<Vec<EspnEvent>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct EspnEvent {
    pub id: Option<String>,
    /// Fallback when the competition carries no status of its own.
    pub status: Option<EspnStatus>,
    pub competitions: Option<Vec<EspnCompetition>>,
    pub date: Option<String>, // ISO 8601
}

#[derive(Debug, Deserialize, Clone)]
pub struct EspnStatus {
    #[serde(rename = "type")]
    pub status_type: Option<EspnStatusType>,
    pub period: Option<u8>,
    #[serde(rename = "displayClock")]
    pub display_clock: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EspnStatusType {
    pub name: Option<String>,  // "STATUS_SCHEDULED", "STATUS_IN_PROGRESS", "STATUS_FINAL"
    pub state: Option<String>, // "pre" | "in" | "post"
    pub completed: Option<bool>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct EspnCompetition {
    pub competitors: Option<Vec<EspnCompetitor>>,
    pub status: Option<EspnStatus>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct EspnCompetitor {
    pub id: Option<String>,
    #[serde(rename = "homeAway")]
    pub home_away: Option<String>, // "home" | "away"
    pub team: Option<EspnTeam>,
    pub score: Option<String>, // ESPN sends scores as strings
    /// Points scored in each period, in order. Overtime appends a fifth entry.
    pub linescores: Option<Vec<EspnLinescore>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EspnTeam {
    pub id: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    pub abbreviation: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EspnLinescore {
    pub value: Option<f64>,
}
