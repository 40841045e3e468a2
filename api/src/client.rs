use crate::espn::{EspnCompetitor, EspnEvent, EspnStatus, ScoreboardResponse};
use crate::{Competitor, Game, GameState, Team};
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

const ESPN_NFL_SITE_V2: &str = "https://site.api.espn.com/apis/site/v2/sports/football/nfl";

/// NFL scoreboard client backed by ESPN's public endpoints.
#[derive(Debug, Clone)]
pub struct NflApi {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl Default for NflApi {
    fn default() -> Self {
        Self {
            client: Client::builder()
                .user_agent("sbsquares/0.1 (super bowl squares pool)")
                .build()
                .unwrap_or_default(),
            base_url: ESPN_NFL_SITE_V2.to_owned(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api(reqwest::Error, String),
    Parsing(reqwest::Error, String),
    NotFound(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api(e, url) => write!(f, "API error for {url}: {e}"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::NotFound(msg) => write!(f, "Not found: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl NflApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the client at a different host serving the same `/scoreboard` shape.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            ..Self::default()
        }
    }

    /// Fetch every game on the current NFL scoreboard.
    ///
    /// An empty event list is reported as `NotFound` so callers can treat
    /// "nothing to track" the same way as any other skipped poll.
    pub async fn fetch_scoreboard(&self) -> ApiResult<Vec<Game>> {
        let url = format!("{}/scoreboard", self.base_url);
        let raw: ScoreboardResponse = self.get(&url).await?;
        let games: Vec<Game> = raw
            .events
            .unwrap_or_default()
            .iter()
            .map(map_event_to_game)
            .collect();
        if games.is_empty() {
            return Err(ApiError::NotFound(format!("no games listed at {url}")));
        }
        Ok(games)
    }

    async fn get<T: Default + serde::de::DeserializeOwned>(&self, url: &str) -> ApiResult<T> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?;

        match response.error_for_status() {
            Ok(res) => res
                .json::<T>()
                .await
                .map_err(|e| ApiError::Parsing(e, url.to_owned())),
            Err(e) => {
                if e.status().map(|s| s.is_client_error()).unwrap_or(false) {
                    Ok(T::default())
                } else {
                    Err(ApiError::Api(e, url.to_owned()))
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Mapping: ESPN wire types → clean domain types
// ---------------------------------------------------------------------------

fn map_event_to_game(event: &EspnEvent) -> Game {
    let id = event.id.clone().unwrap_or_default();

    // Only the first competition matters for a single-game event.
    let competition = event.competitions.as_deref().and_then(|c| c.first());

    // Prefer the competition status, which is what ESPN updates during play.
    let status: Option<&EspnStatus> = competition
        .and_then(|c| c.status.as_ref())
        .or(event.status.as_ref());

    let state = status
        .and_then(|s| s.status_type.as_ref())
        .and_then(|t| t.state.as_deref())
        .map(parse_state)
        .unwrap_or_default();
    let period = status.and_then(|s| s.period).unwrap_or_default();
    let clock = status.and_then(|s| s.display_clock.clone());

    let competitors = competition
        .and_then(|c| c.competitors.as_deref())
        .unwrap_or_default();
    let home = competitors
        .iter()
        .find(|c| c.home_away.as_deref() == Some("home"))
        .map(map_competitor)
        .unwrap_or_default();
    let away = competitors
        .iter()
        .find(|c| c.home_away.as_deref() == Some("away"))
        .map(map_competitor)
        .unwrap_or_default();

    let start_time = event.date.as_deref().and_then(parse_event_date);

    Game {
        id,
        home,
        away,
        state,
        period,
        clock,
        start_time,
    }
}

/// ESPN dates usually stop at the minute (`2026-02-08T23:30Z`), which RFC 3339 rejects.
fn parse_event_date(date: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(date)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%MZ")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

fn map_competitor(c: &EspnCompetitor) -> Competitor {
    let team = c
        .team
        .as_ref()
        .map(|t| Team {
            id: t.id.clone().unwrap_or_default(),
            name: t.display_name.clone().unwrap_or_default(),
            abbrev: t.abbreviation.clone().unwrap_or_default(),
        })
        .unwrap_or_default();

    let score = c
        .score
        .as_deref()
        .and_then(|s| s.trim().parse::<u16>().ok())
        .unwrap_or(0);

    let linescores = c
        .linescores
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|ls| ls.value.map(period_points).unwrap_or(0))
        .collect();

    Competitor { team, score, linescores }
}

/// ESPN reports per-period points as floats ("7.0"); anything odd becomes 0.
fn period_points(value: f64) -> u16 {
    if value.is_finite() && value >= 0.0 {
        value.round().min(f64::from(u16::MAX)) as u16
    } else {
        0
    }
}

fn parse_state(s: &str) -> GameState {
    match s {
        "in" => GameState::InProgress,
        "post" => GameState::Final,
        _ => GameState::Scheduled,
    }
}
