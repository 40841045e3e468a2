use log::{LevelFilter, warn};
use sbsquares::squares::{TeamInfo, Teams};
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_STORE_URL: &str = "ws://127.0.0.1:8788";
const DEFAULT_ADMIN_PASSWORD: &str = "Jags2027";
const DEFAULT_SQUARE_COST: u32 = 5;
const DEFAULT_POLL_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub full_screen: bool,
    pub log_level: Option<LevelFilter>,
    pub store_url: String,
    pub admin_password: String,
    pub teams: Teams,
    pub square_cost: u32,
    pub venmo_user: Option<String>,
    pub poll_interval: Duration,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            full_screen: false,
            log_level: None,
            store_url: DEFAULT_STORE_URL.to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            teams: Teams::default(),
            square_cost: DEFAULT_SQUARE_COST,
            venmo_user: None,
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECS),
        }
    }
}

impl AppSettings {
    /// Settings come from `SBSQ_*` environment variables; anything unset keeps its default.
    pub fn load() -> Self {
        let defaults = Self::default();
        let teams = Teams {
            home: TeamInfo::new(
                var_or("SBSQ_HOME_TEAM", &defaults.teams.home.name),
                var_or("SBSQ_HOME_ABBREV", &defaults.teams.home.abbrev),
            ),
            away: TeamInfo::new(
                var_or("SBSQ_AWAY_TEAM", &defaults.teams.away.name),
                var_or("SBSQ_AWAY_ABBREV", &defaults.teams.away.abbrev),
            ),
        };

        Self {
            full_screen: false,
            log_level: var("SBSQ_LOG").and_then(|level| parse_or_warn("SBSQ_LOG", &level)),
            store_url: var_or("SBSQ_STORE_WS", &defaults.store_url),
            admin_password: var_or("SBSQ_ADMIN_PASSWORD", &defaults.admin_password),
            teams,
            square_cost: var("SBSQ_SQUARE_COST")
                .and_then(|cost| parse_or_warn("SBSQ_SQUARE_COST", &cost))
                .unwrap_or(defaults.square_cost),
            venmo_user: var("SBSQ_VENMO_USER"),
            poll_interval: var("SBSQ_POLL_SECS")
                .and_then(|secs| parse_or_warn::<u64>("SBSQ_POLL_SECS", &secs))
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_interval),
        }
    }
}

/// Non-empty, trimmed value of an environment variable.
fn var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn var_or(key: &str, default: &str) -> String {
    var(key).unwrap_or_else(|| default.to_string())
}

fn parse_or_warn<T: FromStr>(key: &str, value: &str) -> Option<T> {
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("ignoring {key}={value:?}: not a valid value");
            None
        }
    }
}
