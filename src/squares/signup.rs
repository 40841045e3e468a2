//! Sign-up and roster edits made before the board locks.

use super::{GameState, Participant};
use reqwest::Url;
use std::fmt;

const VENMO_BASE: &str = "https://venmo.com/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupError {
    Locked,
    EmptyName,
    NoSquares,
    NotEnoughRemaining { remaining: u32 },
}

impl fmt::Display for SignupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignupError::Locked => write!(f, "Board is locked!"),
            SignupError::EmptyName => write!(f, "Please enter a name."),
            SignupError::NoSquares => write!(f, "Must have at least 1 square."),
            SignupError::NotEnoughRemaining { remaining } => {
                write!(f, "Only {remaining} squares remaining!")
            }
        }
    }
}

impl std::error::Error for SignupError {}

/// Validate a sign-up and return the roster with the new participant appended.
pub fn add_participant(state: &GameState, name: &str, squares: u32) -> Result<Vec<Participant>, SignupError> {
    if state.is_locked() {
        return Err(SignupError::Locked);
    }
    let name = name.trim();
    if name.is_empty() {
        return Err(SignupError::EmptyName);
    }
    if squares < 1 {
        return Err(SignupError::NoSquares);
    }
    let remaining = state.squares_remaining();
    if squares > remaining {
        return Err(SignupError::NotEnoughRemaining { remaining });
    }

    let mut updated = state.participants.clone();
    updated.push(Participant { name: name.to_string(), squares });
    Ok(updated)
}

/// Roster with the participant at `index` removed. `None` once locked or when out of range.
pub fn remove_participant(state: &GameState, index: usize) -> Option<Vec<Participant>> {
    if state.is_locked() || index >= state.participants.len() {
        return None;
    }
    let mut updated = state.participants.clone();
    updated.remove(index);
    Some(updated)
}

/// What a new participant owes. Money moves outside the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentNotice {
    pub name: String,
    pub squares: u32,
    pub amount: u32,
    pub link: Option<String>,
}

impl PaymentNotice {
    pub fn new(name: &str, squares: u32, square_cost: u32, venmo_user: Option<&str>) -> Self {
        let amount = squares.saturating_mul(square_cost);
        let link = venmo_user
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .and_then(|user| venmo_link(user, amount, &format!("Super Bowl squares x{squares} ({})", name.trim())));
        Self { name: name.trim().to_string(), squares, amount, link }
    }
}

fn venmo_link(user: &str, amount: u32, note: &str) -> Option<String> {
    let base = Url::parse(VENMO_BASE).ok()?.join(user.trim_start_matches('@')).ok()?;
    let amount = amount.to_string();
    let url = Url::parse_with_params(
        base.as_str(),
        &[("txn", "pay"), ("amount", amount.as_str()), ("note", note)],
    )
    .ok()?;
    Some(url.to_string())
}
