use crate::app::{AdminAction, MenuItem};
use sbsquares::squares::GameState;
use sbsquares::squares::signup::PaymentNotice;

// ---------------------------------------------------------------------------
// Admin gate
// ---------------------------------------------------------------------------

/// Session-scoped admin flag. Once unlocked it stays unlocked until the process exits.
#[derive(Debug, Default)]
pub struct AdminGate {
    authenticated: bool,
}

impl AdminGate {
    pub fn is_admin(&self) -> bool {
        self.authenticated
    }

    /// Compare an attempt with the shared secret. A wrong attempt leaves the flag as it was.
    pub fn login(&mut self, attempt: &str, secret: &str) -> bool {
        if attempt == secret {
            self.authenticated = true;
        }
        attempt == secret
    }
}

// ---------------------------------------------------------------------------
// Sign-up form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignupField {
    #[default]
    Name,
    Squares,
}

#[derive(Debug)]
pub struct SignupForm {
    pub name: String,
    pub squares: String,
    pub field: SignupField,
    pub composing: bool,
    /// Inline validation message from the last submit.
    pub error: Option<String>,
}

impl Default for SignupForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            squares: "1".to_string(),
            field: SignupField::Name,
            composing: false,
            error: None,
        }
    }
}

impl SignupForm {
    pub fn start(&mut self) {
        self.composing = true;
        self.field = SignupField::Name;
        self.error = None;
    }

    pub fn cancel(&mut self) {
        *self = Self::default();
    }

    pub fn next_field(&mut self) {
        self.field = match self.field {
            SignupField::Name => SignupField::Squares,
            SignupField::Squares => SignupField::Name,
        };
    }

    pub fn push_char(&mut self, c: char) {
        match self.field {
            SignupField::Name => self.name.push(c),
            SignupField::Squares if c.is_ascii_digit() && self.squares.len() < 3 => {
                self.squares.push(c)
            }
            SignupField::Squares => {}
        }
    }

    pub fn pop_char(&mut self) {
        match self.field {
            SignupField::Name => self.name.pop(),
            SignupField::Squares => self.squares.pop(),
        };
    }

    /// Squares as typed; an empty or unparseable field counts as zero.
    pub fn squares_requested(&self) -> u32 {
        self.squares.trim().parse().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Modals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Modal {
    AdminLogin { input: String, error: Option<String> },
    Confirm { message: String, action: AdminAction },
    Notice { title: String, lines: Vec<String> },
    Payment(PaymentNotice),
}

// ---------------------------------------------------------------------------
// Root app state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub show_logs: bool,
    pub last_error: Option<String>,
    /// Latest snapshot of the shared document.
    pub game: GameState,
    pub connected: bool,
    pub admin: AdminGate,
    pub signup: SignupForm,
    pub modal: Option<Modal>,
    /// Admin action that asked for the password; it resumes after a good login.
    pub pending_admin: Option<AdminAction>,
    pub selected_participant: usize,
    /// Quarter the award key acts on (1–4).
    pub award_target: u8,
    /// One-line description of the game the live feed is tracking.
    pub tracked_game: Option<String>,
    pub last_polled_at: Option<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            award_target: 1,
            ..Self::default()
        }
    }

    pub fn is_admin(&self) -> bool {
        self.admin.is_admin()
    }

    pub fn select_next_participant(&mut self) {
        let max = self.game.participants.len().saturating_sub(1);
        if self.selected_participant < max {
            self.selected_participant += 1;
        }
    }

    pub fn select_prev_participant(&mut self) {
        self.selected_participant = self.selected_participant.saturating_sub(1);
    }

    pub fn cycle_award_target(&mut self) {
        self.award_target = self.award_target % 4 + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sbsquares::squares::Participant;

    #[test]
    fn test_admin_gate_only_opens_on_the_secret() {
        let mut gate = AdminGate::default();
        assert!(!gate.login("guess", "Jags2027"));
        assert!(!gate.is_admin());
        assert!(gate.login("Jags2027", "Jags2027"));
        assert!(gate.is_admin());
        // A later typo does not close the session.
        assert!(!gate.login("oops", "Jags2027"));
        assert!(gate.is_admin());
    }

    #[test]
    fn test_squares_field_accepts_digits_only() {
        let mut form = SignupForm::default();
        form.start();
        form.push_char('A');
        form.next_field();
        form.pop_char();
        for c in ['1', 'x', '2'] {
            form.push_char(c);
        }
        assert_eq!(form.name, "A");
        assert_eq!(form.squares, "12");
        assert_eq!(form.squares_requested(), 12);

        form.squares.clear();
        assert_eq!(form.squares_requested(), 0);
    }

    #[test]
    fn test_participant_selection_stays_in_range() {
        let mut state = AppState::new();
        state.game.participants = vec![
            Participant { name: "A".into(), squares: 1 },
            Participant { name: "B".into(), squares: 1 },
        ];
        state.select_prev_participant();
        assert_eq!(state.selected_participant, 0);
        state.select_next_participant();
        state.select_next_participant();
        assert_eq!(state.selected_participant, 1);
    }

    #[test]
    fn test_award_target_cycles_through_four_quarters() {
        let mut state = AppState::new();
        let seen: Vec<u8> = (0..5)
            .map(|_| {
                state.cycle_award_target();
                state.award_target
            })
            .collect();
        assert_eq!(seen, vec![2, 3, 4, 1, 2]);
    }
}
