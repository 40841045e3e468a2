use crate::state::app_settings::AppSettings;
use crate::state::app_state::{AppState, Modal};
use chrono::Local;
use log::{debug, error, info, warn};
use nfl_api::Game;
use sbsquares::squares::award::{AwardError, award_quarter};
use sbsquares::squares::grid::lock_board;
use sbsquares::squares::reconcile::{reconcile, select_game};
use sbsquares::squares::signup::{PaymentNotice, add_participant, remove_participant};
use sbsquares::squares::{FINAL_QUARTER, GameState, Quarter, quarter_label};
use sbsquares::store::{StoreError, StoreOp};

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum MenuItem {
    #[default]
    SignUp,
    Board,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreSide {
    Home,
    Away,
}

impl ScoreSide {
    fn field(self) -> &'static str {
        match self {
            ScoreSide::Home => "home",
            ScoreSide::Away => "away",
        }
    }
}

/// Everything behind the admin gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminAction {
    RemoveParticipant(usize),
    Lock,
    Reset,
    AdjustScore { side: ScoreSide, delta: i32 },
    SetQuarter(u8),
    AwardQuarter(u8),
    ToggleLive,
}

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
}

impl App {
    pub fn new() -> Self {
        let app = Self::with_settings(AppSettings::load());

        if let Some(level) = app.settings.log_level {
            log::set_max_level(level);
            tui_logger::set_default_level(level);
        }

        app
    }

    pub fn with_settings(settings: AppSettings) -> Self {
        Self { settings, state: AppState::new() }
    }

    // -----------------------------------------------------------------------
    // Tab management
    // -----------------------------------------------------------------------

    pub fn update_tab(&mut self, next: MenuItem) {
        if self.state.active_tab == next {
            return;
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    // -----------------------------------------------------------------------
    // Store events: called from main_ui_loop
    // -----------------------------------------------------------------------

    pub fn on_store_connected(&mut self) {
        info!("connected to store at {}", self.settings.store_url);
        self.state.connected = true;
        self.state.last_error = None;
    }

    pub fn on_store_disconnected(&mut self) {
        if self.state.connected {
            warn!("store disconnected, retrying...");
        }
        self.state.connected = false;
    }

    pub fn on_store_error(&mut self, message: String) {
        error!("store error: {message}");
        self.state.last_error = Some(message);
    }

    /// Replace the local mirror with the relay's latest document.
    pub fn on_snapshot(&mut self, game: GameState) {
        if self.state.game.is_locked() != game.is_locked() {
            info!("board is now {}", if game.is_locked() { "locked" } else { "open" });
        }
        self.state.game = game;
        let last = self.state.game.participants.len().saturating_sub(1);
        self.state.selected_participant = self.state.selected_participant.min(last);
    }

    // -----------------------------------------------------------------------
    // Live scoring
    // -----------------------------------------------------------------------

    /// The poller runs only for an admin session with live mode on.
    pub fn should_poll(&self) -> bool {
        self.state.is_admin() && self.state.game.live_mode
    }

    /// Writes owed for one scoreboard poll. Results that arrive after live mode was
    /// switched off are dropped.
    pub fn on_live_scoreboard(&mut self, games: Vec<Game>) -> Vec<StoreOp> {
        if !self.should_poll() {
            debug!("dropping scoreboard result: live mode is off");
            return Vec::new();
        }
        let teams = &self.settings.teams;
        let Some(game) = select_game(&games, teams) else {
            warn!("scoreboard lists no game to track");
            return Vec::new();
        };
        let detail = match game.start_time {
            Some(kickoff) if !game.is_live() && !game.is_final() => {
                format!("kickoff {}", kickoff.with_timezone(&Local).format("%a %H:%M"))
            }
            _ => game.clock.clone().unwrap_or_default(),
        };
        self.state.tracked_game = Some(format!(
            "{} {} @ {} {}  {detail}",
            game.away.team.abbrev,
            game.away.score,
            game.home.team.abbrev,
            game.home.score,
        ));
        self.state.last_polled_at = Some(Local::now().format("%H:%M:%S").to_string());

        let plan = reconcile(&self.state.game, game, teams);
        for quarter in &plan.stalled {
            warn!(
                "{} is over but the feed has no score for it; award it manually",
                quarter.label()
            );
        }

        let mut ops = Vec::with_capacity(plan.awards.len() + 1);
        self.push_op(&mut ops, StoreOp::score(&plan.score));
        self.state.game.score = plan.score;
        for (quarter, award) in plan.awards {
            info!("{} auto-awarded to {} ({})", quarter.label(), award.winner, award.score);
            self.push_op(&mut ops, StoreOp::award(quarter, &award));
            self.state.game.awards.insert(quarter, award);
        }
        ops
    }

    pub fn on_feed_error(&mut self, message: String) {
        warn!("live score poll skipped: {message}");
    }

    // -----------------------------------------------------------------------
    // Sign-up
    // -----------------------------------------------------------------------

    pub fn start_signup(&mut self) {
        if self.state.game.signup_open() {
            self.state.signup.start();
        } else {
            self.notice("Sign-ups closed", vec!["The board is full or locked.".to_string()]);
        }
    }

    pub fn submit_signup(&mut self) -> Vec<StoreOp> {
        let name = self.state.signup.name.clone();
        let squares = self.state.signup.squares_requested();
        match add_participant(&self.state.game, &name, squares) {
            Ok(roster) => {
                let mut ops = Vec::new();
                self.push_op(&mut ops, StoreOp::participants(&roster));
                info!("{} signed up for {squares} squares", name.trim());
                self.state.game.participants = roster;
                self.state.signup.cancel();
                self.state.modal = Some(Modal::Payment(PaymentNotice::new(
                    &name,
                    squares,
                    self.settings.square_cost,
                    self.settings.venmo_user.as_deref(),
                )));
                ops
            }
            Err(e) => {
                self.state.signup.error = Some(e.to_string());
                Vec::new()
            }
        }
    }

    // -----------------------------------------------------------------------
    // Admin gate and actions
    // -----------------------------------------------------------------------

    /// Entry point for every admin action. Without a session the password prompt
    /// opens and the action waits for a successful login.
    pub fn request_admin(&mut self, action: AdminAction) -> Vec<StoreOp> {
        if !self.state.is_admin() {
            self.state.pending_admin = Some(action);
            self.open_admin_login();
            return Vec::new();
        }
        self.begin(action)
    }

    pub fn open_admin_login(&mut self) {
        self.state.modal = Some(Modal::AdminLogin { input: String::new(), error: None });
    }

    pub fn submit_admin_password(&mut self) -> Vec<StoreOp> {
        let Some(Modal::AdminLogin { input, .. }) = self.state.modal.as_ref() else {
            return Vec::new();
        };
        let attempt = input.clone();
        if !self.state.admin.login(&attempt, &self.settings.admin_password) {
            self.state.modal = Some(Modal::AdminLogin {
                input: String::new(),
                error: Some("Incorrect password.".to_string()),
            });
            return Vec::new();
        }

        info!("admin session started");
        self.state.modal = None;
        match self.state.pending_admin.take() {
            Some(action) => self.begin(action),
            None => Vec::new(),
        }
    }

    /// Run the action held by the open confirmation dialog.
    pub fn confirm_modal(&mut self) -> Vec<StoreOp> {
        match self.state.modal.take() {
            Some(Modal::Confirm { action, .. }) => self.execute(action),
            other => {
                self.state.modal = other;
                Vec::new()
            }
        }
    }

    pub fn dismiss_modal(&mut self) {
        if matches!(self.state.modal, Some(Modal::AdminLogin { .. })) {
            self.state.pending_admin = None;
        }
        self.state.modal = None;
    }

    /// Validate an admin action and either ask for confirmation or run it.
    fn begin(&mut self, action: AdminAction) -> Vec<StoreOp> {
        match self.confirmation(&action) {
            Ok(Some(message)) => {
                self.state.modal = Some(Modal::Confirm { message, action });
                Vec::new()
            }
            Ok(None) => self.execute(action),
            Err((title, reason)) => {
                self.notice(title, vec![reason]);
                Vec::new()
            }
        }
    }

    /// Confirmation text for actions that need one, or the reason the action is refused.
    fn confirmation(&self, action: &AdminAction) -> Result<Option<String>, (&'static str, String)> {
        let game = &self.state.game;
        let message = match action {
            AdminAction::RemoveParticipant(index) => {
                if game.is_locked() {
                    return Err(("Cannot remove", "Board is locked!".to_string()));
                }
                let p = game
                    .participants
                    .get(*index)
                    .ok_or(("Cannot remove", "No participant selected.".to_string()))?;
                format!("Remove {} ({} squares)?", p.name, p.squares)
            }
            AdminAction::Lock => {
                let sold = game.lockable().map_err(|e| ("Cannot lock", e.to_string()))?;
                format!(
                    "Lock the board? {sold} squares sold, {} stay OPEN. Numbers are drawn at random and this cannot be undone.",
                    game.squares_remaining()
                )
            }
            AdminAction::Reset => {
                "Reset the whole game? Participants, board, scores and awards are all cleared."
                    .to_string()
            }
            AdminAction::AwardQuarter(q) => {
                let award = award_quarter(game, *q, &self.settings.teams, self.settings.square_cost)
                    .map_err(|e| {
                        if let AwardError::AlreadyAwarded(q) = &e {
                            debug!("award for {} ignored: already awarded", q.label());
                        }
                        ("Cannot award", e.to_string())
                    })?;
                format!(
                    "Award {} to {} for ${}?  ({})",
                    award.quarter.label(),
                    award.record.winner,
                    award.amount,
                    award.record.score
                )
            }
            AdminAction::AdjustScore { .. } | AdminAction::SetQuarter(_) | AdminAction::ToggleLive => {
                return Ok(None);
            }
        };
        Ok(Some(message))
    }

    /// Perform an admin action against the current snapshot and return its writes.
    /// Preconditions are checked again since a snapshot may have landed since `begin`.
    fn execute(&mut self, action: AdminAction) -> Vec<StoreOp> {
        let mut ops = Vec::new();
        match action {
            AdminAction::RemoveParticipant(index) => {
                if let Some(roster) = remove_participant(&self.state.game, index) {
                    self.push_op(&mut ops, StoreOp::participants(&roster));
                    self.state.game.participants = roster;
                    self.state.select_prev_participant();
                }
            }
            AdminAction::Lock => {
                let board = self
                    .state
                    .game
                    .lockable()
                    .and_then(|_| lock_board(&self.state.game.participants, &mut rand::rng()));
                match board {
                    Ok(board) => {
                        info!("board locked with {} open squares", board.open_squares());
                        self.push_op(&mut ops, StoreOp::lock(&board));
                        self.state.game.board = Some(board);
                    }
                    Err(e) => self.notice("Cannot lock", vec![e.to_string()]),
                }
            }
            AdminAction::Reset => {
                info!("game reset");
                self.push_op(&mut ops, StoreOp::reset());
                self.state.game = GameState::default();
                self.state.selected_participant = 0;
            }
            AdminAction::AdjustScore { side, delta } => {
                let score = &mut self.state.game.score;
                let slot = match side {
                    ScoreSide::Home => &mut score.home,
                    ScoreSide::Away => &mut score.away,
                };
                *slot = slot.saturating_add_signed(delta);
                let value = *slot;
                self.push_op(&mut ops, StoreOp::score_field(side.field(), value));
            }
            AdminAction::SetQuarter(quarter) => {
                let quarter = quarter.min(FINAL_QUARTER);
                self.state.game.score.quarter = quarter;
                debug!("quarter set to {}", quarter_label(quarter));
                self.push_op(&mut ops, StoreOp::score_field("quarter", u32::from(quarter)));
            }
            AdminAction::AwardQuarter(q) => {
                match award_quarter(&self.state.game, q, &self.settings.teams, self.settings.square_cost) {
                    Ok(award) => {
                        info!("{} awarded to {}", award.quarter.label(), award.record.winner);
                        self.push_op(&mut ops, StoreOp::award(award.quarter, &award.record));
                        self.state.game.record_award(&award);
                        self.notice(
                            "Winner!",
                            vec![
                                format!("{} winner: {}", award.quarter.label(), award.record.winner),
                                format!("Prize: ${}", award.amount),
                                award.record.score,
                            ],
                        );
                    }
                    Err(e) => self.notice("Cannot award", vec![e.to_string()]),
                }
            }
            AdminAction::ToggleLive => {
                let enabled = !self.state.game.live_mode;
                info!("live mode {}", if enabled { "on" } else { "off" });
                self.state.game.live_mode = enabled;
                self.push_op(&mut ops, StoreOp::live_mode(enabled));
            }
        }
        ops
    }

    fn notice(&mut self, title: &str, lines: Vec<String>) {
        self.state.modal = Some(Modal::Notice { title: title.to_string(), lines });
    }

    fn push_op(&mut self, ops: &mut Vec<StoreOp>, op: Result<StoreOp, StoreError>) {
        match op {
            Ok(op) => ops.push(op),
            Err(e) => self.on_store_error(e.to_string()),
        }
    }

    /// Prize for `quarter` at the current pot, for display.
    pub fn prize_for(&self, quarter: Quarter) -> u32 {
        self.state.game.prize_for(quarter, self.settings.square_cost)
    }
}
