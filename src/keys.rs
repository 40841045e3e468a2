use crate::app::{AdminAction, App, MenuItem, ScoreSide};
use crate::state::app_state::Modal;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use sbsquares::store::StoreOp;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

pub async fn handle_key_bindings(
    key_event: KeyEvent,
    app: &Arc<Mutex<App>>,
    store_ops: &mpsc::Sender<StoreOp>,
) {
    let mut guard = app.lock().await;

    if let (Char('c'), KeyModifiers::CONTROL) = (key_event.code, key_event.modifiers) {
        crate::cleanup_terminal();
        std::process::exit(0);
    }

    let ops = if guard.state.modal.is_some() {
        handle_modal_key(key_event, &mut guard)
    } else if guard.state.signup.composing {
        handle_signup_key(key_event, &mut guard)
    } else {
        handle_view_key(key_event, &mut guard)
    };
    drop(guard);

    for op in ops {
        let _ = store_ops.send(op).await;
    }
}

fn handle_modal_key(key_event: KeyEvent, app: &mut App) -> Vec<StoreOp> {
    match app.state.modal.as_mut() {
        Some(Modal::AdminLogin { input, .. }) => match key_event.code {
            KeyCode::Enter => return app.submit_admin_password(),
            KeyCode::Esc => app.dismiss_modal(),
            KeyCode::Backspace => {
                input.pop();
            }
            Char(c) => input.push(c),
            _ => {}
        },
        Some(Modal::Confirm { .. }) => match key_event.code {
            KeyCode::Enter | Char('y') => return app.confirm_modal(),
            KeyCode::Esc | Char('n') => app.dismiss_modal(),
            _ => {}
        },
        Some(Modal::Notice { .. }) | Some(Modal::Payment(_)) => {
            if matches!(key_event.code, KeyCode::Enter | KeyCode::Esc) {
                app.dismiss_modal();
            }
        }
        None => {}
    }
    Vec::new()
}

fn handle_signup_key(key_event: KeyEvent, app: &mut App) -> Vec<StoreOp> {
    let form = &mut app.state.signup;
    match key_event.code {
        KeyCode::Enter => return app.submit_signup(),
        KeyCode::Esc => form.cancel(),
        KeyCode::Tab | KeyCode::BackTab => form.next_field(),
        KeyCode::Backspace => form.pop_char(),
        Char(c) => form.push_char(c),
        _ => {}
    }
    Vec::new()
}

fn handle_view_key(key_event: KeyEvent, app: &mut App) -> Vec<StoreOp> {
    let action = match (app.state.active_tab, key_event.code) {
        // Quit
        (_, Char('q')) => {
            crate::cleanup_terminal();
            std::process::exit(0);
        }

        // Tab switching
        (_, Char('1')) => {
            app.update_tab(MenuItem::SignUp);
            None
        }
        (_, Char('2')) => {
            app.update_tab(MenuItem::Board);
            None
        }
        (_, Char('?')) => {
            app.update_tab(MenuItem::Help);
            None
        }
        (MenuItem::Help, KeyCode::Esc) => {
            app.exit_help();
            None
        }

        // Sign-up tab
        (MenuItem::SignUp, Char('i') | KeyCode::Enter) => {
            app.start_signup();
            None
        }
        (MenuItem::SignUp, Char('j') | KeyCode::Down) => {
            app.state.select_next_participant();
            None
        }
        (MenuItem::SignUp, Char('k') | KeyCode::Up) => {
            app.state.select_prev_participant();
            None
        }
        (MenuItem::SignUp, Char('x') | KeyCode::Delete) => {
            Some(AdminAction::RemoveParticipant(app.state.selected_participant))
        }

        // Board controls
        (MenuItem::Board, Char('h')) => Some(AdminAction::AdjustScore { side: ScoreSide::Home, delta: 1 }),
        (MenuItem::Board, Char('H')) => Some(AdminAction::AdjustScore { side: ScoreSide::Home, delta: -1 }),
        (MenuItem::Board, Char('y')) => Some(AdminAction::AdjustScore { side: ScoreSide::Away, delta: 1 }),
        (MenuItem::Board, Char('Y')) => Some(AdminAction::AdjustScore { side: ScoreSide::Away, delta: -1 }),
        (MenuItem::Board, Char(']')) => {
            Some(AdminAction::SetQuarter(app.state.game.score.quarter.saturating_add(1)))
        }
        (MenuItem::Board, Char('[')) => {
            Some(AdminAction::SetQuarter(app.state.game.score.quarter.saturating_sub(1)))
        }
        (MenuItem::Board, Char('t')) => {
            app.state.cycle_award_target();
            None
        }
        (MenuItem::Board, Char('A')) => Some(AdminAction::AwardQuarter(app.state.award_target)),

        // Admin, any tab
        (_, Char('L')) => Some(AdminAction::Lock),
        (_, Char('R')) => Some(AdminAction::Reset),
        (_, Char('v')) => Some(AdminAction::ToggleLive),
        (_, Char('a')) => {
            if !app.state.is_admin() {
                app.open_admin_login();
            }
            None
        }

        // Global
        (_, Char('f')) => {
            app.toggle_full_screen();
            None
        }
        (_, Char('"')) => {
            app.toggle_show_logs();
            None
        }

        _ => None,
    };

    match action {
        Some(action) => app.request_admin(action),
        None => Vec::new(),
    }
}
