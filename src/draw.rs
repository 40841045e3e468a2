use log::error;
use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs, Wrap};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::{App, MenuItem};
use crate::components::board::{GRID_HEIGHT, SquaresGrid, TROPHY, fit};
use crate::state::app_state::{Modal, SignupField};
use crate::state::network::{ERROR_CHAR, LoadingState};
use crate::ui::layout::LayoutAreas;
use sbsquares::squares::{Quarter, TOTAL_SQUARES};

static TABS: &[&str; 2] = &["Sign Up", "Board"];

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let result = terminal.draw(|f| {
        let area = f.area();
        layout.update(area, app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
        }

        match app.state.active_tab {
            MenuItem::SignUp => draw_signup(f, layout.main, app),
            MenuItem::Board => draw_board(f, layout.main, app),
            MenuItem::Help => draw_help(f, layout.main),
        }

        if app.state.show_logs {
            draw_logs(f, layout.logs);
        }

        if let Some(modal) = app.state.modal.as_ref() {
            draw_modal(f, area, modal);
        }

        draw_loading_spinner(f, area, app, loading);
    });
    if let Err(e) = result {
        error!("failed to draw frame: {e}");
    }
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tab_index = match app.state.active_tab {
        MenuItem::SignUp => 0,
        MenuItem::Board => 1,
        MenuItem::Help => 0,
    };

    let titles: Vec<Line> = TABS.iter().map(|t| Line::from(*t)).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let (link, link_color) = if app.state.connected {
        ("● synced", Color::Green)
    } else {
        ("○ offline", Color::Red)
    };
    let mut status = vec![Span::styled(link, Style::default().fg(link_color))];
    if app.state.game.live_mode {
        status.push(Span::styled("  LIVE", Style::default().fg(Color::Yellow)));
    }
    if app.state.is_admin() {
        status.push(Span::styled("  admin", Style::default().fg(Color::Cyan)));
    }
    status.push(Span::raw("  Help: ? "));

    let help = Paragraph::new(Line::from(status))
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

// ---------------------------------------------------------------------------
// Sign-up tab
// ---------------------------------------------------------------------------

fn draw_signup(f: &mut Frame, area: Rect, app: &App) {
    let [roster_area, side_area] =
        Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)]).areas(area);
    draw_roster(f, roster_area, app);

    let [pot_area, form_area] =
        Layout::vertical([Constraint::Length(9), Constraint::Fill(1)]).areas(side_area);
    draw_pot(f, pot_area, app);
    draw_signup_form(f, form_area, app);
}

fn draw_roster(f: &mut Frame, area: Rect, app: &App) {
    let game = &app.state.game;
    let block = default_border(Color::White).title(format!(
        " Participants: {} sold / {} remaining ",
        game.squares_sold(),
        game.squares_remaining()
    ));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if game.participants.is_empty() {
        let msg = if app.state.connected {
            "No sign-ups yet. Press i to grab some squares."
        } else {
            "Waiting for the game store..."
        };
        f.render_widget(
            Paragraph::new(msg)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            inner,
        );
        return;
    }

    let cost = app.settings.square_cost;
    let name_w = inner.width.saturating_sub(20).max(8);
    let visible = inner.height as usize;
    let skip = app.state.selected_participant.saturating_sub(visible.saturating_sub(1));

    let lines: Vec<Line> = game
        .participants
        .iter()
        .enumerate()
        .skip(skip)
        .take(visible)
        .map(|(idx, p)| {
            let selected = idx == app.state.selected_participant && app.state.is_admin();
            let marker = if selected { ">" } else { " " };
            let style = if selected {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            Line::from(Span::styled(
                format!("{marker} {} {:>3} sq  ${:>4}", fit(&p.name, name_w), p.squares, p.squares.saturating_mul(cost)),
                style,
            ))
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_pot(f: &mut Frame, area: Rect, app: &App) {
    let game = &app.state.game;
    let block = default_border(Color::White).title(" Pot ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let status = if game.is_locked() {
        Span::styled("Board locked", Style::default().fg(Color::Red))
    } else if game.squares_remaining() == 0 {
        Span::styled("Board full, waiting to lock", Style::default().fg(Color::Yellow))
    } else {
        Span::styled("Sign-ups open", Style::default().fg(Color::Green))
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("${}", game.pot(app.settings.square_cost)),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(
                "  ({} / {TOTAL_SQUARES} squares at ${})",
                game.squares_sold(),
                app.settings.square_cost
            )),
        ]),
        Line::from(status),
        Line::from(""),
    ];
    for q in Quarter::ALL {
        lines.push(Line::from(format!(
            "{}  {:>2.0}%  ${}",
            q.label(),
            q.payout_pct() * 100.0,
            app.prize_for(q)
        )));
    }
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_signup_form(f: &mut Frame, area: Rect, app: &App) {
    let form = &app.state.signup;
    let block = default_border(if form.composing { Color::Yellow } else { Color::DarkGray })
        .title(" Sign Up ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    if !form.composing {
        let hint = if app.state.game.signup_open() {
            "Press i to sign up."
        } else {
            "Sign-ups are closed."
        };
        f.render_widget(
            Paragraph::new(hint).style(Style::default().fg(Color::DarkGray)),
            inner,
        );
        return;
    }

    let field_style = |field: SignupField| {
        if form.field == field {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        }
    };
    let cursor = |field: SignupField| if form.field == field { "_" } else { "" };

    let squares = form.squares_requested();
    let mut lines = vec![
        Line::from(vec![
            Span::raw("Name:    "),
            Span::styled(format!("{}{}", form.name, cursor(SignupField::Name)), field_style(SignupField::Name)),
        ]),
        Line::from(vec![
            Span::raw("Squares: "),
            Span::styled(
                format!("{}{}", form.squares, cursor(SignupField::Squares)),
                field_style(SignupField::Squares),
            ),
        ]),
        Line::from(format!("Total:   ${}", squares.saturating_mul(app.settings.square_cost))),
        Line::from(""),
    ];
    if let Some(err) = form.error.as_deref() {
        lines.push(Line::from(Span::styled(err, Style::default().fg(Color::Red))));
    }
    lines.push(Line::from(Span::styled(
        "Tab=switch field  Enter=submit  Esc=cancel",
        Style::default().fg(Color::DarkGray),
    )));
    f.render_widget(Paragraph::new(lines), inner);
}

// ---------------------------------------------------------------------------
// Board tab
// ---------------------------------------------------------------------------

fn draw_board(f: &mut Frame, area: Rect, app: &App) {
    let [score_area, content] =
        Layout::vertical([Constraint::Length(4), Constraint::Fill(1)]).areas(area);
    draw_scoreline(f, score_area, app);

    let [grid_area, winners_area] =
        Layout::horizontal([Constraint::Fill(1), Constraint::Length(38)]).areas(content);

    let game = &app.state.game;
    let block = default_border(Color::White).title(" Board ");
    let inner = block.inner(grid_area);
    f.render_widget(block, grid_area);
    let [grid_inner, _] =
        Layout::vertical([Constraint::Length(GRID_HEIGHT), Constraint::Fill(1)]).areas(inner);
    f.render_widget(
        SquaresGrid {
            board: game.board.as_ref(),
            awards: &game.awards,
            active: game.active_cell(),
            home_abbrev: &app.settings.teams.home.abbrev,
            away_abbrev: &app.settings.teams.away.abbrev,
        },
        grid_inner,
    );

    draw_winners(f, winners_area, app);
}

fn draw_scoreline(f: &mut Frame, area: Rect, app: &App) {
    let game = &app.state.game;
    let teams = &app.settings.teams;
    let block = default_border(Color::White).title(format!(" {} ", game.score.quarter_label()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = vec![Line::from(vec![
        Span::raw(format!("{} ", teams.away.name)),
        Span::styled(game.score.away.to_string(), bold),
        Span::raw("  -  "),
        Span::raw(format!("{} ", teams.home.name)),
        Span::styled(game.score.home.to_string(), bold),
    ])];

    let live = if game.live_mode {
        let tracked = app.state.tracked_game.as_deref().unwrap_or("waiting for first poll");
        let polled = app
            .state
            .last_polled_at
            .as_deref()
            .map(|at| format!("  (updated {at})"))
            .unwrap_or_default();
        Span::styled(format!("LIVE  {tracked}{polled}"), Style::default().fg(Color::Yellow))
    } else {
        Span::styled("Manual scoring", Style::default().fg(Color::DarkGray))
    };
    lines.push(Line::from(live));
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_winners(f: &mut Frame, area: Rect, app: &App) {
    let game = &app.state.game;
    let block = default_border(Color::White).title(" Winners ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines = Vec::new();
    for q in Quarter::ALL {
        let prize = app.prize_for(q);
        let target = app.state.is_admin() && q.number() == app.state.award_target;
        let marker = if target { ">" } else { " " };
        match game.awards.get(q) {
            Some(award) => {
                lines.push(Line::from(vec![
                    Span::raw(format!("{marker}{} ${prize}  ", q.label())),
                    Span::styled(
                        format!("{TROPHY} {}", award.winner),
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    ),
                ]));
                lines.push(Line::from(Span::styled(
                    format!("   {}", award.score),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            None => {
                lines.push(Line::from(format!("{marker}{} ${prize}  --", q.label())));
                lines.push(Line::from(""));
            }
        }
    }

    if app.state.is_admin() {
        lines.push(Line::from(""));
        for help in [
            "h/H home ±1   y/Y away ±1",
            "[ ] quarter   t pick award quarter",
            "A award       v live mode",
            "L lock        R reset",
        ] {
            lines.push(Line::from(Span::styled(help, Style::default().fg(Color::DarkGray))));
        }
    }
    f.render_widget(Paragraph::new(lines), inner);
}

// ---------------------------------------------------------------------------
// Help, logs, modals
// ---------------------------------------------------------------------------

fn draw_help(f: &mut Frame, area: Rect) {
    let block = default_border(Color::DarkGray).title(" Help ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = [
        ("1 / 2", "Sign Up / Board tabs"),
        ("i", "sign up for squares"),
        ("j / k", "move through participants"),
        ("a", "admin login"),
        ("x", "remove selected participant (admin)"),
        ("L / R", "lock board / reset game (admin)"),
        ("h H y Y", "home / away score up and down (admin)"),
        ("[ ]", "quarter back / forward (admin)"),
        ("t / A", "choose and award a quarter (admin)"),
        ("v", "toggle live scoring (admin)"),
        ("\"", "toggle log pane"),
        ("f", "full screen"),
        ("q", "quit"),
    ];
    let lines: Vec<Line> = rows
        .iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(format!("{key:>9}  "), Style::default().fg(Color::Yellow)),
                Span::raw(*what),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_logs(f: &mut Frame, area: Rect) {
    if area.height == 0 {
        return;
    }
    let logs = TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Logs "))
        .output_timestamp(Some("%H:%M:%S".to_string()))
        .output_target(false)
        .output_file(false)
        .output_line(false)
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Gray))
        .style_debug(Style::default().fg(Color::DarkGray));
    f.render_widget(logs, area);
}

fn draw_modal(f: &mut Frame, area: Rect, modal: &Modal) {
    let (title, color, lines): (String, Color, Vec<Line>) = match modal {
        Modal::AdminLogin { input, error } => {
            let mut lines = vec![
                Line::from("Admin password:"),
                Line::from(Span::styled(
                    format!("{}_", "*".repeat(input.chars().count())),
                    Style::default().fg(Color::Yellow),
                )),
            ];
            if let Some(err) = error {
                lines.push(Line::from(Span::styled(err.as_str(), Style::default().fg(Color::Red))));
            }
            lines.push(hint_line("Enter=login  Esc=cancel"));
            (" Admin ".to_string(), Color::Cyan, lines)
        }
        Modal::Confirm { message, .. } => (
            " Confirm ".to_string(),
            Color::Yellow,
            vec![Line::from(message.as_str()), Line::from(""), hint_line("Enter/y=confirm  Esc/n=cancel")],
        ),
        Modal::Notice { title, lines } => {
            let mut out: Vec<Line> = lines.iter().map(|l| Line::from(l.as_str())).collect();
            out.push(Line::from(""));
            out.push(hint_line("Enter=close"));
            (format!(" {title} "), Color::White, out)
        }
        Modal::Payment(notice) => {
            let mut lines = vec![
                Line::from(format!("You're in, {}!", notice.name)),
                Line::from(format!("{} squares: you owe ${}.", notice.squares, notice.amount)),
                Line::from(""),
            ];
            match notice.link.as_deref() {
                Some(link) => {
                    lines.push(Line::from("Pay with Venmo:"));
                    lines.push(Line::from(Span::styled(link, Style::default().fg(Color::Cyan))));
                }
                None => lines.push(Line::from("Pay the pool host directly.")),
            }
            lines.push(Line::from(""));
            lines.push(hint_line("Enter=close"));
            (" Payment ".to_string(), Color::Green, lines)
        }
    };

    let height = (lines.len() as u16 + 4).min(area.height);
    let popup = centered_rect(60, height, area);
    f.render_widget(Clear, popup);
    let block = default_border(color).title(title);
    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        popup,
    );
}

fn hint_line(text: &str) -> Line<'_> {
    Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)))
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(3), 1, 1, 1)
    };
    f.render_widget(spinner, area);
}
