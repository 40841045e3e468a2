mod app;
mod components;
mod draw;
mod keys;
mod state;
mod ui;

use crate::app::App;
use crate::state::messages::{NetworkRequest, NetworkResponse, UiEvent};
use crate::state::network::{LoadingState, NetworkWorker};
use crate::state::refresher::LivePoller;
use crate::state::sync::{StoreEvent, StoreWorker};
use crossterm::event::{self as crossterm_event, Event};
use crossterm::{cursor, execute, terminal};
use log::{error, info};
use sbsquares::store::StoreOp;
use std::io::Stdout;
use std::sync::Arc;
use std::{io, panic};
use tokio::sync::{Mutex, mpsc};
use tui::{Terminal, backend::CrosstermBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if handle_cli_args() {
        return Ok(());
    }

    better_panic::install();

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;

    setup_panic_hook();
    setup_terminal();

    tui_logger::init_logger(log::LevelFilter::Trace)?;
    tui_logger::set_default_level(log::LevelFilter::Info);

    let app = App::new();
    let store_url = app.settings.store_url.clone();
    let poll_interval = app.settings.poll_interval;
    info!("sbsquares {} starting", env!("CARGO_PKG_VERSION"));
    let app = Arc::new(Mutex::new(app));

    let (ui_event_tx, ui_event_rx) = mpsc::channel::<UiEvent>(100);
    let (network_req_tx, network_req_rx) = mpsc::channel::<NetworkRequest>(100);
    let (network_resp_tx, network_resp_rx) = mpsc::channel::<NetworkResponse>(100);
    let (store_op_tx, store_op_rx) = mpsc::channel::<StoreOp>(100);
    let (store_evt_tx, store_evt_rx) = mpsc::channel::<StoreEvent>(100);

    // Input handler thread
    let input_handler = tokio::spawn(input_handler_task(ui_event_tx));

    // Network thread
    let network_worker = NetworkWorker::new(network_req_rx, network_resp_tx);
    let network_task = tokio::spawn(network_worker.run());

    // Store sync thread
    let store_worker = StoreWorker {
        url: store_url,
        ops: store_op_rx,
        events: store_evt_tx,
    };
    let store_task = tokio::spawn(store_worker.run());

    // Live score polling, started and stopped from the UI loop
    let poller = LivePoller::new(network_req_tx, poll_interval);

    main_ui_loop(
        terminal,
        app,
        poller,
        ui_event_rx,
        network_resp_rx,
        store_op_tx,
        store_evt_rx,
    )
    .await;

    input_handler.abort();
    network_task.abort();
    store_task.abort();

    Ok(())
}

fn handle_cli_args() -> bool {
    let mut args = std::env::args().skip(1);
    let Some(arg) = args.next() else {
        return false;
    };

    match arg.as_str() {
        "-h" | "--help" => {
            println!("{}", usage_text());
            true
        }
        "-V" | "--version" => {
            println!("sbsquares {}", env!("CARGO_PKG_VERSION"));
            true
        }
        _ => {
            eprintln!("Unknown argument: {arg}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }
}

fn usage_text() -> &'static str {
    "sbsquares - Super Bowl squares pool in your terminal

Usage:
  sbsquares
  sbsquares --help
  sbsquares --version

Environment:
  SBSQ_STORE_WS        WebSocket store relay URL (default ws://127.0.0.1:8788)
  SBSQ_ADMIN_PASSWORD  Shared admin password
  SBSQ_HOME_TEAM       Home team name (default Patriots)
  SBSQ_HOME_ABBREV     Home team abbreviation (default NE)
  SBSQ_AWAY_TEAM       Away team name (default Seahawks)
  SBSQ_AWAY_ABBREV     Away team abbreviation (default SEA)
  SBSQ_SQUARE_COST     Dollars per square (default 5)
  SBSQ_VENMO_USER      Venmo handle for the payment link
  SBSQ_POLL_SECS       Live score poll interval in seconds (default 30)
  SBSQ_LOG             error, warn, info, debug or trace"
}

async fn main_ui_loop(
    mut terminal: Terminal<CrosstermBackend<Stdout>>,
    app: Arc<Mutex<App>>,
    mut poller: LivePoller,
    mut ui_events: mpsc::Receiver<UiEvent>,
    mut network_responses: mpsc::Receiver<NetworkResponse>,
    store_ops: mpsc::Sender<StoreOp>,
    mut store_events: mpsc::Receiver<StoreEvent>,
) {
    let mut loading = LoadingState::default();

    {
        let mut app_guard = app.lock().await;
        draw::draw(&mut terminal, &mut app_guard, loading);
    }

    loop {
        let should_redraw = tokio::select! {
            Some(ui_event) = ui_events.recv() => {
                handle_ui_event(ui_event, &app, &store_ops).await
            }

            Some(response) = network_responses.recv() => {
                handle_network_response(response, &app, &store_ops, &mut loading).await
            }

            Some(store_event) = store_events.recv() => {
                handle_store_event(store_event, &app).await
            }

            else => break,
        };

        let mut app_guard = app.lock().await;
        poller.sync(app_guard.should_poll());
        if should_redraw {
            draw::draw(&mut terminal, &mut app_guard, loading);
        }
    }
}

async fn handle_ui_event(
    ui_event: UiEvent,
    app: &Arc<Mutex<App>>,
    store_ops: &mpsc::Sender<StoreOp>,
) -> bool {
    match ui_event {
        UiEvent::KeyPressed(key_event) => {
            keys::handle_key_bindings(key_event, app, store_ops).await;
            true
        }
        UiEvent::Resize => true,
    }
}

async fn handle_store_event(event: StoreEvent, app: &Arc<Mutex<App>>) -> bool {
    let mut guard = app.lock().await;
    match event {
        StoreEvent::Connected => guard.on_store_connected(),
        StoreEvent::Disconnected => guard.on_store_disconnected(),
        StoreEvent::Snapshot(game) => guard.on_snapshot(*game),
        StoreEvent::Error(message) => guard.on_store_error(message),
    }
    true
}

async fn handle_network_response(
    response: NetworkResponse,
    app: &Arc<Mutex<App>>,
    store_ops: &mpsc::Sender<StoreOp>,
    loading: &mut LoadingState,
) -> bool {
    match response {
        NetworkResponse::LoadingStateChanged { loading_state } => {
            *loading = loading_state;
            return true;
        }
        NetworkResponse::LiveScoreLoaded { games } => {
            let mut guard = app.lock().await;
            let ops = guard.on_live_scoreboard(games);
            drop(guard);
            for op in ops {
                if store_ops.send(op).await.is_err() {
                    error!("store worker is gone; dropping live score write");
                    break;
                }
            }
        }
        NetworkResponse::Error { message } => {
            let mut guard = app.lock().await;
            guard.on_feed_error(message);
        }
    }
    !loading.is_loading
}

async fn input_handler_task(ui_events: mpsc::Sender<UiEvent>) {
    loop {
        if let Ok(event) = crossterm_event::read() {
            let ui_event = match event {
                Event::Key(key_event) => Some(UiEvent::KeyPressed(key_event)),
                Event::Resize(_, _) => Some(UiEvent::Resize),
                _ => None,
            };

            if let Some(ui_event) = ui_event
                && ui_events.send(ui_event).await.is_err()
            {
                break;
            }
        }
    }
}

fn setup_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(
        stdout,
        cursor::Hide,
        terminal::EnterAlternateScreen,
        terminal::Clear(terminal::ClearType::All)
    );
    if let Err(e) = terminal::enable_raw_mode() {
        eprintln!("failed to enable raw mode: {e}");
    }
}

pub fn cleanup_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(
        stdout,
        cursor::MoveTo(0, 0),
        terminal::Clear(terminal::ClearType::All),
        terminal::LeaveAlternateScreen,
        cursor::Show
    );
    let _ = terminal::disable_raw_mode();
}

fn setup_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        cleanup_terminal();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));
}
