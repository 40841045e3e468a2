use crate::state::network::LoadingState;
use crossterm::event::KeyEvent;
use nfl_api::Game;

#[derive(Debug, Clone)]
pub enum NetworkRequest {
    FetchLiveScore,
}

#[derive(Debug)]
pub enum NetworkResponse {
    LoadingStateChanged { loading_state: LoadingState },
    LiveScoreLoaded { games: Vec<Game> },
    Error { message: String },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
}
