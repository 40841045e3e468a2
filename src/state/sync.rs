use futures_util::{SinkExt, StreamExt};
use log::{debug, warn};
use sbsquares::squares::GameState;
use sbsquares::store::{RelayMessage, StoreOp};
use tokio::sync::mpsc;
use tokio::time::{Duration, sleep};
use tokio_tungstenite::{connect_async, tungstenite::Message};

const RECONNECT_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub enum StoreEvent {
    Connected,
    Disconnected,
    Snapshot(Box<GameState>),
    Error(String),
}

/// Keeps one connection to the store relay open: forwards local writes, delivers
/// every snapshot, and queues writes made while the relay is unreachable.
#[derive(Debug)]
pub struct StoreWorker {
    pub url: String,
    pub ops: mpsc::Receiver<StoreOp>,
    pub events: mpsc::Sender<StoreEvent>,
}

impl StoreWorker {
    pub async fn run(mut self) {
        let mut pending: Vec<StoreOp> = Vec::new();
        loop {
            match connect_async(self.url.as_str()).await {
                Ok((stream, _)) => {
                    let _ = self.events.send(StoreEvent::Connected).await;
                    let (mut write, mut read) = stream.split();

                    let mut flushed = true;
                    while !pending.is_empty() {
                        let op = pending.remove(0);
                        if let Err(e) = send_op(&mut write, &op).await {
                            pending.insert(0, op);
                            let _ = self.events.send(StoreEvent::Error(format!("store write failed: {e}"))).await;
                            flushed = false;
                            break;
                        }
                    }

                    while flushed {
                        tokio::select! {
                            maybe_op = self.ops.recv() => {
                                let Some(op) = maybe_op else {
                                    return;
                                };
                                if let Err(e) = send_op(&mut write, &op).await {
                                    pending.push(op);
                                    let _ = self.events.send(StoreEvent::Error(format!("store write failed: {e}"))).await;
                                    break;
                                }
                            }
                            inbound = read.next() => {
                                match inbound {
                                    Some(Ok(Message::Text(text))) => {
                                        if let Some(event) = decode_relay_message(&text) {
                                            let _ = self.events.send(event).await;
                                        }
                                    }
                                    Some(Ok(Message::Close(_))) | None => break,
                                    Some(Ok(_)) => {}
                                    Some(Err(e)) => {
                                        let _ = self.events.send(StoreEvent::Error(format!("store read failed: {e}"))).await;
                                        break;
                                    }
                                }
                            }
                        }
                    }
                    let _ = self.events.send(StoreEvent::Disconnected).await;
                }
                Err(e) => {
                    debug!("store connect to {} failed: {e}", self.url);
                    let _ = self.events.send(StoreEvent::Disconnected).await;
                }
            }

            loop {
                match self.ops.try_recv() {
                    Ok(op) => pending.push(op),
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => return,
                }
            }
            sleep(RECONNECT_DELAY).await;
        }
    }
}

fn decode_relay_message(text: &str) -> Option<StoreEvent> {
    match serde_json::from_str::<RelayMessage>(text) {
        Ok(RelayMessage::Snapshot { doc }) => match GameState::from_document(&doc) {
            Ok(state) => Some(StoreEvent::Snapshot(Box::new(state))),
            Err(e) => {
                warn!("ignoring undecodable game document: {e}");
                Some(StoreEvent::Error(format!("bad game document: {e}")))
            }
        },
        Ok(RelayMessage::Error { message }) => Some(StoreEvent::Error(message)),
        Err(e) => {
            warn!("ignoring unknown relay frame: {e}");
            None
        }
    }
}

async fn send_op<S>(write: &mut S, op: &StoreOp) -> Result<(), String>
where
    S: futures_util::sink::Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let text = serde_json::to_string(op).map_err(|e| e.to_string())?;
    write
        .send(Message::Text(text.into()))
        .await
        .map_err(|e| e.to_string())
}
