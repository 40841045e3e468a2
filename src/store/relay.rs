//! WebSocket relay that owns the shared game document.

use super::{RelayMessage, StoreError, StoreOp, apply_op};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, broadcast};
use tokio_tungstenite::{accept_async, tungstenite::Message};

/// The canonical document plus the fan-out channel for snapshots.
pub struct DocumentStore {
    doc: Mutex<Value>,
    snapshots: broadcast::Sender<String>,
    persist_path: Option<PathBuf>,
    /// Held across each file save so saves land in the order ops were applied.
    persist: Mutex<()>,
}

impl DocumentStore {
    pub fn new(initial: Value, persist_path: Option<PathBuf>) -> Self {
        let (snapshots, _rx) = broadcast::channel::<String>(512);
        Self { doc: Mutex::new(initial), snapshots, persist_path, persist: Mutex::new(()) }
    }

    /// Start from the persisted document if there is one.
    pub fn load(persist_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let initial = match &persist_path {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(path)?;
                serde_json::from_str(&content)?
            }
            _ => Value::Null,
        };
        Ok(Self::new(initial, persist_path))
    }

    pub async fn document(&self) -> Value {
        self.doc.lock().await.clone()
    }

    /// Current snapshot plus a receiver for every later one, taken atomically so no
    /// change falls between them.
    async fn subscribe(&self) -> Result<(String, broadcast::Receiver<String>), StoreError> {
        let doc = self.doc.lock().await;
        let rx = self.snapshots.subscribe();
        Ok((snapshot_text(&doc)?, rx))
    }

    /// Apply an op and broadcast the resulting document to every subscriber.
    pub async fn apply(&self, op: StoreOp) -> Result<(), StoreError> {
        let mut doc = self.doc.lock().await;
        apply_op(&mut doc, op)?;
        let text = snapshot_text(&doc)?;
        let saved = match &self.persist_path {
            Some(path) => Some((path, serde_json::to_string_pretty(&*doc)?)),
            None => None,
        };
        let _ = self.snapshots.send(text);

        // The file is written after the document lock is released.
        let _save_order = self.persist.lock().await;
        drop(doc);
        if let Some((path, content)) = saved
            && let Err(e) = tokio::fs::write(path, content).await
        {
            eprintln!("failed to persist document to {}: {e}", path.display());
        }
        Ok(())
    }
}

fn snapshot_text(doc: &Value) -> Result<String, StoreError> {
    let message = RelayMessage::Snapshot { doc: doc.clone() };
    Ok(serde_json::to_string(&message)?)
}

/// Accept clients until the listener fails.
pub async fn serve(listener: TcpListener, store: Arc<DocumentStore>) -> anyhow::Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let store = store.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_client(stream, store).await {
                eprintln!("client {peer} disconnected: {e}");
            }
        });
    }
}

async fn handle_client(stream: TcpStream, store: Arc<DocumentStore>) -> anyhow::Result<()> {
    let ws = accept_async(stream).await?;
    let (mut write, mut read) = ws.split();

    let (initial, mut rx) = store.subscribe().await?;
    write.send(Message::Text(initial.into())).await?;

    loop {
        tokio::select! {
            inbound = read.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        let result = match serde_json::from_str::<StoreOp>(&text) {
                            Ok(op) => store.apply(op).await.map_err(|e| e.to_string()),
                            Err(e) => Err(format!("invalid store op: {e}")),
                        };
                        if let Err(message) = result {
                            let reply = serde_json::to_string(&RelayMessage::Error { message })?;
                            write.send(Message::Text(reply.into())).await?;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                }
            }
            outbound = rx.recv() => {
                match outbound {
                    Ok(text) => {
                        write.send(Message::Text(text.into())).await?;
                    }
                    // A lagging client only needs the newest document.
                    Err(broadcast::error::RecvError::Lagged(_)) => {
                        let latest = snapshot_text(&store.document().await)?;
                        write.send(Message::Text(latest.into())).await?;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tokio::net::TcpStream;
    use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    async fn start_relay(initial: Value) -> (String, Arc<DocumentStore>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let store = Arc::new(DocumentStore::new(initial, None));
        tokio::spawn(serve(listener, store.clone()));
        (format!("ws://{addr}"), store)
    }

    async fn next_message(client: &mut Client) -> RelayMessage {
        let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("relay should answer")
            .expect("stream open")
            .expect("frame ok");
        match frame {
            Message::Text(text) => serde_json::from_str(&text).unwrap(),
            other => panic!("unexpected frame {other:?}"),
        }
    }

    async fn send_op(client: &mut Client, op: &StoreOp) {
        let text = serde_json::to_string(op).unwrap();
        client.send(Message::Text(text.into())).await.unwrap();
    }

    #[tokio::test]
    async fn test_new_client_receives_current_document() {
        let (url, _store) = start_relay(json!({ "liveMode": true })).await;
        let (mut client, _) = connect_async(url.as_str()).await.unwrap();
        assert_eq!(
            next_message(&mut client).await,
            RelayMessage::Snapshot { doc: json!({ "liveMode": true }) }
        );
    }

    #[tokio::test]
    async fn test_writes_are_broadcast_to_every_client_including_the_writer() {
        let (url, store) = start_relay(Value::Null).await;
        let (mut writer, _) = connect_async(url.as_str()).await.unwrap();
        let (mut reader, _) = connect_async(url.as_str()).await.unwrap();
        next_message(&mut writer).await;
        next_message(&mut reader).await;

        send_op(&mut writer, &StoreOp::score_field("home", 7).unwrap()).await;

        let expected = RelayMessage::Snapshot { doc: json!({ "score": { "home": 7 } }) };
        assert_eq!(next_message(&mut writer).await, expected);
        assert_eq!(next_message(&mut reader).await, expected);
        assert_eq!(store.document().await, json!({ "score": { "home": 7 } }));
    }

    #[tokio::test]
    async fn test_invalid_op_is_reported_to_sender_only() {
        let (url, store) = start_relay(json!({ "liveMode": false })).await;
        let (mut client, _) = connect_async(url.as_str()).await.unwrap();
        next_message(&mut client).await;

        client.send(Message::Text(r#"{"op":"explode"}"#.to_string().into())).await.unwrap();
        assert!(matches!(next_message(&mut client).await, RelayMessage::Error { .. }));

        send_op(&mut client, &StoreOp::Set { path: "/".into(), value: json!(1) }).await;
        assert!(matches!(next_message(&mut client).await, RelayMessage::Error { .. }));
        assert_eq!(store.document().await, json!({ "liveMode": false }));
    }

    #[tokio::test]
    async fn test_applied_document_is_persisted() {
        let path = std::env::temp_dir().join(format!("sbsquares-relay-{}.json", std::process::id()));
        let store = DocumentStore::new(Value::Null, Some(path.clone()));
        store.apply(StoreOp::live_mode(true).unwrap()).await.unwrap();

        let reloaded = DocumentStore::load(Some(path.clone())).unwrap();
        assert_eq!(reloaded.document().await, json!({ "liveMode": true }));
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_concurrent_writes_persist_the_last_applied_document() {
        let path = std::env::temp_dir().join(format!("sbsquares-relay-order-{}.json", std::process::id()));
        let store = Arc::new(DocumentStore::new(Value::Null, Some(path.clone())));

        let writes = (0..20u32).map(|home| {
            let store = store.clone();
            tokio::spawn(async move { store.apply(StoreOp::score_field("home", home).unwrap()).await })
        });
        for write in futures_util::future::join_all(writes).await {
            write.unwrap().unwrap();
        }

        let reloaded = DocumentStore::load(Some(path.clone())).unwrap();
        assert_eq!(reloaded.document().await, store.document().await);
        let _ = std::fs::remove_file(path);
    }
}
