use crate::state::messages::NetworkRequest;
use log::{debug, info};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::interval;

/// Live-score poll timer. At most one is running; it is started and stopped from
/// the UI loop as the admin and live-mode flags change.
pub struct LivePoller {
    network_requests: mpsc::Sender<NetworkRequest>,
    period: Duration,
    task: Option<JoinHandle<()>>,
}

impl LivePoller {
    pub fn new(network_requests: mpsc::Sender<NetworkRequest>, period: Duration) -> Self {
        Self { network_requests, period, task: None }
    }

    /// Start the timer if `should_run` and it is not running, stop it if it is and
    /// `!should_run`. Calling it again with the same flag does nothing.
    pub fn sync(&mut self, should_run: bool) {
        match (should_run, self.is_running()) {
            (true, false) => self.start(),
            (false, true) => self.stop(),
            _ => {}
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    fn start(&mut self) {
        info!("live score polling every {}s", self.period.as_secs());
        let requests = self.network_requests.clone();
        let period = self.period;
        self.task = Some(tokio::spawn(async move {
            let mut ticks = interval(period);
            // The first tick fires immediately; polling begins one period in.
            ticks.tick().await;

            loop {
                ticks.tick().await;
                debug!("live poll tick");
                if requests.send(NetworkRequest::FetchLiveScore).await.is_err() {
                    break;
                }
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            info!("live score polling stopped");
            task.abort();
        }
    }
}

impl Drop for LivePoller {
    fn drop(&mut self) {
        self.stop();
    }
}
