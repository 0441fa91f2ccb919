//! Async driver that owns a `MarketView` on a single task.
//!
//! The task multiplexes the poll timer, user commands and fetch completions, so
//! every transition runs to completion before the next one starts. Fetches run on
//! their own tasks and report back through a channel that closes on teardown.

use common::{
    models::{AssetSnapshot, HistorySample, TimeRange},
    Error, FetchFailure, Result,
};
use connectors::MarketDataSource;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::view::{HistoryRequest, MarketView, PollTicket, ViewModel};

const COMMAND_BUFFER: usize = 32;

enum Command {
    Select {
        asset_id: String,
        reply: oneshot::Sender<Result<()>>,
    },
    SetRange {
        range: TimeRange,
        reply: oneshot::Sender<()>,
    },
    ToggleDisplay {
        asset_id: String,
        reply: oneshot::Sender<Result<bool>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

enum Completion {
    Poll(PollTicket, std::result::Result<Vec<AssetSnapshot>, FetchFailure>),
    History(HistoryRequest, std::result::Result<Vec<HistorySample>, FetchFailure>),
}

pub struct Synchronizer {
    source: Arc<dyn MarketDataSource>,
    config: SyncConfig,
}

impl Synchronizer {
    pub fn new(source: Arc<dyn MarketDataSource>, config: SyncConfig) -> Self {
        Self { source, config }
    }

    /// Start polling on a new task. The first poll is issued immediately.
    pub fn spawn(self) -> SyncHandle {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (view_tx, view_rx) = watch::channel(ViewModel::default());

        tokio::spawn(self.run(command_rx, view_tx));

        SyncHandle {
            commands: command_tx,
            view: view_rx,
        }
    }

    async fn run(self, mut commands: mpsc::Receiver<Command>, view_tx: watch::Sender<ViewModel>) {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        let mut view = MarketView::new(self.config.display_count);

        let mut ticker = interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Market synchronizer started (poll interval: {:?})",
            self.config.poll_interval
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let ticket = view.begin_poll();
                    self.spawn_poll(ticket, done_tx.clone());
                }
                command = commands.recv() => match command {
                    Some(command) => {
                        if self.handle_command(&mut view, command, &done_tx, &view_tx) {
                            continue;
                        }
                        break;
                    }
                    None => break,
                },
                Some(completion) = done_rx.recv() => match completion {
                    Completion::Poll(ticket, result) => {
                        if let Some(request) = view.apply_poll(ticket, result) {
                            self.spawn_history(request, done_tx.clone());
                        }
                    }
                    Completion::History(request, result) => {
                        view.apply_history(&request, result);
                    }
                },
            }

            view_tx.send_replace(view.view_model());
        }

        info!("Market synchronizer stopped");
    }

    /// Apply a user command. The new view is published before the caller is answered.
    ///
    /// Returns `false` once the synchronizer should stop.
    fn handle_command(
        &self,
        view: &mut MarketView,
        command: Command,
        done: &mpsc::UnboundedSender<Completion>,
        view_tx: &watch::Sender<ViewModel>,
    ) -> bool {
        match command {
            Command::Select { asset_id, reply } => {
                let result = view.select(&asset_id).map(|request| {
                    self.spawn_history(request, done.clone());
                });
                view_tx.send_replace(view.view_model());
                let _ = reply.send(result);
            }
            Command::SetRange { range, reply } => {
                if let Some(request) = view.set_range(range) {
                    self.spawn_history(request, done.clone());
                }
                view_tx.send_replace(view.view_model());
                let _ = reply.send(());
            }
            Command::ToggleDisplay { asset_id, reply } => {
                let result = view.toggle_display(&asset_id);
                view_tx.send_replace(view.view_model());
                let _ = reply.send(result);
            }
            Command::Shutdown { reply } => {
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    fn spawn_poll(&self, ticket: PollTicket, done: mpsc::UnboundedSender<Completion>) {
        let source = Arc::clone(&self.source);

        tokio::spawn(async move {
            let result = source.list_markets().await.map_err(|e| {
                warn!("Market listing poll failed: {}", e);
                FetchFailure::from(e)
            });
            // A closed channel means the view was torn down
            let _ = done.send(Completion::Poll(ticket, result));
        });
    }

    fn spawn_history(&self, request: HistoryRequest, done: mpsc::UnboundedSender<Completion>) {
        let source = Arc::clone(&self.source);

        debug!(
            "Requesting history for {} ({})",
            request.asset_id, request.range
        );

        tokio::spawn(async move {
            let result = source
                .price_history(&request.asset_id, request.range)
                .await
                .map_err(|e| {
                    warn!(
                        "History fetch for {} ({}) failed: {}",
                        request.asset_id, request.range, e
                    );
                    FetchFailure::from(e)
                });
            let _ = done.send(Completion::History(request, result));
        });
    }
}

/// Cloneable handle to a running synchronizer.
#[derive(Clone)]
pub struct SyncHandle {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<ViewModel>,
}

impl SyncHandle {
    /// Latest published view model
    pub fn view(&self) -> ViewModel {
        self.view.borrow().clone()
    }

    /// Receiver notified after every transition
    pub fn subscribe(&self) -> watch::Receiver<ViewModel> {
        self.view.clone()
    }

    pub fn filtered_assets(&self, term: &str) -> Vec<AssetSnapshot> {
        self.view.borrow().filtered_assets(term)
    }

    pub async fn select(&self, asset_id: impl Into<String>) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Select {
            asset_id: asset_id.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| stopped())?
    }

    pub async fn set_range(&self, range: TimeRange) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::SetRange { range, reply }).await?;
        rx.await.map_err(|_| stopped())
    }

    /// Returns whether the asset is displayed after the toggle
    pub async fn toggle_display(&self, asset_id: impl Into<String>) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::ToggleDisplay {
            asset_id: asset_id.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| stopped())?
    }

    /// Stop the poll timer and the synchronizer task. Stopping twice is a no-op.
    pub async fn shutdown(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        if self.commands.send(Command::Shutdown { reply }).await.is_err() {
            return Ok(());
        }
        let _ = rx.await;
        Ok(())
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).await.map_err(|_| stopped())
    }
}

fn stopped() -> Error {
    Error::InternalError("market synchronizer is not running".to_string())
}
