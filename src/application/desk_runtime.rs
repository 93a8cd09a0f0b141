//! Runs each pharmacy's [`Desk`] in its own task.
//!
//! The task owns the desk outright and handles one event at a time: commands
//! from [`DeskClient`]s, snapshots from the store's pending feed, and the
//! one-second countdown tick. Nothing else ever touches the desk, so there is
//! no lock around the session.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use uuid::Uuid;

use super::alert::AlertController;
use super::desk::{Decision, DecisionOutcome, Desk, DeskError, SessionView};
use super::session::DEFAULT_COUNTDOWN_SECS;
use crate::domain::errors::DomainError;
use crate::domain::order::Order;
use crate::domain::ports::{AlertSound, OrderStore, PendingFeed, PharmacyDirectory};

const COMMAND_BUFFER: usize = 32;

pub type Response<T> = oneshot::Sender<T>;

#[derive(Debug)]
enum DeskCommand {
    Session {
        respond_to: Response<Option<SessionView>>,
    },
    Pending {
        respond_to: Response<Vec<Order>>,
    },
    Decide {
        order_id: Uuid,
        decision: Decision,
        respond_to: Response<Result<DecisionOutcome, DeskError>>,
    },
    Dismiss {
        respond_to: Response<Result<Uuid, DeskError>>,
    },
}

#[derive(Debug, Clone)]
pub struct DeskSettings {
    pub countdown_secs: u32,
    pub tick: Duration,
    pub alert_source: String,
}

impl Default for DeskSettings {
    fn default() -> Self {
        Self {
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            tick: Duration::from_secs(1),
            alert_source: crate::config::DEFAULT_ALERT_SOUND_URL.to_string(),
        }
    }
}

/// Cloneable handle to a running desk.
#[derive(Debug, Clone)]
pub struct DeskClient {
    sender: mpsc::Sender<DeskCommand>,
}

impl DeskClient {
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    pub async fn session(&self) -> Result<Option<SessionView>, DeskError> {
        self.request(|respond_to| DeskCommand::Session { respond_to })
            .await
    }

    pub async fn pending(&self) -> Result<Vec<Order>, DeskError> {
        self.request(|respond_to| DeskCommand::Pending { respond_to })
            .await
    }

    pub async fn accept(&self, order_id: Uuid) -> Result<DecisionOutcome, DeskError> {
        self.decide(order_id, Decision::Accept).await
    }

    pub async fn reject(&self, order_id: Uuid) -> Result<DecisionOutcome, DeskError> {
        self.decide(order_id, Decision::Reject).await
    }

    pub async fn decide(
        &self,
        order_id: Uuid,
        decision: Decision,
    ) -> Result<DecisionOutcome, DeskError> {
        self.request(|respond_to| DeskCommand::Decide {
            order_id,
            decision,
            respond_to,
        })
        .await?
    }

    pub async fn dismiss(&self) -> Result<Uuid, DeskError> {
        self.request(|respond_to| DeskCommand::Dismiss { respond_to })
            .await?
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Response<T>) -> DeskCommand,
    ) -> Result<T, DeskError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(command(respond_to))
            .await
            .map_err(|_| DeskError::Closed)?;
        response.await.map_err(|_| DeskError::Dropped)
    }
}

/// Starts `desk` on its own task. The task ends once every client is dropped.
pub fn spawn_desk(desk: Desk, feed: PendingFeed, tick: Duration) -> (DeskClient, JoinHandle<()>) {
    let (sender, receiver) = mpsc::channel(COMMAND_BUFFER);
    let handle = tokio::spawn(run(desk, receiver, feed, tick));
    (DeskClient { sender }, handle)
}

async fn run(
    mut desk: Desk,
    mut commands: mpsc::Receiver<DeskCommand>,
    feed: PendingFeed,
    tick: Duration,
) {
    let pharmacy_id = desk.pharmacy_id();
    info!("Desk started for pharmacy {}", pharmacy_id);

    let mut feed = Some(feed);
    let mut ticker = time::interval_at(Instant::now() + tick, tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let opened_before = desk.sessions_opened();
        // Store updates and ticks go first so replies reflect the latest state.
        tokio::select! {
            biased;
            snapshot = next_snapshot(&mut feed), if feed.is_some() => match snapshot {
                Some(snapshot) => desk.on_snapshot(snapshot),
                None => {
                    warn!("Pending feed for pharmacy {} closed, queue is frozen", pharmacy_id);
                    feed = None;
                }
            },
            _ = ticker.tick() => desk.on_tick(),
            command = commands.recv() => match command {
                Some(command) => handle(&mut desk, command).await,
                None => break,
            },
        }
        // A fresh session gets a full tick before its first decrement.
        if desk.sessions_opened() != opened_before {
            ticker.reset();
        }
    }

    desk.shutdown();
    info!("Desk stopped for pharmacy {}", pharmacy_id);
}

async fn next_snapshot(feed: &mut Option<PendingFeed>) -> Option<Result<Vec<Order>, DomainError>> {
    match feed {
        Some(feed) => feed.recv().await,
        None => std::future::pending().await,
    }
}

async fn handle(desk: &mut Desk, command: DeskCommand) {
    match command {
        DeskCommand::Session { respond_to } => {
            let _ = respond_to.send(desk.session());
        }
        DeskCommand::Pending { respond_to } => {
            let _ = respond_to.send(desk.pending());
        }
        DeskCommand::Decide {
            order_id,
            decision,
            respond_to,
        } => {
            let result = desk.decide(order_id, decision).await;
            let _ = respond_to.send(result);
        }
        DeskCommand::Dismiss { respond_to } => {
            let _ = respond_to.send(desk.dismiss());
        }
    }
}

/// Hands out one desk per pharmacy, starting it on first use.
#[derive(Clone)]
pub struct DeskRegistry {
    store: Arc<dyn OrderStore>,
    directory: Arc<dyn PharmacyDirectory>,
    alert: AlertController,
    settings: DeskSettings,
    desks: Arc<Mutex<HashMap<Uuid, DeskClient>>>,
}

impl DeskRegistry {
    pub fn new(
        store: Arc<dyn OrderStore>,
        directory: Arc<dyn PharmacyDirectory>,
        sound: Arc<dyn AlertSound>,
        settings: DeskSettings,
    ) -> Self {
        let alert = AlertController::new(sound, settings.alert_source.clone());
        Self {
            store,
            directory,
            alert,
            settings,
            desks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The pharmacy's desk, started on first use. Unknown pharmacies get
    /// `DomainError::NotFound` and no task. Must be called from within a
    /// tokio runtime.
    pub async fn desk(&self, pharmacy_id: Uuid) -> Result<DeskClient, DomainError> {
        if let Some(client) = self.running_desk(pharmacy_id) {
            return Ok(client);
        }
        if self.directory.find(pharmacy_id).await?.is_none() {
            return Err(DomainError::NotFound(format!("pharmacy {}", pharmacy_id)));
        }
        Ok(self.start(pharmacy_id))
    }

    fn running_desk(&self, pharmacy_id: Uuid) -> Option<DeskClient> {
        self.desks
            .lock()
            .get(&pharmacy_id)
            .filter(|c| !c.is_closed())
            .cloned()
    }

    fn start(&self, pharmacy_id: Uuid) -> DeskClient {
        let mut desks = self.desks.lock();
        // Another caller may have started it while the directory was queried.
        if let Some(client) = desks.get(&pharmacy_id) {
            if !client.is_closed() {
                return client.clone();
            }
            warn!("Desk for pharmacy {} had stopped, restarting", pharmacy_id);
        }
        let desk = Desk::new(
            pharmacy_id,
            self.store.clone(),
            self.alert.clone(),
            self.settings.countdown_secs,
        );
        let feed = self.store.watch_pending(pharmacy_id);
        let (client, _handle) = spawn_desk(desk, feed, self.settings.tick);
        desks.insert(pharmacy_id, client.clone());
        client
    }

    pub fn running(&self) -> usize {
        self.desks.lock().values().filter(|c| !c.is_closed()).count()
    }

    /// Drops every cached client so idle desks wind down.
    pub fn shutdown(&self) {
        self.desks.lock().clear();
    }
}
