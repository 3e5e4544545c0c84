//! Unread-notification counter over a realtime change feed.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::client::handle::{ChangeEvent, ClientHandle, QueryFilter, SubscriptionId};

const DEFAULT_TABLE: &str = "notifications";

/// Events worth re-counting for
const WATCHED_EVENTS: [ChangeEvent; 3] = [
    ChangeEvent::Insert,
    ChangeEvent::Update,
    ChangeEvent::Delete,
];

/// Publishes the current user's unread notification count.
///
/// [`start`](Self::start) runs one initial count query, then subscribes to
/// row changes and re-queries after each one. Observers read the latest
/// value from a `watch` channel, so bursts of change events collapse into
/// whatever the most recent count is. Without a signed-in user the counter
/// publishes 0 and subscribes to nothing.
pub struct NotificationCounter {
    client: ClientHandle,
    table: String,
    counts: Arc<watch::Sender<u64>>,
    state: Mutex<CounterState>,
}

#[derive(Default)]
struct CounterState {
    subscription: Option<SubscriptionId>,
    worker: Option<JoinHandle<()>>,
}

impl NotificationCounter {
    pub fn new(client: ClientHandle) -> Self {
        Self::with_table(client, DEFAULT_TABLE)
    }

    pub fn with_table(client: ClientHandle, table: impl Into<String>) -> Self {
        let (counts, _) = watch::channel(0);
        Self {
            client,
            table: table.into(),
            counts: Arc::new(counts),
            state: Mutex::new(CounterState::default()),
        }
    }

    /// Receiver for count updates. The current value is readable
    /// immediately; changes arrive as the counter re-queries.
    pub fn counts(&self) -> watch::Receiver<u64> {
        self.counts.subscribe()
    }

    /// Query the initial count and begin following change events.
    ///
    /// Calling `start` on a running counter is a no-op.
    pub async fn start(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.subscription.is_some() {
            debug!("notification counter already running");
            return Ok(());
        }

        let Some(user) = self.client.get_current_user().await? else {
            debug!("no signed-in user; publishing a zero count");
            self.counts.send_replace(0);
            return Ok(());
        };

        let count = fetch_unread_count(&self.client, &self.table, &user.id).await?;
        self.counts.send_replace(count);

        let (sink, mut events) = mpsc::unbounded_channel();
        let subscription = self
            .client
            .subscribe(&self.table, &WATCHED_EVENTS, sink)
            .await?;

        let client = self.client.clone();
        let table = self.table.clone();
        let user_id = user.id.clone();
        let counts = Arc::clone(&self.counts);
        let worker = tokio::spawn(async move {
            while events.recv().await.is_some() {
                match fetch_unread_count(&client, &table, &user_id).await {
                    Ok(count) => {
                        counts.send_replace(count);
                    }
                    Err(e) => {
                        warn!("unread count refresh failed: {}", e);
                    }
                }
            }
        });

        state.subscription = Some(subscription);
        state.worker = Some(worker);
        Ok(())
    }

    /// Unsubscribe and stop refreshing. The last published count stays
    /// readable. Calling `stop` on a stopped counter is a no-op.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;

        if let Some(subscription) = state.subscription.take() {
            if let Err(e) = self.client.unsubscribe(subscription).await {
                warn!("unsubscribe failed: {}", e);
            }
        }

        if let Some(worker) = state.worker.take() {
            worker.abort();
        }
    }
}

async fn fetch_unread_count(client: &ClientHandle, table: &str, user_id: &str) -> Result<u64> {
    let filter = QueryFilter::new().eq("user_id", user_id).eq("read", "false");
    let result = client.query(table, &filter).await?;
    Ok(result.count)
}
