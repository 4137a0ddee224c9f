//! Sync channel - keeps the Board State Store fresh.
//!
//! One subscription to the backend's change broadcast covers all three
//! collections. Any event on any collection triggers exactly one
//! refetch-all followed by a wholesale `replace_all`; no incremental
//! deltas are ever applied. Events arriving in quick succession coalesce
//! behind a short debounce window, so a burst of writes costs one refetch.
//!
//! There is no reconnect or backoff logic: if the subscription closes,
//! updates stop until a new channel is started.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::backend::{Backend, ChangeEvent, Order};
use crate::store::BoardStore;

/// Debounce duration - wait this long after the last change event before
/// refetching.
const DEBOUNCE_MS: u64 = 100;

/// Refetch all three collections and replace the store's snapshot.
///
/// A collection that fails to load keeps its previous contents; nothing
/// is rolled back and no per-collection error state is surfaced.
pub async fn refresh(backend: &Arc<Mutex<Backend>>, store: &Arc<Mutex<BoardStore>>) {
    let (tickets, comments, messages) = {
        let backend = backend.lock().await;
        (
            backend.list_tickets(Order::Desc),
            backend.list_comments(Order::Asc, None),
            backend.list_messages(Order::Asc, None),
        )
    };

    let mut store = store.lock().await;
    let tickets = match tickets {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!("ticket refetch failed: {}", e);
            store.tickets().to_vec()
        }
    };
    let comments = match comments {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!("comment refetch failed: {}", e);
            store.comments().to_vec()
        }
    };
    let messages = match messages {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!("message refetch failed: {}", e);
            store.messages().to_vec()
        }
    };
    store.replace_all(tickets, comments, messages);
}

/// Handle to a running sync subscription.
///
/// Holds the single subscription for a session; tearing it down (via
/// [`SyncChannel::shutdown`] or drop) stops all future updates.
pub struct SyncChannel {
    task: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
}

impl SyncChannel {
    /// Subscribe to the backend's change broadcast and start the
    /// refetch loop. Performs one initial refresh before returning so
    /// the store starts from a loaded snapshot.
    pub async fn start(backend: Arc<Mutex<Backend>>, store: Arc<Mutex<BoardStore>>) -> Self {
        let rx = backend.lock().await.subscribe();
        refresh(&backend, &store).await;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_loop(backend, store, rx, shutdown_rx));
        Self { task, shutdown_tx }
    }

    /// Tear the subscription down deterministically.
    pub fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        self.task.abort();
    }
}

impl Drop for SyncChannel {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_loop(
    backend: Arc<Mutex<Backend>>,
    store: Arc<Mutex<BoardStore>>,
    mut rx: broadcast::Receiver<ChangeEvent>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    // Debounce state: track when we last saw a change event
    let mut pending_update = false;
    let mut last_event_time = Instant::now();

    loop {
        // If we have a pending update, wait with timeout for more events
        let timeout = if pending_update {
            let elapsed = last_event_time.elapsed();
            let debounce = Duration::from_millis(DEBOUNCE_MS);
            if elapsed >= debounce {
                Duration::ZERO
            } else {
                debounce - elapsed
            }
        } else {
            // No pending update, wait indefinitely for the next event
            Duration::from_secs(3600)
        };

        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(event) => {
                        tracing::debug!(collection = ?event.collection, op = ?event.op, "change event");
                        pending_update = true;
                        last_event_time = Instant::now();
                    }
                    // Dropped events still mean something changed
                    Err(broadcast::error::RecvError::Lagged(_)) => {
                        pending_update = true;
                        last_event_time = Instant::now();
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = shutdown_rx.changed() => break,
            _ = tokio::time::sleep(timeout), if pending_update => {
                // Debounce expired, refetch everything
                refresh(&backend, &store).await;
                pending_update = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewTicket;
    use crate::test_utils::TestEnv;

    fn new_ticket(id: &str) -> NewTicket {
        NewTicket {
            id: id.to_string(),
            title: format!("Ticket {}", id),
            description: String::new(),
            status: Default::default(),
            priority: Default::default(),
            assignee: String::new(),
            labels: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_start_performs_initial_load() {
        let env = TestEnv::new();
        let backend = env.open_backend();
        backend.insert_ticket(&new_ticket("TASK-001")).unwrap();

        let backend = Arc::new(Mutex::new(backend));
        let store = Arc::new(Mutex::new(BoardStore::new()));
        let sync = SyncChannel::start(backend, store.clone()).await;

        assert_eq!(store.lock().await.tickets().len(), 1);
        sync.shutdown();
    }

    #[tokio::test]
    async fn test_change_event_triggers_refetch() {
        let env = TestEnv::new();
        let backend = Arc::new(Mutex::new(env.open_backend()));
        let store = Arc::new(Mutex::new(BoardStore::new()));
        let sync = SyncChannel::start(backend.clone(), store.clone()).await;

        backend
            .lock()
            .await
            .insert_ticket(&new_ticket("TASK-001"))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(DEBOUNCE_MS * 4)).await;
        assert_eq!(store.lock().await.tickets().len(), 1);
        sync.shutdown();
    }

    #[tokio::test]
    async fn test_rapid_events_coalesce() {
        let env = TestEnv::new();
        let backend = Arc::new(Mutex::new(env.open_backend()));
        let store = Arc::new(Mutex::new(BoardStore::new()));
        let sync = SyncChannel::start(backend.clone(), store.clone()).await;

        {
            let backend = backend.lock().await;
            backend.insert_ticket(&new_ticket("TASK-001")).unwrap();
            backend.insert_ticket(&new_ticket("TASK-002")).unwrap();
            backend.insert_ticket(&new_ticket("TASK-003")).unwrap();
        }

        tokio::time::sleep(Duration::from_millis(DEBOUNCE_MS * 4)).await;
        let store = store.lock().await;
        assert_eq!(store.tickets().len(), 3);
        sync.shutdown();
    }

    #[tokio::test]
    async fn test_shutdown_stops_updates() {
        let env = TestEnv::new();
        let backend = Arc::new(Mutex::new(env.open_backend()));
        let store = Arc::new(Mutex::new(BoardStore::new()));
        let sync = SyncChannel::start(backend.clone(), store.clone()).await;
        sync.shutdown();

        backend
            .lock()
            .await
            .insert_ticket(&new_ticket("TASK-001"))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(DEBOUNCE_MS * 4)).await;
        assert!(store.lock().await.tickets().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_orders_tickets_by_recency() {
        let env = TestEnv::new();
        let backend = Arc::new(Mutex::new(env.open_backend()));
        let store = Arc::new(Mutex::new(BoardStore::new()));

        {
            let backend = backend.lock().await;
            backend.insert_ticket(&new_ticket("TASK-001")).unwrap();
            backend.insert_ticket(&new_ticket("TASK-002")).unwrap();
            backend.touch_ticket("TASK-001").unwrap();
        }

        refresh(&backend, &store).await;
        let store = store.lock().await;
        assert_eq!(store.tickets()[0].id, "TASK-001");
    }
}
