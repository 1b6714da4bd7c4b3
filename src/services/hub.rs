//! Per-user fan-out of "alerts updated" events.
//!
//! Each subscriber owns a bounded queue. Publishing never waits: when a
//! subscriber's queue is full the event is dropped for that subscriber only.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};

pub const ALERTS_UPDATED: &str = "alertsUpdated";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

impl HubEvent {
    /// Generic signal; receivers re-read their alerts on receipt.
    pub fn alerts_updated() -> Self {
        Self {
            kind: ALERTS_UPDATED.to_string(),
            message: "Alerts updated".to_string(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Identifies one registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    pub user_id: String,
    pub id: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    pub dropped: usize,
}

type Subscribers = HashMap<String, HashMap<u64, mpsc::Sender<HubEvent>>>;

#[derive(Debug)]
struct HubInner {
    subscribers: Mutex<Subscribers>,
    next_id: AtomicU64,
    capacity: usize,
}

impl HubInner {
    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, handle: &SubscriptionHandle) -> bool {
        let mut subs = self.lock();
        let Some(set) = subs.get_mut(&handle.user_id) else {
            return false;
        };
        let removed = set.remove(&handle.id).is_some();
        if set.is_empty() {
            subs.remove(&handle.user_id);
        }
        removed
    }
}

#[derive(Debug, Clone)]
pub struct NotificationHub {
    inner: Arc<HubInner>,
}

impl NotificationHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                subscribers: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                capacity: capacity.max(1),
            }),
        }
    }

    pub fn subscribe(&self, user_id: &str) -> Subscription {
        let (tx, rx) = mpsc::channel(self.inner.capacity);
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        self.inner
            .lock()
            .entry(user_id.to_string())
            .or_default()
            .insert(id, tx);

        tracing::debug!(user = %user_id, id, "subscriber added");

        Subscription {
            handle: SubscriptionHandle {
                user_id: user_id.to_string(),
                id,
            },
            rx,
            hub: Arc::clone(&self.inner),
        }
    }

    /// Removes the registration and closes its queue. Returns false when
    /// the handle was already gone.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) -> bool {
        let removed = self.inner.remove(handle);
        if removed {
            tracing::debug!(user = %handle.user_id, id = handle.id, "subscriber removed");
        }
        removed
    }

    pub fn publish(&self, user_id: &str, event: HubEvent) -> Delivery {
        let mut delivery = Delivery::default();
        let mut subs = self.inner.lock();

        let Some(set) = subs.get_mut(user_id) else {
            return delivery;
        };

        set.retain(|id, tx| match tx.try_send(event.clone()) {
            Ok(()) => {
                delivery.delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                tracing::debug!(user = %user_id, id, "subscriber queue full, event dropped");
                delivery.dropped += 1;
                true
            }
            // receiver is gone without unsubscribing
            Err(TrySendError::Closed(_)) => false,
        });

        if set.is_empty() {
            subs.remove(user_id);
        }

        delivery
    }

    pub fn subscriber_count(&self, user_id: &str) -> usize {
        self.inner.lock().get(user_id).map_or(0, |set| set.len())
    }

    /// Number of users with at least one live subscriber.
    pub fn user_count(&self) -> usize {
        self.inner.lock().len()
    }
}

/// A live subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    handle: SubscriptionHandle,
    rx: mpsc::Receiver<HubEvent>,
    hub: Arc<HubInner>,
}

impl Subscription {
    pub fn handle(&self) -> &SubscriptionHandle {
        &self.handle
    }

    /// Waits for the next event. `None` once the subscription was removed
    /// and its queue is drained.
    pub async fn recv(&mut self) -> Option<HubEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<HubEvent> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.remove(&self.handle);
    }
}
