//! Fan-out of serialized payloads to every live push-channel subscriber.
//!
//! Each subscriber owns a bounded outbound queue that the transport drains
//! on its own task. Sends from the hub are `try_send`, so a slow or dead
//! peer never stalls delivery to the others. Membership and fan-out share
//! one mutex; the critical sections only enqueue.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};

pub const HANDSHAKE: &str = "Connected";
pub const DEFAULT_QUEUE_DEPTH: usize = 64;

pub type Payload = Arc<str>;
pub type SubscriberId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    Connecting,
    Open,
    Closed,
}

struct Subscriber {
    tx: mpsc::Sender<Payload>,
    state: SubscriberState,
}

impl Subscriber {
    /// Queues one payload. Only `Open` subscribers accept sends; a closed
    /// receiver flips the subscriber to `Closed` until its disconnect
    /// arrives.
    fn send(&mut self, id: SubscriberId, payload: &Payload) -> bool {
        if self.state != SubscriberState::Open {
            return false;
        }
        match self.tx.try_send(Arc::clone(payload)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("[hub] subscriber {id} is not keeping up; dropping frame");
                false
            }
            Err(TrySendError::Closed(_)) => {
                warn!("[hub] subscriber {id} went away; marking closed");
                self.state = SubscriberState::Closed;
                false
            }
        }
    }
}

pub struct BroadcastHub {
    next_id: AtomicU64,
    subscribers: Mutex<BTreeMap<SubscriberId, Subscriber>>,
    queue_depth: usize,
}

impl BroadcastHub {
    pub fn new(queue_depth: usize) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            subscribers: Mutex::new(BTreeMap::new()),
            queue_depth: queue_depth.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<SubscriberId, Subscriber>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a subscriber in `Connecting` state. It receives nothing
    /// until [`open`](Self::open) is called; the returned receiver is its
    /// outbound queue.
    pub fn connect(&self) -> (SubscriberId, mpsc::Receiver<Payload>) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(self.queue_depth);
        let subscriber = Subscriber {
            tx,
            state: SubscriberState::Connecting,
        };
        self.lock().insert(id, subscriber);
        debug!("[hub] subscriber {id} connecting");
        (id, rx)
    }

    /// Moves a `Connecting` subscriber to `Open` and queues the handshake
    /// for it alone, ahead of any broadcast. False if `id` is unknown or
    /// already past `Connecting`.
    pub fn open(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.lock();
        let Some(subscriber) = subscribers.get_mut(&id) else {
            return false;
        };
        if subscriber.state != SubscriberState::Connecting {
            return false;
        }
        subscriber.state = SubscriberState::Open;
        let sent = subscriber.send(id, &Payload::from(HANDSHAKE));
        info!(
            "[hub] subscriber {id} connected ({} total)",
            subscribers.len()
        );
        sent
    }

    pub fn disconnect(&self, id: SubscriberId) {
        let mut subscribers = self.lock();
        if subscribers.remove(&id).is_some() {
            info!(
                "[hub] subscriber {id} disconnected ({} left)",
                subscribers.len()
            );
        }
    }

    /// Pushes `payload` to every open subscriber. Returns how many accepted
    /// it; failures are confined to the failing subscriber.
    pub fn notify(&self, payload: impl Into<Payload>) -> usize {
        let payload = payload.into();
        let mut subscribers = self.lock();
        let delivered = subscribers
            .iter_mut()
            .map(|(id, sub)| sub.send(*id, &payload))
            .filter(|sent| *sent)
            .count();
        debug!(
            "[hub] fan-out reached {delivered}/{} subscribers",
            subscribers.len()
        );
        delivered
    }

    /// Serializes `value` and fans it out. A value that cannot be encoded is
    /// logged and dropped.
    pub fn notify_json<T: Serialize + ?Sized>(&self, value: &T) -> usize {
        match serde_json::to_string(value) {
            Ok(json) => self.notify(json),
            Err(err) => {
                warn!("[hub] failed to encode payload: {err}");
                0
            }
        }
    }

    pub fn state(&self, id: SubscriberId) -> SubscriberState {
        self.lock()
            .get(&id)
            .map_or(SubscriberState::Closed, |sub| sub.state)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_DEPTH)
    }
}
