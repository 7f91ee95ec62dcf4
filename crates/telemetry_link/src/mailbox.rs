//! Latest-value delivery between the reader task and the listener
//!
//! One slot per listener. A new frame replaces an unread one, so a consumer
//! that falls behind only ever sees the most recent frame. The disconnect
//! reason lives beside the frame and never overwrites it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::link::LinkEvent;

#[derive(Debug, Default)]
struct Slot {
    frame: Option<String>,
    disconnected: Option<String>,
    /// Listener replaced, or the disconnect event was already taken
    closed: bool,
}

#[derive(Debug, Default)]
struct Shared {
    slot: Mutex<Slot>,
    notify: Notify,
}

impl Shared {
    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Producer half, held by the link
#[derive(Debug, Clone)]
pub(crate) struct Mailbox {
    shared: Arc<Shared>,
}

impl Mailbox {
    pub(crate) fn pair() -> (Self, LinkListener) {
        let shared = Arc::new(Shared::default());
        (
            Self {
                shared: Arc::clone(&shared),
            },
            LinkListener { shared },
        )
    }

    /// Store a frame; returns true when an unread frame was replaced
    pub(crate) fn put_frame(&self, text: String) -> bool {
        let replaced = self.shared.slot().frame.replace(text).is_some();
        self.shared.notify.notify_one();
        replaced
    }

    pub(crate) fn put_disconnected(&self, reason: String) {
        self.shared.slot().disconnected = Some(reason);
        self.shared.notify.notify_one();
    }

    /// Drop anything unread
    pub(crate) fn clear(&self) {
        let mut slot = self.shared.slot();
        slot.frame = None;
        slot.disconnected = None;
    }

    /// Detach the listener; its `recv` returns `None` once drained
    pub(crate) fn close(&self) {
        self.shared.slot().closed = true;
        self.shared.notify.notify_one();
    }
}

/// Consumer half returned by [`TelemetryLink::attach_listener`](crate::TelemetryLink::attach_listener)
#[derive(Debug)]
pub struct LinkListener {
    shared: Arc<Shared>,
}

impl LinkListener {
    /// Wait for the next event
    ///
    /// A pending frame is returned before a pending disconnect. `None` once
    /// the listener was replaced or the disconnect event was consumed.
    pub async fn recv(&mut self) -> Option<LinkEvent> {
        loop {
            match self.take() {
                Taken::Event(event) => return Some(event),
                Taken::Closed => return None,
                Taken::Empty => self.shared.notify.notified().await,
            }
        }
    }

    /// Take a pending event without waiting
    pub fn try_recv(&mut self) -> Option<LinkEvent> {
        match self.take() {
            Taken::Event(event) => Some(event),
            Taken::Closed | Taken::Empty => None,
        }
    }

    fn take(&self) -> Taken {
        let mut slot = self.shared.slot();
        if let Some(text) = slot.frame.take() {
            return Taken::Event(LinkEvent::Frame(text));
        }
        if let Some(reason) = slot.disconnected.take() {
            slot.closed = true;
            return Taken::Event(LinkEvent::Disconnected { reason });
        }
        if slot.closed {
            Taken::Closed
        } else {
            Taken::Empty
        }
    }
}

enum Taken {
    Event(LinkEvent),
    Closed,
    Empty,
}
