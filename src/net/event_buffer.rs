//! Bounded event queues between the transport and the session
//!
//! Uses crossbeam-channel so the reader task can hand decoded events to the
//! session without locking. The session drains everything pending at the
//! start of a frame, which makes updates visible at frame boundaries only.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::game::constants::net::{INBOUND_CAPACITY, OUTBOUND_CAPACITY, OUTBOUND_RESERVE};
use crate::net::protocol::{ClientIntent, ServerEvent};

/// Queue errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OutboundError {
    /// Queue is full (backpressure)
    #[error("queue full")]
    Full,
    /// Other side has gone away
    #[error("queue disconnected")]
    Disconnected,
}

impl<T> From<TrySendError<T>> for OutboundError {
    fn from(e: TrySendError<T>) -> Self {
        match e {
            TrySendError::Full(_) => OutboundError::Full,
            TrySendError::Disconnected(_) => OutboundError::Disconnected,
        }
    }
}

/// Server events waiting for the next frame
pub struct InboundBuffer {
    sender: Sender<ServerEvent>,
    receiver: Receiver<ServerEvent>,
    capacity: usize,
}

impl InboundBuffer {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Sender handle for the reader task
    pub fn sender(&self) -> InboundSender {
        InboundSender {
            sender: self.sender.clone(),
        }
    }

    /// Push an event (non-blocking)
    #[inline]
    pub fn try_submit(&self, event: ServerEvent) -> bool {
        self.sender.try_send(event).is_ok()
    }

    /// Everything received since the last drain, in arrival order
    pub fn drain(&self) -> Vec<ServerEvent> {
        self.receiver.try_iter().collect()
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InboundBuffer {
    fn default() -> Self {
        Self::new(INBOUND_CAPACITY)
    }
}

/// Clonable sender handle for the reader task
#[derive(Clone)]
pub struct InboundSender {
    sender: Sender<ServerEvent>,
}

impl InboundSender {
    #[inline]
    pub fn try_send(&self, event: ServerEvent) -> Result<(), (OutboundError, ServerEvent)> {
        self.sender.try_send(event).map_err(|e| match e {
            TrySendError::Full(ev) => (OutboundError::Full, ev),
            TrySendError::Disconnected(ev) => (OutboundError::Disconnected, ev),
        })
    }
}

/// Intents waiting to be written to the socket
///
/// Never blocks the frame. Droppable intents stop at the high-water mark so
/// the slots above it stay free for one-shot intents; anything past capacity
/// is rejected and the caller counts it.
pub struct OutboundQueue {
    sender: Sender<ClientIntent>,
    receiver: Receiver<ClientIntent>,
    capacity: usize,
    high_water: usize,
}

impl OutboundQueue {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
            high_water: capacity - OUTBOUND_RESERVE.min(capacity / 2),
        }
    }

    pub fn push(&self, intent: ClientIntent) -> Result<(), OutboundError> {
        if intent.is_droppable() && self.receiver.len() >= self.high_water {
            return Err(OutboundError::Full);
        }
        self.sender.try_send(intent).map_err(OutboundError::from)
    }

    /// Take every queued intent in send order
    pub fn drain(&self) -> Vec<ClientIntent> {
        self.receiver.try_iter().collect()
    }

    /// Discard anything queued (teardown)
    pub fn clear(&self) -> usize {
        self.receiver.try_iter().count()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Queue depth above which droppable intents are refused
    #[inline]
    pub fn high_water(&self) -> usize {
        self.high_water
    }
}

impl Default for OutboundQueue {
    fn default() -> Self {
        Self::new(OUTBOUND_CAPACITY)
    }
}
