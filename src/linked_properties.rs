//! Linked Buffer Properties - a consumer's view of the ring index

use crate::ring_index::RingIndex;
use crossbeam::atomic::AtomicCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub(crate) struct PropertiesChannel {
    pending: AtomicCell<Option<RingIndex>>,
    disposed: AtomicBool,
}

impl PropertiesChannel {
    pub(crate) fn new() -> Self {
        Self {
            pending: AtomicCell::new(None),
            disposed: AtomicBool::new(false),
        }
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    pub(crate) fn prepare_for_pull(&self, properties: RingIndex) {
        self.pending.store(Some(properties));
    }
}

/// Consumer handle receiving a copy of the ring index every tick
pub struct LinkedBufferProperties {
    channel: Arc<PropertiesChannel>,
    current: Option<RingIndex>,
}

impl LinkedBufferProperties {
    pub(crate) fn new(channel: Arc<PropertiesChannel>) -> Self {
        Self { channel, current: None }
    }

    /// Adopt the latest prepared ring index, returning whether one was pending
    pub fn pull(&mut self) -> bool {
        match self.channel.pending.take() {
            Some(properties) => {
                self.current = Some(properties);
                true
            }
            None => false,
        }
    }

    /// Ring index as of the last successful `pull`
    pub fn properties(&self) -> Option<RingIndex> {
        self.current
    }

    /// Latest prepared ring index without consuming it
    pub fn peek_current_buffer_properties(&self) -> Option<RingIndex> {
        self.channel.pending.load().or(self.current)
    }
}

impl Drop for LinkedBufferProperties {
    fn drop(&mut self) {
        self.channel.disposed.store(true, Ordering::Release);
    }
}
