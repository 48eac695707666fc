//! Linked Variable - The "Mailbox" between the buffer owner and a consumer
//!
//! Each link is a pair of single-slot, last-write-wins channels (one per
//! direction) plus one pending sample request and one available sample.
//! Neither side ever blocks: an unconsumed value is simply replaced by a
//! newer one.

use crate::buffer_sample::BufferSample;
use crate::error::Result;
use crate::registry::VariableId;
use crate::request::{PullRequest, PushRequest, SampleRequest};
use crate::ring_index::RingIndex;
use crate::types::ScalarValue;
use crate::variable::Variable;
use crate::variable_buffer::VariableBuffer;
use crossbeam::atomic::AtomicCell;
use crossbeam::queue::ArrayQueue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Owner-side half of a link, shared with the consumer handle
pub(crate) struct LinkChannel {
    buffer_variable: Variable,
    variable_id: VariableId,
    pull_slot: AtomicCell<Option<ScalarValue>>,
    push_slot: AtomicCell<Option<ScalarValue>>,
    sample_request: AtomicCell<Option<SampleRequest>>,
    sample: ArrayQueue<BufferSample>,
    disposed: AtomicBool,
}

impl LinkChannel {
    pub(crate) fn new(buffer_variable: Variable, variable_id: VariableId) -> Self {
        Self {
            buffer_variable,
            variable_id,
            pull_slot: AtomicCell::new(None),
            push_slot: AtomicCell::new(None),
            sample_request: AtomicCell::new(None),
            sample: ArrayQueue::new(1),
            disposed: AtomicBool::new(false),
        }
    }

    pub(crate) fn variable_id(&self) -> VariableId {
        self.variable_id
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    pub(crate) fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
    }

    /// Snapshot the buffer variable for the consumer and resolve any pending
    /// sample request against `properties`.
    pub(crate) fn prepare_for_pull(
        &self,
        buffer: &VariableBuffer,
        properties: &RingIndex,
    ) -> Result<()> {
        if self.is_disposed() {
            return Ok(());
        }

        self.pull_slot.store(Some(self.buffer_variable.value()));

        if let Some(request) = self.sample_request.load() {
            let resolved = request.resolve(properties);
            match resolved {
                Ok(Some((from, length))) => {
                    self.sample.force_push(buffer.copy(from, length, *properties));
                }
                Ok(None) => {
                    log::debug!(
                        "Discarding empty sample request for {}",
                        self.buffer_variable.full_name()
                    );
                }
                Err(_) => {}
            }
            // Cleared only once served, a newer request stays pending
            let _ = self.sample_request.compare_exchange(Some(request), None);
            resolved?;
        }
        Ok(())
    }

    /// Apply the consumer's pending push to the buffer variable, writing it at
    /// `current_index` when asked. Returns whether the variable changed.
    pub(crate) fn process_push(
        &self,
        buffer: &mut VariableBuffer,
        current_index: usize,
        write_buffer: bool,
    ) -> bool {
        if self.is_disposed() {
            return false;
        }

        let Some(value) = self.push_slot.take() else {
            return false;
        };

        let modified = self.buffer_variable.store(value);
        if modified && write_buffer {
            buffer.write(current_index);
        }
        modified
    }

    pub(crate) fn flush_push(&self) {
        self.push_slot.take();
    }

    pub(crate) fn has_request_pending(&self) -> bool {
        !self.is_disposed() && self.sample_request.load().is_some()
    }
}

/// Consumer-side handle linking a consumer variable to its buffer.
///
/// Dropping the handle disposes the link; the buffer owner forgets it on its
/// next fan-out.
pub struct LinkedVariable {
    consumer: Variable,
    channel: Arc<LinkChannel>,
}

impl LinkedVariable {
    pub(crate) fn new(consumer: Variable, channel: Arc<LinkChannel>) -> Self {
        Self { consumer, channel }
    }

    /// The consumer-owned variable this link updates
    pub fn variable(&self) -> &Variable {
        &self.consumer
    }

    pub fn is_active(&self) -> bool {
        !self.channel.is_disposed()
    }

    /// Apply the latest buffer value prepared by the owner, if any.
    /// Returns whether a value was pending.
    pub fn pull(&self) -> bool {
        if self.channel.is_disposed() {
            return false;
        }

        match self.channel.pull_slot.take() {
            Some(value) => {
                self.consumer.store(value);
                true
            }
            None => false,
        }
    }

    /// Offer the consumer variable's current value to the buffer owner,
    /// replacing any push it has not processed yet.
    pub fn push(&self) {
        if self.channel.is_disposed() {
            return;
        }
        self.channel.push_slot.store(Some(self.consumer.value()));
    }

    /// The pending pull as a detached request, left in place for `pull`
    pub fn to_pull_request(&self) -> Option<PullRequest> {
        let value = self.channel.pull_slot.load()?;
        PullRequest::new(self.consumer.clone(), value).ok()
    }

    /// The pending push as a detached request, left in place for the owner
    pub fn to_push_request(&self) -> Option<PushRequest> {
        let value = self.channel.push_slot.load()?;
        PushRequest::new(self.channel.buffer_variable.clone(), value).ok()
    }

    pub fn request_entire_buffer(&self) {
        self.request(SampleRequest::Entire);
    }

    pub fn request_active_buffer_only(&self) {
        self.request(SampleRequest::ActiveOnly);
    }

    pub fn request_buffer_starting_from(&self, from: isize) {
        self.request(SampleRequest::StartingFrom(from));
    }

    /// Request `length` samples from `from`; validated when the owner resolves it
    pub fn request_buffer_window(&self, from: isize, length: isize) {
        self.request(SampleRequest::Window { from, length });
    }

    fn request(&self, request: SampleRequest) {
        if self.channel.is_disposed() {
            return;
        }
        self.channel.sample_request.store(Some(request));
    }

    /// A request was made and the owner has not resolved it yet
    pub fn has_request_pending(&self) -> bool {
        self.channel.has_request_pending()
    }

    pub fn is_requested_buffer_sample_available(&self) -> bool {
        !self.channel.is_disposed() && !self.channel.sample.is_empty()
    }

    /// Take the resolved sample; subsequent polls return `None` until the
    /// next request resolves.
    pub fn poll_requested_buffer_sample(&self) -> Option<BufferSample> {
        if self.channel.is_disposed() {
            return None;
        }
        self.channel.sample.pop()
    }
}

impl Drop for LinkedVariable {
    fn drop(&mut self) {
        self.channel.dispose();
    }
}

impl std::fmt::Debug for LinkedVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkedVariable")
            .field("variable", &self.consumer.full_name())
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChronicleError;
    use crate::types::ScalarKind;

    struct Fixture {
        buffer: VariableBuffer,
        link: LinkedVariable,
        channel: Arc<LinkChannel>,
        properties: RingIndex,
    }

    fn fixture() -> Fixture {
        let buffer_variable = Variable::new("root", "q", ScalarKind::Double).unwrap();
        let consumer = Variable::new("root", "q", ScalarKind::Double).unwrap();
        let mut buffer = VariableBuffer::new(buffer_variable.clone(), 10);
        for i in 0..10 {
            buffer_variable.set_double(i as f64 * 10.0).unwrap();
            buffer.write(i);
        }
        let channel = Arc::new(LinkChannel::new(buffer_variable, VariableId(0)));
        let link = LinkedVariable::new(consumer, channel.clone());
        let properties = RingIndex::with_index(10, 2, 6, 6).unwrap();
        Fixture { buffer, link, channel, properties }
    }

    #[test]
    fn test_pull_coalesces_to_latest() {
        let f = fixture();
        let source = f.buffer.variable().clone();

        for value in [1.0, 2.0, 3.0] {
            source.set_double(value).unwrap();
            f.channel.prepare_for_pull(&f.buffer, &f.properties).unwrap();
        }

        assert_eq!(f.link.variable().get_double(), 0.0);
        assert!(f.link.pull());
        assert_eq!(f.link.variable().get_double(), 3.0);
        assert!(!f.link.pull());
    }

    #[test]
    fn test_pull_without_prepare_is_noop() {
        let f = fixture();
        f.buffer.variable().set_double(5.0).unwrap();
        f.buffer.variable().set_double(6.0).unwrap();

        assert!(!f.link.pull());
        assert_eq!(f.link.variable().get_double(), 0.0);
    }

    #[test]
    fn test_push_coalesces_to_latest() {
        let mut f = fixture();
        for value in [7.0, 8.0, 9.0] {
            f.link.variable().set_double(value).unwrap();
            f.link.push();
        }

        assert!(f.channel.process_push(&mut f.buffer, 4, true));
        assert_eq!(f.buffer.variable().get_double(), 9.0);
        assert_eq!(f.buffer.value_at(4), Some(ScalarValue::Double(9.0)));
        assert!(!f.channel.process_push(&mut f.buffer, 4, true));
    }

    #[test]
    fn test_push_without_write_leaves_buffer() {
        let mut f = fixture();
        f.link.variable().set_double(-1.0).unwrap();
        f.link.push();

        assert!(f.channel.process_push(&mut f.buffer, 4, false));
        assert_eq!(f.buffer.value_at(4), Some(ScalarValue::Double(40.0)));
    }

    #[test]
    fn test_flush_discards_push() {
        let mut f = fixture();
        f.link.variable().set_double(-1.0).unwrap();
        f.link.push();
        assert!(f.link.to_push_request().is_some());

        f.channel.flush_push();
        assert!(f.link.to_push_request().is_none());
        assert!(!f.channel.process_push(&mut f.buffer, 0, true));
    }

    #[test]
    fn test_detached_requests() {
        let f = fixture();
        assert!(f.link.to_pull_request().is_none());

        f.buffer.variable().set_double(12.0).unwrap();
        f.channel.prepare_for_pull(&f.buffer, &f.properties).unwrap();

        let request = f.link.to_pull_request().unwrap();
        assert_eq!(request.value(), ScalarValue::Double(12.0));
        assert!(request.pull());
        assert_eq!(f.link.variable().get_double(), 12.0);
    }

    #[test]
    fn test_active_sample_request() {
        let f = fixture();
        f.link.request_active_buffer_only();
        assert!(f.link.has_request_pending());
        assert!(!f.link.is_requested_buffer_sample_available());

        f.channel.prepare_for_pull(&f.buffer, &f.properties).unwrap();
        assert!(!f.link.has_request_pending());
        assert!(f.link.is_requested_buffer_sample_available());

        let sample = f.link.poll_requested_buffer_sample().unwrap();
        assert_eq!((sample.from(), sample.to(), sample.sample_length()), (2, 6, 5));
        assert_eq!(sample.sample().to_doubles(), vec![20.0, 30.0, 40.0, 50.0, 60.0]);
        assert!(f.link.poll_requested_buffer_sample().is_none());
    }

    #[test]
    fn test_new_request_overwrites_pending() {
        let f = fixture();
        f.link.request_entire_buffer();
        f.link.request_buffer_window(8, 4);
        f.channel.prepare_for_pull(&f.buffer, &f.properties).unwrap();

        let sample = f.link.poll_requested_buffer_sample().unwrap();
        assert_eq!(sample.sample().to_doubles(), vec![80.0, 90.0, 0.0, 10.0]);
    }

    #[test]
    fn test_empty_window_discarded() {
        let f = fixture();
        f.link.request_buffer_window(3, 0);
        f.channel.prepare_for_pull(&f.buffer, &f.properties).unwrap();

        assert!(!f.link.has_request_pending());
        assert!(!f.link.is_requested_buffer_sample_available());
    }

    #[test]
    fn test_invalid_window_fails_once() {
        let f = fixture();
        f.link.request_buffer_window(10, 2);

        assert!(matches!(
            f.channel.prepare_for_pull(&f.buffer, &f.properties),
            Err(ChronicleError::InvalidSampleRequest { from: 10, length: 2, size: 10 })
        ));
        // Not retried
        assert!(!f.link.has_request_pending());
        assert!(f.channel.prepare_for_pull(&f.buffer, &f.properties).is_ok());
    }

    #[test]
    fn test_disposed_link_reports_no_sample() {
        let f = fixture();
        f.link.request_entire_buffer();
        f.channel.prepare_for_pull(&f.buffer, &f.properties).unwrap();
        assert!(f.link.is_requested_buffer_sample_available());

        f.channel.dispose();
        assert!(!f.link.is_requested_buffer_sample_available());
        assert!(f.link.poll_requested_buffer_sample().is_none());
    }

    #[test]
    fn test_request_stays_pending_until_sample_published() {
        let f = fixture();
        f.link.request_buffer_window(1, 3);
        assert!(f.link.has_request_pending());
        assert!(!f.link.is_requested_buffer_sample_available());

        f.channel.prepare_for_pull(&f.buffer, &f.properties).unwrap();
        assert!(!f.link.has_request_pending());
        assert!(f.link.is_requested_buffer_sample_available());

        // A request made after the sample was published is served next time
        f.link.request_buffer_window(4, 2);
        assert!(f.link.has_request_pending());
        let served = f.link.poll_requested_buffer_sample().unwrap();
        assert_eq!(served.sample().to_doubles(), vec![10.0, 20.0, 30.0]);
        f.channel.prepare_for_pull(&f.buffer, &f.properties).unwrap();
        let next = f.link.poll_requested_buffer_sample().unwrap();
        assert_eq!(next.sample().to_doubles(), vec![40.0, 50.0]);
    }

    #[test]
    fn test_drop_disposes_channel() {
        let f = fixture();
        let channel = f.channel.clone();
        assert!(!channel.is_disposed());
        drop(f);
        assert!(channel.is_disposed());
    }
}
