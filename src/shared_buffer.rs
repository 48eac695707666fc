//! Shared Buffer - The "Recorder"
//!
//! The buffer manager: a single thread owns the `SharedBuffer`, moves the ring
//! index, writes and reads the variables, and services linked consumers once
//! per tick. Consumers only ever see a `BufferLinker`, which can create links
//! but never touches the ring index or the per-tick value exchange.
//!
//! ## Typical manager loops
//!
//! Recording:
//! ```text
//! increment_buffer_index(true) -> write_buffer()
//!     -> process_linked_push_requests() -> prepare_linked_buffers_for_pull()
//! ```
//! Playback:
//! ```text
//! read_buffer() -> prepare_linked_buffers_for_pull() -> increment_buffer_index_by(false, step)
//! ```

use crate::error::{ChronicleError, Result};
use crate::linked_properties::{LinkedBufferProperties, PropertiesChannel};
use crate::linked_registry::LinkedRegistry;
use crate::linked_variable::{LinkChannel, LinkedVariable};
use crate::registry::Registry;
use crate::registry_buffer::RegistryBuffer;
use crate::request::{CropRequest, FillRequest};
use crate::ring_index::{compute_from_index, compute_sub_length, is_inside_bounds, RingIndex};
use crate::types::{ChronicleConfig, ScalarKind};
use crate::variable::Variable;
use crossbeam::queue::SegQueue;
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Walks the active window, see [`SharedBuffer::apply_processor`]
pub trait BufferProcessor {
    /// Called once before the walk, typically to grab variable handles
    fn initialize(&mut self, _registry: &Registry) {}

    /// Walk from the in-point to the out-point, or the reverse
    fn go_forward(&self) -> bool {
        true
    }

    /// Called with the variables loaded from `current_index`; whatever the
    /// processor leaves in them is written back at that index.
    fn process(&mut self, start_index: usize, end_index: usize, current_index: usize);
}

/// State shared between the manager and every `BufferLinker`
pub(crate) struct SharedState {
    registry_buffer: Mutex<RegistryBuffer>,
    new_links: SegQueue<Arc<LinkChannel>>,
    new_properties: SegQueue<Arc<PropertiesChannel>>,
    disposed: AtomicBool,
}

pub struct SharedBuffer {
    properties: RingIndex,
    state: Arc<SharedState>,
    links: Vec<Arc<LinkChannel>>,
    linked_properties: Vec<Arc<PropertiesChannel>>,
    write_buffer_on_push: bool,
}

impl SharedBuffer {
    /// Record every variable of `registry` over `size` samples
    pub fn new(registry: Registry, size: usize) -> Result<Self> {
        let properties = RingIndex::new(size)?;
        let registry_buffer = RegistryBuffer::new(registry, size);

        log::info!(
            "Shared buffer created: {} variables x {} samples",
            registry_buffer.buffers().len(),
            size
        );

        Ok(Self {
            properties,
            state: Arc::new(SharedState {
                registry_buffer: Mutex::new(registry_buffer),
                new_links: SegQueue::new(),
                new_properties: SegQueue::new(),
                disposed: AtomicBool::new(false),
            }),
            links: Vec::new(),
            linked_properties: Vec::new(),
            write_buffer_on_push: true,
        })
    }

    /// Empty root registry and buffer sizing from `config`
    pub fn from_config(config: &ChronicleConfig) -> Result<Self> {
        config.validate()?;
        let mut buffer = Self::new(Registry::new(&config.root_registry)?, config.buffer_size)?;
        buffer.write_buffer_on_push = config.write_buffer_on_push;
        Ok(buffer)
    }

    pub fn properties(&self) -> RingIndex {
        self.properties
    }

    /// Lock the registry buffer for structural changes on the manager side
    pub fn registry_buffer(&self) -> MutexGuard<'_, RegistryBuffer> {
        self.state.registry_buffer.lock()
    }

    /// Add (or find) a recorded variable under `namespace`
    pub fn add_variable(&self, namespace: &str, name: &str, kind: ScalarKind) -> Result<Variable> {
        self.registry_buffer().add_variable(namespace, name, kind)
    }

    pub fn add_enum_variable(
        &self,
        namespace: &str,
        name: &str,
        constants: &[&str],
    ) -> Result<Variable> {
        self.registry_buffer().add_enum_variable(namespace, name, constants)
    }

    pub fn is_disposed(&self) -> bool {
        self.state.disposed.load(Ordering::Acquire)
    }

    /// Consumer-facing factory, cheap to clone and send to other threads
    pub fn linker(&self) -> BufferLinker {
        BufferLinker { state: self.state.clone() }
    }

    /// Live links currently serviced by this buffer
    pub fn link_count(&mut self) -> usize {
        self.collect_new_links();
        self.links.len()
    }

    /// Keep only `[from, to]`: the buffer shrinks to that window which becomes
    /// the whole active window, with the current index on its first sample.
    /// Variables are not updated, call `read_buffer` for that.
    pub fn crop_buffer(&mut self, request: CropRequest) -> Result<()> {
        self.check_disposed()?;

        let new_size = request.cropped_size(self.properties.size())?;
        self.registry_buffer().resize(request.from, new_size);
        self.properties = RingIndex::with_index(new_size, 0, new_size - 1, 0)?;

        log::info!("Buffer cropped to [{}, {}], new size {}", request.from, request.to, new_size);
        Ok(())
    }

    pub fn fill_buffer(&mut self, request: FillRequest) -> Result<()> {
        self.check_disposed()?;

        let length = request.filled_size(self.properties.size())?;
        self.registry_buffer().fill(request.zero_fill, request.from, length);
        log::debug!("Filled {} samples from {}", length, request.from);
        Ok(())
    }

    /// Change the capacity, keeping the active window (or its most recent part
    /// when shrinking below it) at the start of the new buffer and the current
    /// index at the same place relative to it. Variables are not updated.
    ///
    /// Returns `false` for a zero or unchanged size.
    pub fn resize_buffer(&mut self, new_size: usize) -> bool {
        if self.is_disposed() || new_size == 0 || new_size == self.properties.size() {
            return false;
        }

        let old = self.properties;
        let active_length = old.active_length();

        let (copy_from, new_out_point, new_current_index) = if new_size < active_length {
            // Not everything fits, keep the samples closest to the out-point
            let copy_from = compute_from_index(old.out_point(), new_size, old.size());
            let new_out_point = new_size - 1;
            let (current, out_point, size) = (old.current_index(), old.out_point(), old.size());
            let new_current_index = if is_inside_bounds(current, copy_from, out_point, size) {
                new_out_point + 1 - compute_sub_length(current, out_point, size)
            } else {
                new_out_point
            };
            (copy_from, new_out_point, new_current_index)
        } else {
            let new_out_point = active_length - 1;
            let new_current_index = if old.is_in_active_window(old.current_index()) {
                compute_sub_length(old.in_point(), old.current_index(), old.size()) - 1
            } else {
                new_out_point
            };
            (old.in_point(), new_out_point, new_current_index)
        };

        let resized = RingIndex::with_index(new_size, 0, new_out_point, new_current_index);
        let properties = match resized {
            Ok(properties) => properties,
            Err(e) => unreachable!("resize produced an invalid ring index: {}", e),
        };
        self.registry_buffer().resize(copy_from, new_size);
        self.properties = properties;

        log::info!("Buffer resized from {} to {} samples", old.size(), new_size);
        true
    }

    /// Bytes of one sample across all recorded variables
    pub fn frame_memory_size(&self) -> usize {
        self.registry_buffer().frame_memory_size()
    }

    /// Seek, loading the variables from the new index when it changed
    pub fn set_current_index(&mut self, index: usize) -> bool {
        if self.is_disposed() || !self.properties.set_current_index(index) {
            return false;
        }
        self.read_buffer();
        true
    }

    pub fn set_in_point(&mut self, index: usize) -> bool {
        !self.is_disposed() && self.properties.set_in_point(index)
    }

    pub fn set_out_point(&mut self, index: usize) -> bool {
        !self.is_disposed() && self.properties.set_out_point(index)
    }

    pub fn increment_buffer_index(&mut self, grow_active_window: bool) -> usize {
        if !self.is_disposed() {
            self.properties.increment_index(grow_active_window);
        }
        self.properties.current_index()
    }

    pub fn increment_buffer_index_by(&mut self, grow_active_window: bool, step: isize) -> usize {
        if !self.is_disposed() {
            self.properties.increment_index_by(grow_active_window, step);
        }
        self.properties.current_index()
    }

    pub fn decrement_buffer_index(&mut self) -> usize {
        if !self.is_disposed() {
            self.properties.decrement_index();
        }
        self.properties.current_index()
    }

    pub fn decrement_buffer_index_by(&mut self, step: isize) -> usize {
        if !self.is_disposed() {
            self.properties.decrement_index_by(step);
        }
        self.properties.current_index()
    }

    /// Record every variable at the current index
    pub fn write_buffer(&mut self) {
        if self.is_disposed() {
            return;
        }
        let index = self.properties.current_index();
        self.registry_buffer().write(index);
    }

    /// Load every variable from the current index, returning whether any changed
    pub fn read_buffer(&mut self) -> bool {
        if self.is_disposed() {
            return false;
        }
        let index = self.properties.current_index();
        self.registry_buffer().read(index)
    }

    /// Apply consumer pushes to the buffer variables (and the buffers at the
    /// current index when `write_buffer`). Returns whether anything changed.
    pub fn process_linked_push_requests(&mut self, write_buffer: bool) -> bool {
        if self.is_disposed() {
            return false;
        }
        self.collect_new_links();

        let current_index = self.properties.current_index();
        let mut registry_buffer = self.state.registry_buffer.lock();
        let mut modified = false;
        for link in &self.links {
            let buffer = registry_buffer.variable_buffer_mut(link.variable_id());
            modified |= link.process_push(buffer, current_index, write_buffer);
        }
        modified
    }

    /// Discard every push consumers have made so far
    pub fn flush_linked_push_requests(&mut self) {
        if self.is_disposed() {
            return;
        }
        self.collect_new_links();
        for link in &self.links {
            link.flush_push();
        }
    }

    /// Hand the current values (and any requested samples) to every consumer.
    ///
    /// A malformed sample request does not stop the others from being served;
    /// the first such error is returned once every link has been prepared.
    pub fn prepare_linked_buffers_for_pull(&mut self) -> Result<()> {
        if self.is_disposed() {
            return Ok(());
        }
        self.collect_new_links();

        let mut first_error = None;
        {
            let registry_buffer = self.state.registry_buffer.lock();
            for link in &self.links {
                let buffer = registry_buffer.variable_buffer(link.variable_id());
                if let Err(e) = link.prepare_for_pull(buffer, &self.properties) {
                    log::warn!(
                        "Rejected sample request for {}: {}",
                        buffer.variable().full_name(),
                        e
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        for properties in &self.linked_properties {
            properties.prepare_for_pull(self.properties);
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Whether a consumer is waiting on a sample request
    pub fn has_request_pending(&mut self) -> bool {
        if self.is_disposed() {
            return false;
        }
        self.collect_new_links();
        self.links.iter().any(|link| link.has_request_pending())
    }

    /// Run `processor` over the active window: for each index, read the
    /// variables, process, write them back. The current index is restored
    /// (and read) afterwards.
    pub fn apply_processor(&mut self, processor: &mut dyn BufferProcessor) {
        if self.is_disposed() {
            return;
        }

        let initial_index = self.properties.current_index();
        let length = self.properties.active_length();
        let mut registry_buffer = self.state.registry_buffer.lock();
        processor.initialize(registry_buffer.registry());

        let forward = processor.go_forward();
        let (start_index, end_index) = if forward {
            (self.properties.in_point(), self.properties.out_point())
        } else {
            (self.properties.out_point(), self.properties.in_point())
        };
        self.properties.set_current_index(start_index);

        for _ in 0..length {
            let index = self.properties.current_index();
            registry_buffer.read(index);
            processor.process(start_index, end_index, index);
            registry_buffer.write(index);
            if forward {
                self.properties.increment_index(false);
            } else {
                self.properties.decrement_index();
            }
        }

        self.properties.set_current_index(initial_index);
        registry_buffer.read(initial_index);
    }

    /// One recording step: advance, record, accept pushes, publish
    pub fn tick(&mut self) -> Result<()> {
        self.check_disposed()?;

        self.increment_buffer_index(true);
        self.write_buffer();
        self.process_linked_push_requests(self.write_buffer_on_push);
        self.prepare_linked_buffers_for_pull()
    }

    /// Stop servicing consumers; every later operation is a no-op or fails
    /// with `Disposed`, and every consumer link goes inactive.
    pub fn dispose(&mut self) {
        if self.state.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        self.collect_new_links();
        for link in self.links.drain(..) {
            link.dispose();
        }
        self.linked_properties.clear();
        log::info!("Shared buffer disposed");
    }

    fn check_disposed(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(ChronicleError::Disposed);
        }
        Ok(())
    }

    /// Adopt links registered by consumers and forget the dropped ones
    fn collect_new_links(&mut self) {
        while let Some(link) = self.state.new_links.pop() {
            self.links.push(link);
        }
        while let Some(properties) = self.state.new_properties.pop() {
            self.linked_properties.push(properties);
        }

        let before = self.links.len();
        self.links.retain(|link| !link.is_disposed());
        self.linked_properties.retain(|properties| !properties.is_disposed());
        if self.links.len() != before {
            log::debug!("Pruned {} disposed links", before - self.links.len());
        }
    }
}

impl Drop for SharedBuffer {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Thread-safe factory for consumer links to a `SharedBuffer`
#[derive(Clone)]
pub struct BufferLinker {
    state: Arc<SharedState>,
}

impl BufferLinker {
    /// Link `consumer` to the buffer of the variable with the same full name,
    /// creating that variable on the buffer side if needed.
    pub fn new_linked_variable(&self, consumer: Variable) -> Result<LinkedVariable> {
        self.check_disposed()?;

        let (id, buffer_variable) = {
            let mut registry_buffer = self.state.registry_buffer.lock();
            let id = registry_buffer.find_or_create_variable_buffer(&consumer)?;
            (id, registry_buffer.registry().variable(id).clone())
        };

        let channel = Arc::new(LinkChannel::new(buffer_variable, id));
        self.state.new_links.push(channel.clone());
        log::debug!("Linked {}", consumer.full_name());

        Ok(LinkedVariable::new(consumer, channel))
    }

    /// Link a fresh consumer copy of the recorded variable `full_name`
    pub fn link_by_name(&self, full_name: &str) -> Result<LinkedVariable> {
        let consumer = {
            let registry_buffer = self.state.registry_buffer.lock();
            let id = registry_buffer
                .registry()
                .find_variable(full_name)
                .ok_or_else(|| ChronicleError::UnknownVariable(full_name.to_string()))?;
            let variable = registry_buffer.registry().variable(id);
            variable.duplicate(variable.namespace())
        };
        self.new_linked_variable(consumer)
    }

    /// Empty consumer mirror of `namespace` (or the whole tree), populated on
    /// demand with `LinkedRegistry::update_from_buffer`
    pub fn new_linked_registry(&self, namespace: Option<&str>) -> Result<LinkedRegistry> {
        self.check_disposed()?;
        let (registry, root) = self.state.registry_buffer.lock().new_linked_registry(namespace)?;
        Ok(LinkedRegistry::new(registry, root, self.clone()))
    }

    pub fn new_linked_buffer_properties(&self) -> Result<LinkedBufferProperties> {
        self.check_disposed()?;
        let channel = Arc::new(PropertiesChannel::new());
        self.state.new_properties.push(channel.clone());
        Ok(LinkedBufferProperties::new(channel))
    }

    pub(crate) fn registry_buffer(&self) -> MutexGuard<'_, RegistryBuffer> {
        self.state.registry_buffer.lock()
    }

    fn check_disposed(&self) -> Result<()> {
        if self.state.disposed.load(Ordering::Acquire) {
            return Err(ChronicleError::Disposed);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScalarValue;

    /// Buffer of `size` samples with `root.q` recorded as 0, 1, 2, ... at indices 0, 1, 2, ...
    fn ramp(size: usize) -> (SharedBuffer, Variable) {
        let mut shared = SharedBuffer::new(Registry::new("root").unwrap(), size).unwrap();
        let q = shared.add_variable("root", "q", ScalarKind::Double).unwrap();
        for i in 0..size {
            shared.set_current_index(i);
            q.set_double(i as f64).unwrap();
            shared.write_buffer();
        }
        (shared, q)
    }

    fn recorded(shared: &SharedBuffer) -> Vec<f64> {
        shared.registry_buffer().find_variable_buffer("root.q").unwrap().array().to_doubles()
    }

    #[test]
    fn test_crop_buffer() {
        let (mut shared, _) = ramp(10);
        shared.crop_buffer(CropRequest::new(3, 7)).unwrap();

        let properties = shared.properties();
        assert_eq!(properties.size(), 5);
        assert_eq!(
            (properties.in_point(), properties.out_point(), properties.current_index()),
            (0, 4, 0)
        );
        assert_eq!(recorded(&shared), vec![3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_crop_buffer_wrapping() {
        let (mut shared, _) = ramp(10);
        shared.crop_buffer(CropRequest::new(8, 1)).unwrap();
        assert_eq!(recorded(&shared), vec![8.0, 9.0, 0.0, 1.0]);
        assert!(matches!(
            shared.crop_buffer(CropRequest::new(0, 4)),
            Err(ChronicleError::IndexOutOfBounds { index: 4, size: 4 })
        ));
        assert_eq!(shared.properties().size(), 4);
    }

    #[test]
    fn test_resize_grow_keeps_active_window() {
        let (mut shared, _) = ramp(10);
        shared.set_in_point(2);
        shared.set_out_point(6);
        shared.set_current_index(4);

        assert!(shared.resize_buffer(20));
        let properties = shared.properties();
        assert_eq!(properties.size(), 20);
        assert_eq!(
            (properties.in_point(), properties.out_point(), properties.current_index()),
            (0, 4, 2)
        );
        assert_eq!(&recorded(&shared)[..5], &[2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_resize_current_outside_window_clamps() {
        let (mut shared, _) = ramp(10);
        shared.set_in_point(2);
        shared.set_out_point(6);
        shared.set_current_index(8);

        assert!(shared.resize_buffer(7));
        let properties = shared.properties();
        assert_eq!(
            (properties.in_point(), properties.out_point(), properties.current_index()),
            (0, 4, 4)
        );
    }

    #[test]
    fn test_resize_shrink_keeps_latest() {
        let (mut shared, _) = ramp(10);
        shared.set_in_point(2);
        shared.set_out_point(6);
        shared.set_current_index(5);

        assert!(shared.resize_buffer(3));
        let properties = shared.properties();
        assert_eq!(
            (properties.in_point(), properties.out_point(), properties.current_index()),
            (0, 2, 1)
        );
        assert_eq!(recorded(&shared), vec![4.0, 5.0, 6.0]);

        // Current index fell off the kept part
        let (mut shared, _) = ramp(10);
        shared.set_in_point(2);
        shared.set_out_point(6);
        shared.set_current_index(2);
        assert!(shared.resize_buffer(3));
        assert_eq!(shared.properties().current_index(), 2);
    }

    #[test]
    fn test_resize_noop() {
        let (mut shared, _) = ramp(10);
        assert!(!shared.resize_buffer(10));
        assert!(!shared.resize_buffer(0));
        assert_eq!(shared.properties().size(), 10);
    }

    #[test]
    fn test_set_current_index_reads() {
        let (mut shared, q) = ramp(10);
        assert!(shared.set_current_index(3));
        assert_eq!(q.get_double(), 3.0);
        assert!(!shared.set_current_index(3));
        assert!(!shared.set_current_index(10));
        assert_eq!(shared.properties().current_index(), 3);
    }

    #[test]
    fn test_fill_buffer() {
        let (mut shared, q) = ramp(6);
        q.set_double(-1.0).unwrap();
        shared.fill_buffer(FillRequest::new(false, 5, 0)).unwrap();
        assert_eq!(recorded(&shared), vec![-1.0, 1.0, 2.0, 3.0, 4.0, -1.0]);
    }

    #[test]
    fn test_tick_records_and_publishes() {
        let mut shared = SharedBuffer::new(Registry::new("root").unwrap(), 8).unwrap();
        let q = shared.add_variable("root", "q", ScalarKind::Double).unwrap();
        let linked = shared.linker().link_by_name("root.q").unwrap();

        for i in 1..=3 {
            q.set_double(i as f64).unwrap();
            shared.tick().unwrap();
        }

        let properties = shared.properties();
        assert_eq!(
            (properties.in_point(), properties.out_point(), properties.current_index()),
            (0, 3, 3)
        );
        assert!(linked.pull());
        assert_eq!(linked.variable().get_double(), 3.0);
    }

    #[test]
    fn test_tick_applies_consumer_push() {
        let mut shared = SharedBuffer::new(Registry::new("root").unwrap(), 8).unwrap();
        let gain = shared.add_variable("root.controller", "gain", ScalarKind::Double).unwrap();
        let linked = shared.linker().link_by_name("root.controller.gain").unwrap();

        linked.variable().set_double(0.5).unwrap();
        linked.push();
        shared.tick().unwrap();

        assert_eq!(gain.get_double(), 0.5);
        let index = shared.properties().current_index();
        let registry_buffer = shared.registry_buffer();
        let buffer = registry_buffer.find_variable_buffer("root.controller.gain").unwrap();
        assert_eq!(buffer.value_at(index), Some(ScalarValue::Double(0.5)));
    }

    #[test]
    fn test_consumer_created_variable() {
        let mut shared = SharedBuffer::new(Registry::new("root").unwrap(), 4).unwrap();
        let consumer = Variable::new("root.ui", "slider", ScalarKind::Integer).unwrap();
        let linked = shared.linker().new_linked_variable(consumer).unwrap();

        assert!(shared.registry_buffer().find_variable_buffer("root.ui.slider").is_some());
        linked.variable().set_integer(9).unwrap();
        linked.push();
        assert!(shared.process_linked_push_requests(false));
    }

    #[test]
    fn test_enum_link_with_extra_constants_rejected() {
        let mut shared = SharedBuffer::new(Registry::new("root").unwrap(), 4).unwrap();
        let mode = shared.add_enum_variable("root", "mode", &["A", "B"]).unwrap();

        let consumer = Variable::new_enum("root", "mode", &["A", "B", "C", "D"]).unwrap();
        consumer.set_ordinal(Some(3)).unwrap();
        assert!(matches!(
            shared.linker().new_linked_variable(consumer),
            Err(ChronicleError::VariableConflict(_))
        ));

        assert!(!shared.process_linked_push_requests(true));
        assert_eq!(mode.get_ordinal(), None);
    }

    #[test]
    fn test_request_pending_and_flush() {
        let (mut shared, _) = ramp(10);
        let linked = shared.linker().link_by_name("root.q").unwrap();
        linked.request_entire_buffer();
        assert!(shared.has_request_pending());

        shared.prepare_linked_buffers_for_pull().unwrap();
        assert!(!shared.has_request_pending());
        assert_eq!(linked.poll_requested_buffer_sample().unwrap().sample_length(), 10);

        linked.variable().set_double(100.0).unwrap();
        linked.push();
        shared.flush_linked_push_requests();
        assert!(!shared.process_linked_push_requests(true));
    }

    #[test]
    fn test_invalid_request_does_not_block_others() {
        let (mut shared, _) = ramp(10);
        let bad = shared.linker().link_by_name("root.q").unwrap();
        let good = shared.linker().link_by_name("root.q").unwrap();
        bad.request_buffer_window(0, 11);
        good.request_buffer_window(0, 2);

        assert!(matches!(
            shared.prepare_linked_buffers_for_pull(),
            Err(ChronicleError::InvalidSampleRequest { .. })
        ));
        assert!(good.is_requested_buffer_sample_available());
        assert!(!bad.is_requested_buffer_sample_available());
    }

    #[test]
    fn test_dropped_links_are_pruned() {
        let (mut shared, _) = ramp(4);
        let first = shared.linker().link_by_name("root.q").unwrap();
        let _second = shared.linker().link_by_name("root.q").unwrap();
        assert_eq!(shared.link_count(), 2);

        drop(first);
        assert_eq!(shared.link_count(), 1);
    }

    #[test]
    fn test_linked_properties_follow_ticks() {
        let mut shared = SharedBuffer::new(Registry::new("root").unwrap(), 8).unwrap();
        let mut properties = shared.linker().new_linked_buffer_properties().unwrap();

        shared.tick().unwrap();
        shared.tick().unwrap();
        assert!(properties.pull());
        assert_eq!(properties.properties().unwrap().current_index(), 2);
    }

    struct Doubler {
        q: Option<Variable>,
        visited: Vec<usize>,
        forward: bool,
    }

    impl BufferProcessor for Doubler {
        fn initialize(&mut self, registry: &Registry) {
            let id = registry.find_variable("root.q").unwrap();
            self.q = Some(registry.variable(id).clone());
        }

        fn go_forward(&self) -> bool {
            self.forward
        }

        fn process(&mut self, _start_index: usize, _end_index: usize, current_index: usize) {
            let q = self.q.as_ref().unwrap();
            q.set_double(q.get_double() * 2.0).unwrap();
            self.visited.push(current_index);
        }
    }

    #[test]
    fn test_apply_processor_over_active_window() {
        let (mut shared, q) = ramp(6);
        shared.set_in_point(4);
        shared.set_out_point(1);
        shared.set_current_index(0);

        let mut doubler = Doubler { q: None, visited: Vec::new(), forward: true };
        shared.apply_processor(&mut doubler);

        assert_eq!(doubler.visited, vec![4, 5, 0, 1]);
        assert_eq!(recorded(&shared), vec![0.0, 2.0, 2.0, 3.0, 8.0, 10.0]);
        assert_eq!(shared.properties().current_index(), 0);
        assert_eq!(q.get_double(), 0.0);

        let mut backward = Doubler { q: None, visited: Vec::new(), forward: false };
        shared.apply_processor(&mut backward);
        assert_eq!(backward.visited, vec![1, 0, 5, 4]);
    }

    #[test]
    fn test_dispose() {
        let (mut shared, _) = ramp(4);
        let linker = shared.linker();
        let linked = linker.link_by_name("root.q").unwrap();

        shared.dispose();
        assert!(shared.is_disposed());
        assert!(!linked.is_active());
        assert!(matches!(shared.tick(), Err(ChronicleError::Disposed)));
        assert!(!shared.resize_buffer(8));
        assert!(matches!(linker.link_by_name("root.q"), Err(ChronicleError::Disposed)));
    }
}
