//! # RayOS Chronicle
//!
//! Recording and playback buffers for the history of every variable of a
//! running simulation, shared with independently clocked consumers.
//!
//! ## Architecture
//!
//! - **Ring Index**: in-point, out-point and current index of a circular buffer
//! - **Registry Buffer**: one circular history per variable of a namespace tree
//! - **Shared Buffer**: the single owner that records, plays back, crops and resizes
//! - **Linked Variables**: lock-free, last-write-wins mailboxes to consumers
//!
//! ## Example
//!
//! ```no_run
//! use rayos_chronicle::{Registry, ScalarKind, SharedBuffer};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut shared = SharedBuffer::new(Registry::new("root")?, 1024)?;
//!     let q = shared.add_variable("root.arm", "q", ScalarKind::Double)?;
//!
//!     // A consumer, possibly on another thread
//!     let linked = shared.linker().link_by_name("root.arm.q")?;
//!
//!     for i in 0..100 {
//!         q.set_double(i as f64 * 0.01)?;
//!         shared.tick()?;
//!     }
//!
//!     linked.pull();
//!     linked.request_active_buffer_only();
//!     shared.prepare_linked_buffers_for_pull()?;
//!     let history = linked.poll_requested_buffer_sample();
//!     assert!(history.is_some());
//!     Ok(())
//! }
//! ```

pub mod buffer_sample;
pub mod error;
pub mod linked_properties;
pub mod linked_registry;
pub mod linked_variable;
pub mod registry;
pub mod registry_buffer;
pub mod request;
pub mod ring_index;
pub mod shared_buffer;
pub mod types;
pub mod variable;
pub mod variable_buffer;

pub use buffer_sample::BufferSample;
pub use error::{ChronicleError, Result};
pub use linked_properties::LinkedBufferProperties;
pub use linked_registry::LinkedRegistry;
pub use linked_variable::LinkedVariable;
pub use registry::{Registry, RegistryId, VariableId};
pub use registry_buffer::RegistryBuffer;
pub use request::{CropRequest, FillRequest, PullRequest, PushRequest, SampleRequest};
pub use ring_index::RingIndex;
pub use shared_buffer::{BufferLinker, BufferProcessor, SharedBuffer};
pub use types::{ChronicleConfig, ScalarKind, ScalarValue};
pub use variable::Variable;
pub use variable_buffer::{ScalarArray, VariableBuffer};
