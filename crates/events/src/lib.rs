//! Session events and the pub/sub mechanics used to fan them out.
//!
//! Reward-ledger events are published here after they have been applied, so
//! that side concerns (scan-history persistence) never sit on the request path.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::{EventEnvelope, UserScoped};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
