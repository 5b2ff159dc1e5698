//! Bus core: registration façade, posting protocol and construction.
//!
//! The public API from this module is [`EventBus`] and its [`EventBusBuilder`].
//!
//! Internal modules:
//! - [`bus`]: register / unregister / post, dead-event wrapping, drain loop;
//! - [`context`]: task-local queues implementing re-entrant posting;
//! - [`builder`]: assembles finder, reporter, dispatch presets and initial handlers.

mod builder;
mod bus;
mod context;

pub use builder::EventBusBuilder;
pub use bus::EventBus;
