//! Runtime core: build phase, lifecycle and shutdown.
//!
//! The public entry point of this module is [`Node`], built by [`NodeBuilder`].
//!
//! Internal modules:
//! - [`builder`]: opens storage and registers services in dependency order;
//! - [`node`]: lifecycle lock, start/close, stop signal;
//! - [`registry`]: type-keyed service registry with ordered start/stop;
//! - [`escalation`]: interrupt counting from graceful close to forced exit;
//! - [`shutdown`]: cross-platform interrupt sources.

mod builder;
mod escalation;
mod node;
mod registry;
mod shutdown;

pub use builder::NodeBuilder;
pub use escalation::{
    Escalation, ExitHook, ShutdownState, SignalAction, force_exit, handle_signals,
};
pub use node::Node;
pub use registry::{ServiceFault, ServiceRegistry};
pub use shutdown::{OsSignals, SignalSource};
