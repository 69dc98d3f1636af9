//! # Lifecycle event subscribers.
//!
//! ## Architecture
//! ```text
//! Registry/Node ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit(&Event)
//!                                                              │
//!                                                ┌─────────────┼─────────────┐
//!                                                ▼             ▼             ▼
//!                                            LogWriter      Custom         ...
//! ```
//!
//! Implement [`Subscribe`] and pass it to
//! [`NodeBuilder::with_subscribers`](crate::NodeBuilder::with_subscribers) to observe
//! service lifecycle transitions.

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
