//! # Shutdown escalation: from graceful close to forced termination.
//!
//! ## State machine
//! ```text
//!            1st notification                 remaining hits 0
//! Running ────────────────────► ShuttingDown ─────────────────────► ForcedTermination
//!           (begin close)        { remaining }   (flush, exit hook)       (terminal)
//!                                   │    ▲
//!                                   └────┘ further notification: remaining -= 1, warn
//! ```
//!
//! With the default threshold of 10: notification 1 begins the graceful close,
//! notifications 2..=9 warn with 8..=1 remaining, notification 10 forces exit.
//! There is no way back to `Running`.
//!
//! The state machine ([`Escalation`]) is pure; [`handle_signals`] drives it from a
//! [`SignalSource`] and performs the side effects.

use std::io::Write;
use std::sync::Arc;

use crate::core::shutdown::SignalSource;
use crate::events::{Bus, Event, EventKind};

/// Hook invoked on forced termination. The default flushes stdio and exits the process.
pub type ExitHook = Arc<dyn Fn() + Send + Sync>;

/// Escalation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    /// Waiting for the first notification.
    Running,
    /// Graceful close in flight; `remaining` notifications until forced exit.
    ShuttingDown {
        /// Notifications left before forced exit.
        remaining: u32,
    },
    /// Terminal.
    ForcedTermination,
}

/// What the handler must do for one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// Begin the graceful close (not awaited).
    BeginShutdown {
        /// Notifications left before forced exit.
        remaining: u32,
    },
    /// Already shutting down; warn the operator.
    Warn {
        /// Notifications left before forced exit.
        remaining: u32,
    },
    /// Tolerance exhausted; terminate the process.
    ForceExit,
    /// Notification after forced exit was decided.
    Ignore,
}

/// Three-state escalation policy.
#[derive(Debug, Clone)]
pub struct Escalation {
    state: ShutdownState,
    threshold: u32,
}

impl Escalation {
    /// Creates a policy forcing exit on the `threshold`-th notification (min 2).
    pub fn new(threshold: u32) -> Self {
        Self {
            state: ShutdownState::Running,
            threshold: threshold.max(2),
        }
    }

    /// Current state.
    pub fn state(&self) -> ShutdownState {
        self.state
    }

    /// Applies one notification and returns the action to perform.
    pub fn on_signal(&mut self) -> SignalAction {
        match self.state {
            ShutdownState::Running => {
                let remaining = self.threshold - 1;
                self.state = ShutdownState::ShuttingDown { remaining };
                SignalAction::BeginShutdown { remaining }
            }
            ShutdownState::ShuttingDown { remaining } => {
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.state = ShutdownState::ForcedTermination;
                    SignalAction::ForceExit
                } else {
                    self.state = ShutdownState::ShuttingDown { remaining };
                    SignalAction::Warn { remaining }
                }
            }
            ShutdownState::ForcedTermination => SignalAction::Ignore,
        }
    }
}

/// Default [`ExitHook`]: flushes stdout/stderr and exits with status 1.
pub fn force_exit() -> ExitHook {
    Arc::new(|| {
        let _ = std::io::stdout().flush();
        let _ = std::io::stderr().flush();
        std::process::exit(1);
    })
}

/// Drives `escalation` from `source` until forced exit or until the source ends.
///
/// `begin_close` is called once, on the first notification, and must not block
/// (it spawns the graceful close). `exit` is called once, on the last one.
pub async fn handle_signals<S, F>(
    mut source: S,
    mut escalation: Escalation,
    bus: Bus,
    begin_close: F,
    exit: ExitHook,
) where
    S: SignalSource,
    F: Fn() + Send,
{
    while source.recv().await.is_some() {
        match escalation.on_signal() {
            SignalAction::BeginShutdown { remaining } => {
                bus.publish(Event::new(EventKind::ShutdownRequested).with_remaining(remaining));
                begin_close();
            }
            SignalAction::Warn { remaining } => {
                bus.publish(Event::new(EventKind::ShutdownEscalated).with_remaining(remaining));
            }
            SignalAction::ForceExit => {
                bus.publish(Event::new(EventKind::ForcedTermination));
                // Subscribers may never see the event above before the process dies.
                tracing::error!("interrupted too many times, forcing exit");
                exit();
                return;
            }
            SignalAction::Ignore => {}
        }
    }
}
