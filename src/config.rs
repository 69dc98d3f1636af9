//! # Node configuration.
//!
//! Provides [`Config`], the read-only snapshot the node is built from, and
//! [`ActorRole`], the selector deciding which actor service (if any) is registered.
//!
//! Values are expected to be produced by the embedding process (flags, files, env);
//! this crate does not parse any of those.
//!
//! ## Sentinel values
//! - `stop_timeout = 0s` → no per-service stop timeout (wait indefinitely)
//! - `force_exit_after < 2` → clamped to 2 (first notification begins shutdown,
//!   second forces exit)

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Logical name of the node database inside the data directory.
pub const SHARD_CHAIN_DB_NAME: &str = "shardchaindata";

/// Actor run by the node on top of the beacon service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActorRole {
    /// No actor: the node only runs networking, RPC client and beacon.
    #[default]
    None,
    /// Attests to collations every slot.
    Attester,
    /// Proposes collations every slot; also runs the transaction relay.
    Proposer,
}

impl ActorRole {
    /// Parses a role flag.
    ///
    /// Unrecognized values map to [`ActorRole::None`]; this is not an error.
    ///
    /// # Example
    /// ```
    /// use shardvisor::ActorRole;
    ///
    /// assert_eq!(ActorRole::from_flag("proposer"), ActorRole::Proposer);
    /// assert_eq!(ActorRole::from_flag("observer"), ActorRole::None);
    /// ```
    pub fn from_flag(flag: &str) -> Self {
        match flag {
            "attester" => ActorRole::Attester,
            "proposer" => ActorRole::Proposer,
            _ => ActorRole::None,
        }
    }

    /// Returns the flag spelling of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::None => "none",
            ActorRole::Attester => "attester",
            ActorRole::Proposer => "proposer",
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration of the node and of the services it builds.
///
/// ## Field semantics
/// - `data_dir`: directory holding the node database
/// - `in_memory`: keep the database in a temporary location removed on drop
/// - `actor`: which actor service to register
/// - `beacon_endpoint`: RPC provider the beacon service reads from
/// - `p2p_listen_addr`: address the networking service identifies itself with
/// - `slot_duration`: beacon slot tick period
/// - `tx_interval`: period of the transaction relay (proposer only)
/// - `stop_timeout`: per-service stop bound (`0s` = none)
/// - `force_exit_after`: interrupt notifications until forced termination
/// - `bus_capacity`: lifecycle event bus ring buffer size (min 1)
#[derive(Clone, Debug)]
pub struct Config {
    /// Directory holding the node database.
    pub data_dir: PathBuf,

    /// Keeps the database in a temporary location instead of `data_dir`.
    pub in_memory: bool,

    /// Actor service to register on top of the beacon service.
    pub actor: ActorRole,

    /// Endpoint of the beacon RPC provider.
    ///
    /// Only checked when the RPC client starts; construction never contacts it.
    pub beacon_endpoint: String,

    /// Socket address the networking service identifies itself with.
    pub p2p_listen_addr: String,

    /// Period between beacon slots.
    pub slot_duration: Duration,

    /// Period between relayed transactions.
    pub tx_interval: Duration,

    /// Maximum time a single service may take to stop.
    ///
    /// - `Duration::ZERO` = wait indefinitely; only the forced-exit escalation can
    ///   interrupt a hung `stop`
    /// - `> 0` = a service exceeding it is recorded as a stop fault and skipped
    pub stop_timeout: Duration,

    /// Number of interrupt notifications after which the process is force-exited.
    ///
    /// The first notification begins graceful shutdown; the rest are tolerated
    /// with warnings until this count is reached.
    pub force_exit_after: u32,

    /// Capacity of the lifecycle event bus.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns the per-service stop timeout as an `Option`.
    ///
    /// - `None` → no timeout
    /// - `Some(d)` → each `stop` call bounded by `d`
    #[inline]
    pub fn stop_timeout(&self) -> Option<Duration> {
        if self.stop_timeout == Duration::ZERO {
            None
        } else {
            Some(self.stop_timeout)
        }
    }

    /// Returns the forced-exit threshold clamped to a minimum of 2.
    #[inline]
    pub fn force_exit_after_clamped(&self) -> u32 {
        self.force_exit_after.max(2)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `data_dir = ./shardnode`, on disk
    /// - `actor = none`
    /// - `beacon_endpoint = http://localhost:4000/`
    /// - `p2p_listen_addr = 0.0.0.0:30303`
    /// - `slot_duration = 8s`, `tx_interval = 1s`
    /// - `stop_timeout = 0s` (no timeout)
    /// - `force_exit_after = 10`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("shardnode"),
            in_memory: false,
            actor: ActorRole::None,
            beacon_endpoint: "http://localhost:4000/".to_string(),
            p2p_listen_addr: "0.0.0.0:30303".to_string(),
            slot_duration: Duration::from_secs(8),
            tx_interval: Duration::from_secs(1),
            stop_timeout: Duration::ZERO,
            force_exit_after: 10,
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_flags() {
        assert_eq!(ActorRole::from_flag("attester"), ActorRole::Attester);
        assert_eq!(ActorRole::from_flag("proposer"), ActorRole::Proposer);
        assert_eq!(ActorRole::from_flag("none"), ActorRole::None);
        assert_eq!(ActorRole::from_flag(""), ActorRole::None);
        assert_eq!(ActorRole::from_flag("Proposer"), ActorRole::None);
    }

    #[test]
    fn test_sentinels() {
        let mut cfg = Config::default();
        assert_eq!(cfg.stop_timeout(), None);
        assert_eq!(cfg.force_exit_after_clamped(), 10);

        cfg.stop_timeout = Duration::from_millis(250);
        cfg.force_exit_after = 0;
        cfg.bus_capacity = 0;
        assert_eq!(cfg.stop_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(cfg.force_exit_after_clamped(), 2);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
