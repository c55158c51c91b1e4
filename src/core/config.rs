//! # Supervisor configuration.
//!
//! Provides [`SupervisorConfig`], centralized settings for the runtime core.
//!
//! ## Sentinel values
//! - `max_concurrent = 0` → unlimited (no global semaphore created)
//! - `unit_timeout = 0s` → no per-unit timeout

use std::time::Duration;

/// Global configuration for the supervisor.
///
/// ## Field semantics
/// - `grace`: drain deadline used when shutdown is triggered by an OS signal
/// - `max_concurrent`: how many accepted units may run at once (`0` = unlimited)
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `unit_timeout`: default hard timeout per unit (`0s` = none)
///
/// All fields are public. Prefer the helper accessors over sentinel checks.
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Drain deadline applied by [`Supervisor::shutdown_on_os_signal`](crate::Supervisor::shutdown_on_os_signal).
    ///
    /// Only bounds the wait in `wait_for_drain`; units are never force-killed.
    pub grace: Duration,

    /// Maximum number of units running concurrently.
    ///
    /// Accepted units beyond the limit wait for a slot; waiting observes cancellation.
    pub max_concurrent: usize,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Default hard timeout per unit.
    ///
    /// A unit may override it via [`WorkUnit::timeout`](crate::WorkUnit::timeout).
    /// Elapsing cancels the unit's token and yields `ErrorKind::Timeout`.
    pub unit_timeout: Duration,
}

impl SupervisorConfig {
    /// Returns the concurrency limit as an `Option` (`None` = unlimited).
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        if self.max_concurrent == 0 {
            None
        } else {
            Some(self.max_concurrent)
        }
    }

    /// Returns the default per-unit timeout as an `Option` (`None` = no timeout).
    #[inline]
    pub fn default_unit_timeout(&self) -> Option<Duration> {
        if self.unit_timeout == Duration::ZERO {
            None
        } else {
            Some(self.unit_timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for SupervisorConfig {
    /// Default configuration:
    ///
    /// - `grace = 30s`
    /// - `max_concurrent = 0` (unlimited)
    /// - `bus_capacity = 1024`
    /// - `unit_timeout = 0s` (no timeout)
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(30),
            max_concurrent: 0,
            bus_capacity: 1024,
            unit_timeout: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_map_to_none() {
        let cfg = SupervisorConfig {
            bus_capacity: 0,
            ..SupervisorConfig::default()
        };
        assert_eq!(cfg.concurrency_limit(), None);
        assert_eq!(cfg.default_unit_timeout(), None);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }

    #[test]
    fn explicit_values_pass_through() {
        let cfg = SupervisorConfig {
            max_concurrent: 4,
            unit_timeout: Duration::from_millis(250),
            ..SupervisorConfig::default()
        };
        assert_eq!(cfg.concurrency_limit(), Some(4));
        assert_eq!(cfg.default_unit_timeout(), Some(Duration::from_millis(250)));
    }
}
