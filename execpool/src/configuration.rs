// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Registry configuration

use std::time::Duration;

/// Upper bound on concurrently running workers per concurrent pool,
/// unless configured otherwise
pub const DEFAULT_MAX_WORKERS: usize = 20;

/// Idle time after which a concurrent pool worker retires,
/// unless configured otherwise
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(3);

/// Configuration applied to every pool created by an executor registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Upper bound on concurrently running workers in a concurrent pool
    pub(crate) max_workers: usize,
    /// Idle time after which a concurrent pool worker retires
    pub(crate) keep_alive: Duration,
    /// Workers' stack size
    pub(crate) stack_size: Option<usize>,
}

impl RegistryConfig {
    /// Create a configuration with the default pool parameters
    pub fn new() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            keep_alive: DEFAULT_KEEP_ALIVE,
            stack_size: None,
        }
    }

    /// Set the worker bound of concurrent pools
    pub fn max_workers(&mut self, max_workers: usize) -> &mut Self {
        assert!(max_workers > 0, "worker bound must be at least 1");
        self.max_workers = max_workers;
        self
    }

    /// Set the idle time after which a concurrent pool worker retires
    pub fn keep_alive(&mut self, keep_alive: Duration) -> &mut Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Set worker threads' stack size
    pub fn stack_size(&mut self, stack_size: usize) -> &mut Self {
        self.stack_size = Some(stack_size);
        self
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig::new()
    }
}

/////////////
// Tests
/////////////

#[test]
fn test_default_configuration() {
    let config = RegistryConfig::default();
    assert_eq!(config.max_workers, DEFAULT_MAX_WORKERS);
    assert_eq!(config.keep_alive, DEFAULT_KEEP_ALIVE);
    assert!(config.stack_size.is_none());
}

#[test]
fn test_chained_setters() {
    let mut config = RegistryConfig::new();
    config
        .max_workers(2)
        .keep_alive(Duration::from_millis(50))
        .stack_size(64 * 1024);
    assert_eq!(config.max_workers, 2);
    assert_eq!(config.keep_alive, Duration::from_millis(50));
    assert_eq!(config.stack_size, Some(64 * 1024));
}

#[test]
#[should_panic(expected = "worker bound must be at least 1")]
fn test_zero_worker_bound() {
    RegistryConfig::new().max_workers(0);
}
