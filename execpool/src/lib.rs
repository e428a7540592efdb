// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Execpool is a process-wide registry of named, lazily created worker pools
//! ("executors") backing asynchronous service calls.
//!
//! # Executors
//!
//! Each service owns up to two pools, created on first demand and identified
//! by a name derived from the service name. The *concurrent* executor runs
//! work on a bounded, elastic set of worker threads and never queues. The
//! *serial* executor runs work on a single worker thread, strictly in
//! submission order, with an unbounded queue.
//!
//! # Fallback routing
//!
//! Work that a saturated concurrent executor cannot admit is not failed and
//! not queued. The [registry](crate::registry::ExecutorRegistry) reroutes it
//! to the same service's serial executor, creating that pool if it does not
//! exist yet. Callers never observe saturation.
//!
//! # Teardown
//!
//! When a service is disposed, [`teardown`](crate::registry::ExecutorRegistry::teardown)
//! shuts down both of its pools immediately and removes them from the
//! registry. Pools of other services are not affected. Every service owner
//! must call it once at end of life, otherwise its worker threads leak for
//! the remaining lifetime of the process.

pub mod configuration;
pub mod error;
pub mod pool;
pub mod registry;

/// Re-export the public API
pub mod prelude {
    pub use crate::configuration::RegistryConfig;
    pub use crate::error::Error;
    pub use crate::registry::{pool_name, Executor, ExecutorRegistry, PoolKind};
}
