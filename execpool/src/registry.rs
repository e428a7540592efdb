// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Executor registry

use crate::configuration::RegistryConfig;
use crate::error::Error;
use crate::pool::{Admission, ConcurrentPool, SerialPool};
use log::{debug, info};
use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::BuildHasher;
use std::sync::{Arc, Mutex};

/// Number of independent registry shards.
/// Both pools of one service hash onto the same shard, so teardown of a
/// service locks exactly one shard and never serializes against pools of
/// services on other shards.
const SHARD_COUNT: usize = 8;

/// Pool name suffix of concurrent executors
const CONCURRENT_SUFFIX: &str = "Executor";

/// Pool name suffix of serial executors
const SERIAL_SUFFIX: &str = "TransactionalExecutor";

/// Flavor of executor backing a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolKind {
    /// Bounded worker count, no queue, saturation absorbed by fallback
    Concurrent,
    /// Single worker, unbounded queue, strict submission order
    Serial,
}

/// Derive the unique pool name for the given service and pool kind
pub fn pool_name(service: &str, kind: PoolKind) -> String {
    match kind {
        PoolKind::Concurrent => format!("{service}{CONCURRENT_SUFFIX}"),
        PoolKind::Serial => format!("{service}{SERIAL_SUFFIX}"),
    }
}

/// Candidate service stems of a derived pool name.
/// A name ending in the serial suffix also ends in the concurrent suffix,
/// and a service name may itself end in "Transactional", so a pool name
/// alone does not determine the stem; both readings must be considered.
fn stem_candidates(pool_name: &str) -> [Option<&str>; 2] {
    [
        pool_name.strip_suffix(SERIAL_SUFFIX),
        pool_name.strip_suffix(CONCURRENT_SUFFIX),
    ]
}

/// Shared reference to one pool of either kind
#[derive(Clone)]
enum Pool {
    Concurrent(Arc<ConcurrentPool>),
    Serial(Arc<SerialPool>),
}

impl Pool {
    fn kind(&self) -> PoolKind {
        match self {
            Pool::Concurrent(_) => PoolKind::Concurrent,
            Pool::Serial(_) => PoolKind::Serial,
        }
    }

    fn name(&self) -> &str {
        match self {
            Pool::Concurrent(pool) => pool.name(),
            Pool::Serial(pool) => pool.name(),
        }
    }

    fn shutdown(&self) {
        match self {
            Pool::Concurrent(pool) => pool.shutdown(),
            Pool::Serial(pool) => pool.shutdown(),
        }
    }
}

/// Submittable handle to one pool of one service.
///
/// Handles are cheap to clone and remain valid after the pool has been torn
/// down; submitting through a stale handle fails with
/// [`Error::PoolClosed`](crate::error::Error::PoolClosed).
#[derive(Clone)]
pub struct Executor {
    service: String,
    pool: Pool,
}

impl Executor {
    /// The service this executor belongs to
    pub fn service(&self) -> &str {
        &self.service
    }

    /// The pool kind behind this handle
    pub fn kind(&self) -> PoolKind {
        self.pool.kind()
    }

    /// The derived name of the pool behind this handle
    pub fn pool_name(&self) -> &str {
        self.pool.name()
    }

    /// Check if both handles refer to the same underlying pool instance
    pub fn same_pool(&self, other: &Executor) -> bool {
        match (&self.pool, &other.pool) {
            (Pool::Concurrent(a), Pool::Concurrent(b)) => Arc::ptr_eq(a, b),
            (Pool::Serial(a), Pool::Serial(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

type ShardMap = HashMap<String, Pool>;

/// Registry of named, lazily created worker pools.
///
/// One registry instance is constructed at the application root and handed
/// to every service façade that needs pools; there is no implicit global.
/// All operations are safe to call from arbitrary threads.
pub struct ExecutorRegistry {
    config: RegistryConfig,
    shards: [Mutex<ShardMap>; SHARD_COUNT],
    hasher: RandomState,
}

impl ExecutorRegistry {
    /// Create a registry with the default pool configuration
    pub fn new() -> ExecutorRegistry {
        ExecutorRegistry::with_config(RegistryConfig::default())
    }

    /// Create a registry whose pools use the given configuration
    pub fn with_config(config: RegistryConfig) -> ExecutorRegistry {
        ExecutorRegistry {
            config,
            shards: std::array::from_fn(|_| Mutex::new(ShardMap::default())),
            hasher: RandomState::new(),
        }
    }

    /// Return the concurrent executor of the given service, creating it on
    /// first demand
    pub fn concurrent_executor(&self, service: &str) -> Result<Executor, Error> {
        self.get_or_create(service, PoolKind::Concurrent)
    }

    /// Return the serial executor of the given service, creating it on
    /// first demand
    pub fn serial_executor(&self, service: &str) -> Result<Executor, Error> {
        self.get_or_create(service, PoolKind::Serial)
    }

    /// Submit a unit of work to the given executor.
    ///
    /// Work on a serial executor runs strictly in submission order. Work
    /// that a saturated concurrent executor cannot admit is rerouted to the
    /// same service's serial executor, which is created on demand; the
    /// caller never observes saturation. Rerouted work is ordered only
    /// relative to other work on the serial pool, not relative to work that
    /// stayed on the concurrent pool.
    pub fn submit(
        &self,
        executor: &Executor,
        work: impl FnOnce() + Send + 'static,
    ) -> Result<(), Error> {
        match &executor.pool {
            Pool::Serial(pool) => pool.submit(Box::new(work)),
            Pool::Concurrent(pool) => match pool.try_submit(Box::new(work))? {
                Admission::Accepted => Ok(()),
                Admission::Rejected(job) => {
                    debug!(
                        "Pool {} is saturated, rerouting work to the serial executor",
                        pool.name()
                    );
                    let fallback = self.serial_executor(&executor.service)?;
                    self.submit(&fallback, job)
                }
            },
        }
    }

    /// Shut down and remove every pool belonging to the given service.
    ///
    /// Pools of other services are untouched, including services whose name
    /// starts with the given name. Safe to call repeatedly and for services
    /// that never created a pool.
    pub fn teardown(&self, service: &str) {
        // Both pools of the service live on its shard under the two derived
        // names; matching those names exactly cannot misread a service name
        // that happens to end in a suffix fragment
        let mut shard = self.shard(service).lock().expect("poisoned registry shard");
        for kind in [PoolKind::Concurrent, PoolKind::Serial] {
            let name = pool_name(service, kind);
            if let Some(pool) = shard.remove(&name) {
                pool.shutdown();
                info!("Removed pool {name}");
            }
        }
    }

    /// Shut down and remove the single pool registered under the exact
    /// name; no-op when absent
    pub fn remove_executor(&self, pool_name: &str) {
        // The name was sharded by the stem of the service that created it,
        // so every candidate reading of the name must be checked
        for stem in stem_candidates(pool_name).into_iter().flatten() {
            let mut shard = self.shard(stem).lock().expect("poisoned registry shard");
            if let Some(pool) = shard.remove(pool_name) {
                pool.shutdown();
                info!("Removed pool {pool_name}");
                return;
            }
        }
    }

    /// Number of live pools across all services
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.lock().expect("poisoned registry shard").len())
            .sum()
    }

    /// Check if no pool is currently registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn shard(&self, stem: &str) -> &Mutex<ShardMap> {
        let index = self.hasher.hash_one(stem) as usize % SHARD_COUNT;
        &self.shards[index]
    }

    fn get_or_create(&self, service: &str, kind: PoolKind) -> Result<Executor, Error> {
        assert!(!service.is_empty(), "service name must not be empty");
        let name = pool_name(service, kind);
        let mut shard = self.shard(service).lock().expect("poisoned registry shard");

        // The whole read-or-insert sequence runs under the shard lock, so
        // racing creators of the same name observe exactly one winner
        if let Some(pool) = shard.get(&name) {
            return Ok(Executor {
                service: service.to_owned(),
                pool: pool.clone(),
            });
        }

        let pool = match kind {
            PoolKind::Concurrent => {
                Pool::Concurrent(Arc::new(ConcurrentPool::new(&name, &self.config)))
            }
            PoolKind::Serial => {
                Pool::Serial(Arc::new(SerialPool::new(&name, self.config.stack_size)?))
            }
        };
        debug!("Created pool {name}");
        shard.insert(name, pool.clone());

        Ok(Executor {
            service: service.to_owned(),
            pool,
        })
    }
}

impl Default for ExecutorRegistry {
    fn default() -> Self {
        ExecutorRegistry::new()
    }
}

/////////////
// Tests
/////////////
