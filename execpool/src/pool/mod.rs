// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

mod concurrent;
mod serial;

pub use concurrent::{Admission, ConcurrentPool};
pub use serial::SerialPool;

use crate::error::Error;
use std::thread;

/// A unit of work accepted by the pools
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Spawn a named worker thread with an optional stack size
pub(crate) fn spawn_worker(
    thread_name: String,
    stack_size: Option<usize>,
    f: impl FnOnce() + Send + 'static,
) -> Result<thread::JoinHandle<()>, Error> {
    let mut builder = thread::Builder::new().name(thread_name);
    if let Some(stack_size) = stack_size {
        builder = builder.stack_size(stack_size);
    }
    builder
        .spawn(f)
        .map_err(|e| Error::Allocation((e, "could not spawn worker thread")))
}
