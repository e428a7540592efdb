// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Execpool error implementation

/// Execpool error type
#[non_exhaustive]
#[derive(Debug)]
pub enum Error {
    /// Work was submitted to a pool that has been shut down
    PoolClosed(&'static str),
    /// The operating system refused to allocate a worker thread
    Allocation((std::io::Error, &'static str)),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::PoolClosed(description) => write!(f, "Pool closed, {}", description),
            Error::Allocation((e, description)) => {
                write!(f, "Allocation error: {}, {}", description, e)
            }
        }
    }
}
