/// Account entity: balance guarded by its own lock.
pub mod account;

/// Cancellable, deadline-bearing context passed through every async operation.
pub mod context;

/// Account persistence interface, plus "in memory" implementation.
///
/// NOTE: the engine only talks to the trait, so a real database backend
/// can be dropped in without touching transfer logic.
pub mod store;

/// Thread-safe transfer counters.
pub mod stats;

/// Single transfers ([`transfer::engine`]) and batched transfers ([`transfer::bulk`]).
pub mod transfer;

/// Runtime knobs (timeouts, worker count, simulated store latency).
pub mod config;

/// Bootstraps the library from CSV files for the binary and integration tests.
pub mod bin_utils;
