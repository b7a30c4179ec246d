//! Worker process internals: configuration and the claim/run loop.

pub mod config;
pub mod worker_loop;

pub use config::WorkerConfig;
pub use worker_loop::WorkerLoop;
