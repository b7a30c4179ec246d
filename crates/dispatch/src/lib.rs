//! Job dispatch: the low-latency wake-up channel and the periodic sweep.
//!
//! The channel ([`JobSignals`]) tells listening workers that a job id is
//! ready; delivery is at-least-once and a lost signal only costs latency,
//! because the [`Sweep`] re-publishes stale jobs and the store's atomic
//! claim prevents double-processing either way.

pub mod signals;
pub mod sweep;

pub use signals::{DispatchError, JobSignals, PgJobSignals};
pub use sweep::{Sweep, SweepConfig};
