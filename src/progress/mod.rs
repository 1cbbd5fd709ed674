//! Phase-based progress estimation.
//!
//! A remote generation call gives no progress feedback, so the studio
//! simulates it: each creative mode declares an ordered [`PhaseSequence`]
//! with expected durations, and a [`ProgressEstimator`] maps elapsed
//! wall-clock time onto a percentage and an active phase.
//!
//! The last one or two phases form the *final window*. Until the caller
//! signals that the real operation finished, the estimator parks at the
//! boundary of that window, so it never claims to be done early. After the
//! signal, the final window plays out and the completion callback fires
//! exactly once.
//!
//! [`EstimationRun`] holds the pure state machine and takes instants
//! explicitly; [`ProgressEstimator`] drives it from a tokio ticker.

mod estimator;
mod phase;
mod run;
mod sequences;

pub use estimator::{ProgressEstimator, ProgressEstimatorBuilder, DEFAULT_TICK_INTERVAL};
pub use phase::{Phase, PhaseSequence};
pub use run::{EstimationRun, ProgressSnapshot, RunState, TickOutcome};
pub use sequences::CreativeMode;
