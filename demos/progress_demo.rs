//! Progress estimation without a remote call.
//!
//! Run with: `cargo run --example progress_demo -- [seconds]`
//!
//! Simulates a generation that takes the given number of seconds (default
//! 6) and prints every snapshot the estimator publishes.

use nb_studio::progress::{CreativeMode, ProgressEstimator};
use std::time::Duration;

#[tokio::main]
async fn main() {
    let work_secs: u64 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(6);

    let estimator = ProgressEstimator::builder()
        .tick_interval(Duration::from_millis(250))
        .on_complete(|| println!("-- completion callback fired"))
        .build();

    let phases = CreativeMode::SingleEdit.phases();
    let mut updates = estimator.subscribe();
    let printer = tokio::spawn({
        let phases = phases.clone();
        async move {
            while updates.changed().await.is_ok() {
                let snapshot = *updates.borrow_and_update();
                let label = phases
                    .get(snapshot.phase_index)
                    .map(|p| p.label.as_str())
                    .unwrap_or_default();
                println!(
                    "{:>5.1}%  {:<28} {:>5.1}s left  {:?}",
                    snapshot.percent, label, snapshot.seconds_remaining, snapshot.state
                );
                if snapshot.state.is_terminal() {
                    break;
                }
            }
        }
    });

    estimator
        .track(phases, tokio::time::sleep(Duration::from_secs(work_secs)))
        .await;
    let _ = printer.await;
}
