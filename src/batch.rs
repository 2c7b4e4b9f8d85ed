//! Runs a set of independent units on a bounded pool, isolating failures.

use std::future::Future;

use anyhow::{Error, Result};
use futures::{stream, StreamExt};
use tracing::{info, warn};

use crate::cli::create_progress_bar;

#[derive(Debug)]
pub struct BatchOutcome<T> {
    pub items: Vec<T>,
    /// Label of each failed unit with its error.
    pub failures: Vec<(String, Error)>,
}

impl<T> BatchOutcome<T> {
    pub fn summary(&self) -> String {
        format!(
            "{} succeeded, {} failed",
            self.items.len(),
            self.failures.len()
        )
    }
}

/// Runs `work` over `units` with at most `workers` in flight.
///
/// Completion order is arbitrary; callers sort the results. A failing unit is
/// logged and left out without stopping the others.
pub async fn run<U, T, F, Fut>(
    units: Vec<U>,
    workers: usize,
    message: &str,
    label: impl Fn(&U) -> String,
    work: F,
) -> BatchOutcome<T>
where
    F: Fn(U) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let pb = create_progress_bar(units.len() as u64, message.to_string());

    let mut results = stream::iter(units)
        .map(|unit| {
            let name = label(&unit);
            let fut = work(unit);
            async move { (name, fut.await) }
        })
        .buffer_unordered(workers.max(1));

    let mut outcome = BatchOutcome {
        items: Vec::new(),
        failures: Vec::new(),
    };
    while let Some((name, result)) = results.next().await {
        match result {
            Ok(item) => outcome.items.push(item),
            Err(e) => {
                warn!(unit = %name, error = %e, "unit failed");
                outcome.failures.push((name, e));
            }
        }
        pb.inc(1);
    }

    pb.finish_with_message(format!("{} done", message.trim_end_matches("...")));
    info!("{}: {}", message.trim_end_matches("..."), outcome.summary());

    outcome
}

// -- Tests -------------------------------------------------------------------
