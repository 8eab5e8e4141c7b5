// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Background sampling thread.
//!
//! The worker walks a `(density + 1) x (density + 1)` grid over the face's
//! parameter domain, evaluates the field at each node and appends the sample
//! to the shared [`ResultBuffer`]. It stops as soon as the buffer refuses a
//! sample, so cancellation takes effect after at most one more unit of work.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use field_lite_model::UvRect;

use crate::buffer::ResultBuffer;
use crate::error::Result;
use crate::field::{FieldFunction, GridSample};

/// The grid of parameter values a worker samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingGrid {
    pub domain: UvRect,
    pub density: u32,
}

impl SamplingGrid {
    pub fn new(domain: UvRect, density: u32) -> Self {
        Self { domain, density }
    }

    /// A zero-extent domain or zero density collapses to a single sample at
    /// the domain's minimum corner.
    pub fn is_degenerate(&self) -> bool {
        self.density == 0 || self.domain.is_degenerate()
    }

    /// Number of samples a full run produces.
    pub fn sample_count(&self) -> usize {
        if self.is_degenerate() {
            1
        } else {
            let n = (self.density as usize).saturating_add(1);
            n.saturating_mul(n)
        }
    }

    /// The grid node `(i, j)`, by linear interpolation across the domain.
    pub fn sample(&self, i: u32, j: u32) -> GridSample {
        let uv = if self.is_degenerate() {
            self.domain.min
        } else {
            let d = f64::from(self.density);
            self.domain.lerp(f64::from(i) / d, f64::from(j) / d)
        };
        GridSample {
            i,
            j,
            density: self.density,
            uv,
        }
    }

    fn last_index(&self) -> u32 {
        if self.is_degenerate() {
            0
        } else {
            self.density
        }
    }
}

/// How a worker thread ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// Every grid node was evaluated and accepted.
    Completed { samples: usize },
    /// The buffer was completed before the grid was exhausted.
    Cancelled { samples: usize },
}

impl WorkerOutcome {
    pub fn samples(&self) -> usize {
        match self {
            WorkerOutcome::Completed { samples } | WorkerOutcome::Cancelled { samples } => *samples,
        }
    }
}

/// Owns at most one background sampling thread.
pub struct WorkerAgent {
    grid: SamplingGrid,
    buffer: Arc<ResultBuffer>,
    field: Arc<dyn FieldFunction>,
    sample_delay: Duration,
    handle: Option<JoinHandle<WorkerOutcome>>,
}

impl std::fmt::Debug for WorkerAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerAgent")
            .field("grid", &self.grid)
            .field("sample_delay", &self.sample_delay)
            .field("alive", &self.is_thread_alive())
            .finish()
    }
}

impl WorkerAgent {
    pub fn new(
        grid: SamplingGrid,
        buffer: Arc<ResultBuffer>,
        field: Arc<dyn FieldFunction>,
        sample_delay: Duration,
    ) -> Self {
        Self {
            grid,
            buffer,
            field,
            sample_delay,
            handle: None,
        }
    }

    pub fn grid(&self) -> &SamplingGrid {
        &self.grid
    }

    /// The buffer this worker writes to.
    pub fn buffer(&self) -> &Arc<ResultBuffer> {
        &self.buffer
    }

    /// Spawns the sampling thread.
    ///
    /// Returns `Ok(false)` without doing anything if a thread is already
    /// running. A previous thread that has finished is joined first.
    pub fn start(&mut self) -> Result<bool> {
        if self.is_thread_alive() {
            return Ok(false);
        }
        self.wait_to_finish();

        let grid = self.grid;
        let buffer = Arc::clone(&self.buffer);
        let field = Arc::clone(&self.field);
        let delay = self.sample_delay;

        let handle = thread::Builder::new()
            .name("field-analysis".into())
            .spawn(move || run_sampling(grid, &buffer, field.as_ref(), delay))?;
        self.handle = Some(handle);

        tracing::debug!(
            density = grid.density,
            samples = grid.sample_count(),
            "Analysis worker started"
        );
        Ok(true)
    }

    pub fn is_thread_alive(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Blocks until the thread exits. Returns `None` if there was no thread
    /// or the field function panicked.
    pub fn wait_to_finish(&mut self) -> Option<WorkerOutcome> {
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(outcome) => Some(outcome),
            Err(_) => {
                tracing::error!("Analysis worker panicked");
                None
            }
        }
    }
}

/// The sampling loop. Runs on the worker thread.
fn run_sampling(
    grid: SamplingGrid,
    buffer: &ResultBuffer,
    field: &dyn FieldFunction,
    delay: Duration,
) -> WorkerOutcome {
    let last = grid.last_index();
    let mut samples = 0usize;

    for i in 0..=last {
        for j in 0..=last {
            if !delay.is_zero() {
                thread::sleep(delay);
            }
            let sample = grid.sample(i, j);
            let value = field.evaluate(&sample);
            if !buffer.add_result(sample.uv, value) {
                tracing::debug!(samples, "Analysis worker cancelled");
                return WorkerOutcome::Cancelled { samples };
            }
            samples += 1;
        }
    }

    tracing::debug!(samples, "Analysis worker finished");
    WorkerOutcome::Completed { samples }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::GridWorkload;
    use std::time::Instant;

    fn agent(domain: UvRect, density: u32, delay: Duration) -> WorkerAgent {
        WorkerAgent::new(
            SamplingGrid::new(domain, density),
            Arc::new(ResultBuffer::new()),
            Arc::new(GridWorkload),
            delay,
        )
    }

    #[test]
    fn grid_nodes_span_the_domain() {
        let grid = SamplingGrid::new(UvRect::from_bounds(1.0, 2.0, 5.0, 10.0), 4);
        assert_eq!(grid.sample_count(), 25);
        assert_eq!(grid.sample(0, 0).uv, grid.domain.min);
        assert_eq!(grid.sample(4, 4).uv, grid.domain.max);
        let mid = grid.sample(2, 1).uv;
        assert_eq!(mid.u, 3.0);
        assert_eq!(mid.v, 4.0);
    }

    #[test]
    fn sample_count_saturates_at_maximum_density() {
        let grid = SamplingGrid::new(UvRect::from_bounds(0.0, 0.0, 1.0, 1.0), u32::MAX);
        assert_eq!(grid.sample_count(), usize::MAX);
        assert_eq!(grid.sample(u32::MAX, 0).uv.u, 1.0);
    }

    #[test]
    fn full_run_fills_the_buffer() {
        let mut worker = agent(UvRect::from_bounds(0.0, 0.0, 4.0, 4.0), 4, Duration::ZERO);
        assert!(worker.start().unwrap());
        let outcome = worker.wait_to_finish().unwrap();

        assert_eq!(outcome, WorkerOutcome::Completed { samples: 25 });
        assert_eq!(worker.buffer().len(), 25);
        assert!(!worker.is_thread_alive());
    }

    #[test]
    fn values_follow_the_field_function() {
        let mut worker = agent(UvRect::from_bounds(0.0, 0.0, 4.0, 4.0), 4, Duration::ZERO);
        worker.start().unwrap();
        worker.wait_to_finish();

        let results = worker.buffer().get_results().unwrap();
        // Row-major over i, then j: node (2, 2) is the 13th sample.
        assert_eq!(results.values[2 * 5 + 2], 4.0);
        assert_eq!(results.values[0], 0.0);
        assert_eq!(results.values.iter().cloned().fold(f64::MIN, f64::max), 4.0);
    }

    #[test]
    fn degenerate_domains_take_one_sample() {
        for (domain, density) in [
            (UvRect::from_bounds(0.0, 0.0, 4.0, 4.0), 0),
            (UvRect::from_bounds(2.0, 2.0, 2.0, 2.0), 8),
            (UvRect::from_bounds(0.0, 1.0, 3.0, 1.0), 8),
        ] {
            let mut worker = agent(domain, density, Duration::ZERO);
            worker.start().unwrap();
            let outcome = worker.wait_to_finish().unwrap();
            assert_eq!(outcome, WorkerOutcome::Completed { samples: 1 });
            let results = worker.buffer().get_results().unwrap();
            assert_eq!(results.points, vec![domain.min]);
        }
    }

    #[test]
    fn start_is_refused_while_running() {
        let mut worker = agent(
            UvRect::from_bounds(0.0, 0.0, 1.0, 1.0),
            10,
            Duration::from_millis(20),
        );
        assert!(worker.start().unwrap());
        assert!(worker.is_thread_alive());
        assert!(!worker.start().unwrap());

        worker.buffer().set_completed();
        assert!(matches!(
            worker.wait_to_finish(),
            Some(WorkerOutcome::Cancelled { .. })
        ));
    }

    #[test]
    fn cancellation_is_observed_within_one_sample() {
        let delay = Duration::from_millis(25);
        let mut worker = agent(UvRect::from_bounds(0.0, 0.0, 1.0, 1.0), 50, delay);
        worker.start().unwrap();
        thread::sleep(delay * 3);

        let requested = Instant::now();
        worker.buffer().set_completed();
        let len_at_cancel = worker.buffer().len();
        let outcome = worker.wait_to_finish().unwrap();

        assert!(requested.elapsed() < delay * 20);
        assert_eq!(outcome, WorkerOutcome::Cancelled { samples: len_at_cancel });
    }

    #[test]
    fn wait_without_thread_is_a_no_op() {
        let mut worker = agent(UvRect::from_bounds(0.0, 0.0, 1.0, 1.0), 2, Duration::ZERO);
        assert!(worker.wait_to_finish().is_none());
        assert!(!worker.is_thread_alive());
    }

    #[test]
    fn panicking_field_is_contained() {
        let mut worker = WorkerAgent::new(
            SamplingGrid::new(UvRect::from_bounds(0.0, 0.0, 1.0, 1.0), 2),
            Arc::new(ResultBuffer::new()),
            Arc::new(|_: &GridSample| -> f64 { panic!("field failure") }),
            Duration::ZERO,
        );
        worker.start().unwrap();
        assert!(worker.wait_to_finish().is_none());
        assert!(worker.buffer().is_empty());
    }
}
