// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Thread-safe exchange point between the sampling worker and the host.
//!
//! One lock guards everything. Reads hand back the *whole* accumulated
//! result set, not a delta: the consumer replaces what it displays with each
//! successful read.

use field_lite_model::UvPoint;
use parking_lot::Mutex;

/// Every sample accumulated so far, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldResults {
    pub points: Vec<UvPoint>,
    pub values: Vec<f64>,
}

impl FieldResults {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Default)]
struct BufferState {
    // `points` and `values` always have the same length.
    points: Vec<UvPoint>,
    values: Vec<f64>,
    completed: bool,
    // Length at the last successful read; never exceeds `values.len()`.
    last_read: usize,
}

/// Shared result buffer, written by one worker and read by one coordinator.
///
/// # Example
///
/// ```
/// use field_lite_analysis::ResultBuffer;
/// use field_lite_model::UvPoint;
///
/// let buffer = ResultBuffer::new();
/// assert!(buffer.add_result(UvPoint::new(0.0, 0.0), 1.0));
/// assert_eq!(buffer.get_results().unwrap().len(), 1);
/// assert!(buffer.get_results().is_none());
///
/// buffer.set_completed();
/// assert!(!buffer.add_result(UvPoint::new(1.0, 0.0), 2.0));
/// ```
#[derive(Debug, Default)]
pub struct ResultBuffer {
    state: Mutex<BufferState>,
}

impl ResultBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sample unless the buffer has been completed.
    ///
    /// Returns `false` (and changes nothing) once [`set_completed`] has been
    /// called. This is where the worker observes cancellation.
    ///
    /// [`set_completed`]: ResultBuffer::set_completed
    pub fn add_result(&self, point: UvPoint, value: f64) -> bool {
        let mut state = self.state.lock();
        if state.completed {
            return false;
        }
        state.points.push(point);
        state.values.push(value);
        true
    }

    /// Returns all accumulated samples if any arrived since the last
    /// successful read, and advances the read watermark.
    pub fn get_results(&self) -> Option<FieldResults> {
        let mut state = self.state.lock();
        let len = state.values.len();
        if len == state.last_read {
            return None;
        }
        state.last_read = len;
        Some(FieldResults {
            points: state.points.clone(),
            values: state.values.clone(),
        })
    }

    /// Marks the buffer complete. Idempotent and irreversible.
    pub fn set_completed(&self) {
        self.state.lock().completed = true;
    }

    pub fn is_completed(&self) -> bool {
        self.state.lock().completed
    }

    /// Number of samples accumulated so far.
    pub fn len(&self) -> usize {
        self.state.lock().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
