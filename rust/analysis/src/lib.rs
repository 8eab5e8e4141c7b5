// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Field-Lite Analysis
//!
//! Long-running surface analysis that never blocks the host's UI thread.
//!
//! A [`WorkerAgent`] samples a scalar field over a face's parameter domain on
//! a background thread and appends each sample to a shared [`ResultBuffer`].
//! The [`AnalysisCoordinator`] lives on the host thread: on every idle tick it
//! drains the buffer into the host's spatial field display, and when the
//! analyzed face is edited it stops the worker and defers the restart to the
//! next tick, where the document is safe to touch again.
//!
//! Cancellation is cooperative. The buffer's `completed` flag is the only
//! signal; the worker observes it the next time it tries to add a sample.
//!
//! [`AnalysisSession`] is the host-application context that wires the
//! coordinator to idle, document-changed and document-closing callbacks.

pub mod buffer;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod field;
pub mod session;
pub mod worker;

pub use buffer::{FieldResults, ResultBuffer};
pub use config::{AnalysisConfig, FieldKind};
pub use coordinator::{AnalysisCoordinator, AnalysisState};
pub use error::{AnalysisError, Result};
pub use field::{DistanceField, FieldFunction, GridSample, GridWorkload};
pub use session::AnalysisSession;
pub use worker::{SamplingGrid, WorkerAgent, WorkerOutcome};
