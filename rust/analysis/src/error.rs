// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the analysis pipeline.
//!
//! None of these are fatal to the host: the coordinator logs them and
//! reports a boolean, so a failed tick simply produces no results.

use field_lite_model::FaceRef;

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The analyzed face was deleted or no longer exists on its element.
    #[error("face reference no longer resolves: {0}")]
    FaceUnavailable(FaceRef),

    /// The OS refused to create the worker thread.
    #[error("failed to spawn analysis worker: {0}")]
    Spawn(#[from] std::io::Error),

    /// The host model rejected an operation (e.g. a stale field primitive).
    #[error("host model error: {0}")]
    Model(#[from] field_lite_model::Error),

    /// A configuration value could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}
