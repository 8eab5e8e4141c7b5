// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for host model operations.

use crate::keys::{ElementKey, FaceRef, PrimitiveId};

/// Result type alias for host model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while editing the document or pushing field data.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The element was deleted or never existed in this document.
    #[error("element not found: {0:?}")]
    ElementNotFound(ElementKey),

    /// The element exists but has no face at the referenced index.
    #[error("face not found: {0}")]
    FaceNotFound(FaceRef),

    /// A stable reference string could not be parsed.
    #[error("invalid stable reference: {0:?}")]
    InvalidReference(String),

    /// The spatial field primitive was removed or never added.
    #[error("field primitive not found: {0:?}")]
    PrimitiveNotFound(PrimitiveId),

    /// No result schema is registered at this index.
    #[error("result schema not registered: {0}")]
    SchemaNotFound(usize),

    /// Points and values pushed to a primitive must pair up one to one.
    #[error("field batch has {points} points but {values} values")]
    LengthMismatch { points: usize, values: usize },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}
