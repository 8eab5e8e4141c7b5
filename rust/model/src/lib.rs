// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Field-Lite Model
//!
//! A small in-memory stand-in for the host application's object model, as
//! seen by a surface analysis:
//!
//! - a [`Document`] of elements, each owning parametric faces, stored in a
//!   slot map so that references are generation-checked handles rather than
//!   pointers into mutable state;
//! - [`FaceRef`], the stable reference to one face, with a compact string
//!   form that survives document edits and fails to resolve after deletion;
//! - [`SpatialFieldManager`], the visualization sink that receives batches of
//!   `(uv, value)` samples tagged by a registered [`ResultSchema`].
//!
//! The analysis pipeline only sees these through the [`FaceResolver`] and
//! [`FieldSink`] traits.

pub mod document;
pub mod error;
pub mod fields;
pub mod keys;
pub mod snapshot;
pub mod surface;

pub use document::{Document, DocumentChange, ElementData, FaceResolver};
pub use error::{Error, Result};
pub use fields::{FieldPrimitive, FieldSink, ResultSchema, SchemaIndex, SpatialFieldManager};
pub use keys::{ElementKey, FaceRef, PrimitiveId};
pub use snapshot::{FieldSnapshot, PrimitiveSnapshot};
pub use surface::{FaceGeometry, Surface, UvPoint, UvRect};

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};
