// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Stable handles into the host model.
//!
//! Elements and field primitives are keyed by `slotmap` keys: a slot index
//! plus a generation, so a key held across a deletion stops resolving
//! instead of aliasing whatever reuses the slot.

use std::fmt;
use std::str::FromStr;

use slotmap::{new_key_type, Key, KeyData};

use crate::error::Error;

new_key_type! {
    /// Key for an element (a wall, a roof, a mass) in a [`Document`](crate::Document).
    pub struct ElementKey;

    /// Key for a spatial field primitive in a [`SpatialFieldManager`](crate::SpatialFieldManager).
    pub struct PrimitiveId;
}

/// Stable reference to one face of one element.
///
/// The reference stays valid while the element is edited (its faces may
/// change shape) and stops resolving once the element is deleted.
///
/// The string form is `<element>:<face>`, where `<element>` is the key's
/// 64-bit FFI encoding (slot index and generation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceRef {
    pub element: ElementKey,
    pub face: usize,
}

impl FaceRef {
    pub fn new(element: ElementKey, face: usize) -> Self {
        Self { element, face }
    }

    /// Returns the stable string representation of this reference.
    pub fn to_stable_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FaceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.element.data().as_ffi(), self.face)
    }
}

impl FromStr for FaceRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidReference(s.to_string());
        let (element, face) = s.trim().split_once(':').ok_or_else(invalid)?;
        let element: u64 = element.parse().map_err(|_| invalid())?;
        let face: usize = face.parse().map_err(|_| invalid())?;
        Ok(Self {
            element: ElementKey::from(KeyData::from_ffi(element)),
            face,
        })
    }
}
