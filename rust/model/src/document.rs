// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The host document: elements with parametric faces, stored in a slot map.
//!
//! Every edit bumps the document version and the edited element's version,
//! and returns a [`DocumentChange`] describing what was touched. Hosts hand
//! that change to their change listeners; listeners must not edit the
//! document from inside the notification.

use slotmap::SlotMap;

use crate::error::{Error, Result};
use crate::keys::{ElementKey, FaceRef};
use crate::surface::FaceGeometry;

/// Data stored for an element.
#[derive(Debug, Clone)]
pub struct ElementData {
    pub name: String,
    pub faces: Vec<FaceGeometry>,
    /// Incremented on every edit of this element.
    pub version: u64,
}

/// Elements touched by one document edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentChange {
    pub modified: Vec<ElementKey>,
    pub deleted: Vec<ElementKey>,
    /// Document version after the edit.
    pub version: u64,
}

impl DocumentChange {
    /// True if the element was modified or deleted by this change.
    pub fn affects(&self, element: ElementKey) -> bool {
        self.modified.contains(&element) || self.deleted.contains(&element)
    }

    pub fn is_empty(&self) -> bool {
        self.modified.is_empty() && self.deleted.is_empty()
    }
}

/// Resolves stable face references against the current document state.
pub trait FaceResolver {
    /// Returns a copy of the face's geometry, or `None` when the reference no
    /// longer resolves (element deleted, face index out of range).
    fn resolve_face(&self, reference: &FaceRef) -> Option<FaceGeometry>;

    /// Resolves the string form of a [`FaceRef`].
    fn resolve_stable(&self, stable: &str) -> Option<FaceGeometry> {
        let reference: FaceRef = stable.parse().ok()?;
        self.resolve_face(&reference)
    }
}

/// In-memory document owning all elements.
///
/// # Example
///
/// ```
/// use field_lite_model::{Document, FaceGeometry, FaceResolver, Point3, Vector3};
///
/// let mut doc = Document::new();
/// let wall = doc.add_element(
///     "Wall",
///     vec![FaceGeometry::rectangle(Point3::origin(), Vector3::x(), Vector3::z(), 4.0, 3.0)],
/// );
/// let face = doc.face_ref(wall, 0).unwrap();
/// assert!(doc.resolve_face(&face).is_some());
/// ```
#[derive(Debug, Default)]
pub struct Document {
    elements: SlotMap<ElementKey, ElementData>,
    version: u64,
}

impl Document {
    /// Creates a new, empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an element owning the given faces.
    pub fn add_element(&mut self, name: impl Into<String>, faces: Vec<FaceGeometry>) -> ElementKey {
        self.version += 1;
        let name = name.into();
        let key = self.elements.insert(ElementData {
            name,
            faces,
            version: 0,
        });
        tracing::debug!(element = ?key, version = self.version, "Element added");
        key
    }

    /// Returns the element data for the given key, or `None` if not found.
    pub fn element(&self, key: ElementKey) -> Option<&ElementData> {
        self.elements.get(key)
    }

    /// Returns the number of elements in the document.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Document version; incremented by every edit.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Builds a checked reference to face `index` of `element`.
    pub fn face_ref(&self, element: ElementKey, index: usize) -> Result<FaceRef> {
        let data = self
            .elements
            .get(element)
            .ok_or(Error::ElementNotFound(element))?;
        let reference = FaceRef::new(element, index);
        if index >= data.faces.len() {
            return Err(Error::FaceNotFound(reference));
        }
        Ok(reference)
    }

    /// Edits one face in place.
    pub fn modify_face(
        &mut self,
        reference: &FaceRef,
        edit: impl FnOnce(&mut FaceGeometry),
    ) -> Result<DocumentChange> {
        let data = self
            .elements
            .get_mut(reference.element)
            .ok_or(Error::ElementNotFound(reference.element))?;
        let face = data
            .faces
            .get_mut(reference.face)
            .ok_or(Error::FaceNotFound(*reference))?;
        edit(face);
        data.version += 1;
        self.version += 1;

        tracing::debug!(face = %reference, version = self.version, "Face modified");
        Ok(DocumentChange {
            modified: vec![reference.element],
            deleted: Vec::new(),
            version: self.version,
        })
    }

    /// Replaces one face's geometry.
    pub fn replace_face(&mut self, reference: &FaceRef, geometry: FaceGeometry) -> Result<DocumentChange> {
        self.modify_face(reference, |face| *face = geometry)
    }

    /// Deletes an element. References to its faces stop resolving, even if
    /// the slot is later reused.
    pub fn delete_element(&mut self, key: ElementKey) -> Result<DocumentChange> {
        self.elements.remove(key).ok_or(Error::ElementNotFound(key))?;
        self.version += 1;

        tracing::debug!(element = ?key, version = self.version, "Element deleted");
        Ok(DocumentChange {
            modified: Vec::new(),
            deleted: vec![key],
            version: self.version,
        })
    }
}

impl FaceResolver for Document {
    fn resolve_face(&self, reference: &FaceRef) -> Option<FaceGeometry> {
        self.elements
            .get(reference.element)?
            .faces
            .get(reference.face)
            .cloned()
    }
}
