// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scalar fields evaluated by the sampling worker.

use field_lite_model::{FaceGeometry, UvPoint};
use nalgebra::Point3;

/// One node of the sampling grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSample {
    /// Grid index along u, `0..=density`.
    pub i: u32,
    /// Grid index along v, `0..=density`.
    pub j: u32,
    pub density: u32,
    /// Parametric coordinates of the node on the face.
    pub uv: UvPoint,
}

/// A scalar field over a face, evaluated on the worker thread.
pub trait FieldFunction: Send + Sync {
    fn evaluate(&self, sample: &GridSample) -> f64;
}

impl<F> FieldFunction for F
where
    F: Fn(&GridSample) -> f64 + Send + Sync,
{
    #[inline]
    fn evaluate(&self, sample: &GridSample) -> f64 {
        self(sample)
    }
}

/// Synthetic workload on grid indices: `min(i * (d - i), j * (d - j))`.
///
/// Zero on the domain boundary, largest in the middle. Stands in for a real
/// per-point computation.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridWorkload;

impl FieldFunction for GridWorkload {
    fn evaluate(&self, sample: &GridSample) -> f64 {
        let d = f64::from(sample.density);
        let i = f64::from(sample.i);
        let j = f64::from(sample.j);
        (i * (d - i)).min(j * (d - j))
    }
}

/// Distance from each face point to a fixed target point.
#[derive(Debug, Clone)]
pub struct DistanceField {
    face: FaceGeometry,
    target: Point3<f64>,
}

impl DistanceField {
    pub fn new(face: FaceGeometry, target: Point3<f64>) -> Self {
        Self { face, target }
    }
}

impl FieldFunction for DistanceField {
    fn evaluate(&self, sample: &GridSample) -> f64 {
        (self.face.evaluate(sample.uv) - self.target).norm()
    }
}
