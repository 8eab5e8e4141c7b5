// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parametric faces: a surface plus the rectangle of its (u, v) domain that
//! the face occupies.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A point in a face's parameter space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UvPoint {
    pub u: f64,
    pub v: f64,
}

impl UvPoint {
    pub fn new(u: f64, v: f64) -> Self {
        Self { u, v }
    }
}

/// Axis-aligned bounding rectangle in (u, v) parameter space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UvRect {
    pub min: UvPoint,
    pub max: UvPoint,
}

impl UvRect {
    /// Creates a rectangle from two opposite corners in any order.
    pub fn new(a: UvPoint, b: UvPoint) -> Self {
        Self {
            min: UvPoint::new(a.u.min(b.u), a.v.min(b.v)),
            max: UvPoint::new(a.u.max(b.u), a.v.max(b.v)),
        }
    }

    pub fn from_bounds(u_min: f64, v_min: f64, u_max: f64, v_max: f64) -> Self {
        Self::new(UvPoint::new(u_min, v_min), UvPoint::new(u_max, v_max))
    }

    pub fn width(&self) -> f64 {
        self.max.u - self.min.u
    }

    pub fn height(&self) -> f64 {
        self.max.v - self.min.v
    }

    /// True when the rectangle has zero extent in either direction.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Linear interpolation across the rectangle; `(0, 0)` is `min`,
    /// `(1, 1)` is `max`.
    pub fn lerp(&self, s: f64, t: f64) -> UvPoint {
        UvPoint::new(
            self.min.u + s * self.width(),
            self.min.v + t * self.height(),
        )
    }

    pub fn contains(&self, p: UvPoint) -> bool {
        p.u >= self.min.u && p.u <= self.max.u && p.v >= self.min.v && p.v <= self.max.v
    }
}

/// The underlying surface of a face.
#[derive(Debug, Clone, PartialEq)]
pub enum Surface {
    /// `origin + u * x_dir + v * y_dir`
    Plane {
        origin: Point3<f64>,
        x_dir: Vector3<f64>,
        y_dir: Vector3<f64>,
    },
    /// `u` is the angle around `axis` measured from `ref_dir` (radians),
    /// `v` the distance along `axis`.
    Cylinder {
        origin: Point3<f64>,
        axis: Vector3<f64>,
        ref_dir: Vector3<f64>,
        radius: f64,
    },
}

impl Surface {
    /// Evaluates the 3D point at parametric coordinates.
    pub fn evaluate(&self, uv: UvPoint) -> Point3<f64> {
        match self {
            Surface::Plane {
                origin,
                x_dir,
                y_dir,
            } => *origin + *x_dir * uv.u + *y_dir * uv.v,
            Surface::Cylinder {
                origin,
                axis,
                ref_dir,
                radius,
            } => {
                let (x, y) = Self::cylinder_frame(axis, ref_dir);
                let radial = x * uv.u.cos() + y * uv.u.sin();
                *origin + axis.normalize() * uv.v + radial * *radius
            }
        }
    }

    /// Unit normal at parametric coordinates.
    pub fn normal(&self, uv: UvPoint) -> Vector3<f64> {
        match self {
            Surface::Plane { x_dir, y_dir, .. } => x_dir.cross(y_dir).normalize(),
            Surface::Cylinder { axis, ref_dir, .. } => {
                let (x, y) = Self::cylinder_frame(axis, ref_dir);
                (x * uv.u.cos() + y * uv.u.sin()).normalize()
            }
        }
    }

    // Orthonormal (x, y) in the plane perpendicular to the axis.
    fn cylinder_frame(axis: &Vector3<f64>, ref_dir: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
        let z = axis.normalize();
        let x = (*ref_dir - z * ref_dir.dot(&z)).normalize();
        (x, z.cross(&x))
    }
}

/// Geometry of one face as handed out by the host: plain data, safe to move
/// to a worker thread.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceGeometry {
    pub surface: Surface,
    pub domain: UvRect,
}

impl FaceGeometry {
    pub fn new(surface: Surface, domain: UvRect) -> Self {
        Self { surface, domain }
    }

    /// A planar face spanning `width x height` from `origin` along the
    /// given directions, with a `[0, width] x [0, height]` domain.
    pub fn rectangle(
        origin: Point3<f64>,
        x_dir: Vector3<f64>,
        y_dir: Vector3<f64>,
        width: f64,
        height: f64,
    ) -> Self {
        Self {
            surface: Surface::Plane {
                origin,
                x_dir: x_dir.normalize(),
                y_dir: y_dir.normalize(),
            },
            domain: UvRect::from_bounds(0.0, 0.0, width, height),
        }
    }

    /// Parametric bounding rectangle of the face.
    pub fn domain(&self) -> UvRect {
        self.domain
    }

    pub fn evaluate(&self, uv: UvPoint) -> Point3<f64> {
        self.surface.evaluate(uv)
    }

    pub fn normal(&self, uv: UvPoint) -> Vector3<f64> {
        self.surface.normal(uv)
    }
}
