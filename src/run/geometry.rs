// Distributed under the OSI-approved BSD 2-Clause License.
// See accompanying LICENSE file for details.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::data::Value;

/// The plane in which bullets move.
///
/// Angles are in degrees: `0` points along the plane's "up" axis and angles grow clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordinatePlane {
    /// Up is `+y`, right is `+x`.
    XY,
    /// Up is `+y`, right is `+z`.
    YZ,
}

impl Default for CoordinatePlane {
    fn default() -> Self {
        CoordinatePlane::XY
    }
}

impl CoordinatePlane {
    /// The axis an angle of `0` points along.
    pub fn up(self) -> Vec3 {
        Vec3::Y
    }

    /// The axis an angle of `90` points along.
    pub fn right(self) -> Vec3 {
        match self {
            CoordinatePlane::XY => Vec3::X,
            CoordinatePlane::YZ => Vec3::Z,
        }
    }

    /// Build a vector from its horizontal and vertical components in the plane.
    pub fn compose(self, horizontal: Value, vertical: Value) -> Vec3 {
        self.right() * horizontal + self.up() * vertical
    }

    /// Split a vector into its horizontal and vertical components in the plane.
    pub fn components(self, v: Vec3) -> (Value, Value) {
        (v.dot(self.right()), v.dot(self.up()))
    }

    /// The unit vector for an angle.
    pub fn vector(self, degrees: Value) -> Vec3 {
        let (sin, cos) = degrees.to_radians().sin_cos();
        self.compose(sin, cos)
    }

    /// The angle from one point towards another, in `[0, 360)`.
    ///
    /// Coincident points give an angle of `0`.
    pub fn angle_between(self, from: Vec3, to: Vec3) -> Value {
        let (horizontal, vertical) = self.components(to - from);
        if horizontal == 0. && vertical == 0. {
            return 0.;
        }

        normalize_degrees(horizontal.atan2(vertical).to_degrees())
    }
}

/// Convert an angle to a unit vector within the given plane.
pub fn convert_angle_to_vector(degrees: Value, plane: CoordinatePlane) -> Vec3 {
    plane.vector(degrees)
}

/// Wrap an angle into `[0, 360)`.
pub fn normalize_degrees(degrees: Value) -> Value {
    let wrapped = degrees.rem_euclid(360.);
    // Tiny negative inputs round up to exactly 360.
    if wrapped >= 360. {
        0.
    } else {
        wrapped
    }
}

/// The signed turn of at most half a revolution which takes `from` to `to`.
pub fn shortest_turn(from: Value, to: Value) -> Value {
    let delta = normalize_degrees(to - from);
    if delta > 180. {
        delta - 360.
    } else {
        delta
    }
}
