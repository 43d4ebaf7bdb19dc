// Distributed under the OSI-approved BSD 2-Clause License.
// See accompanying LICENSE file for details.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::data::Value;
use crate::run::CoordinatePlane;

/// How to aim a fired bullet which has no `direction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultDirection {
    /// Aim at the target.
    Aim,
    /// Use the heading of the firing bullet.
    Inherit,
}

impl Default for DefaultDirection {
    fn default() -> Self {
        DefaultDirection::Aim
    }
}

/// Settings for running BulletML documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The difficulty, exposed as `$rank`.
    pub rank: Value,
    /// A fixed value for `$rand`.
    pub rand: Option<Value>,
    /// The seed for `$rand`.
    pub seed: u64,
    /// The plane bullets move in.
    pub plane: CoordinatePlane,
    /// The initial position bullets aim at.
    pub target: Vec3,
    /// The speed of fired bullets which do not specify one.
    pub default_speed: Value,
    /// The heading of fired bullets which do not specify one.
    pub default_direction: DefaultDirection,
    /// The most commands one bullet may run in a single frame.
    pub max_commands_per_step: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            rank: 0.5,
            rand: None,
            seed: 0,
            plane: CoordinatePlane::default(),
            target: Vec3::ZERO,
            default_speed: 1.,
            default_direction: DefaultDirection::default(),
            max_commands_per_step: 10_000,
        }
    }
}
