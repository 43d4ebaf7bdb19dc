// Distributed under the OSI-approved BSD 2-Clause License.
// See accompanying LICENSE file for details.

//! Facilities for running a BulletML document.
//!
//! An [`Executor`] steps the actions of [`Bullet`]s once per frame; a [`Context`] carries the
//! state shared between them (aim target, rank, random numbers, and sequence values).

mod bullet;
mod change;
mod config;
mod context;
mod executor;
mod geometry;
mod runner;

pub use self::bullet::Bullet;
pub use self::change::TimedChange;
pub use self::config::{Config, DefaultDirection};
pub use self::context::{Context, SequenceState};
pub use self::executor::Executor;
pub use self::geometry::{
    convert_angle_to_vector, normalize_degrees, shortest_turn, CoordinatePlane,
};
pub use self::runner::{ActionRunner, Parameters};
