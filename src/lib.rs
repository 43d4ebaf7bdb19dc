// Distributed under the OSI-approved BSD 2-Clause License.
// See accompanying LICENSE file for details.

//! BulletML
//!
//! A BulletML document model and a frame-stepped interpreter for it.
//!
//! Documents are parsed into an immutable tree of [`data::Element`]s. Each
//! [`run::Bullet`] carries its own stack of suspended action frames which an
//! [`run::Executor`] advances by one frame per call to [`run::Executor::step`].

#![warn(missing_docs)]

pub mod data;
mod parse;
pub mod run;
