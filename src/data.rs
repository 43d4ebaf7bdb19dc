// Distributed under the OSI-approved BSD 2-Clause License.
// See accompanying LICENSE file for details.

//! Data entities
//!
//! These are the data structures used to represent a BulletML file.

mod document;
mod element;
mod expression;

pub use self::document::{Document, EntityError, Orientation};
pub use self::element::{Change, DirectionKind, Element, ElementKind};
pub use self::expression::{Expression, ExpressionContext, ExpressionError, Value};
pub use crate::parse::ParseError;
