// Distributed under the OSI-approved BSD 2-Clause License.
// See accompanying LICENSE file for details.

use std::collections::hash_map::HashMap;
use std::rc::Rc;

use thiserror::Error;

use crate::data::{Element, ElementKind};
use crate::parse::{self, ParseError};

/// An error related to entity searches.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    /// An entity with the given name could not be found.
    #[error("could not find {} entity `{}`", kind, label)]
    CannotFind {
        /// The kind of the requested entity.
        kind: ElementKind,
        /// The label for the requested entity.
        label: String,
    },
    /// A reference does not name its target.
    #[error("{} reference without a label", kind)]
    MissingLabel {
        /// The kind of the reference.
        kind: ElementKind,
    },
    /// An element which is not a reference was used as one.
    #[error("`{}` is not a reference", kind)]
    NotAReference {
        /// The kind of the element.
        kind: ElementKind,
    },
}

impl EntityError {
    fn cannot_find(kind: ElementKind, label: &str) -> Self {
        Self::CannotFind {
            kind,
            label: label.into(),
        }
    }
}

/// The orientation of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// For games with a toroidal topology.
    None,
    /// For games with a vertical orientation.
    Vertical,
    /// For games with a horizontal orientation.
    Horizontal,
}

impl Orientation {
    fn from_attribute(kind: Option<&str>) -> Self {
        match kind {
            Some("vertical") => Orientation::Vertical,
            Some("horizontal") => Orientation::Horizontal,
            _ => Orientation::None,
        }
    }

    /// The "up" direction for the given orientation.
    pub fn up(self, dir: f32) -> f32 {
        if let Orientation::Horizontal = self {
            dir - 90.
        } else {
            dir
        }
    }

    /// Whether the horizontal and vertical axes are exchanged.
    pub fn swaps_axes(self) -> bool {
        self == Orientation::Horizontal
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Orientation::None
    }
}

/// A parsed BulletML document.
///
/// Every labeled `bullet`, `action`, and `fire` in the tree is indexed by its label. When a label
/// is used more than once within a category, the later element in document order is the one
/// found by lookups.
#[derive(Debug, Clone, Default)]
pub struct Document {
    root: Option<Rc<Element>>,
    orientation: Orientation,
    bullets: HashMap<String, Rc<Element>>,
    actions: HashMap<String, Rc<Element>>,
    fires: HashMap<String, Rc<Element>>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a document from XML text.
    pub fn parse<X>(xml: X) -> Result<Self, ParseError>
    where
        X: AsRef<str>,
    {
        let root = parse::read_element(xml.as_ref())?;
        let mut document = Self::new();
        document.set_root(root);
        Ok(document)
    }

    /// Set the root element of the document.
    pub fn set_root(&mut self, root: Element) {
        let root = Rc::new(root);

        self.orientation = Orientation::from_attribute(root.attribute("type"));
        self.bullets.clear();
        self.actions.clear();
        self.fires.clear();
        self.index(&root);

        self.root = Some(root);
    }

    fn index(&mut self, element: &Rc<Element>) {
        if let Some(label) = element.label() {
            let map = match element.kind() {
                ElementKind::Bullet => Some(&mut self.bullets),
                ElementKind::Action => Some(&mut self.actions),
                ElementKind::Fire => Some(&mut self.fires),
                _ => None,
            };

            if let Some(map) = map {
                if map.insert(label.into(), element.clone()).is_some() {
                    tracing::debug!(
                        kind = %element.kind(),
                        label,
                        "duplicate label; the later entity takes precedence"
                    );
                }
            }
        }

        element
            .children()
            .iter()
            .for_each(|child| self.index(child));
    }

    /// The root element of the document.
    pub fn root(&self) -> Option<&Rc<Element>> {
        self.root.as_ref()
    }

    /// The orientation of the game.
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Find an entity of a given kind by its label.
    pub fn find(&self, kind: ElementKind, label: &str) -> Option<&Rc<Element>> {
        match kind {
            ElementKind::Bullet => self.bullets.get(label),
            ElementKind::Action => self.actions.get(label),
            ElementKind::Fire => self.fires.get(label),
            _ => None,
        }
    }

    /// Find a labeled bullet.
    pub fn labeled_bullet(&self, label: &str) -> Option<&Rc<Element>> {
        self.bullets.get(label)
    }

    /// Find a labeled action.
    pub fn labeled_action(&self, label: &str) -> Option<&Rc<Element>> {
        self.actions.get(label)
    }

    /// Find a labeled fire.
    pub fn labeled_fire(&self, label: &str) -> Option<&Rc<Element>> {
        self.fires.get(label)
    }

    /// The `top` action of the document.
    pub fn top_action(&self) -> Option<&Rc<Element>> {
        self.labeled_action("top")
    }

    /// All entry point actions of the document.
    ///
    /// These are the actions directly below the root whose labels start with `top`, in document
    /// order.
    pub fn top_actions(&self) -> Vec<&Rc<Element>> {
        self.root
            .iter()
            .flat_map(|root| root.children_of(ElementKind::Action))
            .filter(|action| {
                action
                    .label()
                    .map_or(false, |label| label.starts_with("top"))
            })
            .collect()
    }

    /// Resolve a `bulletRef`, `actionRef`, or `fireRef` element to its target.
    pub fn resolve(&self, reference: &Element) -> Result<&Rc<Element>, EntityError> {
        let kind = reference.kind();
        let target = kind
            .referent()
            .ok_or(EntityError::NotAReference {
                kind,
            })?;
        let label = reference.label().ok_or(EntityError::MissingLabel {
            kind,
        })?;

        self.find(target, label)
            .ok_or_else(|| EntityError::cannot_find(target, label))
    }
}
