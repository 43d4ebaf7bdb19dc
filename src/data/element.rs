// Distributed under the OSI-approved BSD 2-Clause License.
// See accompanying LICENSE file for details.

use std::collections::hash_map::HashMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

/// The kinds of elements which may appear in a BulletML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// The document root.
    BulletML,
    /// A bullet template.
    Bullet,
    /// An ordered list of commands.
    Action,
    /// Create a new bullet.
    Fire,
    /// A gradual change of direction.
    ChangeDirection,
    /// A gradual change of speed.
    ChangeSpeed,
    /// A gradual change of acceleration.
    Accel,
    /// Pause for a number of frames.
    Wait,
    /// Destroy the bullet.
    Vanish,
    /// Cause an action to be repeated a number of times.
    Repeat,
    /// A direction value.
    Direction,
    /// A speed value.
    Speed,
    /// A horizontal acceleration value.
    Horizontal,
    /// A vertical acceleration value.
    Vertical,
    /// A duration in frames.
    Term,
    /// A repetition count.
    Times,
    /// A reference to a labeled bullet.
    BulletRef,
    /// A reference to a labeled action.
    ActionRef,
    /// A reference to a labeled fire.
    FireRef,
    /// A parameter passed through a reference.
    Param,
    /// A tag outside of the BulletML vocabulary.
    Unknown,
}

impl ElementKind {
    const TAGS: &'static [(&'static str, ElementKind)] = &[
        ("bulletml", ElementKind::BulletML),
        ("bullet", ElementKind::Bullet),
        ("action", ElementKind::Action),
        ("fire", ElementKind::Fire),
        ("changeDirection", ElementKind::ChangeDirection),
        ("changeSpeed", ElementKind::ChangeSpeed),
        ("accel", ElementKind::Accel),
        ("wait", ElementKind::Wait),
        ("vanish", ElementKind::Vanish),
        ("repeat", ElementKind::Repeat),
        ("direction", ElementKind::Direction),
        ("speed", ElementKind::Speed),
        ("horizontal", ElementKind::Horizontal),
        ("vertical", ElementKind::Vertical),
        ("term", ElementKind::Term),
        ("times", ElementKind::Times),
        ("bulletRef", ElementKind::BulletRef),
        ("actionRef", ElementKind::ActionRef),
        ("fireRef", ElementKind::FireRef),
        ("param", ElementKind::Param),
    ];

    /// The kind for a markup tag name.
    pub fn from_tag(tag: &str) -> Self {
        Self::TAGS
            .iter()
            .find(|(name, _)| *name == tag)
            .map_or(ElementKind::Unknown, |&(_, kind)| kind)
    }

    /// The markup tag name for the kind.
    pub fn tag(self) -> &'static str {
        Self::TAGS
            .iter()
            .find(|(_, kind)| *kind == self)
            .map_or("unknown", |&(name, _)| name)
    }

    /// The kind of entity a reference kind refers to.
    pub fn referent(self) -> Option<Self> {
        match self {
            ElementKind::BulletRef => Some(ElementKind::Bullet),
            ElementKind::ActionRef => Some(ElementKind::Action),
            ElementKind::FireRef => Some(ElementKind::Fire),
            _ => None,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// How to interpret a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionKind {
    /// Aim towards the target.
    Aim,
    /// An absolute heading.
    Absolute,
    /// Relative to the current heading.
    Relative,
    /// Relative to the previously emitted heading.
    Sequence,
}

impl Default for DirectionKind {
    fn default() -> Self {
        DirectionKind::Aim
    }
}

impl FromStr for DirectionKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aim" => Ok(DirectionKind::Aim),
            "absolute" => Ok(DirectionKind::Absolute),
            "relative" => Ok(DirectionKind::Relative),
            "sequence" => Ok(DirectionKind::Sequence),
            _ => Err(()),
        }
    }
}

/// Ways a speed or acceleration value may be given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Set the value.
    Absolute,
    /// Set the value relative to the current value.
    Relative,
    /// Set the value relative to the previously emitted value.
    Sequence,
}

impl Default for Change {
    fn default() -> Self {
        Change::Absolute
    }
}

impl FromStr for Change {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "absolute" => Ok(Change::Absolute),
            "relative" => Ok(Change::Relative),
            "sequence" => Ok(Change::Sequence),
            _ => Err(()),
        }
    }
}

impl Change {
    /// Compute a new value from the given amount.
    ///
    /// `current` is the value of the entity being changed and `previous` the last value emitted
    /// for the same quantity.
    pub fn modify(self, amount: f32, current: f32, previous: f32) -> f32 {
        match self {
            Change::Absolute => amount,
            Change::Relative => amount + current,
            Change::Sequence => amount + previous,
        }
    }
}

/// A node of a BulletML document.
///
/// Elements are immutable once they are placed into a tree; children are shared so that running
/// bullets may hold on to the actions they execute.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    kind: ElementKind,
    label: Option<String>,
    text: Option<String>,
    attributes: HashMap<String, String>,
    children: Vec<Rc<Element>>,
}

impl Element {
    /// Create a new element.
    pub fn new<L, T>(kind: ElementKind, label: Option<L>, text: Option<T>) -> Self
    where
        L: Into<String>,
        T: Into<String>,
    {
        let mut element = Element {
            kind,
            label: None,
            text: text.map(Into::into),
            attributes: HashMap::new(),
            children: Vec::new(),
        };
        if let Some(label) = label {
            element.add_attribute("label", label);
        }
        element
    }

    /// Create a new element with neither label nor text.
    pub fn empty(kind: ElementKind) -> Self {
        Self::new::<String, String>(kind, None, None)
    }

    /// Create a new element holding text.
    pub fn with_text<T>(kind: ElementKind, text: T) -> Self
    where
        T: Into<String>,
    {
        Self::new::<String, _>(kind, None, Some(text))
    }

    /// Add an attribute to the element.
    ///
    /// A `label` attribute also sets the label of the element.
    pub fn add_attribute<N, V>(&mut self, name: N, value: V)
    where
        N: Into<String>,
        V: Into<String>,
    {
        let name = name.into();
        let value = value.into();
        if name == "label" {
            self.label = Some(value.clone());
        }
        self.attributes.insert(name, value);
    }

    /// Add an attribute, builder style.
    pub fn with_attribute<N, V>(mut self, name: N, value: V) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        self.add_attribute(name, value);
        self
    }

    /// Append a child element.
    pub fn add_child(&mut self, child: Element) {
        self.children.push(Rc::new(child));
    }

    /// Append a child element, builder style.
    pub fn with_child(mut self, child: Element) -> Self {
        self.add_child(child);
        self
    }

    /// Set the literal text of the element.
    pub fn set_text<T>(&mut self, text: T)
    where
        T: Into<String>,
    {
        self.text = Some(text.into());
    }

    /// The kind of the element.
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// The label of the element.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The literal text of the element.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Look up an attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// All children of the element, in document order.
    pub fn children(&self) -> &[Rc<Element>] {
        &self.children
    }

    /// The first child of the given kind.
    pub fn first_child(&self, kind: ElementKind) -> Option<&Rc<Element>> {
        self.children.iter().find(|child| child.kind() == kind)
    }

    /// All children of the given kind, in document order.
    pub fn children_of(&self, kind: ElementKind) -> impl Iterator<Item = &Rc<Element>> {
        self.children
            .iter()
            .filter(move |child| child.kind() == kind)
    }

    /// How a `direction` element is to be interpreted.
    pub fn direction_kind(&self) -> DirectionKind {
        self.attribute("type")
            .and_then(|kind| kind.parse().ok())
            .unwrap_or_default()
    }

    /// How a `speed`, `horizontal`, or `vertical` element is to be interpreted.
    pub fn change_kind(&self) -> Change {
        self.attribute("type")
            .and_then(|kind| kind.parse().ok())
            .unwrap_or_default()
    }
}
