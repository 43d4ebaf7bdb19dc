// Distributed under the OSI-approved BSD 2-Clause License.
// See accompanying LICENSE file for details.

use thiserror::Error;
use xml::reader::{ParserConfig, XmlEvent};

use crate::data::{Element, ElementKind};

/// An error when reading a BulletML document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The document text was empty.
    #[error("empty document")]
    Empty,
    /// The document is not well-formed XML.
    #[error("malformed document")]
    Xml {
        /// The XML reader error.
        #[from]
        source: xml::reader::Error,
    },
    /// The document does not contain an element.
    #[error("document has no root element")]
    MissingRoot,
}

/// Read the root element of an XML document.
pub fn read_element(xml: &str) -> Result<Element, ParseError> {
    if xml.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let reader = ParserConfig::new()
        .trim_whitespace(true)
        .cdata_to_characters(true)
        .ignore_comments(true)
        .create_reader(xml.as_bytes());

    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    for event in reader {
        match event? {
            XmlEvent::StartElement {
                name,
                attributes,
                ..
            } => {
                let kind = ElementKind::from_tag(&name.local_name);
                if kind == ElementKind::Unknown {
                    tracing::debug!(tag = %name.local_name, "unknown element");
                }

                let mut element = Element::empty(kind);
                attributes.into_iter().for_each(|attr| {
                    element.add_attribute(attr.name.local_name, attr.value);
                });
                stack.push(element);
            },
            XmlEvent::EndElement {
                ..
            } => {
                if let Some(mut element) = stack.pop() {
                    let text = element.text().map(|text| text.trim().to_owned());
                    if let Some(text) = text {
                        element.set_text(text);
                    }

                    if let Some(parent) = stack.last_mut() {
                        parent.add_child(element);
                    } else {
                        root = Some(element);
                    }
                }
            },
            XmlEvent::Characters(text) => {
                if let Some(element) = stack.last_mut() {
                    let text = match element.text() {
                        Some(existing) => format!("{}{}", existing, text),
                        None => text,
                    };
                    element.set_text(text);
                }
            },
            _ => {},
        }
    }

    root.ok_or(ParseError::MissingRoot)
}
