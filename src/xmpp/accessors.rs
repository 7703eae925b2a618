//! Tree accessors used by every extraction rule.
//!
//! Lookups only ever walk direct children, so a `uri` nested inside some
//! other sub-structure is never mistaken for the one a rule asked for.
//! Absence comes back as `None`; the `require_*` variants turn it into a
//! [`DecodeError`] that names the missing path.

use std::collections::BTreeMap;
use std::str::FromStr;

use log::warn;
use roxmltree::Node;

use super::DecodeError;

/// Slash-separated element path from the document root to `node`.
pub fn path_of(node: Node<'_, '_>) -> String {
    let mut names: Vec<&str> = node
        .ancestors()
        .filter(|n| n.is_element())
        .map(|n| n.tag_name().name())
        .collect();
    names.reverse();
    names.join("/")
}

pub trait NodeExt<'a, 'input: 'a>: Sized {
    /// First direct child element called `name`.
    fn child(&self, name: &str) -> Option<Node<'a, 'input>>;

    /// Every direct child element called `name`, in document order.
    fn children_named(&self, name: &str) -> Vec<Node<'a, 'input>>;

    /// Follow `path` one direct child per step.
    fn child_at(&self, path: &[&str]) -> Option<Node<'a, 'input>>;

    fn require_child(&self, name: &str) -> Result<Node<'a, 'input>, DecodeError>;

    fn require_child_at(&self, path: &[&str]) -> Result<Node<'a, 'input>, DecodeError>;

    fn attr(&self, name: &str) -> Option<&'a str>;

    fn require_attr(&self, name: &str) -> Result<&'a str, DecodeError>;

    /// `true` only for the literal value `"true"`; anything else, absence included, is `false`.
    fn flag(&self, name: &str) -> bool {
        self.attr(name) == Some("true")
    }

    /// Text content of this element; an empty element yields `""`.
    fn text_content(&self) -> String;

    fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).map(|n| n.text_content())
    }

    fn child_text_at(&self, path: &[&str]) -> Option<String> {
        self.child_at(path).map(|n| n.text_content())
    }

    fn require_child_text(&self, name: &str) -> Result<String, DecodeError> {
        self.require_child(name).map(|n| n.text_content())
    }

    /// Namespace the element was declared in, if any.
    fn namespace(&self) -> Option<String>;
}

impl<'a, 'input: 'a> NodeExt<'a, 'input> for Node<'a, 'input> {
    fn child(&self, name: &str) -> Option<Node<'a, 'input>> {
        self.children()
            .find(|n| n.is_element() && n.tag_name().name() == name)
    }

    fn children_named(&self, name: &str) -> Vec<Node<'a, 'input>> {
        self.children()
            .filter(|n| n.is_element() && n.tag_name().name() == name)
            .collect()
    }

    fn child_at(&self, path: &[&str]) -> Option<Node<'a, 'input>> {
        let mut current = *self;
        for name in path {
            current = current.child(name)?;
        }
        Some(current)
    }

    fn require_child(&self, name: &str) -> Result<Node<'a, 'input>, DecodeError> {
        self.child(name).ok_or_else(|| DecodeError::MissingElement {
            path: format!("{}/{}", path_of(*self), name),
        })
    }

    fn require_child_at(&self, path: &[&str]) -> Result<Node<'a, 'input>, DecodeError> {
        let mut current = *self;
        for name in path {
            current = current.require_child(name)?;
        }
        Ok(current)
    }

    fn attr(&self, name: &str) -> Option<&'a str> {
        self.attribute(name)
    }

    fn require_attr(&self, name: &str) -> Result<&'a str, DecodeError> {
        self.attr(name).ok_or_else(|| DecodeError::MissingAttribute {
            path: path_of(*self),
            attribute: name.to_string(),
        })
    }

    fn text_content(&self) -> String {
        self.children()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
            .collect()
    }

    fn namespace(&self) -> Option<String> {
        self.tag_name().namespace().map(str::to_string)
    }
}

/// Parse a numeric value pulled from the tree, reporting `path` on failure.
pub fn parse_number<T: FromStr>(path: &str, raw: &str) -> Result<T, DecodeError> {
    raw.trim().parse::<T>().map_err(|_| DecodeError::InvalidValue {
        path: path.to_string(),
        value: raw.to_string(),
    })
}

/// Optional numeric text of the child at `path`; present but unparsable is an error.
pub fn optional_number_at<T: FromStr>(
    node: Node<'_, '_>,
    path: &[&str],
) -> Result<Option<T>, DecodeError> {
    match node.child_at(path) {
        Some(n) => parse_number(&path_of(n), &n.text_content()).map(Some),
        None => Ok(None),
    }
}

/// Collect the `item{key,val}` list of an extras element into a flat table.
///
/// Later items overwrite earlier ones with the same key. Items without a
/// `key` child are skipped; unknown keys are kept.
pub fn extras_table(extras: Node<'_, '_>) -> BTreeMap<String, String> {
    let mut table = BTreeMap::new();
    for item in extras.children_named("item") {
        match item.child_text("key") {
            Some(key) => {
                let val = item.child_text("val").unwrap_or_default();
                table.insert(key, val);
            }
            None => warn!("Skipping extras item without key at {}", path_of(item)),
        }
    }
    table
}
