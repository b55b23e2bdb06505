//! Page inspection
//!
//! The verifier never touches a real document. It asks a [`PageInspector`]
//! for the footer region, which exposes the region's rendered text and the
//! sources of the images inside it.
//!
//! Two inspectors ship with the crate:
//! - [`DocumentTree`]: an in-process element tree the host mutates as the
//!   page changes
//! - [`SnapshotFile`]: a JSON element tree re-read from disk on every check

use crate::error::InspectError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// ARIA role of the page footer
const FOOTER_ROLE: &str = "contentinfo";

/// One element of a page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Tag name
    pub tag: String,
    /// Explicit ARIA role
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Own text, before children
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Attributes
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    /// Child elements in document order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,
}

impl Element {
    /// Create an element with a tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// With ARIA role
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// With own text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// With attribute
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// With child appended
    #[must_use]
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// `<img src=...>` shorthand
    pub fn image(src: impl Into<String>) -> Self {
        Self::new("img").with_attr("src", src)
    }

    /// Whether this element is a footer landmark
    #[must_use]
    pub fn is_footer(&self) -> bool {
        self.tag.eq_ignore_ascii_case("footer") || self.role.as_deref() == Some(FOOTER_ROLE)
    }

    /// First element in document order (self included) matching `predicate`
    pub fn find_first(&self, predicate: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        if predicate(self) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find_first(predicate))
    }

    /// Concatenated text of this subtree
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }

    /// `src` of every image in this subtree, document order
    #[must_use]
    pub fn image_sources(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_images(&mut out);
        out
    }

    fn collect_images(&self, out: &mut Vec<String>) {
        if self.tag.eq_ignore_ascii_case("img") {
            if let Some(src) = self.attrs.get("src") {
                out.push(src.clone());
            }
        }
        for child in &self.children {
            child.collect_images(out);
        }
    }
}

/// What the verifier sees of the footer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FooterRegion {
    /// Rendered text of the region
    pub text: String,
    /// Image sources inside the region
    pub image_sources: Vec<String>,
}

impl FooterRegion {
    /// Capture the region rooted at `element`
    #[must_use]
    pub fn from_element(element: &Element) -> Self {
        Self {
            text: element.text_content(),
            image_sources: element.image_sources(),
        }
    }

    /// First image whose source contains `fragment`
    #[must_use]
    pub fn find_image(&self, fragment: &str) -> Option<&str> {
        self.image_sources
            .iter()
            .map(String::as_str)
            .find(|src| src.contains(fragment))
    }
}

/// Narrow read access to the live page
pub trait PageInspector: Send + Sync {
    /// The footer region, if the page has one
    fn footer(&self) -> Result<Option<FooterRegion>, InspectError>;
}

fn footer_of(root: &Element) -> Option<FooterRegion> {
    root.find_first(&Element::is_footer).map(FooterRegion::from_element)
}

/// Live in-process document
#[derive(Debug, Default)]
pub struct DocumentTree {
    root: RwLock<Element>,
}

impl DocumentTree {
    /// Create a document with the given root
    #[must_use]
    pub fn new(root: Element) -> Self {
        Self {
            root: RwLock::new(root),
        }
    }

    /// Replace the whole document
    pub fn replace(&self, root: Element) {
        *self.root.write() = root;
    }

    /// Mutate the document in place
    pub fn update(&self, mutate: impl FnOnce(&mut Element)) {
        let mut root = self.root.write();
        mutate(&mut root);
    }
}

impl PageInspector for DocumentTree {
    fn footer(&self) -> Result<Option<FooterRegion>, InspectError> {
        Ok(footer_of(&self.root.read()))
    }
}

/// JSON page snapshot on disk, re-read on each inspection
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    /// Inspect the snapshot at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Snapshot path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_root(&self) -> Result<Element, InspectError> {
        let bytes = std::fs::read(&self.path).map_err(|err| InspectError::io_error(&self.path, err))?;
        serde_json::from_slice(&bytes).map_err(|source| InspectError::Malformed {
            path: self.path.clone(),
            source,
        })
    }
}

impl PageInspector for SnapshotFile {
    fn footer(&self) -> Result<Option<FooterRegion>, InspectError> {
        Ok(footer_of(&self.read_root()?))
    }
}
