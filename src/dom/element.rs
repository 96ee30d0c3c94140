use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Snapshot of a DOM element captured at the moment of interaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
    /// HTML tag name (e.g., "div", "button", "input")
    pub tag: String,

    /// Element `id` attribute, when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Class tokens in document order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub class_list: Vec<String>,

    /// Remaining attributes (data-*, aria-*, role, name, type, href...)
    #[serde(default)]
    pub attributes: IndexMap<String, String>,

    /// Visible text content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Position on screen at capture time
    #[serde(default)]
    pub bounding_box: BoundingBox,

    /// Host tag names from the document root down to the element's shadow root
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shadow_path: Vec<String>,

    /// Ancestor chain from the root down to the parent
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ancestors: Vec<AncestorStep>,

    /// 1-based position among same-tag siblings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sibling_index: Option<u32>,

    #[serde(default)]
    pub is_input: bool,

    #[serde(default)]
    pub is_clickable: bool,
}

/// One element on the path from the document root to a captured element
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AncestorStep {
    pub tag: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sibling_index: Option<u32>,
}

/// Bounding box coordinates for an element
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementSnapshot {
    /// Create a new snapshot for the given tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            class_list: Vec::new(),
            attributes: IndexMap::new(),
            text: None,
            bounding_box: BoundingBox::default(),
            shadow_path: Vec::new(),
            ancestors: Vec::new(),
            sibling_index: None,
            is_input: false,
            is_clickable: false,
        }
    }

    /// Builder method: set id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Builder method: set class tokens
    pub fn with_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.class_list = classes.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method: add a single attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Builder method: set text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder method: set bounding box
    pub fn with_bounding_box(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.bounding_box = BoundingBox::new(x, y, width, height);
        self
    }

    /// Builder method: set shadow host path
    pub fn with_shadow_path<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shadow_path = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method: set ancestor chain
    pub fn with_ancestors(mut self, ancestors: Vec<AncestorStep>) -> Self {
        self.ancestors = ancestors;
        self
    }

    /// Builder method: set sibling index
    pub fn with_sibling_index(mut self, index: u32) -> Self {
        self.sibling_index = Some(index);
        self
    }

    /// Builder method: mark as clickable
    pub fn clickable(mut self, clickable: bool) -> Self {
        self.is_clickable = clickable;
        self
    }

    /// Builder method: mark as input
    pub fn input(mut self, input: bool) -> Self {
        self.is_input = input;
        self
    }

    /// Get attribute value by key
    pub fn get_attribute(&self, key: &str) -> Option<&String> {
        self.attributes.get(key)
    }

    /// Non-empty, trimmed text content
    pub fn visible_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Non-empty id
    pub fn non_empty_id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }

    /// Check if element is a specific tag
    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    /// Whether the element sits inside at least one shadow root
    pub fn is_in_shadow_dom(&self) -> bool {
        !self.shadow_path.is_empty()
    }

    /// Password fields never expose their value in generated names
    pub fn is_password(&self) -> bool {
        self.get_attribute("type")
            .is_some_and(|t| t.eq_ignore_ascii_case("password"))
    }

    /// Whether the element is something a user would click on
    pub fn is_click_target(&self) -> bool {
        if self.is_clickable {
            return true;
        }
        let clickable_tags = ["button", "a", "summary", "option"];
        let tag_is_clickable = clickable_tags.iter().any(|&tag| self.is_tag(tag));
        let has_clickable_role = self
            .get_attribute("role")
            .is_some_and(|r| ["button", "link", "tab", "menuitem", "option"].contains(&r.as_str()));
        tag_is_clickable || has_clickable_role
    }

    /// Short human label for names and comments
    pub fn describe(&self) -> String {
        if let Some(text) = self.visible_text() {
            return format!("\"{}\"", truncate(text, 40));
        }
        if let Some(label) = self.get_attribute("aria-label").filter(|l| !l.trim().is_empty()) {
            return format!("\"{}\"", truncate(label.trim(), 40));
        }
        match self.non_empty_id() {
            Some(id) => format!("{}#{}", self.tag, id),
            None => self.tag.clone(),
        }
    }
}

impl BoundingBox {
    /// Create a new BoundingBox
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Check if the bounding box is visible (has non-zero dimensions)
    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Center point, rounded to whole pixels
    pub fn center(&self) -> (i64, i64) {
        (
            (self.x + self.width / 2.0).round() as i64,
            (self.y + self.height / 2.0).round() as i64,
        )
    }
}

/// Truncate on a char boundary, appending "..." when shortened
pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}
