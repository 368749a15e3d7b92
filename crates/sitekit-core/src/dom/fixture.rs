use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Dom, HeadlessDom, NodeId, Rect};
use crate::error::{Error, Result};

/// Declarative page description used to build a [`HeadlessDom`]
///
/// ```toml
/// [viewport]
/// width = 1280
/// height = 800
///
/// [[element]]
/// tag = "header"
/// rect = [0, 0, 1280, 70]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageFixture {
    #[serde(default)]
    pub viewport: ViewportFixture,
    #[serde(default)]
    pub scroll_y: f64,
    #[serde(default)]
    pub reduced_motion: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Overrides the height derived from element boxes
    #[serde(default)]
    pub document_height: Option<f64>,
    #[serde(default, rename = "element")]
    pub elements: Vec<ElementFixture>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewportFixture {
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
}

impl Default for ViewportFixture {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementFixture {
    pub tag: String,
    #[serde(default)]
    pub id: Option<String>,
    /// Space-separated class list
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub style: BTreeMap<String, String>,
    #[serde(default)]
    pub text: Option<String>,
    /// `[x, y, width, height]` in document coordinates
    #[serde(default)]
    pub rect: Option<[f64; 4]>,
    #[serde(default, rename = "child")]
    pub children: Vec<ElementFixture>,
}

fn default_url() -> String {
    "https://example.test/".to_string()
}

fn default_user_agent() -> String {
    "sitekit-headless".to_string()
}

fn default_width() -> f64 {
    1280.0
}

fn default_height() -> f64 {
    800.0
}

impl PageFixture {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Fixture(e.to_string()))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content).map_err(|e| Error::Fixture(e.to_string())),
            _ => Self::from_toml_str(&content),
        }
    }

    /// Build the document; ids must be unique and tags non-empty
    pub fn build(&self) -> Result<HeadlessDom> {
        let mut dom = HeadlessDom::new(self.viewport.width, self.viewport.height);
        dom.set_document_height(self.document_height);
        dom.set_reduced_motion(self.reduced_motion);
        dom.set_hidden(self.hidden);
        dom.set_location(self.url.clone());
        dom.set_user_agent(self.user_agent.clone());

        let mut seen_ids = HashSet::new();
        let body = dom.body();
        for element in &self.elements {
            insert(&mut dom, body, element, &mut seen_ids)?;
        }

        dom.scroll_to(self.scroll_y);
        Ok(dom)
    }
}

fn insert(
    dom: &mut HeadlessDom,
    parent: NodeId,
    fixture: &ElementFixture,
    seen_ids: &mut HashSet<String>,
) -> Result<NodeId> {
    if fixture.tag.trim().is_empty() {
        return Err(Error::Fixture("element with empty tag".to_string()));
    }

    let node = dom.element(parent, fixture.tag.trim()).finish();
    if let Some(ref id) = fixture.id {
        if !seen_ids.insert(id.clone()) {
            return Err(Error::Fixture(format!("duplicate id '{}'", id)));
        }
        dom.set_attribute(node, "id", id);
    }
    if let Some(ref class) = fixture.class {
        dom.set_attribute(node, "class", class);
    }
    for (name, value) in &fixture.attrs {
        dom.set_attribute(node, name, value);
    }
    for (property, value) in &fixture.style {
        dom.set_style(node, property, value);
    }
    if let Some(ref text) = fixture.text {
        dom.set_text(node, text);
    }
    if let Some([x, y, width, height]) = fixture.rect {
        dom.set_layout(node, Rect::new(x, y, width, height));
    }
    for child in &fixture.children {
        insert(dom, node, child, seen_ids)?;
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"
        scroll_y = 120
        reduced_motion = true

        [viewport]
        width = 800
        height = 600

        [[element]]
        tag = "nav"
        id = "mainNav"
        rect = [0, 0, 800, 60]

        [[element.child]]
        tag = "a"
        class = "nav-link active"
        attrs = { href = "#about" }

        [[element]]
        tag = "section"
        id = "about"
        rect = [0, 900, 800, 600]
    "##;

    #[test]
    fn test_build_nested_fixture() {
        let dom = PageFixture::from_toml_str(PAGE).unwrap().build().unwrap();
        assert_eq!(dom.viewport().width, 800.0);
        assert!(dom.prefers_reduced_motion());
        assert_eq!(dom.scroll_y(), 120.0);

        let link = dom.query("nav > a.nav-link").unwrap();
        assert_eq!(dom.attribute(link, "href").as_deref(), Some("#about"));
        assert_eq!(dom.offset_top(dom.element_by_id("about").unwrap()), 900.0);
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let fixture = PageFixture::from_toml_str(
            r#"
            [[element]]
            tag = "div"
            id = "home"

            [[element]]
            tag = "div"
            id = "home"
            "#,
        )
        .unwrap();
        assert!(matches!(fixture.build(), Err(Error::Fixture(_))));
    }

    #[test]
    fn test_malformed_fixture() {
        assert!(matches!(
            PageFixture::from_toml_str("[[element]]\nid = \"x\""),
            Err(Error::Fixture(_))
        ));
    }
}
