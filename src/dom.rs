//! Thin query layer over `scraper`.
//!
//! Gives the extractors a small selection API: find nodes by CSS selector,
//! relative to the whole document or to one node, then read the concatenated
//! text or the first node's attribute. A selection's `text()` joins the text
//! of every matched node, and `attr()` reads only the first match.

use scraper::{ElementRef, Html, Selector};

/// A parsed HTML page.
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        Document {
            html: Html::parse_document(html),
        }
    }

    /// All elements in the document matching `selector`, in document order.
    pub fn find(&self, selector: &Selector) -> Selection<'_> {
        Selection {
            nodes: self.html.select(selector).collect(),
        }
    }
}

/// One element of a [`Document`].
#[derive(Clone, Copy, Debug)]
pub struct Node<'a> {
    element: ElementRef<'a>,
}

impl<'a> Node<'a> {
    /// Descendants of this node matching `selector`.
    pub fn find(&self, selector: &Selector) -> Selection<'a> {
        Selection {
            nodes: self.element.select(selector).collect(),
        }
    }

    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }
}

/// The result of a selector query.
#[derive(Debug)]
pub struct Selection<'a> {
    nodes: Vec<ElementRef<'a>>,
}

impl<'a> Selection<'a> {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn first(&self) -> Option<Node<'a>> {
        self.nodes.first().map(|&element| Node { element })
    }

    pub fn iter(&self) -> impl Iterator<Item = Node<'a>> + '_ {
        self.nodes.iter().map(|&element| Node { element })
    }

    /// Text of every matched node, concatenated. Empty when nothing matched.
    pub fn text(&self) -> String {
        self.nodes.iter().flat_map(|e| e.text()).collect()
    }

    /// Attribute of the first matched node.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.first().and_then(|n| n.attr(name))
    }
}
