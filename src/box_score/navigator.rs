//! Traversal primitives over a parsed page.
//!
//! Fields on a box score page have no stable names; they sit at fixed ordinal distances
//! from a handful of landmarks. Everything here treats whitespace-only text nodes as
//! transparent and reports a [`Mismatch`] naming the field when the layout deviates,
//! so markup drift surfaces at this seam instead of as a misassigned value.

use ego_tree::NodeRef;
use scraper::{ElementRef, Node, Selector};

use crate::box_score::error::{Mismatch, PageResult};
use crate::util::normalize_ws;

pub type PageNode<'a> = NodeRef<'a, Node>;

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum Axis {
    /// Document order: first child if any, otherwise the next node after this subtree.
    Document,
    Sibling,
}

fn is_blank(node: &PageNode) -> bool {
    node.value()
        .as_text()
        .map_or(false, |t| t.trim().is_empty())
}

fn step<'a>(node: PageNode<'a>, axis: Axis) -> Option<PageNode<'a>> {
    match axis {
        Axis::Sibling => node.next_sibling(),
        Axis::Document => {
            if let Some(child) = node.first_child() {
                return Some(child);
            }
            let mut current = node;
            loop {
                if let Some(sibling) = current.next_sibling() {
                    return Some(sibling);
                }
                current = current.parent()?;
            }
        }
    }
}

/// The `skip`-th meaningful node after `node` along `axis`, or `None` past the end of the tree.
pub fn advance<'a>(node: PageNode<'a>, skip: usize, axis: Axis) -> Option<PageNode<'a>> {
    let mut current = node;
    for _ in 0..skip {
        current = step(current, axis)?;
        while is_blank(&current) {
            current = step(current, axis)?;
        }
    }
    Some(current)
}

pub fn advance_to<'a>(
    node: PageNode<'a>,
    skip: usize,
    axis: Axis,
    field: &str,
) -> PageResult<PageNode<'a>> {
    advance(node, skip, axis)
        .ok_or_else(|| Mismatch::new(field, format!("ran past the end of the page ({axis:?} +{skip})")))
}

pub fn expect_element<'a>(node: PageNode<'a>, field: &str) -> PageResult<ElementRef<'a>> {
    ElementRef::wrap(node).ok_or_else(|| Mismatch::new(field, "expected an element"))
}

pub fn expect_text<'a>(node: PageNode<'a>, field: &str) -> PageResult<&'a str> {
    match node.value().as_text() {
        Some(text) => Ok(&**text),
        None => Err(Mismatch::new(field, "expected a text node")),
    }
}

/// A named landmark query: "the `nth` match of `selector` under the scope".
pub struct Anchor {
    pub name: &'static str,
    selector: Selector,
    nth: usize,
}

impl Anchor {
    #[allow(clippy::expect_used)]
    pub fn new(name: &'static str, css: &str, nth: usize) -> Self {
        Self {
            name,
            selector: Selector::parse(css).expect("Landmark selectors are static"),
            nth,
        }
    }

    pub fn find<'a>(&self, scope: ElementRef<'a>) -> PageResult<ElementRef<'a>> {
        scope
            .select(&self.selector)
            .nth(self.nth)
            .ok_or_else(|| Mismatch::new(self.name, format!("landmark #{} not found", self.nth)))
    }

    /// Every match from the `nth` one onwards.
    pub fn find_all<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        scope.select(&self.selector).skip(self.nth).collect()
    }
}

pub fn element_children<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    el.children().filter_map(ElementRef::wrap)
}

pub fn text_of(el: ElementRef) -> String {
    normalize_ws(&el.text().collect::<String>())
}

/// A person or team anchor: the link target and its printed text.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LinkRef {
    pub link: String,
    pub name: String,
}

impl LinkRef {
    pub fn from_anchor(anchor: ElementRef, field: &str) -> PageResult<Self> {
        let link = anchor
            .value()
            .attr("href")
            .ok_or_else(|| Mismatch::new(field, "anchor without href"))?;
        Ok(Self {
            link: link.to_string(),
            name: text_of(anchor),
        })
    }
}

lazy_static::lazy_static! {
    static ref LINK: Selector = Selector::parse("a[href]").unwrap();
}

/// The first link anywhere under `el`, if any.
pub fn find_link(el: ElementRef) -> Option<LinkRef> {
    el.select(&LINK)
        .next()
        .and_then(|a| LinkRef::from_anchor(a, "link").ok())
}

pub fn expect_link(el: ElementRef, field: &str) -> PageResult<LinkRef> {
    find_link(el).ok_or_else(|| Mismatch::new(field, "expected a link"))
}
