//! Structural selectors: the subset of CSS selectors the engine queries with.
//!
//! A [`Selector`] keeps its source text next to the parsed form. Browser hosts
//! pass the source straight to `querySelectorAll`; [`crate::MemoryDom`] uses
//! [`Selector::matches`].

mod parser;

pub use parser::parse_selector;

use crate::host::HostDom;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    source: String,
    alternatives: Vec<ComplexSelector>,
}

/// Compound selectors joined by combinators, left to right.
/// `combinators[i]` relates `compounds[i]` to `compounds[i + 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexSelector {
    pub compounds: Vec<CompoundSelector>,
    pub combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompoundSelector {
    pub element: TypeSelector,
    pub filters: Vec<SimpleSelector>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeSelector {
    Universal,
    Named(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimpleSelector {
    Class(String),
    Id(String),
    Attribute {
        name: String,
        test: Option<(AttributeOp, String)>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOp {
    Equals,
    Contains,
    Prefix,
    Suffix,
    Word,
}

impl Selector {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn alternatives(&self) -> &[ComplexSelector] {
        &self.alternatives
    }

    /// Whether `node` matches any alternative of this selector list.
    pub fn matches<D: HostDom + ?Sized>(&self, dom: &D, node: &D::Node) -> bool {
        dom.is_element(node) && self.alternatives.iter().any(|alt| alt.matches(dom, node))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for Selector {
    type Err = crate::error::SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_selector(s)
    }
}

impl ComplexSelector {
    fn matches<D: HostDom + ?Sized>(&self, dom: &D, node: &D::Node) -> bool {
        match self.compounds.len() {
            0 => false,
            n => self.matches_from(dom, node, n - 1),
        }
    }

    fn matches_from<D: HostDom + ?Sized>(&self, dom: &D, node: &D::Node, idx: usize) -> bool {
        if !self.compounds[idx].matches(dom, node) {
            return false;
        }
        if idx == 0 {
            return true;
        }

        match self.combinators[idx - 1] {
            Combinator::Child => dom
                .parent(node)
                .filter(|p| dom.is_element(p))
                .is_some_and(|p| self.matches_from(dom, &p, idx - 1)),
            Combinator::Descendant => {
                let mut current = dom.parent(node);
                while let Some(p) = current {
                    if dom.is_element(&p) && self.matches_from(dom, &p, idx - 1) {
                        return true;
                    }
                    current = dom.parent(&p);
                }
                false
            }
        }
    }
}

impl CompoundSelector {
    fn matches<D: HostDom + ?Sized>(&self, dom: &D, node: &D::Node) -> bool {
        if let TypeSelector::Named(name) = &self.element
            && dom.tag_name(node).as_deref() != Some(name.as_str())
        {
            return false;
        }
        self.filters.iter().all(|f| f.matches(dom, node))
    }
}

impl SimpleSelector {
    fn matches<D: HostDom + ?Sized>(&self, dom: &D, node: &D::Node) -> bool {
        match self {
            SimpleSelector::Class(class) => dom.class_list(node).iter().any(|c| c == class),
            SimpleSelector::Id(id) => dom.attribute(node, "id").as_deref() == Some(id.as_str()),
            SimpleSelector::Attribute { name, test } => {
                let Some(value) = dom.attribute(node, name) else {
                    return false;
                };
                match test {
                    None => true,
                    Some((op, expected)) => op.test(&value, expected),
                }
            }
        }
    }
}

impl AttributeOp {
    fn test(self, value: &str, expected: &str) -> bool {
        match self {
            AttributeOp::Equals => value == expected,
            // An empty needle never matches for the substring operators, as in CSS.
            AttributeOp::Contains => !expected.is_empty() && value.contains(expected),
            AttributeOp::Prefix => !expected.is_empty() && value.starts_with(expected),
            AttributeOp::Suffix => !expected.is_empty() && value.ends_with(expected),
            AttributeOp::Word => value.split_whitespace().any(|w| w == expected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDom;

    fn notion_like() -> (MemoryDom, crate::NodeId, crate::NodeId) {
        let mut dom = MemoryDom::new();
        let body = dom.body_id();
        let block = dom.append_element(body, "div", &[("class", "notion-header-block")]);
        let inner = dom.append_element(block, "div", &[]);
        let h2 = dom.append_element(inner, "h2", &[("id", "t1")]);
        dom.append_text(h2, "Title");
        (dom, block, h2)
    }

    #[test]
    fn test_child_combinator_requires_direct_parent() {
        let (dom, _, h2) = notion_like();
        let direct = parse_selector(".notion-header-block > div > h2").unwrap();
        let skipping = parse_selector(".notion-header-block > h2").unwrap();
        assert!(direct.matches(&dom, &h2));
        assert!(!skipping.matches(&dom, &h2));
    }

    #[test]
    fn test_descendant_combinator_skips_levels() {
        let (dom, _, h2) = notion_like();
        let sel = parse_selector(".notion-header-block h2").unwrap();
        assert!(sel.matches(&dom, &h2));
    }

    #[test]
    fn test_attribute_operators() {
        let (dom, block, h2) = notion_like();
        assert!(parse_selector("[class*=\"header\"]").unwrap().matches(&dom, &block));
        assert!(parse_selector("[class^=notion]").unwrap().matches(&dom, &block));
        assert!(parse_selector("[class$='-block']").unwrap().matches(&dom, &block));
        assert!(!parse_selector("[class*=\"\"]").unwrap().matches(&dom, &block));
        assert!(parse_selector("#t1").unwrap().matches(&dom, &h2));
        assert!(parse_selector("h2[id]").unwrap().matches(&dom, &h2));
    }

    #[test]
    fn test_selector_list_matches_any_alternative() {
        let (dom, block, h2) = notion_like();
        let sel = parse_selector("h1, h2, h3").unwrap();
        assert!(sel.matches(&dom, &h2));
        assert!(!sel.matches(&dom, &block));
    }
}
