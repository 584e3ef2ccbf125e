//! Parsing of single-branch tag markup and path queries against it

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::iter;
use std::str::FromStr;
use thiserror::Error;

/// Build an [`Attributes`] map from `name => value` pairs
#[macro_export]
macro_rules! attributes {
    ($($name:expr => $value:expr),* $(,)?) => {
        $crate::Attributes(::std::collections::HashMap::from([
            $(($name.to_string(), $value.to_string())),*
        ]))
    };
}

/// Parsing of markup text to a [`Node`] chain
mod parsing;
/// Resolution of `tag.child~attribute` paths
mod query;

pub use parsing::parse;
pub use query::{resolve, split_query, Answer, NOT_FOUND};

/// A parsed tag. Each tag owns at most one nested tag.
#[derive(Debug, Eq)]
pub struct Node {
    pub name: String,
    pub attributes: Attributes,
    pub child: Option<Box<Node>>,
}

#[derive(Debug, Eq, PartialEq, Default)]
pub struct Attributes(pub HashMap<String, String>);

impl Attributes {
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    pub fn get(&self, name: &str) -> Option<&String> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Insert an attribute unless one with the same name was already seen.
    /// Returns whether the value was stored.
    pub fn insert_first(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        match self.0.entry(name.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(value.into());
                true
            }
        }
    }

    /// Attributes ordered by name
    pub fn sorted(&self) -> Vec<(&String, &String)> {
        let mut pairs: Vec<_> = self.0.iter().collect();
        pairs.sort();
        pairs
    }
}

impl Node {
    pub fn new(name: impl Display, attributes: Option<Attributes>, child: Option<Node>) -> Self {
        Self {
            name: name.to_string(),
            attributes: attributes.unwrap_or_default(),
            child: child.map(Box::new),
        }
    }

    pub fn get_attribute(&self, name: &str) -> Option<&String> {
        self.attributes.get(name)
    }

    pub fn child(&self) -> Option<&Node> {
        self.child.as_deref()
    }

    /// This node followed by every nested node, outermost first
    pub fn chain(&self) -> impl Iterator<Item = &Node> {
        iter::successors(Some(self), |node| node.child())
    }

    /// Number of nodes in the chain, including this one
    pub fn depth(&self) -> usize {
        self.chain().count()
    }
}

// Comparison, serialization and teardown walk the chain iteratively so
// arbitrarily deep markup never overflows the stack.

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        fn head(node: &Node) -> (&str, &Attributes) {
            (node.name.as_str(), &node.attributes)
        }
        self.chain().map(head).eq(other.chain().map(head))
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        let mut next = self.child.take();
        while let Some(mut node) = next {
            next = node.child.take();
        }
    }
}

/// Writes the node back out as markup, `<name key = "value">...</name>`
impl Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in self.chain() {
            write!(f, "<{}", node.name)?;
            for (name, value) in node.attributes.sorted() {
                write!(f, " {} = \"{}\"", name, value)?;
            }
            write!(f, ">")?;
        }
        let names: Vec<&str> = self.chain().map(|node| node.name.as_str()).collect();
        for name in names.iter().rev() {
            write!(f, "</{}>", name)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("no tag found in {len} bytes of markup")]
pub struct ParseError {
    pub len: usize,
}

impl FromStr for Node {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s).ok_or(ParseError { len: s.len() })
    }
}
