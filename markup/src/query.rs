use tracing::trace;

use super::Node;

/// Printed for a query whose tag or attribute does not exist
pub const NOT_FOUND: &str = "Not Found!";

/// Outcome of resolving one query against a [`Node`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer<'a> {
    Value(&'a str),
    NotFound,
    /// Empty queries, and queries naming only the root tag, produce no output at all
    Silent,
}

impl<'a> Answer<'a> {
    /// The line to print for this answer, if any
    pub fn line(&self) -> Option<&'a str> {
        match *self {
            Answer::Value(value) => Some(value),
            Answer::NotFound => Some(NOT_FOUND),
            Answer::Silent => None,
        }
    }
}

/// Split a query such as `a.b~value` into its segments. `.` and `~` are not kept;
/// a trailing delimiter does not add an empty segment.
pub fn split_query(path: &str) -> Vec<&str> {
    path.split_terminator(&['.', '~'][..]).collect()
}

#[cfg(test)]
#[test]
fn test_split_query() {
    assert_eq!(split_query("a.b~value"), vec!["a", "b", "value"]);
    assert_eq!(split_query("a~b~c"), vec!["a", "b", "c"]);
    assert_eq!(split_query("a"), vec!["a"]);
    assert_eq!(split_query("a."), vec!["a"]);
    assert_eq!(split_query("a..b"), vec!["a", "", "b"]);
    assert_eq!(split_query(".a"), vec!["", "a"]);
    assert!(split_query("").is_empty());
}

/// Walk `segments` down the chain below `root`. Every segment but the first and
/// last names a nested tag; the last names an attribute of the tag reached.
pub fn resolve<'a>(root: &'a Node, segments: &[&str]) -> Answer<'a> {
    let (first, path) = match segments.split_first() {
        Some(split) => split,
        None => return Answer::Silent,
    };
    if *first != root.name {
        return Answer::NotFound;
    }
    // A lone root name is answered with silence, not `Not Found!`
    let (attribute, tags) = match path.split_last() {
        Some(split) => split,
        None => return Answer::Silent,
    };

    tags.iter()
        .try_fold(root, |node, tag| node.child().filter(|child| child.name == *tag))
        .and_then(|node| node.get_attribute(attribute))
        .map_or(Answer::NotFound, |value| Answer::Value(value))
}

impl Node {
    /// Split and resolve `path` against this node
    pub fn query(&self, path: &str) -> Answer<'_> {
        let answer = resolve(self, &split_query(path));
        trace!(path, ?answer, "Resolved query");
        answer
    }
}
