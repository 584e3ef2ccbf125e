use nom::{
    bytes::complete::take_until,
    character::complete::char,
    combinator::verify,
    sequence::tuple,
    IResult,
};
use tracing::{debug, span, trace, Level};

use super::{Attributes, Node};

/// Name and attributes of a tag, before its child is attached
#[derive(Debug, PartialEq)]
struct Head {
    name: String,
    attributes: Attributes,
}

/// Parse a tag in the form `<name key = "value" ...>`, returning the text between the chevrons.
/// Only text without a `>` may come before the `<`.
fn parse_open_tag(input: &str) -> IResult<&str, &str> {
    let (rest, (_, _, tag, _)) = tuple((
        verify(take_until("<"), |lead: &str| !lead.contains('>')),
        char('<'),
        take_until(">"),
        char('>'),
    ))(input)?;
    Ok((rest, tag))
}

#[cfg(test)]
#[test]
fn test_open_tag_parse() {
    let data = r#"<a value = "0"><b></b></a>"#;
    assert_eq!(
        parse_open_tag(data).unwrap(),
        ("<b></b></a>", r#"a value = "0""#)
    );

    let data = "   <a></a>";
    assert_eq!(parse_open_tag(data).unwrap(), ("</a>", "a"));

    assert!(parse_open_tag("a></a>").is_err());
    assert!(parse_open_tag("<a").is_err());
    assert!(parse_open_tag("no tags here").is_err());
}

/// Where the closing tag starts: the last `<`, as long as some `>` exists too
fn closing_tag_start(input: &str) -> Option<usize> {
    input.rfind('>')?;
    input.rfind('<')
}

/// Split the text of an opening tag into its name and attributes
fn parse_head(tag: &str) -> Option<Head> {
    let mut tokens = tag.split_terminator(' ');
    let name = tokens.next().filter(|name| !name.is_empty())?;
    let tokens: Vec<&str> = tokens.flat_map(split_assignment).collect();
    Some(Head {
        name: name.to_string(),
        attributes: parse_attributes(&tokens),
    })
}

/// Separate a compact `name="value"` token into `name`, `=`, `"value"`.
/// Pieces of a space-split value such as `y=z"` are left whole.
fn split_assignment(token: &str) -> Vec<&str> {
    match token.split_once('=') {
        Some((name, value)) if !name.is_empty() && !name.contains('"') => {
            if value.is_empty() {
                vec![name, "="]
            } else if value.starts_with('"') {
                vec![name, "=", value]
            } else {
                vec![token]
            }
        }
        _ => vec![token],
    }
}

#[cfg(test)]
#[test]
fn test_split_assignment() {
    assert_eq!(split_assignment(r#"value="0""#), vec!["value", "=", r#""0""#]);
    assert_eq!(split_assignment("value="), vec!["value", "="]);
    assert_eq!(split_assignment(r#"k="a=b""#), vec!["k", "=", r#""a=b""#]);
    assert_eq!(split_assignment(r#""a=b""#), vec![r#""a=b""#]);
    assert_eq!(split_assignment("value"), vec!["value"]);
    assert_eq!(split_assignment("="), vec!["="]);
    assert_eq!(split_assignment(r#"="0""#), vec![r#"="0""#]);
    assert_eq!(split_assignment(r#"y=z""#), vec![r#"y=z""#]);
    assert_eq!(split_assignment("y=z"), vec!["y=z"]);
}

#[cfg(test)]
#[test]
fn test_head_parse() {
    let target = Head {
        name: "tag1".to_string(),
        attributes: attributes!("value" => "HelloWorld", "name" => "Name1"),
    };
    assert_eq!(
        parse_head(r#"tag1 value = "HelloWorld" name = "Name1""#),
        Some(target)
    );

    let target = Head {
        name: "a".to_string(),
        attributes: Attributes::empty(),
    };
    assert_eq!(parse_head("a "), Some(target));

    let target = Head {
        name: "a".to_string(),
        attributes: attributes!("value" => "0", "id" => "1"),
    };
    assert_eq!(parse_head(r#"a value="0" id= "1""#), Some(target));

    // An `=` inside a space-split value does not start a new attribute
    let target = Head {
        name: "a".to_string(),
        attributes: attributes!("k" => "x"),
    };
    assert_eq!(parse_head(r#"a k = "x y=z""#), Some(target));

    assert_eq!(parse_head(""), None);
    assert_eq!(parse_head(" a"), None);
}

// Attribute parsing below

/// Collect `name = "value"` token triples. An incomplete trailing triple is dropped.
fn parse_attributes(tokens: &[&str]) -> Attributes {
    let triples = tokens.chunks_exact(3);
    let dropped = triples.remainder();
    if !dropped.is_empty() {
        debug!(?dropped, "Ignoring incomplete attribute");
    }
    triples.fold(Attributes::empty(), |mut attributes, triple| {
        attributes.insert_first(triple[0], unquote(triple[2]));
        attributes
    })
}

fn unquote(value: &str) -> &str {
    let value = value.strip_prefix('"').unwrap_or(value);
    value.strip_suffix('"').unwrap_or(value)
}

#[cfg(test)]
#[test]
fn test_attribute_parse() {
    let tokens = ["value", "=", r#""0""#, "id", "=", r#""""#];
    assert_eq!(
        parse_attributes(&tokens),
        attributes!("value" => "0", "id" => "")
    );

    // Only complete triples survive
    let tokens = ["value", "=", r#""0""#, "id", "="];
    assert_eq!(parse_attributes(&tokens), attributes!("value" => "0"));
    let tokens = ["value", "="];
    assert_eq!(parse_attributes(&tokens), Attributes::empty());

    // First occurrence wins
    let tokens = ["value", "=", r#""0""#, "value", "=", r#""1""#];
    assert_eq!(parse_attributes(&tokens), attributes!("value" => "0"));
}

/// Parse the outermost tag of `input`, returning its head and the text it encloses
fn parse_element(input: &str) -> Option<(Head, &str)> {
    let (rest, tag) = parse_open_tag(input).ok()?;
    let close = closing_tag_start(input)?;
    let open_end = input.len() - rest.len();
    let inner = input.get(open_end..close).unwrap_or("");
    let head = parse_head(tag)?;
    Some((head, inner))
}

/// Parse markup into its outermost [`Node`], with every nested tag chained below it.
/// Returns `None` if no tag can be found.
pub fn parse(input: &str) -> Option<Node> {
    let span = span!(Level::DEBUG, "Parsing markup", len = input.len());
    let _enter = span.enter();

    let mut heads = Vec::new();
    let mut rest = input;
    while let Some((head, inner)) = parse_element(rest) {
        trace!(name = %head.name, attributes = head.attributes.len(), "Parsed tag");
        heads.push(head);
        rest = inner;
    }
    debug!(depth = heads.len(), "Parsed tag chain");

    heads
        .into_iter()
        .rev()
        .fold(None, |child, Head { name, attributes }| {
            Some(Node::new(name, Some(attributes), child))
        })
}

#[cfg(test)]
#[test]
fn test_node_parse() {
    let data = r#"<a value = "0"><b value = "1"></b></a>"#;
    let target = Node::new(
        "a",
        Some(attributes!("value" => "0")),
        Some(Node::new("b", Some(attributes!("value" => "1")), None)),
    );
    assert_eq!(parse(data), Some(target));

    let data = "<a>  <b></b>  </a>";
    let target = Node::new("a", None, Some(Node::new("b", None, None)));
    assert_eq!(parse(data), Some(target));
}

#[cfg(test)]
#[test]
fn test_parse_malformed() {
    assert_eq!(parse(""), None);
    assert_eq!(parse("plain text"), None);
    assert_eq!(parse("<a"), None);
    assert_eq!(parse("< a></a>"), None);
    assert_eq!(parse("></a><"), None);
}

#[cfg(test)]
#[test]
fn test_parse_lenient() {
    // Closing names are never checked
    let data = "<a><b></c></d>";
    let target = Node::new("a", None, Some(Node::new("b", None, None)));
    assert_eq!(parse(data), Some(target));

    // A lone opening tag is a leaf
    assert_eq!(parse("<a>"), Some(Node::new("a", None, None)));

    // An unparseable inner tag ends the chain
    assert_eq!(parse("<a>< b></b></a>"), Some(Node::new("a", None, None)));
}
