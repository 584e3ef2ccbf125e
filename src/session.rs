use markup::Node;
use nom::{
    character::complete::{digit1, space0, space1},
    combinator::{all_consuming, map_res},
    sequence::{delimited, separated_pair},
    IResult,
};
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::{debug, span, Level};

#[derive(Debug, Error)]
pub enum InputError {
    #[error("Invalid header line: {0:?}")]
    Header(String),

    #[error("Expected {expected} {kind} lines, found {found}")]
    Truncated {
        kind: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Could not parse markup: {0}")]
    Markup(#[from] markup::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Everything read from the input: the markup lines joined together, and the queries
#[derive(Debug, PartialEq)]
pub struct Session {
    pub markup: String,
    pub queries: Vec<String>,
}

/// Parse the first line in the form `<markup lines> <query lines>`
fn parse_header(input: &str) -> IResult<&str, (usize, usize)> {
    all_consuming(delimited(
        space0,
        separated_pair(parse_count, space1, parse_count),
        space0,
    ))(input)
}

fn parse_count(input: &str) -> IResult<&str, usize> {
    map_res(digit1, |digits: &str| digits.parse::<usize>())(input)
}

#[cfg(test)]
#[test]
fn test_header_parse() {
    assert_eq!(parse_header("4 3").unwrap(), ("", (4, 3)));
    assert_eq!(parse_header(" 20  1 ").unwrap(), ("", (20, 1)));
    assert_eq!(parse_header("0 0").unwrap(), ("", (0, 0)));
    assert!(parse_header("4").is_err());
    assert!(parse_header("4 3 2").is_err());
    assert!(parse_header("-1 3").is_err());
    assert!(parse_header("four three").is_err());
}

fn take_lines(
    lines: &mut impl Iterator<Item = io::Result<String>>,
    count: usize,
    kind: &'static str,
) -> Result<Vec<String>, InputError> {
    let taken = lines.take(count).collect::<io::Result<Vec<_>>>()?;
    if taken.len() < count {
        return Err(InputError::Truncated {
            kind,
            expected: count,
            found: taken.len(),
        });
    }
    Ok(taken)
}

impl Session {
    /// Read the header, then as many markup and query lines as it announces.
    /// Lines past those are ignored.
    pub fn read(input: impl BufRead) -> Result<Self, InputError> {
        let span = span!(Level::DEBUG, "Reading session");
        let _enter = span.enter();

        let mut lines = input.lines();
        let header = lines.next().transpose()?.unwrap_or_default();
        let (_, (markup_lines, query_lines)) =
            parse_header(&header).map_err(|_| InputError::Header(header.clone()))?;
        debug!(markup_lines, query_lines, "Read header");

        let markup = take_lines(&mut lines, markup_lines, "markup")?.concat();
        let queries = take_lines(&mut lines, query_lines, "query")?;
        Ok(Self { markup, queries })
    }

    /// Parse the markup, then write one line per query that has an answer to print
    pub fn answer(&self, out: &mut impl Write) -> Result<(), InputError> {
        let root: Node = self.markup.parse()?;
        for query in &self.queries {
            if let Some(line) = root.query(query).line() {
                writeln!(out, "{}", line)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SAMPLE: &str = r#"4 3
<tag1 value = "HelloWorld">
<tag2 name = "Name1">
</tag2>
</tag1>
tag1.tag2~name
tag1~name
tag1~value
"#;

    fn answer(input: &str) -> Result<String, InputError> {
        let mut out = Vec::new();
        Session::read(input.as_bytes())?.answer(&mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_read() {
        let session = Session::read(SAMPLE.as_bytes()).unwrap();
        let target = Session {
            markup: r#"<tag1 value = "HelloWorld"><tag2 name = "Name1"></tag2></tag1>"#.to_string(),
            queries: vec![
                "tag1.tag2~name".to_string(),
                "tag1~name".to_string(),
                "tag1~value".to_string(),
            ],
        };
        assert_eq!(session, target);
    }

    #[test]
    fn test_read_crlf() {
        let session = Session::read("1 1\r\n<a></a>\r\na\r\nignored\r\n".as_bytes()).unwrap();
        assert_eq!(session.markup, "<a></a>");
        assert_eq!(session.queries, vec!["a".to_string()]);
    }

    #[test]
    fn test_read_truncated() {
        let err = Session::read("3 1\n<a>\n</a>\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            InputError::Truncated {
                kind: "markup",
                expected: 3,
                found: 2
            }
        ));

        let err = Session::read("1 2\n<a></a>\na\n".as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "Expected 2 query lines, found 1");
    }

    #[test]
    fn test_read_bad_header() {
        assert!(matches!(
            Session::read("".as_bytes()),
            Err(InputError::Header(_))
        ));
        assert!(matches!(
            Session::read("x y\n".as_bytes()),
            Err(InputError::Header(h)) if h == "x y"
        ));
    }

    #[test]
    fn test_answer() {
        assert_eq!(answer(SAMPLE).unwrap(), "Name1\nNot Found!\nHelloWorld\n");

        let input = "1 5\n<a value=\"0\"><b value=\"1\"></b></a>\na~value\na.b~value\na.c~value\na\n\n";
        assert_eq!(answer(input).unwrap(), "0\n1\nNot Found!\n");
    }

    #[test]
    fn test_answer_unparseable() {
        let mut out = Vec::new();
        let session = Session::read("1 1\nno tags\na~b\n".as_bytes()).unwrap();
        assert!(matches!(
            session.answer(&mut out),
            Err(InputError::Markup(_))
        ));
        assert!(out.is_empty());
    }
}
