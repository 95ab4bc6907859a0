// This file is part of the ppguard package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

//! The two synthetic line shapes the pre stage plants around an `#include`
//! and the post stage looks for again.
//!
//! A marker is `int <N>;` and survives the preprocessor as ordinary code. A
//! commented pragma is `/* <N><original include line> */` and survives as a
//! comment when comments are kept. `<N>` is the tag pairing the two lines;
//! pairing is positional, never by lookup.

pub const MARKER_OPEN: &str = "int ";
pub const MARKER_CLOSE: &str = ";\n";
pub const COMMENT_OPEN: &str = "/* ";
pub const COMMENT_CLOSE: &str = " */\n";
pub const COMMENT_DELIM: char = '#';

#[derive(Debug, PartialEq, Eq)]
pub enum LineKind<'a> {
    Regular,
    Marker { tag: i64 },
    CommentedPragma { tag: i64, payload: &'a str },
}

/// Classify a line by its framing. Anything that does not frame exactly, or
/// whose tag does not parse as a non-negative integer, is `Regular`; in
/// particular `int x;` is ordinary code.
pub fn classify(line: &str) -> LineKind<'_> {
    if let Some((tag, _)) = parse_framed(line, MARKER_OPEN, MARKER_CLOSE, None) {
        return LineKind::Marker { tag };
    }
    if let Some((tag, payload)) = parse_framed(line, COMMENT_OPEN, COMMENT_CLOSE, Some(COMMENT_DELIM)) {
        return LineKind::CommentedPragma { tag, payload };
    }
    LineKind::Regular
}

/// Tag of `line` when it is a marker, otherwise −1.
pub fn marker_tag(line: &str) -> i64 {
    match classify(line) {
        LineKind::Marker { tag } => tag,
        _ => -1,
    }
}

/// Tag and payload of `line` when it is a commented pragma, otherwise
/// `(-1, "")`. The payload starts at the delimiter, i.e. it is the original
/// include line without its trailing newline.
pub fn pragma_parts(line: &str) -> (i64, &str) {
    match classify(line) {
        LineKind::CommentedPragma { tag, payload } => (tag, payload),
        _ => (-1, ""),
    }
}

fn parse_framed<'a>(
    line: &'a str,
    open: &str,
    close: &str,
    delim: Option<char>,
) -> Option<(i64, &'a str)> {
    if line.len() < open.len() + close.len() || !line.starts_with(open) || !line.ends_with(close) {
        return None;
    }
    let inner = &line[open.len()..line.len() - close.len()];
    // A missing delimiter means the whole inner region is the tag candidate.
    let (tag, payload) = match delim.and_then(|d| inner.find(d)) {
        Some(pos) => (&inner[..pos], &inner[pos..]),
        None => (inner, ""),
    };
    let tag = tag.trim().parse::<i64>().ok()?.max(-1);
    if tag < 0 {
        return None;
    }
    Some((tag, payload))
}
