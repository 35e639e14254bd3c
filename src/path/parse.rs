//! Textual form of element paths.
//!
//! Segments are separated by `/`. A backslash makes the next character
//! literal, so `a\/b` is a single segment and `\.` is a segment named `.`
//! rather than the current-node marker. Empty segments are discarded, which
//! makes a leading `/` purely cosmetic.

use std::fmt;

use super::Node;

pub(super) const DELIMITER: char = '/';
pub(super) const ESCAPE: char = '\\';

const CURRENT: &str = ".";
const PREVIOUS: &str = "..";

/// Splits `text` into raw nodes. Normalization happens in the caller.
pub(super) fn split(text: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut segment = String::new();
    let mut escaped = false;
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        match ch {
            ESCAPE => {
                // A trailing lone escape stands for itself.
                segment.push(chars.next().unwrap_or(ESCAPE));
                escaped = true;
            }
            DELIMITER => flush(&mut nodes, &mut segment, &mut escaped),
            _ => segment.push(ch),
        }
    }
    flush(&mut nodes, &mut segment, &mut escaped);

    nodes
}

fn flush(nodes: &mut Vec<Node>, segment: &mut String, escaped: &mut bool) {
    if segment.is_empty() {
        return;
    }

    let text = std::mem::take(segment);
    let node = if *escaped {
        Node::Name(text)
    } else {
        match text.as_str() {
            CURRENT => Node::Current,
            PREVIOUS => Node::Previous,
            _ => Node::Name(text),
        }
    };
    *escaped = false;
    nodes.push(node);
}

/// Writes `name` so that [`split`] reads it back as the same name.
pub(super) fn write_name(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    if name == CURRENT || name == PREVIOUS {
        write!(f, "{ESCAPE}")?;
    }
    for ch in name.chars() {
        if ch == DELIMITER || ch == ESCAPE {
            write!(f, "{ESCAPE}")?;
        }
        write!(f, "{ch}")?;
    }
    Ok(())
}

pub(super) fn write_node(f: &mut fmt::Formatter<'_>, node: &Node) -> fmt::Result {
    match node {
        Node::Name(name) => write_name(f, name),
        Node::Current => f.write_str(CURRENT),
        Node::Previous => f.write_str(PREVIOUS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Node {
        Node::Name(s.to_string())
    }

    #[test]
    fn test_split_plain_segments() {
        assert_eq!(split("a/b/c"), vec![name("a"), name("b"), name("c")]);
        assert_eq!(split("/a//b/"), vec![name("a"), name("b")]);
        assert!(split("").is_empty());
        assert!(split("///").is_empty());
    }

    #[test]
    fn test_split_markers() {
        assert_eq!(split("."), vec![Node::Current]);
        assert_eq!(split(".."), vec![Node::Previous]);
        assert_eq!(split("./../..."), vec![Node::Current, Node::Previous, name("...")]);
    }

    #[test]
    fn test_split_escapes() {
        assert_eq!(split(r"a\/b"), vec![name("a/b")]);
        assert_eq!(split(r"\."), vec![name(".")]);
        assert_eq!(split(r"\.."), vec![name("..")]);
        assert_eq!(split(r"a\\/b"), vec![name(r"a\"), name("b")]);
        assert_eq!(split(r"tail\"), vec![name(r"tail\")]);
    }
}
