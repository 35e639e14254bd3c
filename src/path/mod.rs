//! Element paths: normalized addresses into a configuration tree.
//!
//! A path is a sequence of [`Node`]s. It is absolute when it is empty or starts
//! with a name; otherwise it starts with `.` or a run of `..` and is relative to
//! some base. Paths are kept normalized: interior `.` nodes are dropped and a
//! name followed by `..` cancels out, so after normalization every `..` sits at
//! the front of the path.
//!
//! ```
//! use confweave::ElementPath;
//!
//! let path = ElementPath::parse("/a/b/../c");
//! assert_eq!(path.to_string(), "/a/c");
//!
//! let base = ElementPath::parse("/x/y/z");
//! assert_eq!(base.resolve(&ElementPath::parse("..")).to_string(), "/x/y");
//! ```

mod error;
mod follow;
mod parse;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use error::PathError;

/// One step of an [`ElementPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    Name(String),
    Current,
    Previous,
}

impl Node {
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Node::Name(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ElementPath {
    nodes: Vec<Node>,
}

impl ElementPath {
    /// The empty absolute path, addressing the root of a tree.
    pub fn root() -> Self {
        Self::default()
    }

    /// The relative path `.`.
    pub fn current() -> Self {
        Self {
            nodes: vec![Node::Current],
        }
    }

    pub fn parse(text: &str) -> Self {
        Self {
            nodes: normalize(parse::split(text), Anchor::Free),
        }
    }

    /// Builds an absolute path from literal names; no escaping is applied.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            nodes: names.into_iter().map(|name| Node::Name(name.into())).collect(),
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_absolute(&self) -> bool {
        matches!(self.nodes.first(), None | Some(Node::Name(_)))
    }

    /// Last name of the path, if it ends in one.
    pub fn file_name(&self) -> Option<&str> {
        self.nodes.last().and_then(Node::as_name)
    }

    /// Resolves `relative` against `self`.
    ///
    /// An absolute `relative` replaces the base outright. Against an absolute
    /// base, `..` never climbs above the root; against a relative base the
    /// unmatched `..` nodes are kept.
    pub fn resolve(&self, relative: &ElementPath) -> ElementPath {
        if relative.is_absolute() {
            return relative.clone();
        }
        self.concat(relative)
    }

    /// Appends every node of `other`, treating it as relative even when it is
    /// absolute.
    pub fn append(&self, other: &ElementPath) -> ElementPath {
        self.concat(other)
    }

    /// Appends a single literal name.
    pub fn join(&self, name: impl Into<String>) -> ElementPath {
        let mut nodes = self.nodes.clone();
        nodes.push(Node::Name(name.into()));
        ElementPath { nodes }
    }

    fn concat(&self, other: &ElementPath) -> ElementPath {
        let anchor = if self.is_absolute() {
            Anchor::Root
        } else {
            Anchor::Free
        };
        let nodes = self.nodes.iter().chain(other.nodes.iter()).cloned();
        ElementPath {
            nodes: normalize(nodes, anchor),
        }
    }

    /// Drops any leading `.`/`..` nodes.
    pub fn to_absolute(&self) -> ElementPath {
        let start = self
            .nodes
            .iter()
            .position(|node| matches!(node, Node::Name(_)))
            .unwrap_or(self.nodes.len());
        ElementPath {
            nodes: self.nodes[start..].to_vec(),
        }
    }

    pub fn parent(&self) -> Option<ElementPath> {
        let (_, rest) = self.nodes.split_last()?;
        Some(ElementPath {
            nodes: rest.to_vec(),
        })
    }

    /// Iterates `self`, then each parent in turn, ending at the empty path.
    pub fn ancestors(&self) -> impl Iterator<Item = ElementPath> {
        std::iter::successors(Some(self.clone()), ElementPath::parent)
    }

    /// Computes the path that leads from `self` to `other`.
    ///
    /// Both paths must agree on absoluteness. The nodes of `self` past the
    /// common prefix must all be names, each of which becomes a `..`.
    pub fn relativize(&self, other: &ElementPath) -> Result<ElementPath, PathError> {
        if self.is_absolute() != other.is_absolute() {
            return Err(PathError::MixedAbsoluteness {
                from: self.clone(),
                to: other.clone(),
            });
        }

        let common = self
            .nodes
            .iter()
            .zip(other.nodes.iter())
            .take_while(|(a, b)| a == b)
            .count();
        let leftover = &self.nodes[common..];
        let suffix = &other.nodes[common..];

        let mut nodes = Vec::with_capacity(leftover.len() + suffix.len() + 1);
        if leftover.is_empty() {
            nodes.push(Node::Current);
        } else {
            if !leftover.iter().all(|node| matches!(node, Node::Name(_))) {
                return Err(PathError::Unrelativizable {
                    from: self.clone(),
                    to: other.clone(),
                });
            }
            nodes.extend(leftover.iter().map(|_| Node::Previous));
        }
        nodes.extend(suffix.iter().cloned());

        Ok(ElementPath {
            nodes: normalize(nodes, Anchor::Free),
        })
    }

    /// Slices nodes `begin..end`. A slice that starts inside the path is
    /// marked relative with a leading `.`.
    pub fn subpath(&self, begin: usize, end: usize) -> Result<ElementPath, PathError> {
        if begin > end || end > self.nodes.len() {
            return Err(PathError::SubpathOutOfRange {
                path: self.clone(),
                begin,
                end,
            });
        }

        let slice = &self.nodes[begin..end];
        let mut nodes = Vec::with_capacity(slice.len() + 1);
        if begin > 0 && matches!(slice.first(), None | Some(Node::Name(_))) {
            nodes.push(Node::Current);
        }
        nodes.extend(slice.iter().cloned());
        Ok(ElementPath { nodes })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    /// Rooted at a tree root: `.` disappears and `..` stops at the root.
    Root,
    /// Not rooted: a leading `.` is kept and unmatched `..` accumulate.
    Free,
}

fn normalize(nodes: impl IntoIterator<Item = Node>, anchor: Anchor) -> Vec<Node> {
    let mut nodes = nodes.into_iter().peekable();
    let leading_current = anchor == Anchor::Free && nodes.peek() == Some(&Node::Current);

    let mut out: Vec<Node> = Vec::new();
    for node in nodes {
        match node {
            Node::Current => {}
            Node::Previous => match out.last() {
                Some(Node::Name(_)) => {
                    out.pop();
                }
                _ if anchor == Anchor::Root => {}
                _ => out.push(Node::Previous),
            },
            name @ Node::Name(_) => out.push(name),
        }
    }

    if leading_current && out.first() != Some(&Node::Previous) {
        out.insert(0, Node::Current);
    }
    out
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_absolute() {
            if self.nodes.is_empty() {
                return f.write_str("/");
            }
            for node in &self.nodes {
                f.write_str("/")?;
                parse::write_node(f, node)?;
            }
            return Ok(());
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            parse::write_node(f, node)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for ElementPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for ElementPath {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl From<String> for ElementPath {
    fn from(text: String) -> Self {
        Self::parse(&text)
    }
}

impl From<&ElementPath> for ElementPath {
    fn from(path: &ElementPath) -> Self {
        path.clone()
    }
}

impl Serialize for ElementPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ElementPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Self::parse(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn p(text: &str) -> ElementPath {
        ElementPath::parse(text)
    }

    fn name(s: &str) -> Node {
        Node::Name(s.to_string())
    }

    #[test]
    fn test_parse_normalizes() {
        assert_eq!(p("/a/b/../c").to_string(), "/a/c");
        assert_eq!(p("a/./b/.").nodes(), &[name("a"), name("b")]);
        assert_eq!(p("./x").nodes(), &[Node::Current, name("x")]);
        assert_eq!(p("./../x").nodes(), &[Node::Previous, name("x")]);
        assert_eq!(p("./a/..").nodes(), &[Node::Current]);
        assert_eq!(p("a/..").nodes(), &[]);
    }

    #[test]
    fn test_parse_edge_inputs() {
        assert!(p("").is_empty());
        assert!(p("").is_absolute());
        assert_eq!(p(".").nodes(), &[Node::Current]);
        assert_eq!(p("..").nodes(), &[Node::Previous]);
        assert_eq!(p("a//b///c").len(), 3);
        assert_eq!(p(r"a\/b/\./\\").nodes(), &[name("a/b"), name("."), name(r"\")]);
    }

    #[test]
    fn test_unresolvable_previous_accumulates() {
        assert_eq!(p("../../a").nodes(), &[Node::Previous, Node::Previous, name("a")]);
        assert_eq!(p("a/../..").nodes(), &[Node::Previous]);
        assert!(!p("a/../..").is_absolute());
    }

    #[test]
    fn test_display() {
        assert_eq!(p("").to_string(), "/");
        assert_eq!(p("a/b").to_string(), "/a/b");
        assert_eq!(p("./a").to_string(), "./a");
        assert_eq!(p("../../a").to_string(), "../../a");
        assert_eq!(p(".").to_string(), ".");
        assert_eq!(p(r"\..").to_string(), r"/\..");
        assert_eq!(p(r"a\/b").to_string(), r"/a\/b");
    }

    #[test]
    fn test_resolve() {
        assert_eq!(p("/x/y/z").resolve(&p("..")), p("/x/y"));
        assert_eq!(p("/x/y").resolve(&p("./a/b")), p("/x/y/a/b"));
        assert_eq!(p("/x/y").resolve(&p("/q")), p("/q"));
        assert_eq!(p("/x").resolve(&p("../../..")), ElementPath::root());
        assert_eq!(p("./a").resolve(&p("../..")), p(".."));
        assert_eq!(p("..").resolve(&p("../b")), p("../../b"));
    }

    #[test]
    fn test_resolve_identity() {
        for text in ["", "/a/b", "./a", "../x", ".", ".."] {
            assert_eq!(p(text).resolve(&p(".")), p(text), "resolving '.' against {text}");
        }
    }

    #[test]
    fn test_append_and_join() {
        assert_eq!(p("/a").append(&p("/b/c")), p("/a/b/c"));
        assert_eq!(p("/a/b").append(&p("../c")), p("/a/c"));
        assert_eq!(p("/a").join("b/c").nodes(), &[name("a"), name("b/c")]);
    }

    #[test]
    fn test_to_absolute_and_parent() {
        assert_eq!(p("../../a/b").to_absolute(), p("/a/b"));
        assert_eq!(p(".").to_absolute(), ElementPath::root());
        assert_eq!(p("/a/b").parent(), Some(p("/a")));
        assert_eq!(p("/a").parent(), Some(ElementPath::root()));
        assert_eq!(ElementPath::root().parent(), None);
        assert_eq!(p("/a/b").ancestors().count(), 3);
    }

    #[test]
    fn test_relativize() {
        assert_eq!(p("/a/b").relativize(&p("/a/c/d")).unwrap(), p("../c/d"));
        assert_eq!(p("/a").relativize(&p("/a/b/c")).unwrap(), p("./b/c"));
        assert_eq!(p("/a/b/c").relativize(&p("/a")).unwrap(), p("../.."));
        assert_eq!(p("/a").relativize(&p("/a")).unwrap(), ElementPath::current());
        assert!(matches!(
            p("/a").relativize(&p("./a")),
            Err(PathError::MixedAbsoluteness { .. })
        ));
        assert!(matches!(
            p("../a").relativize(&p("./b")),
            Err(PathError::Unrelativizable { .. })
        ));
    }

    #[test]
    fn test_subpath() {
        let path = p("/a/b/c");
        assert_eq!(path.subpath(0, 2).unwrap(), p("/a/b"));
        assert_eq!(path.subpath(1, 3).unwrap(), p("./b/c"));
        assert_eq!(path.subpath(3, 3).unwrap(), ElementPath::current());
        assert_eq!(p("../x").subpath(0, 1).unwrap(), p(".."));
        assert!(matches!(
            path.subpath(2, 4),
            Err(PathError::SubpathOutOfRange { .. })
        ));
    }

    #[test]
    fn test_deserialize_from_string() {
        #[derive(Deserialize)]
        struct Holder {
            child: ElementPath,
        }

        let holder: Holder = toml::from_str(r#"child = "../sibling""#).unwrap();
        assert_eq!(holder.child, p("../sibling"));
    }

    fn segment() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(".".to_string()),
            Just("..".to_string()),
            Just(String::new()),
            "[a-z0-9.]{1,4}",
            r"[a-z\\/.]{1,4}",
        ]
    }

    fn path_text() -> impl Strategy<Value = String> {
        prop::collection::vec(segment(), 0..8).prop_map(|segments| segments.join("/"))
    }

    proptest! {
        #[test]
        fn prop_display_parse_idempotent(text in path_text()) {
            let parsed = p(&text);
            prop_assert_eq!(p(&parsed.to_string()), parsed);
        }

        #[test]
        fn prop_resolve_current_is_identity(text in path_text()) {
            let parsed = p(&text);
            prop_assert_eq!(parsed.resolve(&ElementPath::current()), parsed);
        }

        #[test]
        fn prop_relativize_then_resolve(
            a in prop::collection::vec("[a-c]", 0..5),
            b in prop::collection::vec("[a-c]", 0..5),
        ) {
            let a = ElementPath::from_names(a);
            let b = ElementPath::from_names(b);
            let relative = a.relativize(&b).unwrap();
            prop_assert_eq!(a.resolve(&relative), b);
        }
    }
}
