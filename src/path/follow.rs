use toml::Value;

use super::{ElementPath, Node, PathError};

impl ElementPath {
    /// Walks `root` along the names of this path.
    ///
    /// `.` and `..` nodes only matter for path arithmetic and are skipped here.
    /// Tables are indexed by key and arrays by a non-negative integer index.
    pub fn follow<'a>(&self, root: &'a Value) -> Result<&'a Value, PathError> {
        let mut current = root;

        for (position, node) in self.nodes().iter().enumerate() {
            let Node::Name(segment) = node else {
                continue;
            };

            current = match current {
                Value::Table(table) => {
                    table.get(segment).ok_or_else(|| PathError::MissingKey {
                        segment: segment.clone(),
                        position,
                    })?
                }
                Value::Array(items) => {
                    let index = parse_index(segment).ok_or_else(|| PathError::InvalidIndex {
                        segment: segment.clone(),
                        position,
                    })?;
                    items.get(index).ok_or_else(|| PathError::IndexOutOfRange {
                        segment: segment.clone(),
                        position,
                        len: items.len(),
                    })?
                }
                _ => {
                    return Err(PathError::NotAContainer {
                        segment: segment.clone(),
                        position,
                    })
                }
            };
        }

        Ok(current)
    }
}

fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}
