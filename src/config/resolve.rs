//! `${path}` reference interpolation in string values.
//!
//! References are element paths. Absolute ones (`${server/host}`) start at the
//! root of the merged tree; relative ones (`${./host}`, `${../host}`) start at
//! the table holding the string. `$${...}` produces a literal `${...}`.

use toml::{Table, Value};

use super::ConfigError;
use crate::path::ElementPath;

const MAX_PASSES: usize = 100;

/// Interpolates references until a pass makes no substitutions.
pub(crate) fn resolve_references(table: &mut Table) -> Result<(), ConfigError> {
    for _ in 0..MAX_PASSES {
        let snapshot = Value::Table(table.clone());
        if resolve_table(table, &ElementPath::root(), &snapshot)? == 0 {
            table.iter_mut().for_each(|(_, value)| unescape(value));
            return Ok(());
        }
    }

    Err(ConfigError::CircularReference)
}

fn resolve_table(table: &mut Table, at: &ElementPath, root: &Value) -> Result<usize, ConfigError> {
    let mut count = 0;
    for (key, value) in table.iter_mut() {
        count += resolve_value(value, &at.join(key.as_str()), at, root)?;
    }
    Ok(count)
}

/// `own` is the value's path, `base` the table relative references start from.
fn resolve_value(
    value: &mut Value,
    own: &ElementPath,
    base: &ElementPath,
    root: &Value,
) -> Result<usize, ConfigError> {
    match value {
        Value::String(s) => resolve_string(s, base, root),
        Value::Table(t) => resolve_table(t, own, root),
        Value::Array(items) => {
            let mut count = 0;
            for (i, item) in items.iter_mut().enumerate() {
                count += resolve_value(item, &own.join(i.to_string()), base, root)?;
            }
            Ok(count)
        }
        _ => Ok(0),
    }
}

fn resolve_string(s: &mut String, base: &ElementPath, root: &Value) -> Result<usize, ConfigError> {
    if !s.contains('$') {
        return Ok(0);
    }

    let mut result = String::with_capacity(s.len());
    let mut substitutions = 0;
    let mut rest = s.as_str();

    while let Some(at) = rest.find('$') {
        result.push_str(&rest[..at]);
        let tail = &rest[at..];

        if let Some(escaped) = tail.strip_prefix("$${") {
            // Kept until every pass is done so later passes skip it.
            result.push_str("$${");
            rest = escaped;
        } else if let Some(reference) = tail.strip_prefix("${") {
            let end = reference.find('}').ok_or(ConfigError::UnclosedReference)?;
            result.push_str(&lookup(&reference[..end], base, root)?);
            substitutions += 1;
            rest = &reference[end + 1..];
        } else {
            result.push('$');
            rest = &tail[1..];
        }
    }
    result.push_str(rest);

    *s = result;
    Ok(substitutions)
}

fn unescape(value: &mut Value) {
    match value {
        Value::String(s) if s.contains("$${") => *s = s.replace("$${", "${"),
        Value::Table(t) => t.iter_mut().for_each(|(_, value)| unescape(value)),
        Value::Array(items) => items.iter_mut().for_each(unescape),
        _ => {}
    }
}

fn lookup(reference: &str, base: &ElementPath, root: &Value) -> Result<String, ConfigError> {
    let target = base.resolve(&ElementPath::parse(reference));
    let value = target
        .follow(root)
        .map_err(|_| ConfigError::ReferenceNotFound(reference.to_string()))?;

    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Boolean(b) => Ok(b.to_string()),
        Value::Datetime(dt) => Ok(dt.to_string()),
        Value::Array(_) | Value::Table(_) => {
            Err(ConfigError::NonScalarReference(reference.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(text: &str) -> Result<Table, ConfigError> {
        let mut table: Table = toml::from_str(text).unwrap();
        resolve_references(&mut table).map(|_| table)
    }

    #[test]
    fn test_absolute_reference() {
        let table = resolved(
            r#"
            [server]
            host = "example.com"
            port = 8080

            [client]
            endpoint = "https://${/server/host}:${server/port}"
            "#,
        )
        .unwrap();
        assert_eq!(
            table["client"]["endpoint"].as_str(),
            Some("https://example.com:8080")
        );
    }

    #[test]
    fn test_relative_reference() {
        let table = resolved(
            r#"
            host = "outer"

            [db]
            host = "inner"
            url = "${./host} ${../host}"
            "#,
        )
        .unwrap();
        assert_eq!(table["db"]["url"].as_str(), Some("inner outer"));
    }

    #[test]
    fn test_chained_references() {
        let table = resolved(
            r#"
            a = "hello"
            b = "${a} world"
            c = "${b}!"
            "#,
        )
        .unwrap();
        assert_eq!(table["c"].as_str(), Some("hello world!"));
    }

    #[test]
    fn test_escape_and_lone_dollar() {
        let table = resolved(r#"value = "use $${VAR}, pay $5""#).unwrap();
        assert_eq!(table["value"].as_str(), Some("use ${VAR}, pay $5"));
    }

    #[test]
    fn test_escape_survives_later_passes() {
        let table = resolved("a = \"x\"\nb = \"${a}\"\nc = \"${b} $${a}\"").unwrap();
        assert_eq!(table["c"].as_str(), Some("x ${a}"));
    }

    #[test]
    fn test_array_items_resolve_against_table() {
        let table = resolved(
            r#"
            [api]
            base = "/api"
            endpoints = ["${./base}/users", "${./base}/posts"]
            "#,
        )
        .unwrap();
        let endpoints = table["api"]["endpoints"].as_array().unwrap();
        assert_eq!(endpoints[0].as_str(), Some("/api/users"));
        assert_eq!(endpoints[1].as_str(), Some("/api/posts"));
    }

    #[test]
    fn test_reference_into_list() {
        let table = resolved(
            r#"
            hosts = ["a", "b"]
            primary = "${hosts/1}"
            "#,
        )
        .unwrap();
        assert_eq!(table["primary"].as_str(), Some("b"));
    }

    #[test]
    fn test_circular_reference() {
        let result = resolved("a = \"${b}\"\nb = \"${a}\"");
        assert!(matches!(result, Err(ConfigError::CircularReference)));
    }

    #[test]
    fn test_missing_reference() {
        let result = resolved("url = \"${nonexistent/path}\"");
        assert!(matches!(result, Err(ConfigError::ReferenceNotFound(_))));
    }

    #[test]
    fn test_non_scalar_reference() {
        let result = resolved("[t]\nx = 1\n[u]\ny = \"${/t}\"");
        assert!(matches!(result, Err(ConfigError::NonScalarReference(_))));
    }

    #[test]
    fn test_unclosed_reference() {
        let result = resolved("x = \"${oops\"");
        assert!(matches!(result, Err(ConfigError::UnclosedReference)));
    }
}
