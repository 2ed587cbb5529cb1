//! INSERT statement generation

use super::{field_list, is_wildcard, BuildOptions, Resolved};
use crate::{Error, Result};

/// `INSERT INTO db.table (fields) VALUES ('v1','v2');`
pub(crate) fn render(
    resolved: &Resolved<'_>,
    options: &BuildOptions,
    escape: &dyn Fn(&str) -> String,
) -> Result<String> {
    let values = match options.values.as_deref() {
        Some(values) if !values.is_empty() => values,
        _ => return Err(Error::field("values")),
    };

    if is_wildcard(resolved.fields) {
        return Err(Error::invalid_query("INSERT requires explicit fields"));
    }

    if resolved.fields.len() != values.len() {
        return Err(Error::invalid_query(format!(
            "INSERT has {} fields but {} values",
            resolved.fields.len(),
            values.len()
        )));
    }

    let rendered: Vec<String> = values
        .iter()
        .map(|value| format!("'{}'", escape(&value.to_text())))
        .collect();

    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({});",
        resolved.target(),
        field_list(resolved.fields),
        rendered.join(",")
    ))
}

#[cfg(test)]
mod tests {
    use crate::builder::tests::{backslash, star};
    use crate::builder::{BuildOptions, Defaults, StatementBuilder, StatementKind};
    use crate::Error;

    fn insert(options: &BuildOptions, raw: bool) -> crate::Result<String> {
        let fields = star();
        let defaults = Defaults {
            database: "main",
            fields: &fields,
            limit: 1,
        };
        StatementBuilder::new(defaults, &backslash)
            .raw_insert_values(raw)
            .build(StatementKind::Insert, options)
            .map(|statement| statement.into_sql())
    }

    #[test]
    fn test_insert_single() {
        let options = BuildOptions::new("t")
            .fields(["x"])
            .database("d")
            .values(["v"]);
        assert_eq!(
            insert(&options, false).unwrap(),
            "INSERT INTO `d`.`t` (`x`) VALUES ('v');"
        );
    }

    #[test]
    fn test_insert_multiple_values() {
        let options = BuildOptions::new("users")
            .fields(["name", "age"])
            .values(vec![crate::Value::from("Ann"), crate::Value::from(41)]);
        assert_eq!(
            insert(&options, false).unwrap(),
            "INSERT INTO `main`.`users` (`name`,`age`) VALUES ('Ann','41');"
        );
    }

    #[test]
    fn test_insert_escapes_values() {
        let options = BuildOptions::new("users").fields(["name"]).values(["O'Brien"]);
        assert_eq!(
            insert(&options, false).unwrap(),
            "INSERT INTO `main`.`users` (`name`) VALUES ('O\\'Brien');"
        );
    }

    #[test]
    fn test_insert_raw_values_when_requested() {
        let options = BuildOptions::new("users").fields(["name"]).values(["O'Brien"]);
        assert_eq!(
            insert(&options, true).unwrap(),
            "INSERT INTO `main`.`users` (`name`) VALUES ('O'Brien');"
        );
    }

    #[test]
    fn test_insert_without_values() {
        let options = BuildOptions::new("t").fields(["x"]);
        assert_eq!(insert(&options, false).unwrap_err().field_name(), Some("values"));

        let empty = BuildOptions::new("t").fields(["x"]).values(Vec::<String>::new());
        assert_eq!(insert(&empty, false).unwrap_err().field_name(), Some("values"));
    }

    #[test]
    fn test_insert_requires_explicit_fields() {
        let options = BuildOptions::new("t").values(["v"]);
        assert!(matches!(
            insert(&options, false).unwrap_err(),
            Error::InvalidQuery { .. }
        ));
    }

    #[test]
    fn test_insert_field_value_count_mismatch() {
        let options = BuildOptions::new("t").fields(["a", "b"]).values(["only"]);
        let err = insert(&options, false).unwrap_err();
        assert_eq!(err.to_string(), "Invalid query: INSERT has 2 fields but 1 values");
    }
}
