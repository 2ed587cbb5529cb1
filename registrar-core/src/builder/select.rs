//! SELECT statement generation

use super::{field_list, is_wildcard, quote_ident, BuildOptions, Resolved};
use crate::{Error, Result};

/// `SELECT (fields) FROM db.table WHERE ... [ORDER BY f dir] LIMIT n`
///
/// Equal conditions come first, then not-equal ones, all joined by `AND`.
/// Only the first ORDER BY entry is emitted.
pub(crate) fn render(
    resolved: &Resolved<'_>,
    options: &BuildOptions,
    escape: &dyn Fn(&str) -> String,
) -> Result<String> {
    let equal = options
        .equal
        .iter()
        .map(|(field, value)| (field, "=", value));
    let not_equal = options
        .not_equal
        .iter()
        .map(|(field, value)| (field, "!=", value));

    let conditions: Vec<String> = equal
        .chain(not_equal)
        .map(|(field, op, value)| {
            format!(
                "{} {} \"{}\"",
                quote_ident(field),
                op,
                escape(&value.to_text())
            )
        })
        .collect();

    if conditions.is_empty() {
        return Err(Error::invalid_query(
            "SELECT requires at least one equal or not_equal condition",
        ));
    }

    let mut sql = String::from("SELECT ");

    if is_wildcard(resolved.fields) {
        sql.push('*');
    } else {
        sql.push('(');
        sql.push_str(&field_list(resolved.fields));
        sql.push(')');
    }

    sql.push_str(" FROM ");
    sql.push_str(&resolved.target());

    sql.push_str(" WHERE ");
    sql.push_str(&conditions.join(" AND "));

    if let Some((field, direction)) = options.order_by.first() {
        sql.push_str(&format!(" ORDER BY {} {}", quote_ident(field), direction));
    }

    sql.push_str(&format!(" LIMIT {}", resolved.limit));

    Ok(sql)
}

#[cfg(test)]
mod tests {
    use crate::builder::tests::{backslash, star};
    use crate::builder::{BuildOptions, Defaults, SortDirection, StatementBuilder, StatementKind};
    use crate::sanitize::{escape_string, EscapeMode};
    use crate::Error;

    fn select(options: &BuildOptions) -> crate::Result<String> {
        let fields = star();
        let defaults = Defaults {
            database: "main",
            fields: &fields,
            limit: 1,
        };
        StatementBuilder::new(defaults, &backslash)
            .build(StatementKind::Select, options)
            .map(|statement| statement.into_sql())
    }

    #[test]
    fn test_select_full() {
        let options = BuildOptions::new("t")
            .fields(["x", "y"])
            .database("d")
            .equal("a", "1")
            .order_by("b", SortDirection::Asc)
            .limit(5);
        assert_eq!(
            select(&options).unwrap(),
            "SELECT (`x`,`y`) FROM `d`.`t` WHERE `a` = \"1\" ORDER BY `b` ASC LIMIT 5"
        );
    }

    #[test]
    fn test_select_defaults() {
        let options = BuildOptions::new("users").equal("id", 7);
        assert_eq!(
            select(&options).unwrap(),
            "SELECT * FROM `main`.`users` WHERE `id` = \"7\" LIMIT 1"
        );
    }

    #[test]
    fn test_equal_then_not_equal() {
        let options = BuildOptions::new("users")
            .fields(["name"])
            .not_equal("status", "banned")
            .equal("city", "Oslo")
            .equal("age", 30);
        assert_eq!(
            select(&options).unwrap(),
            "SELECT (`name`) FROM `main`.`users` WHERE `city` = \"Oslo\" AND `age` = \"30\" AND `status` != \"banned\" LIMIT 1"
        );
    }

    #[test]
    fn test_only_first_order_by_is_used() {
        let options = BuildOptions::new("users")
            .equal("id", 1)
            .order_by("created", SortDirection::Desc)
            .order_by("name", SortDirection::Asc);
        assert_eq!(
            select(&options).unwrap(),
            "SELECT * FROM `main`.`users` WHERE `id` = \"1\" ORDER BY `created` DESC LIMIT 1"
        );
    }

    #[test]
    fn test_values_are_escaped() {
        let options = BuildOptions::new("users").equal("name", "x\" OR \"1\"=\"1");
        assert_eq!(
            select(&options).unwrap(),
            "SELECT * FROM `main`.`users` WHERE `name` = \"x\\\" OR \\\"1\\\"=\\\"1\" LIMIT 1"
        );
    }

    #[test]
    fn test_values_are_escaped_with_quote_doubling() {
        let doubling = |text: &str| escape_string(text, EscapeMode::QuoteDoubling);
        let fields = star();
        let defaults = Defaults {
            database: "d",
            fields: &fields,
            limit: 1,
        };
        let options = BuildOptions::new("t").equal("name", "x\" OR \"1\"=\"1");
        let sql = StatementBuilder::new(defaults, &doubling)
            .build(StatementKind::Select, &options)
            .unwrap()
            .into_sql();
        assert_eq!(
            sql,
            "SELECT * FROM `d`.`t` WHERE `name` = \"x\"\" OR \"\"1\"\"=\"\"1\" LIMIT 1"
        );
    }

    #[test]
    fn test_large_json_integer_is_not_rounded() {
        let options =
            BuildOptions::from_json_str(r#"{"table": "t", "equal": {"id": 18446744073709551615}}"#)
                .unwrap();
        assert_eq!(
            select(&options).unwrap(),
            "SELECT * FROM `main`.`t` WHERE `id` = \"18446744073709551615\" LIMIT 1"
        );
    }

    #[test]
    fn test_null_value_renders_empty() {
        let options = BuildOptions::new("users").equal("deleted_at", ());
        assert_eq!(
            select(&options).unwrap(),
            "SELECT * FROM `main`.`users` WHERE `deleted_at` = \"\" LIMIT 1"
        );
    }

    #[test]
    fn test_select_without_conditions_is_rejected() {
        let err = select(&BuildOptions::new("users")).unwrap_err();
        assert!(matches!(err, Error::InvalidQuery { .. }));
    }

    #[test]
    fn test_select_is_deterministic() {
        let options = BuildOptions::new("users")
            .fields(["a", "b"])
            .equal("a", 1)
            .not_equal("b", 2);
        assert_eq!(select(&options).unwrap(), select(&options).unwrap());
    }
}
