use serde::{Deserialize, Serialize};

/// The table/column a selection filters on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldBinding {
    pub table: String,
    pub column: String,
}

impl FieldBinding {
    /// Splits `table.column` or `table[column]`. Anything else binds the raw name
    /// as both table and column. Blank names leave the field unbound.
    pub fn parse(qualified: &str) -> Option<Self> {
        let qualified = qualified.trim();
        if qualified.is_empty() {
            return None;
        }

        if let Some((table, column)) = split_dotted(qualified).or_else(|| split_bracketed(qualified)) {
            return Some(Self {
                table: table.to_string(),
                column: column.to_string(),
            });
        }

        Some(Self {
            table: qualified.to_string(),
            column: qualified.to_string(),
        })
    }
}

/// Rightmost split on `separator` that leaves both halves non-empty.
fn split_last<'a>(value: &'a str, separator: char) -> Option<(&'a str, &'a str)> {
    value
        .rmatch_indices(separator)
        .map(|(index, _)| (&value[..index], &value[index + separator.len_utf8()..]))
        .find(|(table, column)| !table.is_empty() && !column.is_empty())
}

fn split_dotted(qualified: &str) -> Option<(&str, &str)> {
    split_last(qualified, '.')
}

fn split_bracketed(qualified: &str) -> Option<(&str, &str)> {
    split_last(qualified.strip_suffix(']')?, '[')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(table: &str, column: &str) -> FieldBinding {
        FieldBinding {
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    #[test]
    fn parses_dotted_name() {
        assert_eq!(
            FieldBinding::parse("Sales.OrderDate"),
            Some(binding("Sales", "OrderDate"))
        );
    }

    #[test]
    fn dotted_split_uses_last_dot() {
        assert_eq!(
            FieldBinding::parse("dbo.Sales.OrderDate"),
            Some(binding("dbo.Sales", "OrderDate"))
        );
    }

    #[test]
    fn parses_bracketed_name() {
        assert_eq!(
            FieldBinding::parse("Sales[OrderDate]"),
            Some(binding("Sales", "OrderDate"))
        );
    }

    #[test]
    fn unmatched_name_is_used_whole() {
        assert_eq!(
            FieldBinding::parse("OrderDate"),
            Some(binding("OrderDate", "OrderDate"))
        );
        assert_eq!(FieldBinding::parse("Sales."), Some(binding("Sales.", "Sales.")));
        assert_eq!(FieldBinding::parse("[x]"), Some(binding("[x]", "[x]")));
    }

    #[test]
    fn trailing_dot_falls_back_to_earlier_dot() {
        assert_eq!(FieldBinding::parse("a.b."), Some(binding("a", "b.")));
    }

    #[test]
    fn blank_name_is_unbound() {
        assert_eq!(FieldBinding::parse(""), None);
        assert_eq!(FieldBinding::parse("   "), None);
    }
}
