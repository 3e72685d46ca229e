//! SQLite text helpers: identifier quoting and console script handling.

/// Wraps an identifier in double quotes, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// First run of alphabetic characters, skipping any leading non-alphabetic
/// text (whitespace, parentheses, punctuation).
pub fn leading_keyword(sql: &str) -> &str {
    let start = match sql.find(|c: char| c.is_alphabetic()) {
        Some(i) => i,
        None => return "",
    };
    let rest = &sql[start..];
    let end = rest
        .find(|c: char| !c.is_alphabetic())
        .unwrap_or(rest.len());
    &rest[..end]
}

/// `true` when the text reads rows (leading keyword `select`).
pub fn is_select(sql: &str) -> bool {
    leading_keyword(sql).eq_ignore_ascii_case("select")
}

/// Splits console text on `";\n"` into trimmed statements, dropping blank
/// fragments and fragments that start with a `--` comment.
pub fn split_script(text: &str) -> Vec<&str> {
    text.split(";\n")
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty() && !fragment.starts_with("--"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_identifier_doubles_quotes() {
        assert_eq!(quote_identifier("users"), "\"users\"");
        assert_eq!(quote_identifier("my \"odd\" table"), "\"my \"\"odd\"\" table\"");
    }

    #[test]
    fn select_detection_skips_leading_noise() {
        assert!(is_select("SELECT 1"));
        assert!(is_select("  \n(select * from t)"));
        assert!(is_select("Select\tname from t"));
        assert!(!is_select("insert into t values (1)"));
        assert!(!is_select("selection"));
        assert!(!is_select(""));
    }

    #[test]
    fn script_split_skips_blank_and_comment_fragments() {
        let script = "create table a(x);\n\n;\n-- note;\ninsert into a values(1);\n  insert into a values(2)  ";

        assert_eq!(
            split_script(script),
            vec!["create table a(x)", "insert into a values(1)", "insert into a values(2)"]
        );
    }

    #[test]
    fn comment_swallows_rest_of_its_fragment() {
        assert_eq!(split_script("-- note\ndelete from a;\nselect 1"), vec!["select 1"]);
    }

    #[test]
    fn semicolon_without_newline_does_not_split() {
        assert_eq!(split_script("select 1; select 2"), vec!["select 1; select 2"]);
    }
}
