//! Crude N+1 indicator.
//!
//! Any filtered single-table SELECT is flagged, whether or not it is actually
//! repeated. The false positives are accepted: the warning is a prompt to
//! look, not a verdict.

use once_cell::sync::Lazy;
use regex::Regex;

pub const N_PLUS_ONE_MESSAGE: &str =
    "Possible N+1 query. Consider eager loading the associated records.";

static FILTERED_SELECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)SELECT .* FROM .* WHERE .*").expect("static regex is valid")
});

/// `(warning, message)` for one statement.
pub fn analyze(sql: &str) -> (bool, String) {
    if FILTERED_SELECT.is_match(sql) && !sql.contains("JOIN") {
        (true, N_PLUS_ONE_MESSAGE.to_string())
    } else {
        (false, String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_filtered_single_table_select() {
        let (warning, message) = analyze("SELECT * FROM users WHERE id = 1");
        assert!(warning);
        assert_eq!(message, N_PLUS_ONE_MESSAGE);
    }

    #[test]
    fn match_is_case_insensitive() {
        assert!(analyze("select name from posts where user_id = 7").0);
    }

    #[test]
    fn join_suppresses_warning() {
        let (warning, message) = analyze("SELECT * FROM users JOIN orders WHERE id = 1");
        assert!(!warning);
        assert!(message.is_empty());
    }

    #[test]
    fn writes_are_not_flagged() {
        assert!(!analyze("INSERT INTO users (name) VALUES ('a')").0);
        assert!(!analyze("UPDATE users SET name = 'b' WHERE id = 1").0);
    }

    #[test]
    fn unfiltered_select_is_not_flagged() {
        assert!(!analyze("SELECT * FROM users").0);
        assert!(!analyze("").0);
    }
}
