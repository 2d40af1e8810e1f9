use lazy_static::lazy_static;
use regex::Regex;

pub const MAX_NAME_LEN: usize = 20;
pub const MAX_BIO_LEN: usize = 280;
pub const MAX_SCHOOL_LEN: usize = 20;
pub const MAX_STUDY_LEN: usize = 40;
pub const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trims `value` and returns it if it has at most `max` characters.
pub(crate) fn trimmed_within(value: &str, max: usize) -> Option<String> {
    let trimmed = value.trim();
    (trimmed.chars().count() <= max).then(|| trimmed.to_string())
}

/// Removes every ASCII space, not just the surrounding ones. Tabs and other
/// whitespace are kept, since signup and login store and compare passwords
/// as given.
pub(crate) fn strip_spaces(value: &str) -> String {
    value.chars().filter(|c| *c != ' ').collect()
}

/// Parses a path or query id the way the handlers accept it.
pub(crate) fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}
