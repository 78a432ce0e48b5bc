//! IAM-style glob matching (`*` any run, `?` one character).

use regex::Regex;

/// True when `pattern` contains a glob metacharacter.
pub fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?'])
}

/// Match `value` against an IAM glob. Matching is case-sensitive and
/// anchored at both ends.
pub fn glob_matches(pattern: &str, value: &str) -> bool {
    if !is_glob(pattern) {
        return pattern == value;
    }
    glob_regex_matches(pattern, value, false)
}

/// Case-insensitive [`glob_matches`], for action names: IAM treats
/// `lambda:putfunctionconcurrency` as `lambda:PutFunctionConcurrency`.
pub fn glob_matches_ignore_case(pattern: &str, value: &str) -> bool {
    if !is_glob(pattern) {
        return pattern.eq_ignore_ascii_case(value);
    }
    glob_regex_matches(pattern, value, true)
}

fn glob_regex_matches(pattern: &str, value: &str, ignore_case: bool) -> bool {
    let mut expr = String::with_capacity(pattern.len() + 12);
    if ignore_case {
        expr.push_str("(?i)");
    }
    expr.push('^');
    for c in pattern.chars() {
        match c {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            other => expr.push_str(&regex::escape(other.encode_utf8(&mut [0u8; 4]))),
        }
    }
    expr.push('$');

    match Regex::new(&expr) {
        Ok(re) => re.is_match(value),
        Err(err) => {
            tracing::warn!("Invalid glob pattern {}: {}", pattern, err);
            false
        }
    }
}
