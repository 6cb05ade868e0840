use regex::Regex;

/// Compiles a SQL `LIKE` pattern (`%` any run, `_` single character, `\`
/// escapes the following wildcard or itself) to an anchored regular
/// expression and matches `value` against it. Spec §4.2 / SPEC_FULL.md open
/// question 3.
pub fn like_match(value: &str, pattern: &str) -> bool {
    let regex_src = like_to_regex(pattern);
    match Regex::new(&regex_src) {
        Ok(re) => re.is_match(value),
        Err(_) => false,
    }
}

fn like_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');
    let mut chars = pattern.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if let Some(&next) = chars.peek() {
                    if next == '%' || next == '_' || next == '\\' {
                        out.push_str(&regex::escape(&next.to_string()));
                        chars.next();
                        continue;
                    }
                }
                out.push_str(&regex::escape("\\"));
            }
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_any_run() {
        assert!(like_match("ProductAlpha", "Prod%A%"));
        assert!(!like_match("roductAlpha", "Prod%A%"));
    }

    #[test]
    fn underscore_is_single_char() {
        assert!(like_match("cat", "c_t"));
        assert!(!like_match("cart", "c_t"));
    }

    #[test]
    fn anchored_start_and_end() {
        assert!(like_match("ProductA", "Prod%A"));
        assert!(!like_match("xProductA", "Prod%A"));
        assert!(!like_match("ProductAx", "Prod%A"));
    }

    #[test]
    fn escapes_regex_metacharacters_in_literal_parts() {
        assert!(like_match("a.b", "a.b"));
        assert!(!like_match("axb", "a.b"));
    }

    #[test]
    fn backslash_escapes_wildcards() {
        assert!(like_match("50%", "50\\%"));
        assert!(!like_match("50x", "50\\%"));
    }
}
