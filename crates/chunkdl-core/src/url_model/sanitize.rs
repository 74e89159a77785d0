//! Filename sanitization.

/// Sanitizes a candidate filename for local use.
///
/// - Replaces NUL, `/`, `\`, whitespace, and control characters with `_`
/// - Collapses consecutive underscores
/// - Trims leading/trailing dots and underscores
/// - Limits length to 255 bytes (NAME_MAX)
pub fn sanitize_filename(name: &str) -> String {
    const NAME_MAX: usize = 255;

    let mut out = String::with_capacity(name.len());
    let mut prev_underscore = false;
    for c in name.chars() {
        let bad = c == '\0' || c == '/' || c == '\\' || c.is_control() || c.is_whitespace();
        let c = if bad { '_' } else { c };
        if c == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(c);
            prev_underscore = false;
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_');
    let mut take = trimmed.len().min(NAME_MAX);
    while !trimmed.is_char_boundary(take) {
        take -= 1;
    }
    trimmed[..take].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_separators_and_whitespace() {
        assert_eq!(sanitize_filename("a/b\\c d.txt"), "a_b_c_d.txt");
        assert_eq!(sanitize_filename("tab\there"), "tab_here");
    }

    #[test]
    fn trims_dots_and_underscores() {
        assert_eq!(sanitize_filename("..hidden.."), "hidden");
        assert_eq!(sanitize_filename("__x__"), "x");
        assert_eq!(sanitize_filename(".."), "");
    }

    #[test]
    fn limits_length_on_char_boundary() {
        let long = "é".repeat(200);
        let s = sanitize_filename(&long);
        assert!(s.len() <= 255);
        assert!(s.chars().all(|c| c == 'é'));
    }
}
