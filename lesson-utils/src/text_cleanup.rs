//! Normalization applied to free-text answers before they are compared.

/// Normalize an answer for comparison: trims outer whitespace and lowercases.
///
/// Inner whitespace and punctuation are compared as typed.
pub fn normalize_answer(text: &str) -> String {
    text.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_and_outer_whitespace_are_ignored() {
        assert_eq!(normalize_answer("  About \n"), "about");
    }

    #[test]
    fn test_inner_whitespace_is_kept() {
        assert_eq!(normalize_answer("what   about"), "what   about");
    }

    #[test]
    fn test_typographic_quotes_are_kept() {
        assert_eq!(normalize_answer("I\u{2019}m"), "i\u{2019}m");
    }

    #[test]
    fn test_arabic_text_is_left_alone() {
        assert_eq!(normalize_answer(" عن "), "عن");
    }
}
