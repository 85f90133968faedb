//! Free-text cleanup applied before anything is persisted.

/// Trim, drop angle brackets and cap the result at `max` characters.
#[must_use]
pub fn clean(input: &str, max: usize) -> String {
    let stripped: String = input.chars().filter(|c| !matches!(c, '<' | '>')).collect();
    stripped
        .trim()
        .chars()
        .take(max)
        .collect::<String>()
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::clean;

    #[test]
    fn strips_markup_brackets() {
        assert_eq!(clean("<b>Community Hall</b>", 100), "bCommunity Hall/b");
        assert_eq!(clean("  <script>x</script>  ", 100), "scriptx/script");
    }

    #[test]
    fn truncates_on_character_boundaries() {
        assert_eq!(clean("قاعة المجتمع", 4), "قاعة");
        assert_eq!(clean("abcdef", 3), "abc");
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(clean("Doing well", 1000), "Doing well");
    }
}
