//! Char-indexed input manipulation
//! Extracted for testability

/// Byte offset of the given char position, clamped to the end of the input
pub fn byte_index(input: &str, char_pos: usize) -> usize {
    input
        .char_indices()
        .nth(char_pos)
        .map(|(i, _)| i)
        .unwrap_or(input.len())
}

/// Split at a char position, never inside a multi-byte character
pub fn split_at_char(input: &str, char_pos: usize) -> (&str, &str) {
    input.split_at(byte_index(input, char_pos))
}

/// Insert a character at a char position
pub fn insert_char(input: &mut String, char_pos: usize, c: char) {
    let idx = byte_index(input, char_pos);
    input.insert(idx, c);
}

/// Remove the character at a char position, if there is one
pub fn remove_char(input: &mut String, char_pos: usize) {
    let idx = byte_index(input, char_pos);
    if idx < input.len() {
        input.remove(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_index_ascii() {
        assert_eq!(byte_index("hello", 0), 0);
        assert_eq!(byte_index("hello", 3), 3);
        assert_eq!(byte_index("hello", 5), 5);
        assert_eq!(byte_index("hello", 99), 5);
    }

    #[test]
    fn test_byte_index_multibyte() {
        // 'é' is two bytes, so char 1 starts at byte 2
        assert_eq!(byte_index("été", 1), 2);
        assert_eq!(byte_index("été", 2), 3);
        assert_eq!(byte_index("été", 3), 5);
    }

    #[test]
    fn test_split_at_char_stays_on_boundaries() {
        assert_eq!(split_at_char("é", 1), ("é", ""));
        assert_eq!(split_at_char("café", 3), ("caf", "é"));
        assert_eq!(split_at_char("späße", 3), ("spä", "ße"));
    }

    #[test]
    fn test_split_at_char_clamps_past_end() {
        assert_eq!(split_at_char("hi", 5), ("hi", ""));
        assert_eq!(split_at_char("", 0), ("", ""));
    }

    #[test]
    fn test_insert_char_mid_word() {
        let mut input = "cafe".to_string();
        insert_char(&mut input, 3, 'é');
        assert_eq!(input, "cafée");

        let mut input = "é".to_string();
        insert_char(&mut input, 1, '!');
        assert_eq!(input, "é!");
    }

    #[test]
    fn test_remove_char_multibyte() {
        let mut input = "café".to_string();
        remove_char(&mut input, 3);
        assert_eq!(input, "caf");

        let mut input = "été".to_string();
        remove_char(&mut input, 0);
        assert_eq!(input, "té");
    }

    #[test]
    fn test_remove_char_past_end_is_noop() {
        let mut input = "hi".to_string();
        remove_char(&mut input, 2);
        assert_eq!(input, "hi");
    }
}
