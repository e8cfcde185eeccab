/// Split `text` into contiguous, non-overlapping chunks of at most `max_chars`
/// characters, in order. Boundaries always fall on character boundaries.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<&str> {
    if max_chars == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == max_chars {
            chunks.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() {
        chunks.push(&text[start..]);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_one_chunk() {
        assert_eq!(split_into_chunks("hello", 8000), vec!["hello"]);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(split_into_chunks("", 10).is_empty());
    }

    #[test]
    fn test_exact_multiple() {
        assert_eq!(split_into_chunks("abcdef", 3), vec!["abc", "def"]);
        assert_eq!(split_into_chunks("abcdefg", 3), vec!["abc", "def", "g"]);
    }

    #[test]
    fn test_chunks_concatenate_to_input() {
        let text = "00:00:01 héllo wörld\n00:00:05 naïve café 🎙️ talk\n".repeat(50);
        let chunks = split_into_chunks(&text, 37);

        assert_eq!(chunks.concat(), text);
        assert!(chunks.iter().all(|c| c.chars().count() <= 37));
        assert!(chunks[..chunks.len() - 1].iter().all(|c| c.chars().count() == 37));
    }
}
