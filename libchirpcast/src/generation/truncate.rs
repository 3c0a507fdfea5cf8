//! Sentence-safe truncation
//!
//! Lengths are counted in characters (Unicode scalar values), which is how
//! post length is presented to users.

const ELLIPSIS: &str = "...";
const ELLIPSIS_LEN: usize = 3;

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Truncate `text` to at most `max_length` characters, ending on a complete sentence
///
/// Text that already fits is returned unchanged. Otherwise the longest prefix
/// that ends in `.`, `!` or `?` followed by whitespace is kept, so decimal
/// points and abbreviations inside a word never count as sentence ends. When
/// no sentence fits, the text is cut at the last word boundary and marked
/// with `...`, and a single overlong word is hard-cut the same way. The result
/// never exceeds `max_length`.
pub fn truncate_to_complete_sentence(text: &str, max_length: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_length {
        return text.to_string();
    }

    if max_length <= ELLIPSIS_LEN {
        return chars[..max_length].iter().collect();
    }

    // chars[end + 1] exists because chars.len() > max_length > end
    let sentence_end = (0..max_length)
        .rev()
        .find(|&i| is_terminator(chars[i]) && chars[i + 1].is_whitespace());
    if let Some(end) = sentence_end {
        return chars[..=end].iter().collect();
    }

    let budget = max_length - ELLIPSIS_LEN;
    let word_end = (1..=budget).rev().find(|&i| chars[i].is_whitespace());
    if let Some(end) = word_end {
        let prefix: String = chars[..end].iter().collect();
        let prefix = prefix.trim_end();
        if !prefix.trim_start().is_empty() {
            return format!("{}{}", prefix, ELLIPSIS);
        }
    }

    let hard: String = chars[..budget].iter().collect();
    format!("{}{}", hard.trim_end(), ELLIPSIS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_short_text_is_unchanged() {
        assert_eq!(truncate_to_complete_sentence("Hi there.", 50), "Hi there.");
        assert_eq!(truncate_to_complete_sentence("no period", 9), "no period");
    }

    #[test]
    fn test_cuts_at_last_complete_sentence() {
        let text = "First sentence. Second one! Third goes on and on";
        assert_eq!(
            truncate_to_complete_sentence(text, 30),
            "First sentence. Second one!"
        );
        assert_eq!(truncate_to_complete_sentence(text, 20), "First sentence.");
    }

    #[test]
    fn test_question_marks_end_sentences() {
        let text = "Is it shipping? Yes, today, with all the trimmings";
        assert_eq!(truncate_to_complete_sentence(text, 25), "Is it shipping?");
    }

    #[test]
    fn test_decimal_points_are_not_sentence_ends() {
        let text = "Release v2.0 is out with many fixes for everyone";
        let truncated = truncate_to_complete_sentence(text, 20);
        assert_eq!(truncated, "Release v2.0 is...");
    }

    #[test]
    fn test_falls_back_to_word_boundary() {
        let text = "no sentence ends anywhere in this long text";
        let truncated = truncate_to_complete_sentence(text, 16);
        assert_eq!(truncated, "no sentence...");
        assert!(truncated.chars().count() <= 16);
    }

    #[test]
    fn test_hard_cut_for_single_long_word() {
        let text = "supercalifragilisticexpialidocious";
        assert_eq!(truncate_to_complete_sentence(text, 10), "superca...");
    }

    #[test]
    fn test_tiny_limits() {
        assert_eq!(truncate_to_complete_sentence("Hello world.", 3), "Hel");
        assert_eq!(truncate_to_complete_sentence("Hello world.", 0), "");
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let text = "Héllo wörld. Ünïcode everywhere";
        assert_eq!(truncate_to_complete_sentence(text, 14), "Héllo wörld.");
    }

    proptest! {
        #[test]
        fn prop_never_exceeds_limit(text in "\\PC{0,300}", max in 0usize..320) {
            let truncated = truncate_to_complete_sentence(&text, max);
            prop_assert!(truncated.chars().count() <= max || truncated == text);
            if text.chars().count() <= max {
                prop_assert_eq!(truncated, text);
            } else {
                prop_assert!(truncated.chars().count() <= max);
            }
        }

        #[test]
        fn prop_truncated_text_ends_on_terminator(
            sentences in proptest::collection::vec("[A-Za-z ]{1,40}[.!?]", 1..8),
            max in 4usize..200,
        ) {
            let text = sentences.join(" ");
            let truncated = truncate_to_complete_sentence(&text, max);
            if text.chars().count() > max {
                let last = truncated.chars().last();
                prop_assert!(matches!(last, Some('.') | Some('!') | Some('?')));
                prop_assert!(text.starts_with(truncated.trim_end_matches(ELLIPSIS)));
            }
        }
    }
}
