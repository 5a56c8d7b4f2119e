use super::RenderError;

/// Default marker appended to cut text.
pub const DEFAULT_TAIL: &str = "...";

/// Collapse whitespace and cut `s` at a word boundary so it fits `length`.
///
/// Lengths are counted in characters. Text that already fits is returned with
/// whitespace collapsed. Otherwise the text is cut at the last space at or
/// before `length - tail.len()` and `tail` is appended, so the result never
/// exceeds `length`. If no such space exists the text cannot be shortened
/// cleanly.
///
/// # Errors
///
/// Returns [`RenderError::NoBoundary`] when the text is too long and has no
/// space at or before the cut point.
pub fn truncated(s: &str, length: usize, tail: &str) -> Result<String, RenderError> {
    let clean = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if clean.chars().count() <= length {
        return Ok(clean);
    }

    let limit = length.saturating_sub(tail.chars().count());
    let stop = clean
        .char_indices()
        .take(limit.saturating_add(1))
        .filter(|&(_, c)| c == ' ')
        .map(|(byte, _)| byte)
        .last()
        .ok_or(RenderError::NoBoundary { length })?;

    Ok(format!("{}{tail}", &clean[..stop]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn short_text_is_only_collapsed() {
        let out = truncated("  fix\tthis \n soon ", 40, DEFAULT_TAIL).expect("fits");
        assert_eq!(out, "fix this soon");
    }

    #[test]
    fn text_of_exact_length_is_kept() {
        let text = "a".repeat(20) + " " + &"b".repeat(19);
        assert_eq!(truncated(&text, 40, DEFAULT_TAIL).expect("fits"), text);
    }

    #[test]
    fn cuts_at_last_space_before_limit() {
        let out = truncated("foobar.py : 3-5 : Extract fallback logic for Bytes", 40, "...")
            .expect("boundary exists");
        assert_eq!(out, "foobar.py : 3-5 : Extract fallback...");
    }

    #[test]
    fn space_exactly_at_limit_is_a_boundary() {
        // limit = 10 - 3 = 7; the space sits at index 7.
        let out = truncated("abcdefg hijklmnop", 10, "...").expect("boundary exists");
        assert_eq!(out, "abcdefg...");
    }

    #[test]
    fn missing_boundary_is_an_error() {
        let err = truncated(&"x".repeat(80), 40, DEFAULT_TAIL).expect_err("no space");
        assert_eq!(err, RenderError::NoBoundary { length: 40 });
    }

    #[test]
    fn space_only_after_limit_is_an_error() {
        let text = format!("{} tail", "y".repeat(50));
        assert!(truncated(&text, 40, DEFAULT_TAIL).is_err());
    }

    #[test]
    fn counts_characters_not_bytes() {
        let text = "привіт світ як справи у тебе сьогодні друже мій";
        let out = truncated(text, 20, DEFAULT_TAIL).expect("boundary exists");
        assert_eq!(out, "привіт світ як...");
        assert!(out.chars().count() <= 20);
    }

    proptest! {
        #[test]
        fn result_never_exceeds_length(
            words in proptest::collection::vec("[a-z]{1,12}", 1..30),
            length in 5usize..120,
        ) {
            let text = words.join(" ");
            if let Ok(out) = truncated(&text, length, DEFAULT_TAIL) {
                prop_assert!(out.chars().count() <= length);
            }
        }

        #[test]
        fn fitting_text_round_trips(words in proptest::collection::vec("[a-z]{1,8}", 1..5)) {
            let text = words.join("  \t ");
            let clean = words.join(" ");
            prop_assert_eq!(truncated(&text, 60, DEFAULT_TAIL).expect("fits"), clean);
        }
    }
}
