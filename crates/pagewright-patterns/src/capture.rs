//! Regex capture helpers.

use regex::Regex;

/// Extract the parameter capture groups when `text` matches `re`.
///
/// Group 0 (the full match) is skipped so only parameters contribute to the
/// result. Groups that did not participate yield empty strings to keep
/// positional alignment with the pattern's parameters.
///
/// # Examples
/// ```
/// # use regex::Regex;
/// # use pagewright_patterns::extract_captured_values;
/// let regex = Regex::new(r"^add ([0-9]+) of ([^\s]+)$")?;
/// assert_eq!(
///     extract_captured_values(&regex, "add 2 of backpack"),
///     Some(vec!["2".to_string(), "backpack".to_string()])
/// );
/// assert!(extract_captured_values(&regex, "remove backpack").is_none());
/// # Ok::<(), regex::Error>(())
/// ```
#[must_use]
pub fn extract_captured_values(re: &Regex, text: &str) -> Option<Vec<String>> {
    let caps = re.captures(text)?;
    Some(
        caps.iter()
            .skip(1)
            .map(|group| group.map_or_else(String::new, |m| m.as_str().to_owned()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[expect(clippy::expect_used, reason = "tests require descriptive panic messages")]
    fn regex(source: &str) -> Regex {
        Regex::new(source).expect("test regex must compile")
    }

    #[test]
    fn literal_patterns_capture_nothing() {
        let re = regex(r"^the cart is empty$");
        assert_eq!(
            extract_captured_values(&re, "the cart is empty"),
            Some(Vec::new())
        );
    }

    #[test]
    fn non_participating_groups_are_empty() {
        let re = regex(r"^(a)?(b)?$");
        assert_eq!(
            extract_captured_values(&re, "b"),
            Some(vec![String::new(), "b".to_string()])
        );
    }
}
