//! Text helpers for column and filter titles

/// Title-case a string
///
/// The first letter of every word is upper-cased and every other letter
/// lower-cased. Word boundaries are any non-alphabetic characters.
///
/// # Examples
///
/// ```
/// use reinhardt_smart_lists::text::title_case;
///
/// assert_eq!(title_case("blog post"), "Blog Post");
/// assert_eq!(title_case("sAMPLE model"), "Sample Model");
/// assert_eq!(title_case("e-mail address"), "E-Mail Address");
/// ```
pub fn title_case(text: &str) -> String {
	let mut result = String::with_capacity(text.len());
	let mut at_word_start = true;
	for ch in text.chars() {
		if ch.is_alphabetic() {
			if at_word_start {
				result.extend(ch.to_uppercase());
			} else {
				result.extend(ch.to_lowercase());
			}
			at_word_start = false;
		} else {
			result.push(ch);
			at_word_start = true;
		}
	}
	result
}

/// Convert a field name to a human readable label
///
/// Underscores become spaces and the result is title-cased.
///
/// # Examples
///
/// ```
/// use reinhardt_smart_lists::text::humanize_field_name;
///
/// assert_eq!(humanize_field_name("some_display_method"), "Some Display Method");
/// assert_eq!(humanize_field_name("title"), "Title");
/// ```
pub fn humanize_field_name(name: &str) -> String {
	title_case(&name.replace('_', " "))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("", "")]
	#[case("title", "Title")]
	#[case("friendly_category", "Friendly Category")]
	#[case("foreign_1", "Foreign 1")]
	#[case("__str__", "  Str  ")]
	fn test_humanize_field_name(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(humanize_field_name(input), expected);
	}

	#[test]
	fn test_title_case_digits_break_words() {
		assert_eq!(title_case("3rd place"), "3Rd Place");
	}
}
