//! HTML escaping and safe strings for cell rendering

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Escape HTML special characters
///
/// # Examples
///
/// ```
/// use reinhardt_smart_lists::html::escape;
///
/// assert_eq!(escape("Hello, World!"), "Hello, World!");
/// assert_eq!(escape("<script>alert('XSS')</script>"),
///            "&lt;script&gt;alert(&#x27;XSS&#x27;)&lt;/script&gt;");
/// assert_eq!(escape("5 < 10 & 10 > 5"), "5 &lt; 10 &amp; 10 &gt; 5");
/// ```
pub fn escape(text: &str) -> String {
	let mut result = String::with_capacity(text.len() + 10);
	for ch in text.chars() {
		match ch {
			'&' => result.push_str("&amp;"),
			'<' => result.push_str("&lt;"),
			'>' => result.push_str("&gt;"),
			'"' => result.push_str("&quot;"),
			'\'' => result.push_str("&#x27;"),
			_ => result.push(ch),
		}
	}
	result
}

/// String explicitly marked as safe for unescaped output
///
/// Render functions must return this type. Constructing one asserts that
/// any user input inside has already been escaped.
///
/// # Examples
///
/// ```
/// use reinhardt_smart_lists::html::SafeString;
///
/// let safe = SafeString::new("<b>Bold</b>");
/// assert_eq!(safe.as_str(), "<b>Bold</b>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SafeString(String);

impl SafeString {
	/// Create a new SafeString that bypasses HTML escaping
	pub fn new(s: impl Into<String>) -> Self {
		Self(s.into())
	}

	/// Get the string content
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Consume and return the inner string
	pub fn into_string(self) -> String {
		self.0
	}
}

impl fmt::Display for SafeString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<String> for SafeString {
	fn from(s: String) -> Self {
		Self(s)
	}
}

impl From<&str> for SafeString {
	fn from(s: &str) -> Self {
		Self(s.to_string())
	}
}

/// Values that can be interpolated into HTML
pub trait ToHtml {
	/// Return the HTML representation, escaping unless already safe
	fn to_html(&self) -> Cow<'_, str>;
}

impl ToHtml for &str {
	fn to_html(&self) -> Cow<'_, str> {
		Cow::Owned(escape(self))
	}
}

impl ToHtml for String {
	fn to_html(&self) -> Cow<'_, str> {
		Cow::Owned(escape(self))
	}
}

impl ToHtml for SafeString {
	fn to_html(&self) -> Cow<'_, str> {
		Cow::Borrowed(&self.0)
	}
}

/// Format HTML with named placeholders
///
/// Arguments are escaped unless they are [`SafeString`]s. Placeholders
/// without a matching argument are left untouched.
///
/// # Examples
///
/// ```
/// use reinhardt_smart_lists::html::{format_html, SafeString, ToHtml};
///
/// let html = format_html("<td>{value}</td>", &[("value", &"<b>" as &dyn ToHtml)]);
/// assert_eq!(html.as_str(), "<td>&lt;b&gt;</td>");
///
/// let bold = SafeString::new("<b>x</b>");
/// let html = format_html("<td>{value}</td>", &[("value", &bold as &dyn ToHtml)]);
/// assert_eq!(html.as_str(), "<td><b>x</b></td>");
/// ```
pub fn format_html(template: &str, args: &[(&str, &dyn ToHtml)]) -> SafeString {
	let mut result = String::with_capacity(template.len() + 32);
	let mut rest = template;
	while let Some(start) = rest.find('{') {
		result.push_str(&rest[..start]);
		let after = &rest[start + 1..];
		match after.find('}') {
			Some(end) => {
				let key = &after[..end];
				match args.iter().find(|(name, _)| *name == key) {
					Some((_, value)) => result.push_str(&value.to_html()),
					None => {
						result.push('{');
						result.push_str(key);
						result.push('}');
					}
				}
				rest = &after[end + 1..];
			}
			None => {
				result.push_str(&rest[start..]);
				rest = "";
			}
		}
	}
	result.push_str(rest);
	SafeString(result)
}
