//! Query parameters and URL merging

use indexmap::IndexMap;

/// Ordered, multi-valued query parameters of the current request
///
/// Keys keep the order in which they first appeared. Readers see the first
/// value of repeated keys.
///
/// # Examples
///
/// ```
/// use reinhardt_smart_lists::QueryParams;
///
/// let params = QueryParams::parse("o=-2.1&q=rust+lang&category=foo&category=bar");
/// assert_eq!(params.get("o"), Some("-2.1"));
/// assert_eq!(params.get("q"), Some("rust lang"));
/// assert_eq!(params.get("category"), Some("foo"));
/// assert!(!params.contains("page"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
	values: IndexMap<String, Vec<String>>,
}

impl QueryParams {
	/// Create empty parameters
	pub fn new() -> Self {
		Self::default()
	}

	/// Parse an `application/x-www-form-urlencoded` query string
	///
	/// A leading `?` is ignored. Malformed input yields the pairs that
	/// could be decoded.
	pub fn parse(query: &str) -> Self {
		let query = query.strip_prefix('?').unwrap_or(query);
		let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).unwrap_or_default();
		pairs.into_iter().collect()
	}

	/// Builder-style insert, replacing existing values
	pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.set(key, value);
		self
	}

	/// Replace all values of a key
	pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.values.insert(key.into(), vec![value.into()]);
	}

	/// Append a value to a key
	pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.values.entry(key.into()).or_default().push(value.into());
	}

	/// Remove a key
	pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
		self.values.shift_remove(key)
	}

	/// First value of a key
	pub fn get(&self, key: &str) -> Option<&str> {
		self.values
			.get(key)
			.and_then(|values| values.first())
			.map(String::as_str)
	}

	/// All values of a key
	pub fn get_all(&self, key: &str) -> &[String] {
		self.values.get(key).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Returns `true` if the key is present
	pub fn contains(&self, key: &str) -> bool {
		self.values.contains_key(key)
	}

	/// Returns `true` if no parameters are present
	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	/// Iterate keys with their first value
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.values.iter().filter_map(|(key, values)| {
			values.first().map(|value| (key.as_str(), value.as_str()))
		})
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
	fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
		let mut params = QueryParams::new();
		for (key, value) in iter {
			params.append(key, value);
		}
		params
	}
}

/// Build a query string from the current parameters with changes applied
///
/// Each parameter keeps only its first value. Keys listed in `without` are
/// dropped, then `overrides` are applied: `Some(value)` sets a key (keeping
/// its position when it already exists), `None` removes it. The result
/// always starts with `?`.
///
/// # Examples
///
/// ```
/// use reinhardt_smart_lists::{QueryParams, params::url_with_query_params};
///
/// let params = QueryParams::parse("q=test&page=3&o=1");
/// let url = url_with_query_params(&params, &[("category", Some("foo"))], &["page"]);
/// assert_eq!(url, "?q=test&o=1&category=foo");
///
/// let url = url_with_query_params(&params, &[("o", None)], &[]);
/// assert_eq!(url, "?q=test&page=3");
/// ```
pub fn url_with_query_params(
	params: &QueryParams,
	overrides: &[(&str, Option<&str>)],
	without: &[&str],
) -> String {
	let mut merged: IndexMap<&str, &str> = params
		.iter()
		.filter(|(key, _)| !without.contains(key))
		.collect();
	for &(key, value) in overrides {
		match value {
			Some(value) => {
				merged.insert(key, value);
			}
			None => {
				merged.shift_remove(key);
			}
		}
	}
	let pairs: Vec<(&str, &str)> = merged.into_iter().collect();
	// Serializing string pairs cannot fail.
	let encoded = serde_urlencoded::to_string(pairs).unwrap_or_default();
	format!("?{}", encoded)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[test]
	fn test_parse_keeps_first_value_and_order() {
		let params = QueryParams::parse("?b=2&a=1&b=3");
		assert_eq!(params.get("b"), Some("2"));
		assert_eq!(params.get_all("b"), &["2".to_string(), "3".to_string()]);
		let keys: Vec<&str> = params.iter().map(|(k, _)| k).collect();
		assert_eq!(keys, vec!["b", "a"]);
	}

	#[test]
	fn test_parse_empty() {
		assert!(QueryParams::parse("").is_empty());
		assert!(QueryParams::parse("?").is_empty());
	}

	#[rstest]
	#[case("", &[("o", Some("1"))], &[], "?o=1")]
	#[case("o=1", &[("o", Some("2.1"))], &[], "?o=2.1")]
	#[case("page=2&category=foo", &[("category", Some("bar"))], &["page"], "?category=bar")]
	#[case("page=2", &[], &["page"], "?")]
	#[case("q=a b", &[], &[], "?q=a+b")]
	#[case("o=1", &[("o", Some("-1.2"))], &[], "?o=-1.2")]
	fn test_url_with_query_params(
		#[case] query: &str,
		#[case] overrides: &[(&str, Option<&str>)],
		#[case] without: &[&str],
		#[case] expected: &str,
	) {
		let params = QueryParams::parse(query);
		assert_eq!(url_with_query_params(&params, overrides, without), expected);
	}

	#[test]
	fn test_set_and_remove() {
		let mut params = QueryParams::new().with("a", "1");
		params.set("a", "2");
		assert_eq!(params.get("a"), Some("2"));
		assert!(params.remove("a").is_some());
		assert!(!params.contains("a"));
	}
}
