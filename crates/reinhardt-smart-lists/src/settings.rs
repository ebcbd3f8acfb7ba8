//! Smart list settings
//!
//! Query parameter names and value formatting options shared by every
//! smart list in a project. Settings can be embedded in a project's TOML
//! configuration:
//!
//! ```toml
//! ordering_query_param = "sort"
//! search_query_param = "search"
//! date_format = "%d.%m.%Y"
//! ```

use crate::error::{Result, SmartListError};
use serde::{Deserialize, Serialize};

/// Query parameter names and formatting options
///
/// # Examples
///
/// ```
/// use reinhardt_smart_lists::SmartListSettings;
///
/// let settings = SmartListSettings::default();
/// assert_eq!(settings.ordering_query_param, "o");
/// assert_eq!(settings.search_query_param, "q");
/// assert_eq!(settings.export_query_param, "e");
/// assert_eq!(settings.page_query_param, "page");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartListSettings {
	/// Parameter carrying the sort token
	pub ordering_query_param: String,
	/// Parameter carrying the free-text search term
	pub search_query_param: String,
	/// Parameter selecting an export backend by index
	pub export_query_param: String,
	/// Pagination parameter, cleared whenever a filter link is generated
	pub page_query_param: String,
	/// `chrono` format used for date cells
	pub date_format: String,
	/// `chrono` format used for datetime cells
	pub datetime_format: String,
	/// Text shown for empty (null) values
	pub empty_value_display: String,
}

impl Default for SmartListSettings {
	fn default() -> Self {
		Self {
			ordering_query_param: "o".to_string(),
			search_query_param: "q".to_string(),
			export_query_param: "e".to_string(),
			page_query_param: "page".to_string(),
			date_format: "%Y-%m-%d".to_string(),
			datetime_format: "%Y-%m-%d %H:%M".to_string(),
			empty_value_display: String::new(),
		}
	}
}

impl SmartListSettings {
	/// Parse settings from TOML text
	///
	/// Missing keys fall back to their defaults.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_smart_lists::SmartListSettings;
	///
	/// let settings = SmartListSettings::from_toml_str("ordering_query_param = \"sort\"").unwrap();
	/// assert_eq!(settings.ordering_query_param, "sort");
	/// assert_eq!(settings.search_query_param, "q");
	/// ```
	pub fn from_toml_str(source: &str) -> Result<Self> {
		toml::from_str(source).map_err(|e| SmartListError::Settings(e.to_string()))
	}

	/// Set the ordering parameter name
	pub fn with_ordering_query_param(mut self, name: impl Into<String>) -> Self {
		self.ordering_query_param = name.into();
		self
	}

	/// Set the search parameter name
	pub fn with_search_query_param(mut self, name: impl Into<String>) -> Self {
		self.search_query_param = name.into();
		self
	}

	/// Set the export parameter name
	pub fn with_export_query_param(mut self, name: impl Into<String>) -> Self {
		self.export_query_param = name.into();
		self
	}

	/// Set the text displayed for null values
	pub fn with_empty_value_display(mut self, text: impl Into<String>) -> Self {
		self.empty_value_display = text.into();
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_from_toml_overrides_and_defaults() {
		let settings = SmartListSettings::from_toml_str(
			r#"
			search_query_param = "search"
			date_format = "%d.%m.%Y"
			"#,
		)
		.unwrap();

		assert_eq!(settings.search_query_param, "search");
		assert_eq!(settings.date_format, "%d.%m.%Y");
		assert_eq!(settings.ordering_query_param, "o");
		assert_eq!(settings.datetime_format, "%Y-%m-%d %H:%M");
	}

	#[test]
	fn test_from_toml_invalid() {
		let result = SmartListSettings::from_toml_str("ordering_query_param = 5");
		assert!(matches!(result, Err(SmartListError::Settings(_))));
	}

	#[test]
	fn test_builder_methods() {
		let settings = SmartListSettings::default()
			.with_ordering_query_param("sort")
			.with_export_query_param("export")
			.with_empty_value_display("-");

		assert_eq!(settings.ordering_query_param, "sort");
		assert_eq!(settings.export_query_param, "export");
		assert_eq!(settings.empty_value_display, "-");
	}
}
