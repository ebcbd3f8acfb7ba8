//! Column definitions
//!
//! A view declares its columns as a list of [`ListDisplay`] entries. Each
//! entry is resolved against the record schema into a [`Column`] that knows
//! its title, how to read its value and whether it can be sorted.

pub mod base;

pub use base::Column;

use crate::model::{Accessor, ModelMeta, Record};
use crate::text::{humanize_field_name, title_case};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Function rendering a cell directly from a record
///
/// The returned value must be [`Value::Safe`]; anything else is rejected
/// when the cell is resolved.
pub type RenderFn = Arc<dyn Fn(&dyn Record) -> Value + Send + Sync>;

/// One entry of a view's column list
///
/// # Examples
///
/// ```
/// use reinhardt_smart_lists::column::ListDisplay;
/// use reinhardt_smart_lists::html::SafeString;
/// use reinhardt_smart_lists::Value;
///
/// let display = vec![
///     ListDisplay::from("title"),
///     ListDisplay::from(("category", "Kind")),
///     ListDisplay::render(|_| Value::Safe(SafeString::new("<b>x</b>"))).with_label("Custom"),
/// ];
/// assert_eq!(display[0].field_name(), Some("title"));
/// assert_eq!(display[1].label(), Some("Kind"));
/// assert!(display[2].render_function().is_some());
/// ```
#[derive(Clone)]
pub enum ListDisplay {
	/// Field, method or projection key
	Field(String),
	/// Field, method or projection key with an explicit title
	Labeled {
		/// Accessor name
		field: String,
		/// Column title
		label: String,
	},
	/// Cell produced by a render function
	Render {
		/// Render function
		function: RenderFn,
		/// Column title
		label: Option<String>,
	},
}

impl ListDisplay {
	/// Create a render-function entry
	pub fn render<F>(function: F) -> Self
	where
		F: Fn(&dyn Record) -> Value + Send + Sync + 'static,
	{
		ListDisplay::Render {
			function: Arc::new(function),
			label: None,
		}
	}

	/// Set an explicit column title
	pub fn with_label(self, label: impl Into<String>) -> Self {
		let label = label.into();
		match self {
			ListDisplay::Field(field) | ListDisplay::Labeled { field, .. } => {
				ListDisplay::Labeled { field, label }
			}
			ListDisplay::Render { function, .. } => ListDisplay::Render {
				function,
				label: Some(label),
			},
		}
	}

	/// Accessor name, absent for render functions
	pub fn field_name(&self) -> Option<&str> {
		match self {
			ListDisplay::Field(field) | ListDisplay::Labeled { field, .. } => Some(field),
			ListDisplay::Render { .. } => None,
		}
	}

	/// Explicit column title
	pub fn label(&self) -> Option<&str> {
		match self {
			ListDisplay::Field(_) => None,
			ListDisplay::Labeled { label, .. } => Some(label),
			ListDisplay::Render { label, .. } => label.as_deref(),
		}
	}

	/// Render function
	pub fn render_function(&self) -> Option<&RenderFn> {
		match self {
			ListDisplay::Render { function, .. } => Some(function),
			_ => None,
		}
	}
}

impl fmt::Debug for ListDisplay {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ListDisplay::Field(field) => f.debug_tuple("Field").field(field).finish(),
			ListDisplay::Labeled { field, label } => f
				.debug_struct("Labeled")
				.field("field", field)
				.field("label", label)
				.finish(),
			ListDisplay::Render { label, .. } => f
				.debug_struct("Render")
				.field("label", label)
				.finish_non_exhaustive(),
		}
	}
}

impl From<&str> for ListDisplay {
	fn from(field: &str) -> Self {
		ListDisplay::Field(field.to_string())
	}
}

impl From<String> for ListDisplay {
	fn from(field: String) -> Self {
		ListDisplay::Field(field)
	}
}

impl From<(&str, &str)> for ListDisplay {
	fn from((field, label): (&str, &str)) -> Self {
		ListDisplay::Labeled {
			field: field.to_string(),
			label: label.to_string(),
		}
	}
}

/// Derive a human readable title
///
/// Used for columns and filters alike. The first available source wins:
///
/// 1. the explicit label
/// 2. the schema field's verbose name, title-cased
/// 3. the model's verbose name for the default string representation
/// 4. the method's short description
/// 5. the accessor name with underscores replaced by spaces, title-cased
///
/// # Examples
///
/// ```
/// use reinhardt_smart_lists::column::derive_title;
/// use reinhardt_smart_lists::model::{FieldKind, FieldMeta, MethodMeta, ModelMeta};
///
/// let meta = ModelMeta::new("sample_model")
///     .with_field(FieldMeta::new("title", FieldKind::Char))
///     .with_method(MethodMeta::new("friendly_category").with_short_description("Category"));
///
/// assert_eq!(derive_title(&meta, Some("title"), None), "Title");
/// assert_eq!(derive_title(&meta, Some("__str__"), None), "Sample Model");
/// assert_eq!(derive_title(&meta, Some("friendly_category"), None), "Category");
/// assert_eq!(derive_title(&meta, Some("votes_total"), None), "Votes Total");
/// assert_eq!(derive_title(&meta, Some("title"), Some("Headline")), "Headline");
/// ```
pub fn derive_title(meta: &ModelMeta, field_name: Option<&str>, label: Option<&str>) -> String {
	if let Some(label) = label.filter(|label| !label.is_empty()) {
		return label.to_string();
	}
	let Some(field_name) = field_name else {
		return String::new();
	};
	match meta.resolve(field_name) {
		Accessor::Field(field) => title_case(&field.verbose_name()),
		Accessor::Str => title_case(&meta.verbose_name()),
		Accessor::Method(method) => method
			.short_description
			.unwrap_or_else(|| humanize_field_name(field_name)),
		Accessor::Key(_) => humanize_field_name(field_name),
	}
}
