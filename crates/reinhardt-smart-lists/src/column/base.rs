//! Resolved columns

use super::{ListDisplay, RenderFn, derive_title};
use crate::error::{Result, SmartListError};
use crate::model::{Accessor, ModelMeta, RESERVED_PREFIX, STR_ACCESSOR};
use crate::ordering::SmartOrder;
use crate::params::QueryParams;
use std::fmt::{self, Debug};

/// A display entry bound to a record schema
///
/// # Example
///
/// ```rust
/// use reinhardt_smart_lists::column::{Column, ListDisplay};
/// use reinhardt_smart_lists::model::{FieldKind, FieldMeta, MethodMeta, ModelMeta};
///
/// let meta = ModelMeta::new("sample_model")
///     .with_field(FieldMeta::new("category", FieldKind::Char))
///     .with_method(MethodMeta::new("friendly_category").with_admin_order_field("category"));
///
/// let column = Column::new(&meta, &ListDisplay::from("friendly_category"), 1).unwrap();
/// assert_eq!(column.order_field.as_deref(), Some("category"));
/// assert_eq!(column.get_title(), "Friendly Category");
/// ```
#[derive(Clone)]
pub struct Column {
	/// 1-based position in the list
	pub column_id: usize,
	/// Accessor name, absent for render functions
	pub field_name: Option<String>,
	/// Explicit title
	pub label: Option<String>,
	/// Render function
	pub render_function: Option<RenderFn>,
	/// Resolved accessor, absent for render functions
	pub accessor: Option<Accessor>,
	/// Field used when sorting by this column; `None` if unorderable
	pub order_field: Option<String>,
	/// Sort state, attached to orderable columns by [`Column::with_order`]
	pub order: Option<SmartOrder>,
	title: String,
}

impl Column {
	/// Resolve a display entry
	///
	/// # Errors
	///
	/// Returns [`SmartListError::IllegalColumn`] for accessors starting with
	/// an underscore (other than `__str__`) and for data-altering methods.
	pub fn new(meta: &ModelMeta, display: &ListDisplay, column_id: usize) -> Result<Self> {
		let field_name = display.field_name();
		let label = display.label();
		let mut accessor = None;
		let mut order_field = None;

		if let Some(name) = field_name {
			if name.starts_with(RESERVED_PREFIX) && name != STR_ACCESSOR {
				return Err(SmartListError::IllegalColumn(format!(
					"'{}' is private; accessors starting with an underscore cannot be listed",
					name
				)));
			}
			let resolved = meta.resolve(name);
			order_field = match &resolved {
				Accessor::Field(field) => Some(field.name.clone()),
				Accessor::Method(method) if method.alters_data => {
					return Err(SmartListError::IllegalColumn(format!(
						"'{}' alters data and cannot be listed",
						name
					)));
				}
				Accessor::Method(method) => method.admin_order_field.clone(),
				Accessor::Str => None,
				Accessor::Key(key) => Some(key.clone()),
			};
			accessor = Some(resolved);
		}

		Ok(Self {
			column_id,
			field_name: field_name.map(str::to_string),
			label: label.map(str::to_string),
			render_function: display.render_function().cloned(),
			accessor,
			order_field,
			order: None,
			title: derive_title(meta, field_name, label),
		})
	}

	/// The default column shown when no display entries are declared
	pub fn default_for(meta: &ModelMeta) -> Self {
		Self {
			column_id: 1,
			field_name: Some(STR_ACCESSOR.to_string()),
			label: None,
			render_function: None,
			accessor: Some(Accessor::Str),
			order_field: None,
			order: None,
			title: derive_title(meta, Some(STR_ACCESSOR), None),
		}
	}

	/// Attach the sort state of the current request to an orderable column
	///
	/// Unorderable columns are returned unchanged.
	pub fn with_order(mut self, query_params: &QueryParams, ordering_query_param: &str) -> Result<Self> {
		if self.order_field.is_some() {
			self.order = Some(SmartOrder::new(query_params, self.column_id, ordering_query_param)?);
		}
		Ok(self)
	}

	/// Column title
	pub fn get_title(&self) -> &str {
		&self.title
	}

	/// Returns `true` if the column can be sorted
	pub fn is_orderable(&self) -> bool {
		self.order_field.is_some()
	}
}

impl Debug for Column {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Column")
			.field("column_id", &self.column_id)
			.field("field_name", &self.field_name)
			.field("title", &self.title)
			.field("order_field", &self.order_field)
			.field("render_function", &self.render_function.is_some())
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::html::SafeString;
	use crate::model::{FieldKind, FieldMeta, MethodMeta};
	use crate::value::Value;
	use rstest::{fixture, rstest};

	#[fixture]
	fn meta() -> ModelMeta {
		ModelMeta::new("sample_model")
			.with_field(FieldMeta::new("title", FieldKind::Char))
			.with_field(FieldMeta::new("category", FieldKind::Char))
			.with_method(MethodMeta::new("some_display_method"))
			.with_method(MethodMeta::new("delete").altering_data())
			.with_method(MethodMeta::new("_delete"))
	}

	#[rstest]
	#[case("_delete")]
	#[case("_meta")]
	#[case("__class__")]
	#[case("delete")]
	fn test_illegal_accessors_are_rejected(meta: ModelMeta, #[case] name: &str) {
		let result = Column::new(&meta, &ListDisplay::from(name), 1);
		assert!(matches!(result, Err(SmartListError::IllegalColumn(_))));
	}

	#[rstest]
	#[case("title", Some("title"))]
	#[case("some_display_method", None)]
	#[case("__str__", None)]
	#[case("annotated_total", Some("annotated_total"))]
	fn test_order_field(meta: ModelMeta, #[case] name: &str, #[case] expected: Option<&str>) {
		let column = Column::new(&meta, &ListDisplay::from(name), 1).unwrap();
		assert_eq!(column.order_field.as_deref(), expected);
		assert_eq!(column.is_orderable(), expected.is_some());
	}

	#[rstest]
	fn test_render_function_column(meta: ModelMeta) {
		let display = ListDisplay::render(|_| Value::Safe(SafeString::new("<i>x</i>"))).with_label("Custom");
		let column = Column::new(&meta, &display, 2).unwrap();
		assert!(column.field_name.is_none());
		assert!(column.render_function.is_some());
		assert!(!column.is_orderable());
		assert_eq!(column.get_title(), "Custom");
	}

	#[rstest]
	fn test_with_order_only_for_orderable_columns(meta: ModelMeta) {
		let params = QueryParams::parse("o=2.1");
		let title = Column::new(&meta, &ListDisplay::from("title"), 1)
			.unwrap()
			.with_order(&params, "o")
			.unwrap();
		let order = title.order.expect("orderable column has sort state");
		assert_eq!(order.priority(), Some(2));

		let method = Column::new(&meta, &ListDisplay::from("some_display_method"), 2)
			.unwrap()
			.with_order(&params, "o")
			.unwrap();
		assert!(method.order.is_none());
	}

	#[rstest]
	fn test_default_column(meta: ModelMeta) {
		let column = Column::default_for(&meta);
		assert_eq!(column.column_id, 1);
		assert_eq!(column.get_title(), "Sample Model");
		assert_eq!(column.accessor, Some(Accessor::Str));
	}
}
