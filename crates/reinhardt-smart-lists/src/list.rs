//! The smart list aggregate
//!
//! [`SmartList`] binds a collection, its column list, its filters and the
//! current query parameters. Rows are fetched only when [`SmartList::items`]
//! is called and cell values are resolved only when a
//! [`SmartListField`] is rendered or exported.

use crate::column::{Column, ListDisplay};
use crate::error::{Result, SmartListError};
use crate::filters::SmartFilter;
use crate::html::{SafeString, ToHtml, escape, format_html};
use crate::model::{Accessor, Record};
use crate::params::QueryParams;
use crate::query::QuerySet;
use crate::settings::SmartListSettings;
use crate::value::Value;
use std::sync::Arc;

/// Columns, filters and rows of one list view request
///
/// # Examples
///
/// ```
/// use reinhardt_smart_lists::column::ListDisplay;
/// use reinhardt_smart_lists::list::SmartList;
/// use reinhardt_smart_lists::model::{FieldKind, FieldMeta, ModelMeta, ValuesRow};
/// use reinhardt_smart_lists::query::memory::MemoryQuerySet;
/// use reinhardt_smart_lists::{QueryParams, SmartListSettings};
///
/// let meta = ModelMeta::new("post").with_field(FieldMeta::new("title", FieldKind::Char));
/// let posts = MemoryQuerySet::new(meta).with_record(ValuesRow::new().with("id", 1i64).with("title", "Hello"));
///
/// let list = SmartList::new(
///     posts,
///     &QueryParams::parse("o=1"),
///     &[ListDisplay::from("title")],
///     &SmartListSettings::default(),
/// )
/// .unwrap();
///
/// assert_eq!(list.columns()[0].get_title(), "Title");
/// let items = list.items().unwrap();
/// let cells: Vec<String> = items[0]
///     .fields()
///     .iter()
///     .map(|field| field.render().unwrap().into_string())
///     .collect();
/// assert_eq!(cells, vec!["<td>Hello</td>"]);
/// ```
#[derive(Debug, Clone)]
pub struct SmartList<Q: QuerySet> {
	object_list: Q,
	query_params: QueryParams,
	settings: SmartListSettings,
	columns: Vec<Column>,
	filters: Vec<SmartFilter>,
	search_fields: Vec<String>,
}

impl<Q: QuerySet> SmartList<Q> {
	/// Bind a collection to a column list
	///
	/// An empty column list yields a single column showing each record's
	/// default string representation.
	///
	/// # Errors
	///
	/// Returns [`SmartListError::IllegalColumn`] for columns that may not be
	/// listed and [`SmartListError::IllegalOrdering`] for an undecodable
	/// sort token.
	pub fn new(
		object_list: Q,
		query_params: &QueryParams,
		list_display: &[ListDisplay],
		settings: &SmartListSettings,
	) -> Result<Self> {
		let meta = object_list.meta();
		let ordering_param = settings.ordering_query_param.as_str();
		let columns = if list_display.is_empty() {
			vec![Column::default_for(meta).with_order(query_params, ordering_param)?]
		} else {
			list_display
				.iter()
				.enumerate()
				.map(|(index, display)| {
					Column::new(meta, display, index + 1)?.with_order(query_params, ordering_param)
				})
				.collect::<Result<Vec<_>>>()?
		};
		Ok(Self {
			object_list,
			query_params: query_params.clone(),
			settings: settings.clone(),
			columns,
			filters: Vec::new(),
			search_fields: Vec::new(),
		})
	}

	/// Use filters rendered by the caller
	pub fn with_filters(mut self, filters: Vec<SmartFilter>) -> Self {
		self.filters = filters;
		self
	}

	/// Declare the fields searched by the search box
	pub fn with_search_fields<I, S>(mut self, search_fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.search_fields = search_fields.into_iter().map(Into::into).collect();
		self
	}

	/// Underlying collection
	pub fn object_list(&self) -> &Q {
		&self.object_list
	}

	/// Query parameters of the request
	pub fn query_params(&self) -> &QueryParams {
		&self.query_params
	}

	/// Settings in effect
	pub fn settings(&self) -> &SmartListSettings {
		&self.settings
	}

	/// Resolved columns
	pub fn columns(&self) -> &[Column] {
		&self.columns
	}

	/// Rendered filters
	pub fn filters(&self) -> &[SmartFilter] {
		&self.filters
	}

	/// Searched fields; the search box is shown only when non-empty
	pub fn search_fields(&self) -> &[String] {
		&self.search_fields
	}

	/// Current search term
	pub fn search_query_value(&self) -> &str {
		self.query_params
			.get(&self.settings.search_query_param)
			.unwrap_or_default()
	}

	/// Current sort token
	pub fn ordering_query_value(&self) -> &str {
		self.query_params
			.get(&self.settings.ordering_query_param)
			.unwrap_or_default()
	}

	/// Fetch the rows of the collection
	pub fn items(&self) -> Result<Vec<SmartListItem<'_>>> {
		Ok(self
			.object_list
			.fetch()?
			.into_iter()
			.map(|record| self.item(record))
			.collect())
	}

	/// Wrap a record as a row of this list
	pub fn item(&self, record: Arc<dyn Record>) -> SmartListItem<'_> {
		SmartListItem {
			columns: &self.columns,
			settings: &self.settings,
			record,
		}
	}
}

/// One row of a smart list
#[derive(Debug, Clone)]
pub struct SmartListItem<'a> {
	columns: &'a [Column],
	settings: &'a SmartListSettings,
	record: Arc<dyn Record>,
}

impl<'a> SmartListItem<'a> {
	/// The row's record
	pub fn record(&self) -> &Arc<dyn Record> {
		&self.record
	}

	/// One field per column
	pub fn fields(&self) -> Vec<SmartListField<'a>> {
		self.columns
			.iter()
			.map(|column| SmartListField {
				column,
				settings: self.settings,
				record: Arc::clone(&self.record),
			})
			.collect()
	}
}

/// The cell of one row in one column
#[derive(Debug, Clone)]
pub struct SmartListField<'a> {
	column: &'a Column,
	settings: &'a SmartListSettings,
	record: Arc<dyn Record>,
}

impl SmartListField<'_> {
	/// Column of the cell
	pub fn column(&self) -> &Column {
		self.column
	}

	/// Resolve the cell value
	///
	/// Render functions take precedence, then projection keys, then the
	/// column's accessor. Fields with choices resolve to the choice label.
	/// Methods that must not be invoked for display resolve to
	/// [`Value::Null`].
	///
	/// # Errors
	///
	/// Returns [`SmartListError::UnsafeRenderOutput`] when a render function
	/// returns anything but [`Value::Safe`].
	pub fn get_value(&self) -> Result<Value> {
		let record = self.record.as_ref();
		if let Some(render) = &self.column.render_function {
			return match render(record) {
				value @ Value::Safe(_) => Ok(value),
				other => Err(SmartListError::UnsafeRenderOutput(format!(
					"column {} returned {:?}; render functions must return Value::Safe with sanitized input",
					self.column.column_id, other
				))),
			};
		}
		let Some(field_name) = self.column.field_name.as_deref() else {
			return Ok(Value::Null);
		};
		if record.is_mapping() {
			return Ok(record.get(field_name).unwrap_or(Value::Null));
		}
		Ok(match &self.column.accessor {
			Some(Accessor::Field(field)) => {
				let value = record.get(&field.name).unwrap_or(Value::Null);
				match field.choice_label(&value.lookup_key()) {
					Some(label) if !value.is_null() => Value::Text(label.to_string()),
					_ => value,
				}
			}
			Some(Accessor::Method(method)) if method.do_not_call_in_templates => Value::Null,
			Some(Accessor::Method(method)) => record.call(&method.name).unwrap_or(Value::Null),
			Some(Accessor::Str) => Value::Text(record.display()),
			Some(Accessor::Key(key)) => record.get(key).unwrap_or(Value::Null),
			None => Value::Null,
		})
	}

	/// HTML for a value: escaped text unless the value is already safe
	pub fn format(&self, value: &Value) -> SafeString {
		match value {
			Value::Safe(safe) => safe.clone(),
			other => SafeString::new(escape(&other.display(self.settings))),
		}
	}

	/// Render the cell as `<td>`
	pub fn render(&self) -> Result<SafeString> {
		let content = self.format(&self.get_value()?);
		Ok(format_html("<td>{value}</td>", &[("value", &content as &dyn ToHtml)]))
	}

	/// Render the cell as `<td>` wrapping a link to a detail page
	///
	/// The first column links to the row's record, other columns to the
	/// related record they show.
	///
	/// # Errors
	///
	/// Returns [`SmartListError::MissingLink`] if the link target exposes no
	/// detail URL.
	pub fn render_link(&self) -> Result<SafeString> {
		let url = self.get_absolute_url()?.ok_or_else(|| {
			SmartListError::MissingLink(format!(
				"column {} of {:?} has no detail URL; implement Record::absolute_url",
				self.column.column_id, self.record
			))
		})?;
		let content = self.format(&self.get_value()?);
		Ok(format_html(
			"<td><a href=\"{url}\">{value}</a></td>",
			&[("url", &url as &dyn ToHtml), ("value", &content)],
		))
	}

	/// Returns `true` if [`SmartListField::render_link`] can link the cell
	pub fn has_link(&self) -> bool {
		matches!(self.get_absolute_url(), Ok(Some(_)))
	}

	/// Detail URL of the link target
	pub fn get_absolute_url(&self) -> Result<Option<String>> {
		if self.column.column_id == 1 {
			return Ok(self.record.absolute_url());
		}
		Ok(match self.get_value()? {
			Value::Record(related) => related.absolute_url(),
			_ => None,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::{FieldKind, FieldMeta, MethodMeta, ModelMeta, ValuesRow};
	use crate::query::memory::MemoryQuerySet;
	use chrono::NaiveDate;
	use rstest::{fixture, rstest};

	#[derive(Debug)]
	struct Tag;

	impl Record for Tag {
		fn pk(&self) -> Value {
			Value::Int(9)
		}

		fn get(&self, _name: &str) -> Option<Value> {
			None
		}

		fn display(&self) -> String {
			"tag <9>".to_string()
		}

		fn absolute_url(&self) -> Option<String> {
			Some("/tags/9/".to_string())
		}
	}

	#[derive(Debug)]
	struct Entry;

	impl Record for Entry {
		fn pk(&self) -> Value {
			Value::Int(1)
		}

		fn get(&self, name: &str) -> Option<Value> {
			match name {
				"title" => Some(Value::from("<script>")),
				"kind" => Some(Value::from("foo")),
				"tag" => Some(Value::Record(Arc::new(Tag))),
				"published" => Some(Value::from(NaiveDate::from_ymd_opt(2024, 3, 1))),
				_ => None,
			}
		}

		fn call(&self, method: &str) -> Option<Value> {
			match method {
				"shout" => Some(Value::from("HELLO")),
				"lazy" => Some(Value::from("never")),
				_ => None,
			}
		}

		fn display(&self) -> String {
			"Entry 1".to_string()
		}
	}

	#[fixture]
	fn queryset() -> MemoryQuerySet {
		let meta = ModelMeta::new("entry")
			.with_field(FieldMeta::new("title", FieldKind::Char))
			.with_field(FieldMeta::new("kind", FieldKind::Char).with_choices([("foo", "Foo Kind")]))
			.with_field(FieldMeta::foreign_key("tag", "tag"))
			.with_field(FieldMeta::new("published", FieldKind::Date))
			.with_method(MethodMeta::new("shout"))
			.with_method(MethodMeta::new("lazy").not_called_for_display());
		MemoryQuerySet::from_records(meta, vec![Arc::new(Entry)])
	}

	fn list(queryset: MemoryQuerySet, display: &[ListDisplay]) -> SmartList<MemoryQuerySet> {
		SmartList::new(queryset, &QueryParams::new(), display, &SmartListSettings::default()).unwrap()
	}

	fn values(list: &SmartList<MemoryQuerySet>) -> Vec<Value> {
		let items = list.items().unwrap();
		items[0].fields().iter().map(|f| f.get_value().unwrap()).collect()
	}

	#[rstest]
	fn test_value_resolution(queryset: MemoryQuerySet) {
		let display: Vec<ListDisplay> = ["kind", "shout", "lazy", "__str__", "missing"]
			.into_iter()
			.map(ListDisplay::from)
			.collect();
		assert_eq!(
			values(&list(queryset, &display)),
			vec![
				Value::from("Foo Kind"),
				Value::from("HELLO"),
				Value::Null,
				Value::from("Entry 1"),
				Value::Null,
			]
		);
	}

	#[rstest]
	fn test_render_escapes_text_and_formats_dates(queryset: MemoryQuerySet) {
		let list = list(queryset, &[ListDisplay::from("title"), ListDisplay::from("published")]);
		let items = list.items().unwrap();
		let cells: Vec<String> = items[0]
			.fields()
			.iter()
			.map(|f| f.render().unwrap().into_string())
			.collect();
		assert_eq!(cells, vec!["<td>&lt;script&gt;</td>", "<td>2024-03-01</td>"]);
	}

	#[rstest]
	fn test_render_function_must_return_safe_value(queryset: MemoryQuerySet) {
		let display = vec![
			ListDisplay::render(|record| Value::Safe(SafeString::new(format!("<b>{}</b>", escape(&record.display()))))),
			ListDisplay::render(|record| Value::Text(record.display())),
		];
		let list = list(queryset, &display);
		let items = list.items().unwrap();
		let fields = items[0].fields();
		assert_eq!(fields[0].render().unwrap().as_str(), "<td><b>Entry 1</b></td>");
		assert!(matches!(
			fields[1].get_value(),
			Err(SmartListError::UnsafeRenderOutput(_))
		));
	}

	#[rstest]
	fn test_render_link(queryset: MemoryQuerySet) {
		let list = list(queryset, &[ListDisplay::from("title"), ListDisplay::from("tag")]);
		let items = list.items().unwrap();
		let fields = items[0].fields();

		assert!(!fields[0].has_link());
		assert!(matches!(fields[0].render_link(), Err(SmartListError::MissingLink(_))));

		assert!(fields[1].has_link());
		assert_eq!(
			fields[1].render_link().unwrap().as_str(),
			"<td><a href=\"/tags/9/\">tag &lt;9&gt;</a></td>"
		);
	}

	#[rstest]
	fn test_mapping_rows_read_keys() {
		let meta = ModelMeta::new("entry").with_field(FieldMeta::new("kind", FieldKind::Char).with_choices([("foo", "Foo Kind")]));
		let rows = MemoryQuerySet::new(meta).with_record(ValuesRow::new().with("kind", "foo").with("total", 3i64));
		let list = list(rows, &[ListDisplay::from("kind"), ListDisplay::from("total"), ListDisplay::from("absent")]);
		assert_eq!(
			values(&list),
			vec![Value::from("foo"), Value::Int(3), Value::Null]
		);
	}

	#[rstest]
	fn test_empty_display_yields_default_column(queryset: MemoryQuerySet) {
		let list = list(queryset, &[]);
		assert_eq!(list.columns().len(), 1);
		assert_eq!(list.columns()[0].get_title(), "Entry");
		assert_eq!(values(&list), vec![Value::from("Entry 1")]);
	}

	#[rstest]
	fn test_illegal_column_fails_construction(queryset: MemoryQuerySet) {
		let result = SmartList::new(
			queryset,
			&QueryParams::new(),
			&[ListDisplay::from("_secret")],
			&SmartListSettings::default(),
		);
		assert!(matches!(result, Err(SmartListError::IllegalColumn(_))));
	}

	#[rstest]
	fn test_query_values(queryset: MemoryQuerySet) {
		let list = SmartList::new(
			queryset,
			&QueryParams::parse("q=rust&o=-1"),
			&[ListDisplay::from("title")],
			&SmartListSettings::default(),
		)
		.unwrap()
		.with_search_fields(["title"]);
		assert_eq!(list.search_query_value(), "rust");
		assert_eq!(list.ordering_query_value(), "-1");
		assert_eq!(list.search_fields(), &["title".to_string()]);
		assert!(list.columns()[0].order.as_ref().is_some_and(|o| o.is_reverse()));
	}
}
