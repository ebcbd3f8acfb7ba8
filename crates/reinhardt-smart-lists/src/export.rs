//! Export of smart lists to downloadable documents
//!
//! An export walks the same columns and cell values as the on-screen list,
//! but passes every value through a value renderer instead of the HTML cell
//! renderer. Exports ignore pagination; a backend may narrow the rows with
//! extra filters and a row limit.
//!
//! Three backends are provided:
//!
//! - [`ExcelExportBackend`]: an `.xlsx` spreadsheet
//! - [`CsvExportBackend`]: RFC 4180 CSV
//! - [`JsonExportBackend`]: a JSON array of objects keyed by column title

use crate::error::{Result, SmartListError};
use crate::list::{SmartList, SmartListItem};
use crate::query::{FilterCondition, QuerySet};
use crate::settings::SmartListSettings;
use crate::value::Value;
use csv::Writer;
use rust_xlsxwriter::Workbook;
use std::fmt;
use std::sync::Arc;

/// MIME type of `.xlsx` documents
pub const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// MIME type of CSV documents
pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// MIME type of JSON documents
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A cell of an exported document
#[derive(Debug, Clone, PartialEq)]
pub enum ExportCell {
	/// Integer cell, kept exact
	Integer(i64),
	/// Numeric cell
	Number(f64),
	/// Text cell
	Text(String),
	/// Empty cell
	Empty,
}

impl ExportCell {
	/// Text used to size spreadsheet columns and to write CSV fields
	pub fn as_text(&self) -> String {
		match self {
			ExportCell::Integer(integer) => integer.to_string(),
			ExportCell::Number(number) => number.to_string(),
			ExportCell::Text(text) => text.clone(),
			ExportCell::Empty => String::new(),
		}
	}
}

/// Function converting a resolved cell value into an export cell
pub type ValueRenderer<'a> = dyn Fn(&Value) -> ExportCell + 'a;

/// The default value renderer
///
/// Numbers stay numeric; every other value is rendered to unescaped text
/// using the configured formats.
///
/// # Examples
///
/// ```
/// use reinhardt_smart_lists::export::{ExportCell, value_renderer};
/// use reinhardt_smart_lists::html::SafeString;
/// use reinhardt_smart_lists::{SmartListSettings, Value};
///
/// let settings = SmartListSettings::default();
/// let render = value_renderer(&settings);
/// assert_eq!(render(&Value::Int(3)), ExportCell::Integer(3));
/// assert_eq!(render(&Value::Float(2.5)), ExportCell::Number(2.5));
/// assert_eq!(render(&Value::from("a & b")), ExportCell::Text("a & b".to_string()));
/// assert_eq!(render(&Value::Safe(SafeString::new("<b>x</b>"))), ExportCell::Text("<b>x</b>".to_string()));
/// assert_eq!(render(&Value::Null), ExportCell::Empty);
/// ```
pub fn value_renderer(settings: &SmartListSettings) -> impl Fn(&Value) -> ExportCell + '_ {
	move |value| match value {
		Value::Int(integer) => ExportCell::Integer(*integer),
		Value::Float(number) => ExportCell::Number(*number),
		_ => {
			let text = value.display(settings);
			if text.is_empty() {
				ExportCell::Empty
			} else {
				ExportCell::Text(text)
			}
		}
	}
}

/// Extra restriction applied to exported rows
#[derive(Clone)]
pub enum ExtraFilter {
	/// Fixed condition
	Static(FilterCondition),
	/// Condition computed on every export
	Computed(Arc<dyn Fn() -> FilterCondition + Send + Sync>),
}

impl ExtraFilter {
	/// Wrap a function computing the condition
	pub fn computed<F>(function: F) -> Self
	where
		F: Fn() -> FilterCondition + Send + Sync + 'static,
	{
		ExtraFilter::Computed(Arc::new(function))
	}

	/// Condition for the current export
	pub fn condition(&self) -> FilterCondition {
		match self {
			ExtraFilter::Static(condition) => condition.clone(),
			ExtraFilter::Computed(function) => function(),
		}
	}
}

impl fmt::Debug for ExtraFilter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ExtraFilter::Static(condition) => f.debug_tuple("Static").field(condition).finish(),
			ExtraFilter::Computed(_) => f.write_str("Computed(..)"),
		}
	}
}

impl From<FilterCondition> for ExtraFilter {
	fn from(condition: FilterCondition) -> Self {
		ExtraFilter::Static(condition)
	}
}

/// Options shared by every export backend
///
/// # Examples
///
/// ```
/// use reinhardt_smart_lists::export::ExportOptions;
/// use reinhardt_smart_lists::query::FilterCondition;
///
/// let options = ExportOptions::new("Export to Excel", "posts.xlsx")
///     .with_extra_filters(FilterCondition::exact("category", "blog_post"))
///     .with_limit(100);
///
/// assert_eq!(options.verbose_name, "Export to Excel");
/// assert_eq!(options.limit, Some(100));
/// ```
#[derive(Debug, Clone)]
pub struct ExportOptions {
	/// Label of the export link
	pub verbose_name: String,
	/// File name offered for download
	pub file_name: String,
	/// Extra restriction of the exported rows
	pub extra_filters: Option<ExtraFilter>,
	/// Maximum number of exported rows
	pub limit: Option<usize>,
}

impl ExportOptions {
	/// Create options
	pub fn new(verbose_name: impl Into<String>, file_name: impl Into<String>) -> Self {
		Self {
			verbose_name: verbose_name.into(),
			file_name: file_name.into(),
			extra_filters: None,
			limit: None,
		}
	}

	/// Restrict the exported rows
	pub fn with_extra_filters(mut self, extra_filters: impl Into<ExtraFilter>) -> Self {
		self.extra_filters = Some(extra_filters.into());
		self
	}

	/// Limit the number of exported rows
	pub fn with_limit(mut self, limit: usize) -> Self {
		self.limit = Some(limit);
		self
	}
}

/// Trait for export document writers
///
/// Implementors only encode rows; selecting rows and resolving values is
/// shared by every backend through [`ExportBackendExt`].
pub trait ExportBackend: Send + Sync {
	/// Export options
	fn options(&self) -> &ExportOptions;

	/// MIME type of the produced document
	fn content_type(&self) -> &str;

	/// Encode a header row and data rows into a document
	fn write_document(
		&self,
		header: Vec<ExportCell>,
		rows: &mut dyn Iterator<Item = Result<Vec<ExportCell>>>,
	) -> Result<Vec<u8>>;

	/// Label of the export link
	fn verbose_name(&self) -> &str {
		&self.options().verbose_name
	}

	/// File name offered for download
	fn file_name(&self) -> &str {
		&self.options().file_name
	}
}

/// Row selection and document assembly shared by all backends
pub trait ExportBackendExt: ExportBackend {
	/// Rows to export
	///
	/// The extra filters and the limit are applied to the list's collection.
	fn get_items<'a, Q: QuerySet>(&self, smart_list: &'a SmartList<Q>) -> Result<Vec<SmartListItem<'a>>> {
		let options = self.options();
		let mut queryset = smart_list.object_list().clone();
		if let Some(extra) = &options.extra_filters {
			queryset = queryset.filter(extra.condition());
		}
		if let Some(limit) = options.limit {
			queryset = queryset.slice(0, Some(limit));
		}
		Ok(queryset
			.fetch()?
			.into_iter()
			.map(|record| smart_list.item(record))
			.collect())
	}

	/// Produce the complete document
	///
	/// The header holds the column titles; every cell value is passed
	/// through `render`.
	fn get_content<Q: QuerySet>(&self, smart_list: &SmartList<Q>, render: &ValueRenderer<'_>) -> Result<Vec<u8>> {
		let header = smart_list
			.columns()
			.iter()
			.map(|column| render(&Value::from(column.get_title())))
			.collect();
		let items = self.get_items(smart_list)?;
		tracing::debug!(
			file_name = %self.file_name(),
			rows = items.len(),
			"exporting smart list"
		);
		let mut rows = items.iter().map(|item| {
			item.fields()
				.iter()
				.map(|field| field.get_value().map(|value| render(&value)))
				.collect::<Result<Vec<_>>>()
		});
		self.write_document(header, &mut rows)
	}
}

impl<T: ExportBackend + ?Sized> ExportBackendExt for T {}

/// Spreadsheet export
///
/// Column widths are set to the length of the longest value written to the
/// column, header included.
#[derive(Debug, Clone)]
pub struct ExcelExportBackend {
	options: ExportOptions,
}

impl ExcelExportBackend {
	/// Create a spreadsheet backend
	pub fn new(options: ExportOptions) -> Self {
		Self { options }
	}
}

fn xlsx_error(error: rust_xlsxwriter::XlsxError) -> SmartListError {
	SmartListError::Export(format!("Failed to write spreadsheet: {}", error))
}

impl ExportBackend for ExcelExportBackend {
	fn options(&self) -> &ExportOptions {
		&self.options
	}

	fn content_type(&self) -> &str {
		XLSX_CONTENT_TYPE
	}

	fn write_document(
		&self,
		header: Vec<ExportCell>,
		rows: &mut dyn Iterator<Item = Result<Vec<ExportCell>>>,
	) -> Result<Vec<u8>> {
		let mut workbook = Workbook::new();
		let worksheet = workbook.add_worksheet();
		let mut widths: Vec<usize> = Vec::new();

		let mut row_index: u32 = 0;
		for row in std::iter::once(Ok(header)).chain(rows) {
			for (column_index, cell) in row?.iter().enumerate() {
				let column = u16::try_from(column_index)
					.map_err(|_| SmartListError::Export("too many columns".to_string()))?;
				match cell {
					// Spreadsheet cells are IEEE doubles
					ExportCell::Integer(integer) => {
						worksheet
							.write_number(row_index, column, *integer as f64)
							.map_err(xlsx_error)?;
					}
					ExportCell::Number(number) => {
						worksheet.write_number(row_index, column, *number).map_err(xlsx_error)?;
					}
					ExportCell::Text(text) => {
						worksheet.write_string(row_index, column, text).map_err(xlsx_error)?;
					}
					ExportCell::Empty => {}
				}
				if widths.len() <= column_index {
					widths.resize(column_index + 1, 0);
				}
				widths[column_index] = widths[column_index].max(cell.as_text().chars().count());
			}
			row_index += 1;
		}

		for (column_index, width) in widths.iter().enumerate() {
			let column = u16::try_from(column_index)
				.map_err(|_| SmartListError::Export("too many columns".to_string()))?;
			worksheet
				.set_column_width(column, *width as f64)
				.map_err(xlsx_error)?;
		}

		workbook.save_to_buffer().map_err(xlsx_error)
	}
}

/// CSV export
#[derive(Debug, Clone)]
pub struct CsvExportBackend {
	options: ExportOptions,
}

impl CsvExportBackend {
	/// Create a CSV backend
	pub fn new(options: ExportOptions) -> Self {
		Self { options }
	}
}

impl ExportBackend for CsvExportBackend {
	fn options(&self) -> &ExportOptions {
		&self.options
	}

	fn content_type(&self) -> &str {
		CSV_CONTENT_TYPE
	}

	fn write_document(
		&self,
		header: Vec<ExportCell>,
		rows: &mut dyn Iterator<Item = Result<Vec<ExportCell>>>,
	) -> Result<Vec<u8>> {
		// Use csv crate for RFC 4180 compliant CSV writing
		let mut writer = Writer::from_writer(Vec::new());
		for row in std::iter::once(Ok(header)).chain(rows) {
			let fields: Vec<String> = row?.iter().map(ExportCell::as_text).collect();
			writer.write_record(&fields).map_err(|e| {
				SmartListError::Export(format!("Failed to write CSV record: {}", e))
			})?;
		}
		writer
			.into_inner()
			.map_err(|e| SmartListError::Export(format!("Failed to get CSV output: {}", e)))
	}
}

/// JSON export
///
/// Each row becomes an object keyed by the column titles; numeric cells
/// stay numbers and empty cells become `null`.
#[derive(Debug, Clone)]
pub struct JsonExportBackend {
	options: ExportOptions,
}

impl JsonExportBackend {
	/// Create a JSON backend
	pub fn new(options: ExportOptions) -> Self {
		Self { options }
	}
}

fn json_cell(cell: &ExportCell) -> serde_json::Value {
	match cell {
		ExportCell::Integer(integer) => serde_json::Value::from(*integer),
		ExportCell::Number(number) => serde_json::Number::from_f64(*number)
			.map(serde_json::Value::Number)
			.unwrap_or(serde_json::Value::Null),
		ExportCell::Text(text) => serde_json::Value::String(text.clone()),
		ExportCell::Empty => serde_json::Value::Null,
	}
}

impl ExportBackend for JsonExportBackend {
	fn options(&self) -> &ExportOptions {
		&self.options
	}

	fn content_type(&self) -> &str {
		JSON_CONTENT_TYPE
	}

	fn write_document(
		&self,
		header: Vec<ExportCell>,
		rows: &mut dyn Iterator<Item = Result<Vec<ExportCell>>>,
	) -> Result<Vec<u8>> {
		let keys: Vec<String> = header.iter().map(ExportCell::as_text).collect();
		let mut objects = Vec::new();
		for row in rows {
			let object: serde_json::Map<String, serde_json::Value> = keys
				.iter()
				.cloned()
				.zip(row?.iter().map(json_cell))
				.collect();
			objects.push(serde_json::Value::Object(object));
		}
		serde_json::to_vec_pretty(&objects)
			.map_err(|e| SmartListError::Export(format!("JSON export failed: {}", e)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::column::ListDisplay;
	use crate::model::{FieldKind, FieldMeta, ModelMeta, ValuesRow};
	use crate::params::QueryParams;
	use crate::query::memory::MemoryQuerySet;
	use rstest::{fixture, rstest};

	#[fixture]
	fn smart_list() -> SmartList<MemoryQuerySet> {
		let meta = ModelMeta::new("post")
			.with_field(FieldMeta::new("title", FieldKind::Char))
			.with_field(FieldMeta::new("votes", FieldKind::Integer));
		let mut posts = MemoryQuerySet::new(meta);
		for (id, title, votes) in [(1i64, "first, post", 3i64), (2, "second", 10), (3, "third", 7)] {
			posts = posts.with_record(ValuesRow::new().with("id", id).with("title", title).with("votes", votes));
		}
		SmartList::new(
			posts,
			&QueryParams::new(),
			&[ListDisplay::from("title"), ListDisplay::from("votes")],
			&SmartListSettings::default(),
		)
		.unwrap()
	}

	#[rstest]
	fn test_csv_content(smart_list: SmartList<MemoryQuerySet>) {
		let backend = CsvExportBackend::new(ExportOptions::new("CSV", "posts.csv"));
		let settings = SmartListSettings::default();
		let content = backend.get_content(&smart_list, &value_renderer(&settings)).unwrap();
		assert_eq!(
			String::from_utf8(content).unwrap(),
			"Title,Votes\n\"first, post\",3\nsecond,10\nthird,7\n"
		);
	}

	#[rstest]
	fn test_get_items_applies_limit(smart_list: SmartList<MemoryQuerySet>) {
		let backend = CsvExportBackend::new(ExportOptions::new("CSV", "posts.csv").with_limit(2));
		assert_eq!(backend.get_items(&smart_list).unwrap().len(), 2);
	}

	#[rstest]
	fn test_get_items_applies_computed_filter(smart_list: SmartList<MemoryQuerySet>) {
		let options = ExportOptions::new("CSV", "posts.csv")
			.with_extra_filters(ExtraFilter::computed(|| FilterCondition::exact("title", "third")));
		let backend = CsvExportBackend::new(options);
		let items = backend.get_items(&smart_list).unwrap();
		assert_eq!(items.len(), 1);
		assert_eq!(items[0].record().pk(), Value::Int(3));
	}

	#[rstest]
	fn test_xlsx_content_is_zip(smart_list: SmartList<MemoryQuerySet>) {
		let backend = ExcelExportBackend::new(ExportOptions::new("Excel", "posts.xlsx"));
		let settings = SmartListSettings::default();
		let content = backend.get_content(&smart_list, &value_renderer(&settings)).unwrap();
		assert_eq!(backend.content_type(), XLSX_CONTENT_TYPE);
		assert!(content.starts_with(b"PK"));
	}

	#[rstest]
	fn test_json_content(smart_list: SmartList<MemoryQuerySet>) {
		let backend = JsonExportBackend::new(ExportOptions::new("JSON", "posts.json").with_limit(1));
		let settings = SmartListSettings::default();
		let content = backend.get_content(&smart_list, &value_renderer(&settings)).unwrap();
		let parsed: serde_json::Value = serde_json::from_slice(&content).unwrap();
		assert_eq!(parsed, serde_json::json!([{"Title": "first, post", "Votes": 3}]));
	}

	#[rstest]
	fn test_integers_beyond_f64_precision_stay_exact() {
		let meta = ModelMeta::new("post").with_field(FieldMeta::new("votes", FieldKind::Integer));
		let posts = MemoryQuerySet::new(meta).with_record(
			ValuesRow::new().with("id", 9_007_199_254_740_993i64).with("votes", 3i64),
		);
		let list = SmartList::new(
			posts,
			&QueryParams::new(),
			&[ListDisplay::from("id"), ListDisplay::from("votes")],
			&SmartListSettings::default(),
		)
		.unwrap();
		let settings = SmartListSettings::default();

		let csv = CsvExportBackend::new(ExportOptions::new("CSV", "posts.csv"))
			.get_content(&list, &value_renderer(&settings))
			.unwrap();
		assert_eq!(String::from_utf8(csv).unwrap(), "Id,Votes\n9007199254740993,3\n");

		let json = JsonExportBackend::new(ExportOptions::new("JSON", "posts.json"))
			.get_content(&list, &value_renderer(&settings))
			.unwrap();
		let parsed: serde_json::Value = serde_json::from_slice(&json).unwrap();
		assert_eq!(parsed, serde_json::json!([{"Id": 9_007_199_254_740_993i64, "Votes": 3}]));
		assert!(parsed[0]["Votes"].is_i64());
	}

	#[test]
	fn test_cell_text() {
		assert_eq!(ExportCell::Integer(9_007_199_254_740_993).as_text(), "9007199254740993");
		assert_eq!(ExportCell::Number(3.0).as_text(), "3");
		assert_eq!(ExportCell::Number(2.5).as_text(), "2.5");
		assert_eq!(ExportCell::Empty.as_text(), "");
	}
}
