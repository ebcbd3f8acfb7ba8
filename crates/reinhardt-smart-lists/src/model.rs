//! Record schema and accessor resolution
//!
//! A smart list never inspects records reflectively. Instead every
//! collection exposes a [`ModelMeta`] describing its stored fields and its
//! zero-argument methods, and every display entry is resolved once against
//! that schema into an [`Accessor`].

use crate::value::Value;
use indexmap::IndexMap;
use std::fmt;

/// Name of the accessor that renders a record's default string representation
pub const STR_ACCESSOR: &str = "__str__";

/// Prefix reserved for private accessors
pub const RESERVED_PREFIX: char = '_';

/// Storage type of a model field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
	/// Short text
	Char,
	/// Long text
	Text,
	/// Integer number
	Integer,
	/// Floating point number
	Float,
	/// Boolean flag
	Boolean,
	/// Calendar date
	Date,
	/// Date and time
	DateTime,
	/// To-one relation to another model
	ForeignKey {
		/// Name of the related model
		related_model: String,
	},
}

/// Metadata of a stored field
///
/// # Examples
///
/// ```
/// use reinhardt_smart_lists::model::{FieldKind, FieldMeta};
///
/// let field = FieldMeta::new("category", FieldKind::Char)
///     .with_choices([("blog_post", "Blog Post"), ("foo", "Foo")]);
///
/// assert_eq!(field.verbose_name(), "category");
/// assert_eq!(field.choice_label("foo"), Some("Foo"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMeta {
	/// Field name
	pub name: String,
	/// Storage type
	pub kind: FieldKind,
	/// Explicit human readable name
	pub verbose_name: Option<String>,
	/// Enumerated choices as `(stored value, label)`
	pub choices: Vec<(String, String)>,
}

impl FieldMeta {
	/// Create field metadata
	pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
		Self {
			name: name.into(),
			kind,
			verbose_name: None,
			choices: Vec::new(),
		}
	}

	/// Create a to-one relation field
	pub fn foreign_key(name: impl Into<String>, related_model: impl Into<String>) -> Self {
		Self::new(
			name,
			FieldKind::ForeignKey {
				related_model: related_model.into(),
			},
		)
	}

	/// Set the human readable name
	pub fn with_verbose_name(mut self, verbose_name: impl Into<String>) -> Self {
		self.verbose_name = Some(verbose_name.into());
		self
	}

	/// Set the enumerated choices
	pub fn with_choices<I, V, L>(mut self, choices: I) -> Self
	where
		I: IntoIterator<Item = (V, L)>,
		V: Into<String>,
		L: Into<String>,
	{
		self.choices = choices
			.into_iter()
			.map(|(value, label)| (value.into(), label.into()))
			.collect();
		self
	}

	/// Human readable name, defaulting to the field name with spaces
	pub fn verbose_name(&self) -> String {
		self.verbose_name
			.clone()
			.unwrap_or_else(|| self.name.replace('_', " "))
	}

	/// Label of a stored choice value
	pub fn choice_label(&self, value: &str) -> Option<&str> {
		self.choices
			.iter()
			.find(|(stored, _)| stored == value)
			.map(|(_, label)| label.as_str())
	}

	/// Returns `true` for to-one relations
	pub fn is_relation(&self) -> bool {
		matches!(self.kind, FieldKind::ForeignKey { .. })
	}
}

/// Metadata of a zero-argument record method usable as a column
///
/// The annotations mirror what list views need to know about computed
/// columns: a title, the field to sort by, and whether calling it is safe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodMeta {
	/// Method name
	pub name: String,
	/// Column title
	pub short_description: Option<String>,
	/// Field used when the column is sorted
	pub admin_order_field: Option<String>,
	/// The method modifies data and must never back a column
	pub alters_data: bool,
	/// The method must not be invoked for display
	pub do_not_call_in_templates: bool,
}

impl MethodMeta {
	/// Create method metadata
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			..Self::default()
		}
	}

	/// Set the column title
	pub fn with_short_description(mut self, description: impl Into<String>) -> Self {
		self.short_description = Some(description.into());
		self
	}

	/// Set the field used for sorting
	pub fn with_admin_order_field(mut self, field: impl Into<String>) -> Self {
		self.admin_order_field = Some(field.into());
		self
	}

	/// Mark the method as data-altering
	pub fn altering_data(mut self) -> Self {
		self.alters_data = true;
		self
	}

	/// Mark the method as not callable for display
	pub fn not_called_for_display(mut self) -> Self {
		self.do_not_call_in_templates = true;
		self
	}
}

/// Schema of a record type
///
/// # Examples
///
/// ```
/// use reinhardt_smart_lists::model::{FieldKind, FieldMeta, MethodMeta, ModelMeta};
///
/// let meta = ModelMeta::new("sample_model")
///     .with_field(FieldMeta::new("title", FieldKind::Char))
///     .with_method(MethodMeta::new("friendly_category").with_admin_order_field("category"));
///
/// assert_eq!(meta.verbose_name(), "sample model");
/// assert!(meta.get_field("title").is_some());
/// assert!(meta.get_method("friendly_category").is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelMeta {
	/// Model name
	pub model_name: String,
	/// Explicit human readable name
	pub verbose_name: Option<String>,
	fields: IndexMap<String, FieldMeta>,
	methods: IndexMap<String, MethodMeta>,
}

impl ModelMeta {
	/// Create an empty schema
	pub fn new(model_name: impl Into<String>) -> Self {
		Self {
			model_name: model_name.into(),
			..Self::default()
		}
	}

	/// Set the human readable name
	pub fn with_verbose_name(mut self, verbose_name: impl Into<String>) -> Self {
		self.verbose_name = Some(verbose_name.into());
		self
	}

	/// Add a stored field
	pub fn with_field(mut self, field: FieldMeta) -> Self {
		self.fields.insert(field.name.clone(), field);
		self
	}

	/// Add a method
	pub fn with_method(mut self, method: MethodMeta) -> Self {
		self.methods.insert(method.name.clone(), method);
		self
	}

	/// Human readable name, defaulting to the model name with spaces
	pub fn verbose_name(&self) -> String {
		self.verbose_name
			.clone()
			.unwrap_or_else(|| self.model_name.replace('_', " "))
	}

	/// Look up a stored field
	pub fn get_field(&self, name: &str) -> Option<&FieldMeta> {
		self.fields.get(name)
	}

	/// Look up a method
	pub fn get_method(&self, name: &str) -> Option<&MethodMeta> {
		self.methods.get(name)
	}

	/// Stored fields in declaration order
	pub fn fields(&self) -> impl Iterator<Item = &FieldMeta> {
		self.fields.values()
	}

	/// Resolve an accessor name against this schema
	pub fn resolve(&self, name: &str) -> Accessor {
		if let Some(field) = self.get_field(name) {
			return Accessor::Field(field.clone());
		}
		if name == STR_ACCESSOR {
			return Accessor::Str;
		}
		match self.get_method(name) {
			Some(method) => Accessor::Method(method.clone()),
			None => Accessor::Key(name.to_string()),
		}
	}
}

/// Result of resolving an accessor name against a schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
	/// Stored schema field
	Field(FieldMeta),
	/// Zero-argument method
	Method(MethodMeta),
	/// The record's default string representation
	Str,
	/// Key of a projection row; not declared on the schema
	Key(String),
}

/// A row of a collection
///
/// Implemented by model instances and by projection rows. Model instances
/// answer [`Record::get`] for their stored fields and [`Record::call`] for
/// the methods declared in their [`ModelMeta`].
pub trait Record: fmt::Debug + Send + Sync {
	/// Primary key
	fn pk(&self) -> Value;

	/// Stored value of a field or projection key
	fn get(&self, name: &str) -> Option<Value>;

	/// Invoke a zero-argument method
	fn call(&self, _method: &str) -> Option<Value> {
		None
	}

	/// Default string representation
	fn display(&self) -> String;

	/// URL of the record's detail page
	fn absolute_url(&self) -> Option<String> {
		None
	}

	/// Returns `true` for projection rows (key/value mappings)
	fn is_mapping(&self) -> bool {
		false
	}
}

/// Projection row holding selected keys only
///
/// # Examples
///
/// ```
/// use reinhardt_smart_lists::model::{Record, ValuesRow};
///
/// let row = ValuesRow::new().with("title", "Hello").with("votes", 3i64);
/// assert!(row.is_mapping());
/// assert_eq!(row.get("title").unwrap().to_string(), "Hello");
/// assert!(row.get("missing").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ValuesRow {
	values: IndexMap<String, Value>,
}

impl ValuesRow {
	/// Create an empty row
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a key
	pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.values.insert(key.into(), value.into());
		self
	}
}

impl Record for ValuesRow {
	fn pk(&self) -> Value {
		self.values
			.get("pk")
			.or_else(|| self.values.get("id"))
			.cloned()
			.unwrap_or(Value::Null)
	}

	fn get(&self, name: &str) -> Option<Value> {
		self.values.get(name).cloned()
	}

	fn display(&self) -> String {
		self.values
			.iter()
			.map(|(key, value)| format!("{}: {}", key, value))
			.collect::<Vec<_>>()
			.join(", ")
	}

	fn is_mapping(&self) -> bool {
		true
	}
}
