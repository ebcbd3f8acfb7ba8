//! Query interface consumed by smart lists
//!
//! Smart lists do not talk to a database. They describe sorting, filtering
//! and search as [`FilterCondition`]s and [`OrderingTerm`]s and hand them
//! to a [`QuerySet`], which may be backed by an ORM, a remote API or the
//! in-memory [`memory::MemoryQuerySet`].

pub mod memory;

use crate::error::Result;
use crate::model::{ModelMeta, Record};
use crate::value::Value;
use std::sync::Arc;

/// Lookup applied by a single filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
	/// Equal
	Eq,
	/// Not equal
	Ne,
	/// Greater than
	Gt,
	/// Greater than or equal
	Gte,
	/// Less than
	Lt,
	/// Less than or equal
	Lte,
	/// Case-insensitive equality
	IExact,
	/// Case-insensitive substring match
	IContains,
	/// Case-insensitive prefix match
	IStartsWith,
	/// Full-text search
	Search,
	/// Value is contained in a list
	In,
	/// Value is null
	IsNull,
}

/// Right hand side of a filter
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
	/// Single value; strings coming from query parameters are compared
	/// against stored values by the backend
	Value(Value),
	/// List of values for [`FilterOperator::In`]
	List(Vec<Value>),
}

impl From<Value> for FilterValue {
	fn from(value: Value) -> Self {
		FilterValue::Value(value)
	}
}

impl From<&str> for FilterValue {
	fn from(value: &str) -> Self {
		FilterValue::Value(Value::Text(value.to_string()))
	}
}

impl From<String> for FilterValue {
	fn from(value: String) -> Self {
		FilterValue::Value(Value::Text(value))
	}
}

/// Single field lookup
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
	/// Field name
	pub field: String,
	/// Lookup type
	pub operator: FilterOperator,
	/// Compared value
	pub value: FilterValue,
}

impl Filter {
	/// Create a filter
	pub fn new(
		field: impl Into<String>,
		operator: FilterOperator,
		value: impl Into<FilterValue>,
	) -> Self {
		Self {
			field: field.into(),
			operator,
			value: value.into(),
		}
	}
}

/// Composite filter condition supporting AND/OR logic
///
/// # Examples
///
/// ```
/// use reinhardt_smart_lists::query::{Filter, FilterCondition, FilterOperator};
///
/// // (category = 'foo') AND (title ICONTAINS 'rust' OR body ICONTAINS 'rust')
/// let condition = FilterCondition::and(vec![
///     FilterCondition::Single(Filter::new("category", FilterOperator::Eq, "foo")),
///     FilterCondition::or_filters(vec![
///         Filter::new("title", FilterOperator::IContains, "rust"),
///         Filter::new("body", FilterOperator::IContains, "rust"),
///     ]),
/// ]);
/// assert!(!condition.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
	/// A single filter expression
	Single(Filter),
	/// All conditions must match (AND logic)
	And(Vec<FilterCondition>),
	/// Any condition must match (OR logic)
	Or(Vec<FilterCondition>),
	/// Negates the inner condition (NOT logic)
	Not(Box<FilterCondition>),
}

impl FilterCondition {
	/// Create an equality condition
	pub fn exact(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
		Self::Single(Filter::new(field, FilterOperator::Eq, value))
	}

	/// Create an AND condition from multiple conditions
	pub fn and(conditions: Vec<FilterCondition>) -> Self {
		Self::And(conditions)
	}

	/// Create an OR condition from multiple conditions
	pub fn or(conditions: Vec<FilterCondition>) -> Self {
		Self::Or(conditions)
	}

	/// Create a NOT condition that negates the given condition
	#[allow(clippy::should_implement_trait)]
	pub fn not(condition: FilterCondition) -> Self {
		Self::Not(Box::new(condition))
	}

	/// Create an OR condition from multiple filters
	pub fn or_filters(filters: Vec<Filter>) -> Self {
		Self::Or(filters.into_iter().map(FilterCondition::Single).collect())
	}

	/// Check if this condition is empty (no actual filters)
	///
	/// An empty condition matches every record.
	pub fn is_empty(&self) -> bool {
		match self {
			FilterCondition::Single(_) => false,
			FilterCondition::And(conditions) | FilterCondition::Or(conditions) => {
				conditions.is_empty() || conditions.iter().all(|c| c.is_empty())
			}
			FilterCondition::Not(condition) => condition.is_empty(),
		}
	}
}

/// One sort key
///
/// # Examples
///
/// ```
/// use reinhardt_smart_lists::query::OrderingTerm;
///
/// let term = OrderingTerm::parse("-category");
/// assert_eq!(term.field, "category");
/// assert!(term.descending);
/// assert_eq!(term.to_string(), "-category");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderingTerm {
	/// Field name
	pub field: String,
	/// Sort descending
	pub descending: bool,
}

impl OrderingTerm {
	/// Ascending term
	pub fn asc(field: impl Into<String>) -> Self {
		Self {
			field: field.into(),
			descending: false,
		}
	}

	/// Descending term
	pub fn desc(field: impl Into<String>) -> Self {
		Self {
			field: field.into(),
			descending: true,
		}
	}

	/// Parse `field` or `-field`
	pub fn parse(spec: &str) -> Self {
		match spec.strip_prefix('-') {
			Some(field) => Self::desc(field),
			None => Self::asc(spec),
		}
	}
}

impl std::fmt::Display for OrderingTerm {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		if self.descending {
			write!(f, "-{}", self.field)
		} else {
			f.write_str(&self.field)
		}
	}
}

/// A lazily evaluated, filterable, orderable and sliceable collection
///
/// Builder methods never touch the data store; only [`QuerySet::fetch`],
/// [`QuerySet::count`], [`QuerySet::distinct_values`] and
/// [`QuerySet::related_records`] do.
pub trait QuerySet: Clone + Send + Sync {
	/// Schema of the collection's records
	fn meta(&self) -> &ModelMeta;

	/// Restrict the collection
	fn filter(self, condition: FilterCondition) -> Self;

	/// Replace the ordering; an empty slice clears it
	fn order_by(self, ordering: &[OrderingTerm]) -> Self;

	/// Skip `offset` records and keep at most `limit`
	fn slice(self, offset: usize, limit: Option<usize>) -> Self;

	/// Evaluate the collection
	fn fetch(&self) -> Result<Vec<Arc<dyn Record>>>;

	/// Number of records in the collection
	fn count(&self) -> Result<usize> {
		Ok(self.fetch()?.len())
	}

	/// Distinct stored values of a field, ignoring ordering and slicing
	///
	/// For relation fields these are the related primary keys.
	fn distinct_values(&self, field: &str) -> Result<Vec<Value>>;

	/// Records of the model related through `field` whose primary key is in `pks`
	fn related_records(&self, field: &str, pks: &[Value]) -> Result<Vec<Arc<dyn Record>>>;
}
