//! In-memory query backend
//!
//! Evaluates [`FilterCondition`]s and [`OrderingTerm`]s against records held
//! in memory. Filters are always applied before ordering and slicing,
//! whatever order the builder methods were called in.

use super::{Filter, FilterCondition, FilterOperator, FilterValue, OrderingTerm, QuerySet};
use crate::error::Result;
use crate::model::{ModelMeta, Record};
use crate::value::Value;
use chrono::{NaiveDate, NaiveDateTime};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

/// Query set over records held in memory
///
/// # Examples
///
/// ```
/// use reinhardt_smart_lists::model::{FieldKind, FieldMeta, ModelMeta, ValuesRow};
/// use reinhardt_smart_lists::query::memory::MemoryQuerySet;
/// use reinhardt_smart_lists::query::{FilterCondition, OrderingTerm, QuerySet};
///
/// let meta = ModelMeta::new("post").with_field(FieldMeta::new("title", FieldKind::Char));
/// let qs = MemoryQuerySet::new(meta)
///     .with_record(ValuesRow::new().with("id", 1i64).with("title", "b"))
///     .with_record(ValuesRow::new().with("id", 2i64).with("title", "a"));
///
/// let titles: Vec<String> = qs
///     .order_by(&[OrderingTerm::asc("title")])
///     .fetch()
///     .unwrap()
///     .iter()
///     .map(|r| r.get("title").unwrap().to_string())
///     .collect();
/// assert_eq!(titles, vec!["a", "b"]);
/// ```
#[derive(Debug, Clone)]
pub struct MemoryQuerySet {
	meta: Arc<ModelMeta>,
	records: Arc<Vec<Arc<dyn Record>>>,
	conditions: Vec<FilterCondition>,
	ordering: Vec<OrderingTerm>,
	offset: usize,
	limit: Option<usize>,
}

impl MemoryQuerySet {
	/// Create an empty query set for a schema
	pub fn new(meta: ModelMeta) -> Self {
		Self {
			meta: Arc::new(meta),
			records: Arc::new(Vec::new()),
			conditions: Vec::new(),
			ordering: Vec::new(),
			offset: 0,
			limit: None,
		}
	}

	/// Create a query set over existing records
	pub fn from_records(meta: ModelMeta, records: Vec<Arc<dyn Record>>) -> Self {
		Self {
			records: Arc::new(records),
			..Self::new(meta)
		}
	}

	/// Add a record
	pub fn with_record(mut self, record: impl Record + 'static) -> Self {
		Arc::make_mut(&mut self.records).push(Arc::new(record));
		self
	}

	fn filtered(&self) -> Vec<Arc<dyn Record>> {
		self.records
			.iter()
			.filter(|record| {
				self.conditions
					.iter()
					.all(|condition| matches_condition(record.as_ref(), condition))
			})
			.cloned()
			.collect()
	}
}

impl QuerySet for MemoryQuerySet {
	fn meta(&self) -> &ModelMeta {
		&self.meta
	}

	fn filter(mut self, condition: FilterCondition) -> Self {
		if !condition.is_empty() {
			self.conditions.push(condition);
		}
		self
	}

	fn order_by(mut self, ordering: &[OrderingTerm]) -> Self {
		self.ordering = ordering.to_vec();
		self
	}

	fn slice(mut self, offset: usize, limit: Option<usize>) -> Self {
		self.offset += offset;
		self.limit = match (self.limit, limit) {
			(Some(current), Some(new)) => Some(new.min(current.saturating_sub(offset))),
			(Some(current), None) => Some(current.saturating_sub(offset)),
			(None, new) => new,
		};
		self
	}

	fn fetch(&self) -> Result<Vec<Arc<dyn Record>>> {
		let mut records = self.filtered();
		if !self.ordering.is_empty() {
			records.sort_by(|a, b| compare_records(a.as_ref(), b.as_ref(), &self.ordering));
		}
		let records = records.into_iter().skip(self.offset);
		Ok(match self.limit {
			Some(limit) => records.take(limit).collect(),
			None => records.collect(),
		})
	}

	fn distinct_values(&self, field: &str) -> Result<Vec<Value>> {
		let mut seen = HashSet::new();
		let mut values = Vec::new();
		for record in self.filtered() {
			let value = match field_value(record.as_ref(), field) {
				Value::Record(related) => related.pk(),
				Value::Null => continue,
				other => other,
			};
			if seen.insert(value.lookup_key()) {
				values.push(value);
			}
		}
		Ok(values)
	}

	fn related_records(&self, field: &str, pks: &[Value]) -> Result<Vec<Arc<dyn Record>>> {
		let wanted: HashSet<String> = pks.iter().map(Value::lookup_key).collect();
		let mut seen = HashSet::new();
		let mut related = Vec::new();
		for record in self.records.iter() {
			if let Some(Value::Record(target)) = record.get(field) {
				let key = target.pk().lookup_key();
				if wanted.contains(&key) && seen.insert(key) {
					related.push(target);
				}
			}
		}
		related.sort_by(|a, b| a.pk().compare(&b.pk()));
		Ok(related)
	}
}

fn field_value(record: &dyn Record, field: &str) -> Value {
	if field == "pk" {
		return record.pk();
	}
	record.get(field).unwrap_or(Value::Null)
}

fn compare_records(a: &dyn Record, b: &dyn Record, ordering: &[OrderingTerm]) -> Ordering {
	for term in ordering {
		let order = field_value(a, &term.field).compare(&field_value(b, &term.field));
		let order = if term.descending { order.reverse() } else { order };
		if order != Ordering::Equal {
			return order;
		}
	}
	Ordering::Equal
}

fn matches_condition(record: &dyn Record, condition: &FilterCondition) -> bool {
	match condition {
		FilterCondition::Single(filter) => matches_filter(record, filter),
		FilterCondition::And(conditions) => conditions.iter().all(|c| matches_condition(record, c)),
		FilterCondition::Or(conditions) => {
			conditions.is_empty() || conditions.iter().any(|c| matches_condition(record, c))
		}
		FilterCondition::Not(condition) => !matches_condition(record, condition),
	}
}

fn matches_filter(record: &dyn Record, filter: &Filter) -> bool {
	let stored = field_value(record, &filter.field);
	let rhs = match &filter.value {
		FilterValue::Value(value) => value,
		FilterValue::List(values) => {
			return filter.operator == FilterOperator::In
				&& values.iter().any(|value| loosely_equal(&stored, value));
		}
	};
	match filter.operator {
		FilterOperator::Eq => loosely_equal(&stored, rhs),
		FilterOperator::Ne => !loosely_equal(&stored, rhs),
		FilterOperator::Gt => !stored.is_null() && compare_coerced(&stored, rhs) == Ordering::Greater,
		FilterOperator::Gte => !stored.is_null() && compare_coerced(&stored, rhs) != Ordering::Less,
		FilterOperator::Lt => !stored.is_null() && compare_coerced(&stored, rhs) == Ordering::Less,
		FilterOperator::Lte => !stored.is_null() && compare_coerced(&stored, rhs) != Ordering::Greater,
		FilterOperator::IExact => text_of(&stored) == text_of(rhs),
		FilterOperator::IContains => text_of(&stored).contains(&text_of(rhs)),
		FilterOperator::IStartsWith => text_of(&stored).starts_with(&text_of(rhs)),
		FilterOperator::Search => {
			let haystack = text_of(&stored);
			text_of(rhs)
				.split_whitespace()
				.all(|word| haystack.contains(word))
		}
		FilterOperator::In => loosely_equal(&stored, rhs),
		FilterOperator::IsNull => stored.is_null() == is_truthy(rhs),
	}
}

fn text_of(value: &Value) -> String {
	value.to_string().to_lowercase()
}

fn is_truthy(value: &Value) -> bool {
	match value {
		Value::Bool(b) => *b,
		Value::Int(i) => *i != 0,
		Value::Text(s) => matches!(s.to_lowercase().as_str(), "1" | "true" | "yes"),
		_ => false,
	}
}

fn loosely_equal(stored: &Value, rhs: &Value) -> bool {
	match (stored, rhs) {
		(Value::Null, Value::Null) => true,
		(Value::Null, _) | (_, Value::Null) => false,
		(Value::Bool(b), Value::Text(_)) => *b == is_truthy(rhs),
		_ => stored == rhs || stored.lookup_key() == rhs.lookup_key(),
	}
}

// Query parameters arrive as text; interpret them in the stored value's type.
fn coerce_like(rhs: &Value, stored: &Value) -> Value {
	let Value::Text(text) = rhs else {
		return rhs.clone();
	};
	let coerced = match stored {
		Value::Int(_) => text.parse::<i64>().ok().map(Value::Int),
		Value::Float(_) => text.parse::<f64>().ok().map(Value::Float),
		Value::Date(_) => NaiveDate::parse_from_str(text, "%Y-%m-%d").ok().map(Value::Date),
		Value::DateTime(_) => NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
			.ok()
			.map(Value::DateTime),
		_ => None,
	};
	coerced.unwrap_or_else(|| rhs.clone())
}

fn compare_coerced(stored: &Value, rhs: &Value) -> Ordering {
	stored.compare(&coerce_like(rhs, stored))
}
