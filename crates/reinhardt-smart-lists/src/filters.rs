//! List filters
//!
//! Filters offer a set of values for one query parameter and narrow the
//! collection when one is selected. Field filters are derived from the
//! record schema; custom filters implement [`ListFilter`] directly and may
//! transform the collection in any way they like.
//!
//! [`SmartFilter`] is the rendered form of a filter for one request: its
//! title and the links for every selectable value.

use crate::column::derive_title;
use crate::error::{Result, SmartListError};
use crate::model::{FieldKind, FieldMeta, ModelMeta};
use crate::params::{QueryParams, url_with_query_params};
use crate::query::{FilterCondition, QuerySet};
use std::fmt;
use std::sync::Arc;

/// Title of the value that clears a filter
pub const ALL_LABEL: &str = "All";

/// Trait for list filters
///
/// # Examples
///
/// ```
/// use reinhardt_smart_lists::filters::ListFilter;
/// use reinhardt_smart_lists::query::{Filter, FilterCondition, FilterOperator, QuerySet};
/// use reinhardt_smart_lists::{QueryParams, Result};
///
/// struct PopularFilter;
///
/// impl<Q: QuerySet> ListFilter<Q> for PopularFilter {
///     fn title(&self) -> String {
///         "Popularity".to_string()
///     }
///
///     fn parameter_name(&self) -> &str {
///         "popular"
///     }
///
///     fn lookups(&self, _queryset: &Q) -> Result<Vec<(String, String)>> {
///         Ok(vec![("yes".to_string(), "Popular".to_string())])
///     }
///
///     fn queryset(&self, params: &QueryParams, queryset: Q) -> Result<Q> {
///         Ok(match params.get("popular") {
///             Some("yes") => queryset.filter(FilterCondition::Single(Filter::new(
///                 "votes",
///                 FilterOperator::Gte,
///                 "100",
///             ))),
///             _ => queryset,
///         })
///     }
/// }
/// ```
pub trait ListFilter<Q: QuerySet>: Send + Sync {
	/// Filter title displayed in the UI
	fn title(&self) -> String;

	/// Query parameter carrying the selected value
	fn parameter_name(&self) -> &str;

	/// Selectable `(value, label)` pairs
	///
	/// `queryset` is the collection the filter is offered for.
	fn lookups(&self, queryset: &Q) -> Result<Vec<(String, String)>>;

	/// Narrow the collection according to the current query parameters
	fn queryset(&self, params: &QueryParams, queryset: Q) -> Result<Q>;
}

/// Filter derived from a schema field
///
/// Fields with choices offer every choice, boolean fields offer `Yes`/`No`
/// as `1`/`0`, and to-one relations offer the related records that are
/// actually referenced by the collection.
#[derive(Debug, Clone)]
pub struct FieldListFilter {
	field: FieldMeta,
	title: String,
}

impl FieldListFilter {
	/// Create a filter for a schema field
	///
	/// # Errors
	///
	/// Returns [`SmartListError::UnknownFilterField`] if the schema does not
	/// declare the field.
	pub fn new(meta: &ModelMeta, field_name: &str) -> Result<Self> {
		let field = meta
			.get_field(field_name)
			.cloned()
			.ok_or_else(|| SmartListError::UnknownFilterField(field_name.to_string()))?;
		Ok(Self {
			title: derive_title(meta, Some(field_name), None),
			field,
		})
	}

	/// Filtered field
	pub fn field(&self) -> &FieldMeta {
		&self.field
	}
}

impl<Q: QuerySet> ListFilter<Q> for FieldListFilter {
	fn title(&self) -> String {
		self.title.clone()
	}

	fn parameter_name(&self) -> &str {
		&self.field.name
	}

	fn lookups(&self, queryset: &Q) -> Result<Vec<(String, String)>> {
		if !self.field.choices.is_empty() {
			return Ok(self.field.choices.clone());
		}
		match &self.field.kind {
			FieldKind::Boolean => Ok(vec![
				("1".to_string(), "Yes".to_string()),
				("0".to_string(), "No".to_string()),
			]),
			FieldKind::ForeignKey { .. } => {
				let pks = queryset.clone().order_by(&[]).distinct_values(&self.field.name)?;
				let related = queryset.related_records(&self.field.name, &pks)?;
				Ok(related
					.iter()
					.map(|record| (record.pk().lookup_key(), record.display()))
					.collect())
			}
			_ => Ok(Vec::new()),
		}
	}

	fn queryset(&self, params: &QueryParams, queryset: Q) -> Result<Q> {
		Ok(match params.get(&self.field.name) {
			Some(value) => queryset.filter(FilterCondition::exact(self.field.name.clone(), value)),
			None => queryset,
		})
	}
}

/// Entry of a view's filter list
pub enum ListFilterSpec<Q: QuerySet> {
	/// Filter derived from a schema field
	Field(String),
	/// Custom filter
	Custom(Arc<dyn ListFilter<Q>>),
}

impl<Q: QuerySet> ListFilterSpec<Q> {
	/// Wrap a custom filter
	pub fn custom(filter: impl ListFilter<Q> + 'static) -> Self {
		ListFilterSpec::Custom(Arc::new(filter))
	}

	/// Resolve the entry into a filter
	///
	/// # Errors
	///
	/// Returns [`SmartListError::UnknownFilterField`] for field entries the
	/// schema does not declare.
	pub fn resolve(&self, meta: &ModelMeta) -> Result<Arc<dyn ListFilter<Q>>> {
		match self {
			ListFilterSpec::Field(name) => Ok(Arc::new(FieldListFilter::new(meta, name)?)),
			ListFilterSpec::Custom(filter) => Ok(Arc::clone(filter)),
		}
	}
}

impl<Q: QuerySet> Clone for ListFilterSpec<Q> {
	fn clone(&self) -> Self {
		match self {
			ListFilterSpec::Field(name) => ListFilterSpec::Field(name.clone()),
			ListFilterSpec::Custom(filter) => ListFilterSpec::Custom(Arc::clone(filter)),
		}
	}
}

impl<Q: QuerySet> fmt::Debug for ListFilterSpec<Q> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ListFilterSpec::Field(name) => f.debug_tuple("Field").field(name).finish(),
			ListFilterSpec::Custom(filter) => f
				.debug_tuple("Custom")
				.field(&filter.parameter_name())
				.finish(),
		}
	}
}

impl<Q: QuerySet> From<&str> for ListFilterSpec<Q> {
	fn from(name: &str) -> Self {
		ListFilterSpec::Field(name.to_string())
	}
}

/// One selectable value of a filter
///
/// # Examples
///
/// ```
/// use reinhardt_smart_lists::QueryParams;
/// use reinhardt_smart_lists::filters::SmartFilterValue;
///
/// let params = QueryParams::parse("category=foo&page=3");
/// let value = SmartFilterValue::new("category", "Blog Post", Some("blog_post".to_string()), &params, "page");
///
/// assert!(!value.is_active());
/// assert_eq!(value.get_url(), "?category=blog_post");
/// ```
#[derive(Debug, Clone)]
pub struct SmartFilterValue {
	/// Query parameter of the filter
	pub field_name: String,
	/// Displayed label
	pub label: String,
	/// Parameter value; `None` clears the filter
	pub value: Option<String>,
	query_params: QueryParams,
	page_query_param: String,
}

impl SmartFilterValue {
	/// Create a filter value
	pub fn new(
		field_name: impl Into<String>,
		label: impl Into<String>,
		value: Option<String>,
		query_params: &QueryParams,
		page_query_param: impl Into<String>,
	) -> Self {
		Self {
			field_name: field_name.into(),
			label: label.into(),
			value,
			query_params: query_params.clone(),
			page_query_param: page_query_param.into(),
		}
	}

	/// Displayed label
	pub fn get_title(&self) -> &str {
		&self.label
	}

	/// URL selecting this value
	///
	/// Pagination is reset.
	pub fn get_url(&self) -> String {
		url_with_query_params(
			&self.query_params,
			&[(self.field_name.as_str(), self.value.as_deref())],
			&[self.page_query_param.as_str()],
		)
	}

	/// Returns `true` if this value is the current selection
	pub fn is_active(&self) -> bool {
		match self.query_params.get(&self.field_name) {
			Some(selected) => self.value.as_deref() == Some(selected),
			None => self.value.is_none(),
		}
	}
}

/// A filter rendered for the current request
#[derive(Debug, Clone)]
pub struct SmartFilter {
	/// Query parameter of the filter
	pub parameter_name: String,
	title: String,
	values: Vec<SmartFilterValue>,
}

impl SmartFilter {
	/// Render a filter
	///
	/// `source` is the collection whose records determine the values of
	/// relation filters.
	pub fn new<Q: QuerySet>(
		filter: &dyn ListFilter<Q>,
		source: &Q,
		query_params: &QueryParams,
		page_query_param: &str,
	) -> Result<Self> {
		let parameter_name = filter.parameter_name().to_string();
		let mut values = vec![SmartFilterValue::new(
			parameter_name.clone(),
			ALL_LABEL,
			None,
			query_params,
			page_query_param,
		)];
		values.extend(filter.lookups(source)?.into_iter().map(|(value, label)| {
			SmartFilterValue::new(
				parameter_name.clone(),
				label,
				Some(value),
				query_params,
				page_query_param,
			)
		}));
		Ok(Self {
			title: filter.title(),
			parameter_name,
			values,
		})
	}

	/// Filter title
	pub fn get_title(&self) -> &str {
		&self.title
	}

	/// Selectable values, starting with the one clearing the filter
	pub fn get_values(&self) -> &[SmartFilterValue] {
		&self.values
	}

	/// The currently selected value
	pub fn active_value(&self) -> Option<&SmartFilterValue> {
		self.values.iter().find(|value| value.is_active())
	}
}
