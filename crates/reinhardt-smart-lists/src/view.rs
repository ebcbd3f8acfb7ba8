//! List view controller
//!
//! [`SmartListView`] turns the query parameters of a request into a
//! transformed collection (ordering, filters, search), builds the
//! [`SmartList`] shown on the page and answers export requests.
//!
//! The view is configured by an explicit [`ListConfig`]:
//!
//! ```
//! use reinhardt_smart_lists::query::memory::MemoryQuerySet;
//! use reinhardt_smart_lists::view::{ListConfig, SmartListView};
//!
//! let config = ListConfig::<MemoryQuerySet>::new()
//!     .with_list_display(["title", "category"])
//!     .with_list_filter(["category"])
//!     .with_search_fields(["title", "=category"])
//!     .with_ordering(["-title"])
//!     .with_paginate_by(25);
//! let view = SmartListView::new(config);
//! assert_eq!(view.config().paginate_by, Some(25));
//! ```

use crate::column::ListDisplay;
use crate::error::{Result, SmartListError};
use crate::filters::{ListFilter, ListFilterSpec, SmartFilter};
use crate::list::SmartList;
use crate::ordering::resolve_ordering;
use crate::pagination::Pagination;
use crate::params::{QueryParams, url_with_query_params};
use crate::query::{FilterCondition, OrderingTerm, QuerySet};
use crate::search::search_conditions;
use crate::settings::SmartListSettings;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "export")]
use crate::export::{ExportBackend, ExportBackendExt, value_renderer};
#[cfg(feature = "export")]
use bytes::Bytes;
#[cfg(feature = "export")]
use http::{Response, StatusCode, header};

/// Per-view configuration
pub struct ListConfig<Q: QuerySet> {
	/// Columns
	pub list_display: Vec<ListDisplay>,
	/// Filters
	pub list_filter: Vec<ListFilterSpec<Q>>,
	/// Searched fields, optionally prefixed with `^`, `=` or `@`
	pub search_fields: Vec<String>,
	/// Ordering used when the request carries no sort token
	pub ordering: Vec<String>,
	/// Export backends, selected by index
	#[cfg(feature = "export")]
	pub export_backends: Vec<Arc<dyn ExportBackend>>,
	/// Page size; `None` disables pagination
	pub paginate_by: Option<usize>,
}

impl<Q: QuerySet> ListConfig<Q> {
	/// Create an empty configuration
	pub fn new() -> Self {
		Self {
			list_display: Vec::new(),
			list_filter: Vec::new(),
			search_fields: Vec::new(),
			ordering: Vec::new(),
			#[cfg(feature = "export")]
			export_backends: Vec::new(),
			paginate_by: None,
		}
	}

	/// Set the columns
	pub fn with_list_display<I, D>(mut self, list_display: I) -> Self
	where
		I: IntoIterator<Item = D>,
		D: Into<ListDisplay>,
	{
		self.list_display = list_display.into_iter().map(Into::into).collect();
		self
	}

	/// Set the filters
	pub fn with_list_filter<I, F>(mut self, list_filter: I) -> Self
	where
		I: IntoIterator<Item = F>,
		F: Into<ListFilterSpec<Q>>,
	{
		self.list_filter = list_filter.into_iter().map(Into::into).collect();
		self
	}

	/// Add a custom filter
	pub fn with_custom_filter(mut self, filter: impl ListFilter<Q> + 'static) -> Self {
		self.list_filter.push(ListFilterSpec::custom(filter));
		self
	}

	/// Set the searched fields
	pub fn with_search_fields<I, S>(mut self, search_fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.search_fields = search_fields.into_iter().map(Into::into).collect();
		self
	}

	/// Set the default ordering (`field` or `-field`)
	pub fn with_ordering<I, S>(mut self, ordering: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.ordering = ordering.into_iter().map(Into::into).collect();
		self
	}

	/// Add an export backend
	#[cfg(feature = "export")]
	pub fn with_export_backend(mut self, backend: impl ExportBackend + 'static) -> Self {
		self.export_backends.push(Arc::new(backend));
		self
	}

	/// Set the page size
	pub fn with_paginate_by(mut self, paginate_by: usize) -> Self {
		self.paginate_by = Some(paginate_by);
		self
	}
}

impl<Q: QuerySet> Default for ListConfig<Q> {
	fn default() -> Self {
		Self::new()
	}
}

impl<Q: QuerySet> Clone for ListConfig<Q> {
	fn clone(&self) -> Self {
		Self {
			list_display: self.list_display.clone(),
			list_filter: self.list_filter.clone(),
			search_fields: self.search_fields.clone(),
			ordering: self.ordering.clone(),
			#[cfg(feature = "export")]
			export_backends: self.export_backends.clone(),
			paginate_by: self.paginate_by,
		}
	}
}

impl<Q: QuerySet> fmt::Debug for ListConfig<Q> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ListConfig")
			.field("list_display", &self.list_display)
			.field("list_filter", &self.list_filter)
			.field("search_fields", &self.search_fields)
			.field("ordering", &self.ordering)
			.field("paginate_by", &self.paginate_by)
			.finish_non_exhaustive()
	}
}

/// Link starting an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportLink {
	/// Label of the backend
	pub verbose_name: String,
	/// Current URL with the export parameter set
	pub url: String,
}

/// Everything a list page needs to render
#[derive(Debug)]
pub struct ListContext<Q: QuerySet> {
	/// The list over the current page
	pub smart_list: SmartList<Q>,
	/// Pagination state, if the view paginates
	pub pagination: Option<Pagination>,
	/// Export links
	pub exports: Vec<ExportLink>,
}

/// Response of a list view
#[derive(Debug)]
pub enum ListResponse<Q: QuerySet> {
	/// Render the list page
	Page(ListContext<Q>),
	/// Send a download or a redirect
	#[cfg(feature = "export")]
	Http(Response<Bytes>),
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// The list view
///
/// # Architecture
///
/// ```mermaid
/// graph TD
///     A[SmartListView] --> B[Ordering]
///     A --> C[Filters]
///     A --> D[Search]
///     A --> E[Pagination]
///     A --> F[SmartList]
///     F --> G[Columns]
///     F --> H[Items]
///     H --> I[Fields]
///     A --> K[Export]
///     K --> L[Excel]
///     K --> M[CSV]
///     K --> N[JSON]
/// ```
#[derive(Debug, Clone)]
pub struct SmartListView<Q: QuerySet> {
	config: ListConfig<Q>,
	settings: SmartListSettings,
}

impl<Q: QuerySet> SmartListView<Q> {
	/// Create a view with default settings
	pub fn new(config: ListConfig<Q>) -> Self {
		Self {
			config,
			settings: SmartListSettings::default(),
		}
	}

	/// Use specific settings
	pub fn with_settings(mut self, settings: SmartListSettings) -> Self {
		self.settings = settings;
		self
	}

	/// View configuration
	pub fn config(&self) -> &ListConfig<Q> {
		&self.config
	}

	/// Settings in effect
	pub fn settings(&self) -> &SmartListSettings {
		&self.settings
	}

	/// Answer a request
	///
	/// Requests carrying the export parameter are answered with a download
	/// (or a redirect for an unknown backend), all others with the list
	/// page.
	pub fn get(&self, path: &str, params: &QueryParams, queryset: Q) -> Result<ListResponse<Q>> {
		#[cfg(feature = "export")]
		if params.contains(&self.settings.export_query_param) {
			return self.handle_export(path, params, queryset).map(ListResponse::Http);
		}
		#[cfg(not(feature = "export"))]
		let _ = path;
		self.get_context(params, queryset).map(ListResponse::Page)
	}

	/// Ordering for the request
	///
	/// The sort token takes precedence over the configured default ordering.
	///
	/// # Errors
	///
	/// Returns [`SmartListError::IllegalOrdering`] for sort tokens that do
	/// not fit the configured columns.
	pub fn get_ordering(&self, params: &QueryParams, queryset: &Q) -> Result<Vec<OrderingTerm>> {
		match params
			.get(&self.settings.ordering_query_param)
			.filter(|token| !token.is_empty())
		{
			Some(token) => {
				let terms = resolve_ordering(token, &self.config.list_display, queryset.meta())
					.inspect_err(|err| tracing::warn!(token, error = %err, "rejected sort token"))?;
				tracing::debug!(token, ?terms, "resolved ordering");
				Ok(terms)
			}
			None => Ok(self
				.config
				.ordering
				.iter()
				.map(|field| OrderingTerm::parse(field))
				.collect()),
		}
	}

	/// Search conditions for the request
	pub fn get_search_filters(&self, params: &QueryParams) -> Vec<FilterCondition> {
		let term = params
			.get(&self.settings.search_query_param)
			.unwrap_or_default();
		let conditions = search_conditions(&self.config.search_fields, term);
		if !conditions.is_empty() {
			tracing::debug!(term, bits = conditions.len(), "applying search");
		}
		conditions
	}

	/// Apply every configured filter
	pub fn apply_filters(&self, params: &QueryParams, queryset: Q) -> Result<Q> {
		let filters = self.resolve_filters(&queryset)?;
		apply_filters_except(&filters, params, queryset, None)
	}

	/// Apply ordering, filters and search
	pub fn smart_filter_queryset(&self, params: &QueryParams, queryset: Q) -> Result<Q> {
		let queryset = self.order_and_search(params, queryset)?;
		self.apply_filters(params, queryset)
	}

	/// Build the list over the whole transformed collection
	///
	/// The values offered by each filter are derived from the collection
	/// with every other filter applied.
	pub fn smart_list(&self, params: &QueryParams, queryset: Q) -> Result<SmartList<Q>> {
		let base = self.order_and_search(params, queryset)?;
		let filters = self.resolve_filters(&base)?;

		let mut smart_filters = Vec::with_capacity(filters.len());
		for (index, filter) in filters.iter().enumerate() {
			let source = apply_filters_except(&filters, params, base.clone(), Some(index))?;
			smart_filters.push(SmartFilter::new(
				filter.as_ref(),
				&source,
				params,
				&self.settings.page_query_param,
			)?);
		}

		let object_list = apply_filters_except(&filters, params, base, None)?;
		Ok(
			SmartList::new(object_list, params, &self.config.list_display, &self.settings)?
				.with_filters(smart_filters)
				.with_search_fields(self.config.search_fields.iter().cloned()),
		)
	}

	/// Build the list page: the list restricted to the requested page, and
	/// the export links
	pub fn get_context(&self, params: &QueryParams, queryset: Q) -> Result<ListContext<Q>> {
		let smart_list = self.smart_list(params, queryset)?;
		let (smart_list, pagination) = match self.config.paginate_by {
			Some(per_page) => {
				let pagination = Pagination::new(per_page)
					.with_total(smart_list.object_list().count()?)
					.with_page_param(params.get(&self.settings.page_query_param));
				let page = pagination.paginate(smart_list.object_list().clone());
				let columns_only = SmartList::new(page, params, &self.config.list_display, &self.settings)?
					.with_filters(smart_list.filters().to_vec())
					.with_search_fields(smart_list.search_fields().iter().cloned());
				(columns_only, Some(pagination))
			}
			None => (smart_list, None),
		};
		Ok(ListContext {
			smart_list,
			pagination,
			exports: self.export_links(params),
		})
	}

	/// Links selecting each export backend
	pub fn export_links(&self, params: &QueryParams) -> Vec<ExportLink> {
		#[cfg(feature = "export")]
		{
			self.config
				.export_backends
				.iter()
				.enumerate()
				.map(|(index, backend)| {
					let index = index.to_string();
					ExportLink {
						verbose_name: backend.verbose_name().to_string(),
						url: url_with_query_params(
							params,
							&[(self.settings.export_query_param.as_str(), Some(index.as_str()))],
							&[],
						),
					}
				})
				.collect()
		}
		#[cfg(not(feature = "export"))]
		{
			let _ = params;
			Vec::new()
		}
	}

	/// Answer an export request
	///
	/// An unknown or malformed backend index redirects to the same URL
	/// without the export parameter.
	#[cfg(feature = "export")]
	pub fn handle_export(&self, path: &str, params: &QueryParams, queryset: Q) -> Result<Response<Bytes>> {
		let export_param = self.settings.export_query_param.as_str();
		let selected = params.get(export_param).unwrap_or_default();
		let backend = match selected
			.parse::<usize>()
			.ok()
			.and_then(|index| self.config.export_backends.get(index))
		{
			Some(backend) => backend,
			None => {
				tracing::warn!(selected, "unknown export backend, redirecting");
				return redirect(path, params, export_param);
			}
		};

		let smart_list = self.smart_list(params, queryset)?;
		let content = backend.get_content(&smart_list, &value_renderer(&self.settings))?;
		Response::builder()
			.status(StatusCode::OK)
			.header(header::CONTENT_TYPE, backend.content_type())
			.header(
				header::CONTENT_DISPOSITION,
				format!("attachment; filename={}", backend.file_name()),
			)
			.body(Bytes::from(content))
			.map_err(|e| SmartListError::Export(format!("Failed to build response: {}", e)))
	}

	fn order_and_search(&self, params: &QueryParams, queryset: Q) -> Result<Q> {
		let ordering = self.get_ordering(params, &queryset)?;
		let mut queryset = if ordering.is_empty() {
			queryset
		} else {
			queryset.order_by(&ordering)
		};
		for condition in self.get_search_filters(params) {
			queryset = queryset.filter(condition);
		}
		Ok(queryset)
	}

	fn resolve_filters(&self, queryset: &Q) -> Result<Vec<Arc<dyn ListFilter<Q>>>> {
		self.config
			.list_filter
			.iter()
			.map(|spec| spec.resolve(queryset.meta()))
			.collect()
	}
}

fn apply_filters_except<Q: QuerySet>(
	filters: &[Arc<dyn ListFilter<Q>>],
	params: &QueryParams,
	mut queryset: Q,
	skip: Option<usize>,
) -> Result<Q> {
	for (index, filter) in filters.iter().enumerate() {
		if Some(index) == skip {
			continue;
		}
		if params.contains(filter.parameter_name()) {
			tracing::debug!(filter = filter.parameter_name(), "applying filter");
		}
		queryset = filter.queryset(params, queryset)?;
	}
	Ok(queryset)
}

#[cfg(feature = "export")]
fn redirect(path: &str, params: &QueryParams, without: &str) -> Result<Response<Bytes>> {
	let query = url_with_query_params(params, &[], &[without]);
	let location = if query == "?" {
		path.to_string()
	} else {
		format!("{}{}", path, query)
	};
	Response::builder()
		.status(StatusCode::FOUND)
		.header(header::LOCATION, location)
		.body(Bytes::new())
		.map_err(|e| SmartListError::Export(format!("Failed to build redirect: {}", e)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::{FieldKind, FieldMeta, ModelMeta, ValuesRow};
	use crate::query::memory::MemoryQuerySet;
	use rstest::{fixture, rstest};

	#[fixture]
	fn queryset() -> MemoryQuerySet {
		let meta = ModelMeta::new("post")
			.with_field(FieldMeta::new("title", FieldKind::Char))
			.with_field(
				FieldMeta::new("category", FieldKind::Char)
					.with_choices([("blog_post", "Blog Post"), ("foo", "Foo")]),
			);
		let mut posts = MemoryQuerySet::new(meta);
		for (id, title, category) in [(1i64, "b", "foo"), (2, "a", "blog_post"), (3, "c", "foo")] {
			posts = posts.with_record(ValuesRow::new().with("id", id).with("title", title).with("category", category));
		}
		posts
	}

	fn view() -> SmartListView<MemoryQuerySet> {
		SmartListView::new(
			ListConfig::new()
				.with_list_display(["title", "category"])
				.with_list_filter(["category"])
				.with_search_fields(["title"])
				.with_ordering(["-title"]),
		)
	}

	fn titles(queryset: &MemoryQuerySet) -> Vec<String> {
		queryset
			.fetch()
			.unwrap()
			.iter()
			.map(|record| record.get("title").unwrap().to_string())
			.collect()
	}

	#[rstest]
	#[case("", vec!["c", "b", "a"])]
	#[case("o=1", vec!["a", "b", "c"])]
	#[case("o=2.-1", vec!["a", "c", "b"])]
	#[case("category=foo&o=1", vec!["b", "c"])]
	#[case("q=C", vec!["c"])]
	fn test_smart_filter_queryset(queryset: MemoryQuerySet, #[case] query: &str, #[case] expected: Vec<&str>) {
		let qs = view().smart_filter_queryset(&QueryParams::parse(query), queryset).unwrap();
		assert_eq!(titles(&qs), expected);
	}

	#[rstest]
	#[case("o=3")]
	#[case("o=a")]
	#[case("o=0")]
	fn test_illegal_ordering(queryset: MemoryQuerySet, #[case] query: &str) {
		let err = view()
			.smart_filter_queryset(&QueryParams::parse(query), queryset)
			.unwrap_err();
		assert!(matches!(err, SmartListError::IllegalOrdering(_)));
	}

	#[rstest]
	fn test_pagination_restricts_items(queryset: MemoryQuerySet) {
		let view = SmartListView::new(ListConfig::new().with_list_display(["title"]).with_ordering(["title"]).with_paginate_by(2));
		let context = view.get_context(&QueryParams::parse("page=2"), queryset).unwrap();
		let pagination = context.pagination.unwrap();
		assert_eq!(pagination.current_page, 2);
		assert_eq!(pagination.total_pages(), 2);
		let items = context.smart_list.items().unwrap();
		assert_eq!(items.len(), 1);
		assert_eq!(items[0].record().get("title").unwrap().to_string(), "c");
	}

	#[rstest]
	fn test_empty_search_term_skips_search() {
		let params = QueryParams::parse("q=");
		assert!(view().get_search_filters(&params).is_empty());
	}
}
