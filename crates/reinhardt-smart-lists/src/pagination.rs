//! Pagination of list views

use crate::params::{QueryParams, url_with_query_params};
use crate::query::QuerySet;

/// Keyword selecting the last page
pub const LAST_PAGE: &str = "last";

/// Pagination state of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
	/// Number of items per page
	pub per_page: usize,
	/// Current page number (1-indexed)
	pub current_page: usize,
	/// Total number of items
	pub total_items: usize,
}

impl Pagination {
	/// Creates a new pagination configuration
	///
	/// # Arguments
	///
	/// * `per_page` - Number of items per page; zero is treated as one
	pub fn new(per_page: usize) -> Self {
		Self {
			per_page: per_page.max(1),
			current_page: 1,
			total_items: 0,
		}
	}

	/// Sets the total number of items, clamping the current page
	pub fn with_total(mut self, total_items: usize) -> Self {
		self.total_items = total_items;
		self.set_page(self.current_page);
		self
	}

	/// Selects the page named by a query parameter value
	///
	/// Unparseable values select the first page, `last` the last one and
	/// out-of-range numbers the nearest valid page.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_smart_lists::pagination::Pagination;
	///
	/// let pagination = Pagination::new(10).with_total(25);
	/// assert_eq!(pagination.clone().with_page_param(Some("2")).current_page, 2);
	/// assert_eq!(pagination.clone().with_page_param(Some("last")).current_page, 3);
	/// assert_eq!(pagination.clone().with_page_param(Some("99")).current_page, 3);
	/// assert_eq!(pagination.with_page_param(Some("abc")).current_page, 1);
	/// ```
	pub fn with_page_param(mut self, value: Option<&str>) -> Self {
		let page = match value {
			Some(LAST_PAGE) => self.total_pages(),
			Some(number) => number.trim().parse().unwrap_or(1),
			None => 1,
		};
		self.set_page(page);
		self
	}

	/// Returns the total number of pages
	pub fn total_pages(&self) -> usize {
		if self.total_items == 0 {
			0
		} else {
			self.total_items.div_ceil(self.per_page)
		}
	}

	/// Returns the start index for the current page (0-indexed)
	pub fn start_index(&self) -> usize {
		(self.current_page.saturating_sub(1)) * self.per_page
	}

	/// Returns the end index for the current page (exclusive, 0-indexed)
	pub fn end_index(&self) -> usize {
		(self.start_index() + self.per_page).min(self.total_items)
	}

	/// Returns `true` if a following page exists
	pub fn has_next(&self) -> bool {
		self.current_page < self.total_pages()
	}

	/// Returns `true` if a preceding page exists
	pub fn has_previous(&self) -> bool {
		self.current_page > 1
	}

	/// Sets the current page
	pub fn set_page(&mut self, page: usize) {
		self.current_page = page.max(1).min(self.total_pages().max(1));
	}

	/// Restricts a collection to the current page
	pub fn paginate<Q: QuerySet>(&self, queryset: Q) -> Q {
		queryset.slice(self.start_index(), Some(self.per_page))
	}

	/// URL of another page, keeping every other parameter
	pub fn page_url(&self, query_params: &QueryParams, page_query_param: &str, page: usize) -> String {
		let page = page.to_string();
		url_with_query_params(query_params, &[(page_query_param, Some(page.as_str()))], &[])
	}
}
