//! Free-text search
//!
//! Combines multiple search terms across multiple fields: every term must
//! match (AND) in at least one field (OR).
//!
//! A search field may carry a prefix choosing the lookup:
//!
//! | Prefix | Lookup |
//! |---|---|
//! | `^` | case-insensitive starts-with |
//! | `=` | case-insensitive exact match |
//! | `@` | full-text search |
//! | none | case-insensitive contains |

use crate::query::{Filter, FilterCondition, FilterOperator};

/// Search field with its lookup
///
/// # Examples
///
/// ```
/// use reinhardt_smart_lists::query::FilterOperator;
/// use reinhardt_smart_lists::search::SearchField;
///
/// let field = SearchField::parse("^title");
/// assert_eq!(field.field, "title");
/// assert_eq!(field.operator, FilterOperator::IStartsWith);
/// assert_eq!(SearchField::parse("body").operator, FilterOperator::IContains);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchField {
	/// Field name without prefix
	pub field: String,
	/// Lookup applied to the field
	pub operator: FilterOperator,
}

impl SearchField {
	/// Parse a search field declaration
	pub fn parse(entry: &str) -> Self {
		let (operator, field) = if let Some(field) = entry.strip_prefix('^') {
			(FilterOperator::IStartsWith, field)
		} else if let Some(field) = entry.strip_prefix('=') {
			(FilterOperator::IExact, field)
		} else if let Some(field) = entry.strip_prefix('@') {
			(FilterOperator::Search, field)
		} else {
			(FilterOperator::IContains, entry)
		};
		Self {
			field: field.to_string(),
			operator,
		}
	}

	fn lookup(&self, term: &str) -> Filter {
		Filter::new(self.field.clone(), self.operator, term)
	}
}

/// Build search conditions for a search term
///
/// Returns one condition per whitespace-separated bit; each is an OR over
/// the search fields. The conditions are meant to be applied one after the
/// other. An empty or blank term, or an empty field list, yields no
/// conditions.
///
/// # Examples
///
/// ```
/// use reinhardt_smart_lists::search::search_conditions;
///
/// let conditions = search_conditions(&["title", "=category"], "rust  lang");
/// assert_eq!(conditions.len(), 2);
///
/// assert!(search_conditions(&["title"], "").is_empty());
/// assert!(search_conditions::<&str>(&[], "rust").is_empty());
/// ```
pub fn search_conditions<S: AsRef<str>>(search_fields: &[S], term: &str) -> Vec<FilterCondition> {
	if search_fields.is_empty() || term.trim().is_empty() {
		return Vec::new();
	}
	let fields: Vec<SearchField> = search_fields
		.iter()
		.map(|field| SearchField::parse(field.as_ref()))
		.collect();
	term.split_whitespace()
		.map(|bit| FilterCondition::or_filters(fields.iter().map(|field| field.lookup(bit)).collect()))
		.collect()
}
