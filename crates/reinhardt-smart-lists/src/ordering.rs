//! Multi-column sort state
//!
//! The sort state travels in a single query parameter (`o` by default) as
//! dot-separated, 1-based column ids ordered by priority. A leading `-`
//! marks a descending column:
//!
//! ```text
//! o=-2.1    column 2 descending, then column 1 ascending
//! ```
//!
//! [`SmartOrder`] answers how one column takes part in that state and builds
//! the links that add, reverse or remove it.

use crate::column::{Column, ListDisplay};
use crate::error::{Result, SmartListError};
use crate::model::ModelMeta;
use crate::params::{QueryParams, url_with_query_params};
use crate::query::OrderingTerm;
use std::fmt;

const SEPARATOR: char = '.';
const DESCENDING_MARKER: char = '-';

/// One entry of a sort token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortEntry {
	/// 1-based column id
	pub column_id: usize,
	/// Sort descending
	pub descending: bool,
}

impl SortEntry {
	/// Ascending entry
	pub fn asc(column_id: usize) -> Self {
		Self {
			column_id,
			descending: false,
		}
	}

	/// Descending entry
	pub fn desc(column_id: usize) -> Self {
		Self {
			column_id,
			descending: true,
		}
	}

	fn reversed(self) -> Self {
		Self {
			descending: !self.descending,
			..self
		}
	}
}

impl fmt::Display for SortEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.descending {
			write!(f, "{}{}", DESCENDING_MARKER, self.column_id)
		} else {
			write!(f, "{}", self.column_id)
		}
	}
}

/// Decoded sort token
///
/// # Examples
///
/// ```
/// use reinhardt_smart_lists::ordering::{SortEntry, SortToken};
///
/// let token = SortToken::parse("-2.1").unwrap();
/// assert_eq!(token.entries(), &[SortEntry::desc(2), SortEntry::asc(1)]);
/// assert_eq!(token.to_string(), "-2.1");
///
/// assert!(SortToken::parse("2.x").is_err());
/// assert!(SortToken::parse("1.1").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortToken {
	entries: Vec<SortEntry>,
}

impl SortToken {
	/// Decode a token
	///
	/// The empty string decodes to an empty token. Entries that are not
	/// positive integers, and ids repeated within the token, are rejected.
	pub fn parse(token: &str) -> Result<Self> {
		if token.is_empty() {
			return Ok(Self::default());
		}
		let mut entries: Vec<SortEntry> = Vec::new();
		for raw in token.split(SEPARATOR) {
			let (descending, digits) = match raw.strip_prefix(DESCENDING_MARKER) {
				Some(rest) => (true, rest),
				None => (false, raw),
			};
			if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
				return Err(SmartListError::IllegalOrdering(format!(
					"'{}' is not a column number",
					raw
				)));
			}
			let column_id: usize = digits.parse().map_err(|_| {
				SmartListError::IllegalOrdering(format!("'{}' is not a column number", raw))
			})?;
			if column_id == 0 {
				return Err(SmartListError::IllegalOrdering(
					"column numbers start at 1".to_string(),
				));
			}
			if entries.iter().any(|entry| entry.column_id == column_id) {
				return Err(SmartListError::IllegalOrdering(format!(
					"column {} appears more than once",
					column_id
				)));
			}
			entries.push(SortEntry {
				column_id,
				descending,
			});
		}
		Ok(Self { entries })
	}

	/// Entries in priority order
	pub fn entries(&self) -> &[SortEntry] {
		&self.entries
	}

	/// Returns `true` if no column is sorted
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Entry of a column
	pub fn get(&self, column_id: usize) -> Option<SortEntry> {
		self.entries
			.iter()
			.copied()
			.find(|entry| entry.column_id == column_id)
	}

	/// 0-based position of a column
	pub fn position(&self, column_id: usize) -> Option<usize> {
		self.entries
			.iter()
			.position(|entry| entry.column_id == column_id)
	}

	/// Token without a column, other entries keeping their order
	pub fn without(&self, column_id: usize) -> Self {
		Self {
			entries: self
				.entries
				.iter()
				.copied()
				.filter(|entry| entry.column_id != column_id)
				.collect(),
		}
	}

	/// Token with a column's direction flipped in place
	pub fn reversed(&self, column_id: usize) -> Self {
		Self {
			entries: self
				.entries
				.iter()
				.map(|entry| {
					if entry.column_id == column_id {
						entry.reversed()
					} else {
						*entry
					}
				})
				.collect(),
		}
	}

	/// Token with an entry inserted as the primary sort key
	///
	/// Any existing entry for the same column is removed first.
	pub fn promoted(&self, entry: SortEntry) -> Self {
		let mut entries = vec![entry];
		entries.extend(self.without(entry.column_id).entries);
		Self { entries }
	}
}

impl fmt::Display for SortToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (index, entry) in self.entries.iter().enumerate() {
			if index > 0 {
				write!(f, "{}", SEPARATOR)?;
			}
			write!(f, "{}", entry)?;
		}
		Ok(())
	}
}

/// Sort participation of one column
///
/// # Examples
///
/// ```
/// use reinhardt_smart_lists::QueryParams;
/// use reinhardt_smart_lists::ordering::SmartOrder;
///
/// let params = QueryParams::parse("o=-1.2");
/// let order = SmartOrder::new(&params, 2, "o").unwrap();
///
/// assert!(order.is_ordered());
/// assert_eq!(order.priority(), Some(2));
/// assert!(!order.is_reverse());
/// assert_eq!(order.get_add_sort_by(), "?o=2.-1");
/// assert_eq!(order.get_remove_sort_by(), "?o=-1");
/// assert_eq!(order.get_reverse_sort_by(), "?o=-1.-2");
/// ```
#[derive(Debug, Clone)]
pub struct SmartOrder {
	query_params: QueryParams,
	column_id: usize,
	ordering_query_param: String,
	token: SortToken,
}

impl SmartOrder {
	/// Bind a column to the sort state found in the query parameters
	///
	/// # Errors
	///
	/// Returns [`SmartListError::IllegalOrdering`] when the sort token
	/// cannot be decoded.
	pub fn new(
		query_params: &QueryParams,
		column_id: usize,
		ordering_query_param: impl Into<String>,
	) -> Result<Self> {
		let ordering_query_param = ordering_query_param.into();
		let token = SortToken::parse(query_params.get(&ordering_query_param).unwrap_or_default())?;
		Ok(Self {
			query_params: query_params.clone(),
			column_id,
			ordering_query_param,
			token,
		})
	}

	/// Column id this state is bound to
	pub fn column_id(&self) -> usize {
		self.column_id
	}

	/// Decoded sort token
	pub fn token(&self) -> &SortToken {
		&self.token
	}

	/// Returns `true` if the column takes part in the ordering
	pub fn is_ordered(&self) -> bool {
		self.token.get(self.column_id).is_some()
	}

	/// 1-based rank among the sorted columns
	pub fn priority(&self) -> Option<usize> {
		self.token.position(self.column_id).map(|index| index + 1)
	}

	/// Returns `true` if the column is sorted descending
	pub fn is_reverse(&self) -> bool {
		self.token
			.get(self.column_id)
			.is_some_and(|entry| entry.descending)
	}

	/// URL making this column the primary sort key
	///
	/// An unsorted column is prepended ascending. A sorted column among
	/// others moves to the front; it turns descending only when it already
	/// was the ascending primary key. A column sorted alone is reversed.
	pub fn get_add_sort_by(&self) -> String {
		let Some(current) = self.token.get(self.column_id) else {
			return self.url_with_token(&self.token.promoted(SortEntry::asc(self.column_id)));
		};
		if self.token.entries().len() == 1 {
			return self.get_reverse_sort_by();
		}
		let was_primary = self.priority() == Some(1);
		let entry = if was_primary && !current.descending {
			SortEntry::desc(self.column_id)
		} else {
			SortEntry::asc(self.column_id)
		};
		self.url_with_token(&self.token.promoted(entry))
	}

	/// URL with this column removed from the ordering
	///
	/// The sort parameter is dropped entirely once no column remains.
	pub fn get_remove_sort_by(&self) -> String {
		self.url_with_token(&self.token.without(self.column_id))
	}

	/// URL with this column's direction flipped
	pub fn get_reverse_sort_by(&self) -> String {
		self.url_with_token(&self.token.reversed(self.column_id))
	}

	fn url_with_token(&self, token: &SortToken) -> String {
		let encoded = token.to_string();
		let value = if token.is_empty() {
			None
		} else {
			Some(encoded.as_str())
		};
		url_with_query_params(
			&self.query_params,
			&[(self.ordering_query_param.as_str(), value)],
			&[],
		)
	}
}

/// Translate a sort token into ordering terms for the query backend
///
/// Entry `n` refers to display entry `n`; the column's order field is used
/// with the entry's direction.
///
/// # Errors
///
/// Returns [`SmartListError::IllegalOrdering`] for undecodable tokens, for
/// ids beyond the display entries and for columns that cannot be sorted.
/// Display entries that cannot be resolved report
/// [`SmartListError::IllegalColumn`].
///
/// # Examples
///
/// ```
/// use reinhardt_smart_lists::column::ListDisplay;
/// use reinhardt_smart_lists::model::{FieldKind, FieldMeta, ModelMeta};
/// use reinhardt_smart_lists::ordering::resolve_ordering;
/// use reinhardt_smart_lists::query::OrderingTerm;
///
/// let meta = ModelMeta::new("post")
///     .with_field(FieldMeta::new("title", FieldKind::Char))
///     .with_field(FieldMeta::new("votes", FieldKind::Integer));
/// let display = vec![ListDisplay::from("title"), ListDisplay::from("votes")];
///
/// let terms = resolve_ordering("-2.1", &display, &meta).unwrap();
/// assert_eq!(terms, vec![OrderingTerm::desc("votes"), OrderingTerm::asc("title")]);
/// assert!(resolve_ordering("3", &display, &meta).is_err());
/// ```
pub fn resolve_ordering(
	token: &str,
	list_display: &[ListDisplay],
	meta: &ModelMeta,
) -> Result<Vec<OrderingTerm>> {
	let token = SortToken::parse(token)?;
	let mut terms = Vec::with_capacity(token.entries().len());
	for entry in token.entries() {
		let display = list_display.get(entry.column_id - 1).ok_or_else(|| {
			SmartListError::IllegalOrdering(format!("there is no column {}", entry.column_id))
		})?;
		let column = Column::new(meta, display, entry.column_id)?;
		let order_field = column.order_field.ok_or_else(|| {
			SmartListError::IllegalOrdering(format!("column {} cannot be sorted", entry.column_id))
		})?;
		terms.push(OrderingTerm {
			field: order_field,
			descending: entry.descending,
		});
	}
	Ok(terms)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::{FieldKind, FieldMeta, MethodMeta};
	use proptest::prelude::*;
	use rstest::rstest;

	fn order(query: &str, column_id: usize) -> SmartOrder {
		SmartOrder::new(&QueryParams::parse(query), column_id, "o").unwrap()
	}

	#[test]
	fn test_is_ordered_and_priority() {
		let first = order("o=1.2", 1);
		assert!(first.is_ordered());
		assert_eq!(first.priority(), Some(1));

		let second = order("o=1.2", 2);
		assert!(second.is_ordered());
		assert_eq!(second.priority(), Some(2));

		let third = order("o=1.2", 3);
		assert!(!third.is_ordered());
		assert_eq!(third.priority(), None);
		assert!(!third.is_reverse());
	}

	#[rstest]
	#[case("", 1, "?o=1")]
	#[case("o=2", 1, "?o=1.2")]
	#[case("o=1", 1, "?o=-1")]
	#[case("o=-1", 1, "?o=1")]
	#[case("o=1.2", 1, "?o=-1.2")]
	#[case("o=-1.2", 1, "?o=1.2")]
	#[case("o=-1.2", 2, "?o=2.-1")]
	#[case("o=2.-3.1", 3, "?o=3.2.1")]
	fn test_get_add_sort_by(#[case] query: &str, #[case] column_id: usize, #[case] expected: &str) {
		assert_eq!(order(query, column_id).get_add_sort_by(), expected);
	}

	#[rstest]
	#[case("o=-1.2", 2, "?o=-1")]
	#[case("o=3.-1.2", 1, "?o=3.2")]
	#[case("o=1&q=x", 1, "?q=x")]
	fn test_get_remove_sort_by(#[case] query: &str, #[case] column_id: usize, #[case] expected: &str) {
		assert_eq!(order(query, column_id).get_remove_sort_by(), expected);
	}

	#[test]
	fn test_get_reverse_sort_by_keeps_other_params() {
		let order = order("q=test&o=2.-1&page=2", 1);
		assert!(order.is_reverse());
		assert_eq!(order.get_reverse_sort_by(), "?q=test&o=2.1&page=2");
	}

	#[rstest]
	#[case("a")]
	#[case("1.")]
	#[case("--1")]
	#[case("0")]
	#[case("2.-2")]
	#[case("+1")]
	fn test_parse_rejects_malformed_tokens(#[case] token: &str) {
		assert!(matches!(
			SortToken::parse(token),
			Err(SmartListError::IllegalOrdering(_))
		));
	}

	#[test]
	fn test_smart_order_rejects_malformed_token() {
		let result = SmartOrder::new(&QueryParams::parse("o=x"), 1, "o");
		assert!(result.is_err());
	}

	fn meta() -> ModelMeta {
		ModelMeta::new("sample_model")
			.with_field(FieldMeta::new("title", FieldKind::Char))
			.with_field(FieldMeta::new("category", FieldKind::Char))
			.with_method(MethodMeta::new("friendly_category").with_admin_order_field("category"))
			.with_method(MethodMeta::new("some_display_method"))
	}

	#[test]
	fn test_resolve_ordering_uses_order_field() {
		let display = vec![
			ListDisplay::from("title"),
			ListDisplay::from("friendly_category"),
		];
		let terms = resolve_ordering("-2.1", &display, &meta()).unwrap();
		assert_eq!(
			terms,
			vec![OrderingTerm::desc("category"), OrderingTerm::asc("title")]
		);
	}

	#[rstest]
	#[case("2")]
	#[case("1.x")]
	#[case("3")]
	fn test_resolve_ordering_rejects(#[case] token: &str) {
		let display = vec![
			ListDisplay::from("title"),
			ListDisplay::from("some_display_method"),
		];
		let err = resolve_ordering(token, &display, &meta()).unwrap_err();
		assert!(err.is_client_error());
	}

	fn token_strategy() -> impl Strategy<Value = Vec<SortEntry>> {
		prop::collection::btree_set(1usize..20, 0..6)
			.prop_flat_map(|ids| {
				let ids: Vec<usize> = ids.into_iter().collect();
				let len = ids.len();
				(Just(ids), prop::collection::vec(any::<bool>(), len))
			})
			.prop_flat_map(|(ids, directions)| {
				let entries: Vec<SortEntry> = ids
					.into_iter()
					.zip(directions)
					.map(|(column_id, descending)| SortEntry {
						column_id,
						descending,
					})
					.collect();
				Just(entries).prop_shuffle()
			})
	}

	fn decode(url: &str) -> SortToken {
		let params = QueryParams::parse(url);
		SortToken::parse(params.get("o").unwrap_or_default()).unwrap()
	}

	fn others(token: &SortToken, column_id: usize) -> Vec<SortEntry> {
		token.without(column_id).entries().to_vec()
	}

	proptest! {
		#[test]
		fn prop_toggles_never_duplicate_or_reorder(entries in token_strategy(), column_id in 1usize..20) {
			let token = SortToken { entries };
			let query = format!("o={}", token);
			let order = SmartOrder::new(&QueryParams::parse(&query), column_id, "o").unwrap();

			for url in [order.get_add_sort_by(), order.get_reverse_sort_by(), order.get_remove_sort_by()] {
				// Decoding rejects duplicate ids.
				let decoded = decode(&url);
				prop_assert_eq!(others(&decoded, column_id), others(&token, column_id));
			}

			let added = decode(&order.get_add_sort_by());
			prop_assert_eq!(added.entries().first().map(|e| e.column_id), Some(column_id));
			prop_assert!(decode(&order.get_remove_sort_by()).get(column_id).is_none());
		}

		#[test]
		fn prop_token_round_trips(entries in token_strategy()) {
			let token = SortToken { entries };
			prop_assert_eq!(SortToken::parse(&token.to_string()).unwrap(), token);
		}
	}
}
