//! Dynamically typed cell values

use crate::html::SafeString;
use crate::model::Record;
use crate::settings::SmartListSettings;
use chrono::{NaiveDate, NaiveDateTime};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// A value read from a record
///
/// Values are what accessors, render functions and query backends
/// exchange. Related records are carried whole so that cells can link to
/// their detail pages.
#[derive(Clone)]
pub enum Value {
	/// Missing or SQL `NULL`
	Null,
	/// Boolean
	Bool(bool),
	/// Integer
	Int(i64),
	/// Floating point number
	Float(f64),
	/// Plain (unescaped) text
	Text(String),
	/// Calendar date
	Date(NaiveDate),
	/// Date and time without timezone
	DateTime(NaiveDateTime),
	/// Pre-sanitized HTML
	Safe(SafeString),
	/// Related record (to-one relation)
	Record(Arc<dyn Record>),
}

impl Value {
	/// Returns `true` for [`Value::Null`]
	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	/// Returns the numeric value for numbers
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Value::Int(i) => Some(*i as f64),
			Value::Float(f) => Some(*f),
			_ => None,
		}
	}

	/// Returns the related record, if this value is one
	pub fn as_record(&self) -> Option<&Arc<dyn Record>> {
		match self {
			Value::Record(record) => Some(record),
			_ => None,
		}
	}

	/// Returns the form used to compare values with query parameters
	///
	/// Related records compare by primary key and booleans by `1`/`0`, which
	/// is how filter links encode them.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_smart_lists::Value;
	///
	/// assert_eq!(Value::Bool(true).lookup_key(), "1");
	/// assert_eq!(Value::Int(42).lookup_key(), "42");
	/// assert_eq!(Value::Text("blog_post".into()).lookup_key(), "blog_post");
	/// ```
	pub fn lookup_key(&self) -> String {
		match self {
			Value::Null => String::new(),
			Value::Bool(true) => "1".to_string(),
			Value::Bool(false) => "0".to_string(),
			Value::Record(record) => record.pk().lookup_key(),
			other => other.to_string(),
		}
	}

	/// Format the value for display using the given settings
	///
	/// Dates use the configured formats and nulls the configured empty text.
	pub fn display(&self, settings: &SmartListSettings) -> String {
		match self {
			Value::Null => settings.empty_value_display.clone(),
			Value::Date(date) => format_or_default(date.format(&settings.date_format), date),
			Value::DateTime(datetime) => {
				format_or_default(datetime.format(&settings.datetime_format), datetime)
			}
			other => other.to_string(),
		}
	}

	/// Compare two values for ordering
	///
	/// Nulls sort first. Values of different kinds compare by their
	/// textual form.
	pub fn compare(&self, other: &Value) -> Ordering {
		match (self, other) {
			(Value::Null, Value::Null) => Ordering::Equal,
			(Value::Null, _) => Ordering::Less,
			(_, Value::Null) => Ordering::Greater,
			(Value::Bool(a), Value::Bool(b)) => a.cmp(b),
			(Value::Date(a), Value::Date(b)) => a.cmp(b),
			(Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
			(Value::Record(a), Value::Record(b)) => a.pk().compare(&b.pk()),
			(a, b) => match (a.as_f64(), b.as_f64()) {
				(Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
				_ => a.to_string().cmp(&b.to_string()),
			},
		}
	}
}

// Invalid user-supplied format strings fall back to the ISO form.
fn format_or_default(formatted: impl fmt::Display, fallback: &impl fmt::Display) -> String {
	let mut out = String::new();
	match fmt::Write::write_fmt(&mut out, format_args!("{}", formatted)) {
		Ok(()) => out,
		Err(_) => fallback.to_string(),
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Value::Null => Ok(()),
			Value::Bool(b) => write!(f, "{}", if *b { "Yes" } else { "No" }),
			Value::Int(i) => write!(f, "{}", i),
			Value::Float(x) => write!(f, "{}", x),
			Value::Text(s) => f.write_str(s),
			Value::Date(d) => write!(f, "{}", d),
			Value::DateTime(dt) => write!(f, "{}", dt),
			Value::Safe(s) => f.write_str(s.as_str()),
			Value::Record(record) => f.write_str(&record.display()),
		}
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Value::Null => f.write_str("Null"),
			Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
			Value::Int(i) => f.debug_tuple("Int").field(i).finish(),
			Value::Float(x) => f.debug_tuple("Float").field(x).finish(),
			Value::Text(s) => f.debug_tuple("Text").field(s).finish(),
			Value::Date(d) => f.debug_tuple("Date").field(d).finish(),
			Value::DateTime(dt) => f.debug_tuple("DateTime").field(dt).finish(),
			Value::Safe(s) => f.debug_tuple("Safe").field(s).finish(),
			Value::Record(record) => f.debug_tuple("Record").field(&record.pk()).finish(),
		}
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Value::Null, Value::Null) => true,
			(Value::Bool(a), Value::Bool(b)) => a == b,
			(Value::Int(a), Value::Int(b)) => a == b,
			(Value::Float(a), Value::Float(b)) => a == b,
			(Value::Text(a), Value::Text(b)) => a == b,
			(Value::Date(a), Value::Date(b)) => a == b,
			(Value::DateTime(a), Value::DateTime(b)) => a == b,
			(Value::Safe(a), Value::Safe(b)) => a == b,
			(Value::Record(a), Value::Record(b)) => a.pk() == b.pk(),
			_ => false,
		}
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Value::Bool(value)
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Value::Int(value)
	}
}

impl From<i32> for Value {
	fn from(value: i32) -> Self {
		Value::Int(i64::from(value))
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Value::Float(value)
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Value::Text(value.to_string())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Value::Text(value)
	}
}

impl From<NaiveDate> for Value {
	fn from(value: NaiveDate) -> Self {
		Value::Date(value)
	}
}

impl From<NaiveDateTime> for Value {
	fn from(value: NaiveDateTime) -> Self {
		Value::DateTime(value)
	}
}

impl From<SafeString> for Value {
	fn from(value: SafeString) -> Self {
		Value::Safe(value)
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(value: Option<T>) -> Self {
		value.map(Into::into).unwrap_or(Value::Null)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(Value::Null, "")]
	#[case(Value::Bool(false), "No")]
	#[case(Value::Int(-3), "-3")]
	#[case(Value::Float(1.5), "1.5")]
	#[case(Value::Text("a<b".into()), "a<b")]
	#[case(Value::Safe(SafeString::new("<b>")), "<b>")]
	fn test_display(#[case] value: Value, #[case] expected: &str) {
		assert_eq!(value.to_string(), expected);
	}

	#[test]
	fn test_display_with_settings_formats_dates() {
		let settings = SmartListSettings {
			date_format: "%d.%m.%Y".to_string(),
			empty_value_display: "-".to_string(),
			..SmartListSettings::default()
		};
		let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
		assert_eq!(Value::Date(date).display(&settings), "15.01.2024");
		assert_eq!(Value::Null.display(&settings), "-");

		let datetime = date.and_hms_opt(9, 30, 0).unwrap();
		assert_eq!(
			Value::DateTime(datetime).display(&SmartListSettings::default()),
			"2024-01-15 09:30"
		);
	}

	#[test]
	fn test_display_with_invalid_format_falls_back() {
		let settings = SmartListSettings {
			date_format: "%Q".to_string(),
			..SmartListSettings::default()
		};
		let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
		assert_eq!(Value::Date(date).display(&settings), "2024-01-15");
	}

	#[test]
	fn test_compare_orders_nulls_first_and_numbers_numerically() {
		assert_eq!(Value::Null.compare(&Value::Int(1)), Ordering::Less);
		assert_eq!(Value::Int(10).compare(&Value::Int(9)), Ordering::Greater);
		assert_eq!(Value::Int(2).compare(&Value::Float(2.5)), Ordering::Less);
		assert_eq!(
			Value::from("apple").compare(&Value::from("banana")),
			Ordering::Less
		);
	}

	#[test]
	fn test_from_option() {
		assert_eq!(Value::from(None::<i64>), Value::Null);
		assert_eq!(Value::from(Some("x")), Value::Text("x".into()));
	}
}
