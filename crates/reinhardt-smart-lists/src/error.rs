//! Error types for smart lists

use thiserror::Error;

/// Smart list error type
///
/// Every variant is a contract violation by the calling view or by the
/// client-supplied query string; none of them is transient.
#[derive(Debug, Error)]
pub enum SmartListError {
	/// A display entry names a private or data-altering accessor
	#[error("Illegal column: {0}")]
	IllegalColumn(String),

	/// The sort token cannot be applied to the declared columns
	#[error("Illegal ordering: {0}")]
	IllegalOrdering(String),

	/// Link rendering was requested for a value without a detail URL
	#[error("Cannot render link: {0}")]
	MissingLink(String),

	/// A render function returned a value that is not marked safe
	#[error("Unsafe render output: {0}")]
	UnsafeRenderOutput(String),

	/// A declared filter names a field the model does not have
	#[error("Unknown filter field '{0}'")]
	UnknownFilterField(String),

	/// The query backend reported an error
	#[error("Backend error: {0}")]
	Backend(String),

	/// Writing an export document failed
	#[error("Export error: {0}")]
	Export(String),

	/// Settings could not be parsed
	#[error("Settings error: {0}")]
	Settings(String),
}

/// Result type for smart list operations
pub type Result<T> = std::result::Result<T, SmartListError>;

impl SmartListError {
	/// Returns `true` for errors caused by client-supplied query parameters
	///
	/// Views are expected to answer these with a `400 Bad Request`.
	pub fn is_client_error(&self) -> bool {
		matches!(self, SmartListError::IllegalOrdering(_))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_error_messages() {
		let err = SmartListError::IllegalColumn("_delete".to_string());
		assert_eq!(err.to_string(), "Illegal column: _delete");

		let err = SmartListError::UnknownFilterField("missing".to_string());
		assert_eq!(err.to_string(), "Unknown filter field 'missing'");
	}

	#[test]
	fn test_client_error_classification() {
		assert!(SmartListError::IllegalOrdering("x".into()).is_client_error());
		assert!(!SmartListError::IllegalColumn("x".into()).is_client_error());
		assert!(!SmartListError::Backend("x".into()).is_client_error());
	}
}
