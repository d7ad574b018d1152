use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, ActionError>;

/// Error raised by an invoked member body. Carried through unmodified.
pub type TargetError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why an [`ObjectHandle`](crate::action::ObjectHandle) could not reach its object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ObjectAccessError {
	/// The object was destroyed.
	#[error("object {0} no longer exists")]
	Missing(crate::action::ObjectId),
	/// The object is already mutably borrowed by a call running on this thread.
	#[error("object {0} is already in use by a running call")]
	Busy(crate::action::ObjectId),
	/// The object is not of the requested Rust type.
	#[error("object {id} is not a {expected}")]
	WrongType {
		/// Object that was reached.
		id: crate::action::ObjectId,
		/// Requested Rust type name.
		expected: &'static str,
	},
}

/// Errors produced while registering types, packing arguments, and invoking actions.
#[derive(Debug, Error)]
pub enum ActionError {
	/// Filesystem or stream IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Persisted document or encoded text is not valid JSON for the expected shape.
	#[error("json: {0}")]
	Json(#[from] serde_json::Error),
	/// A qualified type name no longer resolves in the type universe.
	#[error("type not found: {qualified_name}")]
	TypeNotFound {
		/// Qualified name that failed to resolve.
		qualified_name: String,
	},
	/// A type or alias with this qualified name is already registered.
	#[error("type already registered: {qualified_name}")]
	DuplicateType {
		/// Conflicting qualified name.
		qualified_name: String,
	},
	/// Stored text could not be materialized as the requested type.
	#[error("decode {type_name}: {reason}")]
	Decode {
		/// Type the decoder was asked to produce.
		type_name: String,
		/// Human-readable failure detail.
		reason: String,
	},
	/// Value cannot be represented in the structural text form.
	#[error("encode {type_name}: {reason}")]
	Encode {
		/// Runtime type being encoded.
		type_name: String,
		/// Human-readable failure detail.
		reason: String,
	},
	/// Value is not assignment-compatible with a declared parameter type.
	#[error("argument type mismatch for {parameter}: expected {expected}, got {actual}")]
	ArgumentTypeMismatch {
		/// Parameter or field receiving the value.
		parameter: String,
		/// Declared type name.
		expected: String,
		/// Runtime type name of the rejected value.
		actual: String,
	},
	/// Argument list length differs from the member's parameter list.
	#[error("argument count mismatch for {member}: expected {expected}, got {got}")]
	ArgumentCount {
		/// Member display name.
		member: String,
		/// Declared parameter count.
		expected: usize,
		/// Supplied argument count.
		got: usize,
	},
	/// Generic method was closed with the wrong number of type arguments.
	#[error("generic argument count mismatch for {member}: expected {expected}, got {got}")]
	GenericArgumentCount {
		/// Member display name.
		member: String,
		/// Required type argument count.
		expected: usize,
		/// Supplied type argument count.
		got: usize,
	},
	/// Persisted document is structurally malformed.
	#[error("invalid document: {reason}")]
	InvalidDocument {
		/// Human-readable failure detail.
		reason: String,
	},
	/// The invoked member itself failed.
	#[error("{member} failed: {source}")]
	Target {
		/// Member display name.
		member: String,
		/// Error returned by the member body.
		source: TargetError,
	},
}

impl ActionError {
	/// Take the member body's own error out of a `Target` failure.
	pub fn into_target_error(self) -> Option<TargetError> {
		match self {
			Self::Target { source, .. } => Some(source),
			_ => None,
		}
	}
}
