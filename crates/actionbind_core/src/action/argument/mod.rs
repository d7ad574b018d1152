use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::action::{ActionError, CodecOptions, ObjectHandle, ObjectResolver, Result, TypeIdentity, Value, ValueSnapshot, decode, default_value_for, encode, universe};

/// One persisted argument: declared parameter type, stored snapshot, and the
/// lazily materialized runtime value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ArgumentRecord", into = "ArgumentRecord")]
pub struct ArgumentSlot {
	name: Box<str>,
	declared_type: TypeIdentity,
	value_type: TypeIdentity,
	snapshot: ValueSnapshot,
	resolved: OnceCell<Value>,
}

impl ArgumentSlot {
	/// Capture `value` for a parameter of type `declared_type`.
	pub fn new(name: impl Into<Box<str>>, declared_type: TypeIdentity, value: Value) -> Result<Self> {
		let name = name.into();
		let value_type = checked_value_type(&name, &declared_type, &value)?;
		let snapshot = encode(&value, &CodecOptions::default())?;
		Ok(Self {
			name,
			declared_type,
			value_type,
			snapshot,
			resolved: OnceCell::with_value(value),
		})
	}

	/// Parameter name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Declared parameter type.
	pub fn declared_type(&self) -> &TypeIdentity {
		&self.declared_type
	}

	/// Runtime type the stored value was captured as.
	pub fn value_type(&self) -> &TypeIdentity {
		&self.value_type
	}

	/// Persisted snapshot.
	pub fn snapshot(&self) -> &ValueSnapshot {
		&self.snapshot
	}

	/// Whether the runtime value has been materialized.
	pub fn is_resolved(&self) -> bool {
		self.resolved.get().is_some()
	}

	/// Replace the stored value. Rejects values incompatible with the declared type.
	pub fn set_value(&mut self, value: Value) -> Result<()> {
		self.value_type = checked_value_type(&self.name, &self.declared_type, &value)?;
		self.snapshot = encode(&value, &CodecOptions::default())?;
		self.resolved = OnceCell::with_value(value);
		Ok(())
	}

	/// Materialized runtime value, decoded on first access and cached after.
	///
	/// Stored text that no longer decodes falls back to the declared type's
	/// default. Fails only when the declared type itself no longer resolves.
	pub fn unpack(&self) -> Result<&Value> {
		self.unpack_with(&CodecOptions::default())
	}

	/// [`ArgumentSlot::unpack`] with explicit codec limits for the first decode.
	pub fn unpack_with(&self, opt: &CodecOptions) -> Result<&Value> {
		self.resolved.get_or_try_init(|| self.materialize(opt))
	}

	fn materialize(&self, opt: &CodecOptions) -> Result<Value> {
		let decoded = decode(&self.snapshot, &self.value_type, opt).and_then(|value| {
			// Detached handles carry no type until the object graph re-links them.
			if value.as_object().is_some_and(|handle| !handle.is_attached()) {
				return Ok(value);
			}
			let declared = self.declared_type.resolve()?;
			if universe().accepts(&declared, &value)? {
				Ok(value)
			} else {
				Err(ActionError::Decode {
					type_name: self.declared_type.qualified_name().to_owned(),
					reason: format!("stored {} value is not assignable", value.kind_label()),
				})
			}
		});

		match decoded {
			Ok(value) => Ok(value),
			Err(err) => {
				tracing::warn!(argument = %self.name, declared = self.declared_type.qualified_name(), error = %err, "argument falls back to default");
				default_value_for(&self.declared_type)
			}
		}
	}

	/// Same stored value under another parameter name.
	pub(crate) fn renamed(&self, name: &str) -> Self {
		let mut slot = self.clone();
		slot.name = name.into();
		slot
	}

	/// Re-link a live-reference snapshot to the external object graph.
	pub(crate) fn attach(&mut self, objects: &dyn ObjectResolver) {
		if let ValueSnapshot::LiveReference(handle) = &self.snapshot {
			self.snapshot = ValueSnapshot::LiveReference(handle.attach(objects));
			self.resolved = OnceCell::new();
		}
	}
}

/// Runtime type identity of `value` once checked against `declared`.
pub(crate) fn checked_value_type(parameter: &str, declared: &TypeIdentity, value: &Value) -> Result<TypeIdentity> {
	let declared_ty = declared.resolve()?;
	let uni = universe();
	let actual = uni.type_of(value)?;
	let accepted = match &actual {
		None => !declared_ty.is_value_type(),
		Some(actual) => uni.is_assignable(&declared_ty, actual),
	};
	if !accepted {
		return Err(ActionError::ArgumentTypeMismatch {
			parameter: parameter.to_owned(),
			expected: declared_ty.qualified_name().to_owned(),
			actual: actual.map_or_else(|| "null".to_owned(), |item| item.qualified_name().to_owned()),
		});
	}
	Ok(actual.map_or_else(|| declared.clone(), |item| item.identity()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
enum ValueKind {
	Encoded,
	LiveRef,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArgumentRecord {
	name: Box<str>,
	declared_type: TypeIdentity,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	value_type: Option<TypeIdentity>,
	value_kind: ValueKind,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	encoded_text: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	live_ref_handle: Option<ObjectHandle>,
}

impl From<ArgumentSlot> for ArgumentRecord {
	fn from(slot: ArgumentSlot) -> Self {
		let (value_kind, encoded_text, live_ref_handle) = match slot.snapshot {
			ValueSnapshot::Encoded(text) => (ValueKind::Encoded, Some(text), None),
			ValueSnapshot::LiveReference(handle) => (ValueKind::LiveRef, None, Some(handle)),
		};
		Self {
			name: slot.name,
			declared_type: slot.declared_type,
			value_type: Some(slot.value_type),
			value_kind,
			encoded_text,
			live_ref_handle,
		}
	}
}

impl TryFrom<ArgumentRecord> for ArgumentSlot {
	type Error = ActionError;

	fn try_from(record: ArgumentRecord) -> Result<Self> {
		let snapshot = match (record.value_kind, record.encoded_text, record.live_ref_handle) {
			(ValueKind::Encoded, Some(text), _) => ValueSnapshot::Encoded(text),
			(ValueKind::LiveRef, _, Some(handle)) => ValueSnapshot::LiveReference(handle),
			(kind, _, _) => {
				return Err(ActionError::InvalidDocument {
					reason: format!("argument {} has kind {kind:?} without its payload", record.name),
				});
			}
		};
		Ok(Self {
			value_type: record.value_type.unwrap_or_else(|| record.declared_type.clone()),
			name: record.name,
			declared_type: record.declared_type,
			snapshot,
			resolved: OnceCell::new(),
		})
	}
}
