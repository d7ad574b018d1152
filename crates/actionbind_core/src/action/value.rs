use crate::action::ObjectHandle;

/// Runtime value passed to and returned from members.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	/// Null reference.
	Null,
	/// `bool`
	Bool(bool),
	/// `i32`
	I32(i32),
	/// `i64`
	I64(i64),
	/// `f32`
	F32(f32),
	/// `f64`
	F64(f64),
	/// `string`
	String(String),
	/// Enum value, possibly a flag combination.
	Enum(EnumValue),
	/// Struct or class instance.
	Struct(StructValue),
	/// External engine object.
	Object(ObjectHandle),
}

/// Enum value tagged with its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
	/// Qualified enum type name.
	pub type_name: Box<str>,
	/// Raw value bits.
	pub bits: i64,
}

/// Struct or class instance tagged with its type.
#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
	/// Qualified type name.
	pub type_name: Box<str>,
	/// Field values in declaration order.
	pub fields: Vec<FieldValue>,
}

/// One named field value.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
	/// Field name.
	pub name: Box<str>,
	/// Field value.
	pub value: Value,
}

impl StructValue {
	/// Field value by name.
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.fields.iter().find(|field| &*field.name == name).map(|field| &field.value)
	}
}

impl Value {
	/// Build a struct value from `(name, value)` pairs.
	pub fn structure<I, V>(type_name: &str, fields: I) -> Self
	where
		I: IntoIterator<Item = (&'static str, V)>,
		V: Into<Value>,
	{
		Self::Struct(StructValue {
			type_name: type_name.into(),
			fields: fields
				.into_iter()
				.map(|(name, value)| FieldValue {
					name: name.into(),
					value: value.into(),
				})
				.collect(),
		})
	}

	/// Build an enum value.
	pub fn enumeration(type_name: &str, bits: i64) -> Self {
		Self::Enum(EnumValue {
			type_name: type_name.into(),
			bits,
		})
	}

	/// Whether this is the null reference.
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// Short label of the value's variant, used in diagnostics.
	pub fn kind_label(&self) -> &'static str {
		match self {
			Self::Null => "null",
			Self::Bool(_) => "bool",
			Self::I32(_) => "i32",
			Self::I64(_) => "i64",
			Self::F32(_) => "f32",
			Self::F64(_) => "f64",
			Self::String(_) => "string",
			Self::Enum(_) => "enum",
			Self::Struct(_) => "struct",
			Self::Object(_) => "object",
		}
	}

	/// `bool` payload.
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Bool(value) => Some(*value),
			_ => None,
		}
	}

	/// `i32` payload.
	pub fn as_i32(&self) -> Option<i32> {
		match self {
			Self::I32(value) => Some(*value),
			_ => None,
		}
	}

	/// `i64` payload, widening `i32`.
	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Self::I32(value) => Some(i64::from(*value)),
			Self::I64(value) => Some(*value),
			_ => None,
		}
	}

	/// `f32` payload.
	pub fn as_f32(&self) -> Option<f32> {
		match self {
			Self::F32(value) => Some(*value),
			_ => None,
		}
	}

	/// `f64` payload, widening `f32`.
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Self::F32(value) => Some(f64::from(*value)),
			Self::F64(value) => Some(*value),
			_ => None,
		}
	}

	/// String payload.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(value) => Some(value),
			_ => None,
		}
	}

	/// Struct payload.
	pub fn as_struct(&self) -> Option<&StructValue> {
		match self {
			Self::Struct(value) => Some(value),
			_ => None,
		}
	}

	/// Engine-object payload.
	pub fn as_object(&self) -> Option<&ObjectHandle> {
		match self {
			Self::Object(value) => Some(value),
			_ => None,
		}
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<i32> for Value {
	fn from(value: i32) -> Self {
		Self::I32(value)
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Self::I64(value)
	}
}

impl From<f32> for Value {
	fn from(value: f32) -> Self {
		Self::F32(value)
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Self::F64(value)
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Self::String(value.to_owned())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Self::String(value)
	}
}

impl From<ObjectHandle> for Value {
	fn from(value: ObjectHandle) -> Self {
		Self::Object(value)
	}
}
