use std::sync::Arc;

use serde_json::{Map, Number, Value as Json};

use crate::action::defaults::default_of;
use crate::action::{ActionError, EnumDef, FieldValue, ObjectHandle, Primitive, Result, StructValue, TypeDescriptor, TypeIdentity, TypeKind, Value, universe};

const TYPE_TAG: &str = "$type";
const CONTENT_TAG: &str = "$content";

/// Limits for structural encoding and decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
	/// Maximum struct nesting depth. Deeper structs are written empty and
	/// decoded as their type default.
	pub max_depth: u32,
}

impl Default for CodecOptions {
	fn default() -> Self {
		Self { max_depth: 7 }
	}
}

impl CodecOptions {
	/// Preset keeping only the outermost struct levels, for previews.
	pub fn shallow() -> Self {
		Self { max_depth: 2 }
	}
}

/// Persisted form of one value.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueSnapshot {
	/// Compact structural text.
	Encoded(String),
	/// Handle to an engine object, re-attached rather than decoded.
	LiveReference(ObjectHandle),
}

impl ValueSnapshot {
	/// Whether this snapshot references an engine object.
	pub fn is_live_reference(&self) -> bool {
		matches!(self, Self::LiveReference(_))
	}

	/// Stored text of an encoded snapshot.
	pub fn encoded_text(&self) -> Option<&str> {
		match self {
			Self::Encoded(text) => Some(text),
			Self::LiveReference(_) => None,
		}
	}

	/// Handle of a live-reference snapshot.
	pub fn live_reference(&self) -> Option<&ObjectHandle> {
		match self {
			Self::Encoded(_) => None,
			Self::LiveReference(handle) => Some(handle),
		}
	}
}

/// Capture `value` as a snapshot, typed by its own runtime type.
///
/// Engine objects become live references without touching the text encoder.
pub fn encode(value: &Value, opt: &CodecOptions) -> Result<ValueSnapshot> {
	if let Value::Object(handle) = value {
		return Ok(ValueSnapshot::LiveReference(handle.clone()));
	}
	let json = encode_value(value, opt, 0)?;
	Ok(ValueSnapshot::Encoded(serde_json::to_string(&json)?))
}

/// Materialize a snapshot as `as_type`.
pub fn decode(snapshot: &ValueSnapshot, as_type: &TypeIdentity, opt: &CodecOptions) -> Result<Value> {
	match snapshot {
		ValueSnapshot::LiveReference(handle) => Ok(Value::Object(handle.clone())),
		ValueSnapshot::Encoded(text) => {
			let ty = as_type.resolve()?;
			let json: Json = serde_json::from_str(text).map_err(|err| decode_error(&ty, err.to_string()))?;
			decode_value(&json, &ty, opt, 0)
		}
	}
}

fn encode_value(value: &Value, opt: &CodecOptions, depth: u32) -> Result<Json> {
	Ok(match value {
		Value::Null => Json::Null,
		Value::Bool(v) => Json::Bool(*v),
		Value::I32(v) => Json::from(*v),
		Value::I64(v) => Json::from(*v),
		Value::F32(v) => encode_float(f64::from(*v)),
		Value::F64(v) => encode_float(*v),
		Value::String(v) => Json::String(v.clone()),
		Value::Enum(item) => {
			let ty = lookup(&item.type_name)?;
			match ty.kind() {
				TypeKind::Enum(def) => encode_enum(def, item.bits),
				_ => return Err(encode_error(&item.type_name, "not an enum type")),
			}
		}
		Value::Struct(item) => encode_struct(item, opt, depth)?,
		Value::Object(handle) => return Err(encode_error("engine.Object", &format!("object {} cannot be text-encoded", handle.id()))),
	})
}

fn encode_struct(item: &StructValue, opt: &CodecOptions, depth: u32) -> Result<Json> {
	let ty = lookup(&item.type_name)?;
	if !matches!(ty.kind(), TypeKind::Struct { .. }) {
		return Err(encode_error(&item.type_name, "not a struct type"));
	}

	let mut out = Map::new();
	if depth >= opt.max_depth {
		return Ok(Json::Object(out));
	}

	for field in ty.data_fields() {
		let Some(value) = item.get(&field.name) else {
			continue;
		};
		let field_ty = field.ty.resolve()?;
		if !universe().accepts(&field_ty, value)? {
			return Err(encode_error(&item.type_name, &format!("field {} holds a {} value", field.name, value.kind_label())));
		}

		let mut json = encode_value(value, opt, depth + 1)?;
		if let (Value::Struct(inner), Json::Object(map)) = (value, &mut json) {
			if lookup(&inner.type_name)?.key() != field_ty.key() {
				map.insert(TYPE_TAG.to_owned(), Json::String(inner.type_name.to_string()));
			}
		} else if matches!(field_ty.kind(), TypeKind::Any) && !value.is_null() {
			json = box_untyped(value, json)?;
		}
		out.insert(field.name.to_string(), json);
	}

	Ok(Json::Object(out))
}

/// Wrap a non-struct value stored in an untyped field with its runtime type.
fn box_untyped(value: &Value, json: Json) -> Result<Json> {
	let Some(actual) = universe().type_of(value)? else {
		return Ok(json);
	};
	let mut map = Map::new();
	map.insert(TYPE_TAG.to_owned(), Json::String(actual.qualified_name().to_owned()));
	map.insert(CONTENT_TAG.to_owned(), json);
	Ok(Json::Object(map))
}

fn encode_float(value: f64) -> Json {
	match Number::from_f64(value) {
		Some(number) => Json::Number(number),
		None if value.is_nan() => Json::String("NaN".to_owned()),
		None if value > 0.0 => Json::String("Infinity".to_owned()),
		None => Json::String("-Infinity".to_owned()),
	}
}

fn encode_enum(def: &EnumDef, bits: i64) -> Json {
	if let Some(name) = def.name_of(bits) {
		return Json::String(name.to_owned());
	}
	if def.flags {
		let mut names = Vec::new();
		let mut covered = 0_i64;
		for (name, value) in &def.variants {
			if *value != 0 && bits & value == *value && covered & value != *value {
				names.push(&**name);
				covered |= value;
			}
		}
		if covered == bits {
			return Json::String(names.join(", "));
		}
	}
	Json::from(bits)
}

fn decode_value(json: &Json, ty: &Arc<TypeDescriptor>, opt: &CodecOptions, depth: u32) -> Result<Value> {
	if json.is_null() {
		if ty.is_value_type() {
			return Err(decode_error(ty, "null for a value type".to_owned()));
		}
		return Ok(Value::Null);
	}

	match ty.kind() {
		TypeKind::Primitive(primitive) => decode_primitive(json, *primitive, ty),
		TypeKind::Enum(def) => decode_enum(json, def, ty),
		TypeKind::Struct { .. } => decode_struct(json, ty, opt, depth),
		TypeKind::Object => Err(decode_error(ty, "engine objects are not stored as text".to_owned())),
		TypeKind::Any => decode_untyped(json, ty, opt, depth),
	}
}

/// Decode a value stored under an untyped declaration, using its `$type` tag.
fn decode_untyped(json: &Json, ty: &Arc<TypeDescriptor>, opt: &CodecOptions, depth: u32) -> Result<Value> {
	let Some(Json::String(name)) = json.get(TYPE_TAG) else {
		return Err(decode_error(ty, "cannot instantiate an untyped value without a type tag".to_owned()));
	};
	let actual = lookup(name)?;
	if matches!(actual.kind(), TypeKind::Any | TypeKind::Object) {
		return Err(decode_error(ty, format!("type tag {name} cannot be stored as text")));
	}
	match json.get(CONTENT_TAG) {
		Some(content) => decode_value(content, &actual, opt, depth),
		None => decode_struct(json, &actual, opt, depth),
	}
}

fn decode_primitive(json: &Json, primitive: Primitive, ty: &TypeDescriptor) -> Result<Value> {
	let mismatch = || decode_error(ty, format!("unexpected {json}"));
	Ok(match primitive {
		Primitive::Bool => Value::Bool(json.as_bool().ok_or_else(mismatch)?),
		Primitive::I32 => {
			let wide = json.as_i64().ok_or_else(mismatch)?;
			Value::I32(i32::try_from(wide).map_err(|_| decode_error(ty, format!("{wide} out of range")))?)
		}
		Primitive::I64 => Value::I64(json.as_i64().ok_or_else(mismatch)?),
		Primitive::F32 => Value::F32(decode_float(json).ok_or_else(mismatch)? as f32),
		Primitive::F64 => Value::F64(decode_float(json).ok_or_else(mismatch)?),
		Primitive::String => Value::String(json.as_str().ok_or_else(mismatch)?.to_owned()),
	})
}

fn decode_float(json: &Json) -> Option<f64> {
	match json {
		Json::Number(number) => number.as_f64(),
		Json::String(text) => match text.as_str() {
			"NaN" => Some(f64::NAN),
			"Infinity" => Some(f64::INFINITY),
			"-Infinity" => Some(f64::NEG_INFINITY),
			_ => None,
		},
		_ => None,
	}
}

fn decode_enum(json: &Json, def: &EnumDef, ty: &TypeDescriptor) -> Result<Value> {
	let bits = match json {
		Json::Number(number) => number.as_i64().ok_or_else(|| decode_error(ty, format!("bad enum value {number}")))?,
		Json::String(text) => {
			let names: Vec<&str> = text.split(',').map(str::trim).collect();
			if names.len() > 1 && !def.flags {
				return Err(decode_error(ty, format!("combined value {text:?} on a non-flags enum")));
			}
			let mut bits = 0_i64;
			for name in names {
				bits |= def.value_of(name).ok_or_else(|| decode_error(ty, format!("unknown variant {name:?}")))?;
			}
			bits
		}
		other => return Err(decode_error(ty, format!("unexpected {other}"))),
	};
	Ok(Value::enumeration(ty.qualified_name(), bits))
}

fn decode_struct(json: &Json, ty: &Arc<TypeDescriptor>, opt: &CodecOptions, depth: u32) -> Result<Value> {
	let Json::Object(map) = json else {
		return Err(decode_error(ty, format!("expected an object, got {json}")));
	};

	let actual = match map.get(TYPE_TAG) {
		Some(Json::String(name)) => {
			let actual = lookup(name)?;
			if !universe().is_assignable(ty, &actual) {
				return Err(decode_error(ty, format!("stored subtype {name} is not assignable")));
			}
			actual
		}
		Some(other) => return Err(decode_error(ty, format!("bad type tag {other}"))),
		None => ty.clone(),
	};

	if depth >= opt.max_depth {
		return default_of(&actual);
	}

	let mut fields = Vec::with_capacity(actual.data_fields().len());
	for field in actual.data_fields() {
		let field_ty = field.ty.resolve()?;
		let value = match map.get(&*field.name) {
			Some(item) => decode_value(item, &field_ty, opt, depth + 1)?,
			None => default_of(&field_ty)?,
		};
		fields.push(FieldValue {
			name: field.name.clone(),
			value,
		});
	}

	Ok(Value::Struct(StructValue {
		type_name: actual.qualified_name().into(),
		fields,
	}))
}

fn lookup(name: &str) -> Result<Arc<TypeDescriptor>> {
	universe().lookup(name).ok_or_else(|| ActionError::TypeNotFound { qualified_name: name.to_owned() })
}

fn decode_error(ty: &TypeDescriptor, reason: String) -> ActionError {
	ActionError::Decode {
		type_name: ty.qualified_name().to_owned(),
		reason,
	}
}

fn encode_error(type_name: &str, reason: &str) -> ActionError {
	ActionError::Encode {
		type_name: type_name.to_owned(),
		reason: reason.to_owned(),
	}
}
