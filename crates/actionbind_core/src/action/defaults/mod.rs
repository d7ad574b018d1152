use std::sync::Arc;

use crate::action::{CodecOptions, FieldValue, Primitive, Result, StructValue, TypeDescriptor, TypeIdentity, TypeKind, Value};

/// Value synthesized for a newly selected parameter of type `ty`.
///
/// Registered custom defaults win. Otherwise value types are zero-built
/// (struct fields recursively), strings are empty, classes get a fresh instance
/// whose reference fields are null, and engine objects are null.
pub fn default_value_for(ty: &TypeIdentity) -> Result<Value> {
	default_of(&ty.resolve()?)
}

pub(crate) fn default_of(ty: &Arc<TypeDescriptor>) -> Result<Value> {
	default_at(ty, 0, CodecOptions::default().max_depth)
}

fn default_at(ty: &TypeDescriptor, depth: u32, max_depth: u32) -> Result<Value> {
	if let Some(value) = ty.custom_default() {
		return Ok(value);
	}

	Ok(match ty.kind() {
		TypeKind::Primitive(primitive) => match primitive {
			Primitive::Bool => Value::Bool(false),
			Primitive::I32 => Value::I32(0),
			Primitive::I64 => Value::I64(0),
			Primitive::F32 => Value::F32(0.0),
			Primitive::F64 => Value::F64(0.0),
			Primitive::String => Value::String(String::new()),
		},
		TypeKind::Enum(_) => Value::enumeration(ty.qualified_name(), 0),
		TypeKind::Struct { fields } => {
			let mut values = Vec::with_capacity(fields.len());
			if depth < max_depth {
				for field in fields {
					let field_ty = field.ty.resolve()?;
					let value = if field_ty.is_value_type() || matches!(field_ty.kind(), TypeKind::Primitive(_)) {
						default_at(&field_ty, depth + 1, max_depth)?
					} else {
						Value::Null
					};
					values.push(FieldValue {
						name: field.name.clone(),
						value,
					});
				}
			}
			Value::Struct(StructValue {
				type_name: ty.qualified_name().into(),
				fields: values,
			})
		}
		TypeKind::Object | TypeKind::Any => Value::Null,
	})
}
