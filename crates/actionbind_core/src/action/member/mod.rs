use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::action::{ActionError, FieldDescriptor, MethodDescriptor, ParamType, Result, TypeIdentity};

/// One persisted parameter of a method signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSignature {
	/// Parameter type; for generic positions, the concrete type chosen at capture.
	#[serde(rename = "type")]
	pub ty: TypeIdentity,
	/// Parameter name. Informational only; not part of equality.
	pub name: Box<str>,
	/// Whether the live declaration types this position by a generic parameter.
	pub is_generic: bool,
}

/// Persisted reference to a method.
#[derive(Debug, Clone)]
pub struct MethodSignature {
	/// Type declaring the method.
	pub declaring_type: TypeIdentity,
	/// Method name.
	pub name: Box<str>,
	/// Static methods ignore the target object.
	pub is_static: bool,
	/// Parameters in declaration order.
	pub parameters: Vec<ParameterSignature>,
}

impl MethodSignature {
	/// Capture a live method. Generic methods need one type argument per generic
	/// parameter; those types replace the open positions.
	pub fn capture(method: &MethodDescriptor, type_args: &[TypeIdentity]) -> Result<Self> {
		if type_args.len() != method.generic_params.len() {
			return Err(ActionError::GenericArgumentCount {
				member: method.name.to_string(),
				expected: method.generic_params.len(),
				got: type_args.len(),
			});
		}

		let parameters = method
			.params
			.iter()
			.map(|param| match &param.ty {
				ParamType::Concrete(ty) => ParameterSignature {
					ty: ty.clone(),
					name: param.name.clone(),
					is_generic: false,
				},
				ParamType::Generic(idx) => ParameterSignature {
					ty: type_args[*idx].clone(),
					name: param.name.clone(),
					is_generic: true,
				},
			})
			.collect();

		Ok(Self {
			declaring_type: method.declaring.clone(),
			name: method.name.clone(),
			is_static: method.is_static,
			parameters,
		})
	}

	/// Replace the generic-marked positions, in order, with concrete types.
	pub fn close(&self, types: &[TypeIdentity]) -> Result<Self> {
		let expected = self.parameters.iter().filter(|param| param.is_generic).count();
		if types.len() != expected {
			return Err(ActionError::GenericArgumentCount {
				member: self.name.to_string(),
				expected,
				got: types.len(),
			});
		}

		let mut types = types.iter();
		let mut closed = self.clone();
		for param in closed.parameters.iter_mut().filter(|param| param.is_generic) {
			if let Some(ty) = types.next() {
				param.ty = ty.clone();
			}
		}
		Ok(closed)
	}

	/// Whether any parameter position is generic.
	pub fn is_generic(&self) -> bool {
		self.parameters.iter().any(|param| param.is_generic)
	}
}

impl PartialEq for MethodSignature {
	fn eq(&self, other: &Self) -> bool {
		self.declaring_type == other.declaring_type
			&& self.name == other.name
			&& self.is_static == other.is_static
			&& self.parameters.len() == other.parameters.len()
			&& self.parameters.iter().zip(&other.parameters).all(|(left, right)| left.ty == right.ty && left.is_generic == right.is_generic)
	}
}

impl Eq for MethodSignature {}

impl Hash for MethodSignature {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.declaring_type.hash(state);
		self.name.hash(state);
		self.is_static.hash(state);
		for param in &self.parameters {
			param.ty.hash(state);
			param.is_generic.hash(state);
		}
	}
}

/// Persisted reference to a settable field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldSignature {
	/// Type declaring the field.
	pub declaring_type: TypeIdentity,
	/// Field name.
	pub name: Box<str>,
	/// Field type.
	pub field_type: TypeIdentity,
}

impl FieldSignature {
	/// Capture a live field.
	pub fn capture(field: &FieldDescriptor) -> Self {
		Self {
			declaring_type: field.declaring.clone(),
			name: field.name.clone(),
			field_type: field.ty.clone(),
		}
	}
}

/// Persisted member reference: a method or a settable field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TargetRecord", into = "TargetRecord")]
pub enum MemberSignature {
	/// Method reference.
	Method(MethodSignature),
	/// Field reference; invoked as a one-argument setter.
	Field(FieldSignature),
}

impl MemberSignature {
	/// Whether this references a method.
	pub fn is_method(&self) -> bool {
		matches!(self, Self::Method(_))
	}

	/// Member name.
	pub fn name(&self) -> &str {
		match self {
			Self::Method(method) => &method.name,
			Self::Field(field) => &field.name,
		}
	}

	/// Declaring type.
	pub fn declaring_type(&self) -> &TypeIdentity {
		match self {
			Self::Method(method) => &method.declaring_type,
			Self::Field(field) => &field.declaring_type,
		}
	}

	/// Number of argument slots an entry needs for this member.
	pub fn arity(&self) -> usize {
		match self {
			Self::Method(method) => method.parameters.len(),
			Self::Field(_) => 1,
		}
	}

	/// Declared `(name, type)` of each argument position. Fields expose one
	/// position named after the field.
	pub fn parameters(&self) -> Vec<(&str, &TypeIdentity)> {
		match self {
			Self::Method(method) => method.parameters.iter().map(|param| (&*param.name, &param.ty)).collect(),
			Self::Field(field) => vec![(&*field.name, &field.field_type)],
		}
	}
}

impl From<MethodSignature> for MemberSignature {
	fn from(value: MethodSignature) -> Self {
		Self::Method(value)
	}
}

impl From<FieldSignature> for MemberSignature {
	fn from(value: FieldSignature) -> Self {
		Self::Field(value)
	}
}

impl fmt::Display for MemberSignature {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Method(method) => {
				if method.is_static {
					f.write_str("static ")?;
				}
				write!(f, "{}.{}(", method.declaring_type, method.name)?;
				for (idx, param) in method.parameters.iter().enumerate() {
					if idx > 0 {
						f.write_str(", ")?;
					}
					if param.is_generic {
						write!(f, "<{}>", param.ty)?;
					} else {
						write!(f, "{}", param.ty)?;
					}
				}
				f.write_str(")")
			}
			Self::Field(field) => write!(f, "{}.{}: {}", field.declaring_type, field.name, field.field_type),
		}
	}
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TargetRecord {
	is_method: bool,
	declaring_type: TypeIdentity,
	name: Box<str>,
	#[serde(default)]
	is_static: bool,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	parameters: Vec<ParameterSignature>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	field_type: Option<TypeIdentity>,
}

impl From<MemberSignature> for TargetRecord {
	fn from(value: MemberSignature) -> Self {
		match value {
			MemberSignature::Method(method) => Self {
				is_method: true,
				declaring_type: method.declaring_type,
				name: method.name,
				is_static: method.is_static,
				parameters: method.parameters,
				field_type: None,
			},
			MemberSignature::Field(field) => Self {
				is_method: false,
				declaring_type: field.declaring_type,
				name: field.name,
				is_static: false,
				parameters: Vec::new(),
				field_type: Some(field.field_type),
			},
		}
	}
}

impl TryFrom<TargetRecord> for MemberSignature {
	type Error = ActionError;

	fn try_from(record: TargetRecord) -> Result<Self> {
		if record.is_method {
			return Ok(Self::Method(MethodSignature {
				declaring_type: record.declaring_type,
				name: record.name,
				is_static: record.is_static,
				parameters: record.parameters,
			}));
		}

		let field_type = record.field_type.ok_or_else(|| ActionError::InvalidDocument {
			reason: format!("field target {} has no fieldType", record.name),
		})?;
		Ok(Self::Field(FieldSignature {
			declaring_type: record.declaring_type,
			name: record.name,
			field_type,
		}))
	}
}

#[cfg(test)]
mod tests;
