use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::action::types::MethodBody;
use crate::action::{
	ActionError, Call, FieldDescriptor, FieldSignature, MemberSignature, MethodDescriptor, MethodSignature, ObjectHandle, ParamType, Result, TargetError,
	TypeDescriptor, TypeIdentity, TypeKey, Value, universe,
};

/// Why a persisted member no longer binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DanglingReason {
	/// A type named by the signature no longer resolves.
	TypeNotFound {
		/// Qualified name that failed.
		qualified_name: String,
	},
	/// No member with this name and kind exists on the target type.
	NoSuchMember,
	/// Members with this name exist but none matches the stored parameter list.
	SignatureChanged,
	/// The field exists with a different type.
	FieldTypeChanged {
		/// Type the field has now.
		actual: String,
	},
}

impl fmt::Display for DanglingReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::TypeNotFound { qualified_name } => write!(f, "type {qualified_name} not found"),
			Self::NoSuchMember => f.write_str("member no longer exists"),
			Self::SignatureChanged => f.write_str("no overload matches the stored parameters"),
			Self::FieldTypeChanged { actual } => write!(f, "field type changed to {actual}"),
		}
	}
}

/// A member reference that no longer resolves. Invoking it is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dangling {
	/// Last known member description, kept for diagnostics.
	pub member: String,
	/// Failure detail.
	pub reason: DanglingReason,
}

impl fmt::Display for Dangling {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}: {}", self.member, self.reason)
	}
}

/// Method bound to a live declaration, closed over concrete generic arguments.
#[derive(Debug)]
pub struct BoundMethod {
	signature: MethodSignature,
	method: MethodDescriptor,
	type_args: Vec<TypeIdentity>,
}

impl BoundMethod {
	/// Persisted signature this binding satisfies.
	pub fn signature(&self) -> &MethodSignature {
		&self.signature
	}

	/// Live method declaration.
	pub fn descriptor(&self) -> &MethodDescriptor {
		&self.method
	}

	/// Concrete generic arguments, in generic parameter order.
	pub fn type_args(&self) -> &[TypeIdentity] {
		&self.type_args
	}

	/// Whether the bound method ignores its target.
	pub fn is_static(&self) -> bool {
		self.method.is_static
	}

	/// Call the method. Instance methods borrow `target` mutably for the duration of the call.
	///
	/// Errors raised by the body come back as [`ActionError::Target`]. A target
	/// already borrowed by an outer call fails with [`ObjectAccessError::Busy`](crate::action::ObjectAccessError::Busy)
	/// as the target error.
	pub fn invoke(&self, target: Option<&ObjectHandle>, args: &[Value]) -> Result<Value> {
		let member = MemberSignature::Method(self.signature.clone()).to_string();
		if args.len() != self.method.params.len() {
			return Err(ActionError::ArgumentCount {
				member,
				expected: self.method.params.len(),
				got: args.len(),
			});
		}

		let call = Call {
			type_args: &self.type_args,
			args,
		};
		let result = match &self.method.body {
			MethodBody::Static(body) => body(&call),
			MethodBody::Instance(body) => match target {
				Some(handle) => handle.try_with_mut(|object| body(object, &call)).unwrap_or_else(|err| Err(err.into())),
				None => Err(missing_target()),
			},
		};
		result.map_err(|source| ActionError::Target { member, source })
	}
}

/// Settable field bound to a live declaration.
#[derive(Debug)]
pub struct BoundField {
	signature: FieldSignature,
	field: FieldDescriptor,
}

impl BoundField {
	/// Persisted signature this binding satisfies.
	pub fn signature(&self) -> &FieldSignature {
		&self.signature
	}

	/// Live field declaration.
	pub fn descriptor(&self) -> &FieldDescriptor {
		&self.field
	}

	/// Assign `value` on `target`.
	pub fn set(&self, target: &ObjectHandle, value: Value) -> Result<()> {
		let result = target.try_with_mut(|object| (self.field.setter)(object, value)).unwrap_or_else(|err| Err(err.into()));
		result.map_err(|source| ActionError::Target {
			member: MemberSignature::Field(self.signature.clone()).to_string(),
			source,
		})
	}
}

fn missing_target() -> TargetError {
	"target object is missing".into()
}

/// Outcome of re-binding a persisted member against a live type.
#[derive(Debug, Clone)]
pub enum Resolution {
	/// Bound method.
	Method(Arc<BoundMethod>),
	/// Bound field setter.
	Field(Arc<BoundField>),
	/// Member no longer exists in a matching form.
	Dangling(Dangling),
}

impl Resolution {
	/// Whether the member failed to bind.
	pub fn is_dangling(&self) -> bool {
		matches!(self, Self::Dangling(_))
	}
}

/// Re-binds member signatures to live members, caching per `(type, signature)`.
///
/// Entries live until a type is registered in the universe, which drops them all.
#[derive(Default)]
pub struct MemberResolver {
	cache: RwLock<HashMap<(TypeKey, MemberSignature), Resolution>>,
}

impl MemberResolver {
	/// Empty resolver.
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of cached resolutions.
	pub fn len(&self) -> usize {
		self.cache.read().len()
	}

	/// Whether nothing has been resolved yet.
	pub fn is_empty(&self) -> bool {
		self.cache.read().is_empty()
	}

	/// Drop every cached resolution.
	pub(crate) fn clear(&self) {
		self.cache.write().clear();
	}

	#[cfg(test)]
	pub(crate) fn cached_dangling(&self) -> Vec<Dangling> {
		self.cache
			.read()
			.values()
			.filter_map(|resolution| match resolution {
				Resolution::Dangling(dangling) => Some(dangling.clone()),
				_ => None,
			})
			.collect()
	}

	/// Resolve `signature` against the runtime type `target`.
	pub fn resolve(&self, target: &Arc<TypeDescriptor>, signature: &MemberSignature) -> Resolution {
		let key = (target.key(), signature.clone());
		if let Some(hit) = self.cache.read().get(&key) {
			return hit.clone();
		}

		let resolution = match signature {
			MemberSignature::Method(method) => resolve_method(target, method),
			MemberSignature::Field(field) => resolve_field(target, field),
		};
		tracing::debug!(target_type = target.qualified_name(), member = %signature, dangling = resolution.is_dangling(), "resolved member");
		self.cache.write().entry(key).or_insert(resolution).clone()
	}
}

fn dangling(signature: &MemberSignature, reason: DanglingReason) -> Resolution {
	Resolution::Dangling(Dangling {
		member: signature.to_string(),
		reason,
	})
}

fn type_not_found(err: ActionError, fallback: &TypeIdentity) -> DanglingReason {
	match err {
		ActionError::TypeNotFound { qualified_name } => DanglingReason::TypeNotFound { qualified_name },
		_ => DanglingReason::TypeNotFound {
			qualified_name: fallback.qualified_name().to_owned(),
		},
	}
}

fn resolve_method(target: &Arc<TypeDescriptor>, signature: &MethodSignature) -> Resolution {
	let as_member = || MemberSignature::Method(signature.clone());

	for param in &signature.parameters {
		if let Err(err) = param.ty.resolve() {
			return dangling(&as_member(), type_not_found(err, &param.ty));
		}
	}

	let search = if signature.is_static {
		match signature.declaring_type.resolve() {
			Ok(declaring) => vec![declaring],
			Err(err) => return dangling(&as_member(), type_not_found(err, &signature.declaring_type)),
		}
	} else {
		universe().ancestry(target)
	};

	let mut named = false;
	for owner in &search {
		let candidates = owner
			.methods()
			.iter()
			.filter(|method| method.name == signature.name && method.is_static == signature.is_static);
		for method in candidates {
			named = true;
			if let Some(type_args) = match_parameters(method, signature) {
				return Resolution::Method(Arc::new(BoundMethod {
					signature: signature.clone(),
					method: method.clone(),
					type_args,
				}));
			}
		}
	}

	let reason = if named { DanglingReason::SignatureChanged } else { DanglingReason::NoSuchMember };
	dangling(&as_member(), reason)
}

/// Structural match of a live declaration against stored parameters.
///
/// Returns the concrete generic arguments on success. Each generic parameter is
/// closed over the stored type at its positions; positions that disagree, or a
/// generic parameter no position binds, reject the candidate.
fn match_parameters(method: &MethodDescriptor, signature: &MethodSignature) -> Option<Vec<TypeIdentity>> {
	if method.params.len() != signature.parameters.len() {
		return None;
	}

	let mut bound: Vec<Option<&TypeIdentity>> = vec![None; method.generic_params.len()];
	for (live, stored) in method.params.iter().zip(&signature.parameters) {
		match &live.ty {
			ParamType::Concrete(ty) => {
				if stored.is_generic || *ty != stored.ty {
					return None;
				}
			}
			ParamType::Generic(idx) => {
				if !stored.is_generic {
					return None;
				}
				match bound.get(*idx).copied()? {
					Some(existing) if *existing != stored.ty => return None,
					Some(_) => {}
					None => bound[*idx] = Some(&stored.ty),
				}
			}
		}
	}

	bound.into_iter().map(|item| item.cloned()).collect()
}

fn resolve_field(target: &Arc<TypeDescriptor>, signature: &FieldSignature) -> Resolution {
	let as_member = || MemberSignature::Field(signature.clone());

	if let Err(err) = signature.field_type.resolve() {
		return dangling(&as_member(), type_not_found(err, &signature.field_type));
	}

	let found = universe()
		.ancestry(target)
		.iter()
		.find_map(|owner| owner.fields().iter().find(|field| field.name == signature.name).cloned());
	match found {
		None => dangling(&as_member(), DanglingReason::NoSuchMember),
		Some(field) if field.ty != signature.field_type => dangling(
			&as_member(),
			DanglingReason::FieldTypeChanged {
				actual: field.ty.qualified_name().to_owned(),
			},
		),
		Some(field) => Resolution::Field(Arc::new(BoundField {
			signature: signature.clone(),
			field,
		})),
	}
}

#[cfg(test)]
mod tests;
