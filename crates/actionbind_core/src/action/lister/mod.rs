use crate::action::{Accessor, FieldSignature, MemberSignature, MethodDescriptor, MethodSignature, Result, TypeIdentity, builtin};

bitflags::bitflags! {
	/// Which members [`list_invocable_members`] reports.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
	pub struct MemberFilter: u32 {
		/// Methods that return a value.
		const HAS_RETURN_VALUE = 1 << 0;
		/// Methods without a return value.
		const NO_RETURN_VALUE  = 1 << 1;
		/// Generic methods, listed with `object` in their generic positions.
		const INCLUDE_GENERICS = 1 << 2;
		/// Property getters.
		const INCLUDE_GETTERS  = 1 << 3;
		/// Property setters.
		const INCLUDE_SETTERS  = 1 << 4;
		/// Members marked deprecated.
		const INCLUDE_OBSOLETE = 1 << 5;
		/// Settable fields.
		const INCLUDE_FIELDS   = 1 << 6;
		/// Plain methods of either return kind plus property setters.
		const DEFAULT = Self::HAS_RETURN_VALUE.bits() | Self::NO_RETURN_VALUE.bits() | Self::INCLUDE_SETTERS.bits();
	}
}

impl Default for MemberFilter {
	fn default() -> Self {
		Self::DEFAULT
	}
}

impl MemberFilter {
	fn admits(self, method: &MethodDescriptor) -> bool {
		if method.is_static || (method.obsolete && !self.contains(Self::INCLUDE_OBSOLETE)) {
			return false;
		}
		if method.is_generic() && !self.contains(Self::INCLUDE_GENERICS) {
			return false;
		}
		match method.accessor {
			Some(Accessor::Getter) => self.contains(Self::INCLUDE_GETTERS),
			Some(Accessor::Setter) => self.contains(Self::INCLUDE_SETTERS),
			None if method.returns.is_some() => self.contains(Self::HAS_RETURN_VALUE),
			None => self.contains(Self::NO_RETURN_VALUE),
		}
	}
}

/// Instance members declared on `ty` itself that an entry could target, in
/// declaration order: methods first, then fields when requested.
pub fn list_invocable_members(ty: &TypeIdentity, filter: MemberFilter) -> Result<Vec<MemberSignature>> {
	let descriptor = ty.resolve()?;
	let mut out = Vec::new();

	for method in descriptor.methods().iter().filter(|method| filter.admits(method)) {
		let placeholders = vec![TypeIdentity::builtin(builtin::OBJECT); method.generic_params.len()];
		out.push(MemberSignature::Method(MethodSignature::capture(method, &placeholders)?));
	}

	if filter.contains(MemberFilter::INCLUDE_FIELDS) {
		let fields = descriptor
			.fields()
			.iter()
			.filter(|field| !field.obsolete || filter.contains(MemberFilter::INCLUDE_OBSOLETE));
		out.extend(fields.map(|field| MemberSignature::Field(FieldSignature::capture(field))));
	}

	Ok(out)
}
