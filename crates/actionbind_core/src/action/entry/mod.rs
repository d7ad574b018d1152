use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::action::{
	ActionError, ArgumentSlot, Dangling, DanglingReason, FieldSignature, MemberSignature, MethodSignature, ObjectHandle, ObjectResolver, Resolution, Result,
	Value, default_value_for, universe,
};

/// Per-entry invocation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CallState {
	/// Invoke in every run mode.
	Always,
	/// Invoke only while the host is live.
	#[default]
	RuntimeOnly,
	/// Never invoke.
	Disabled,
}

/// Host execution mode consulted by [`CallState::RuntimeOnly`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
	/// Authoring; runtime-only entries stay silent.
	Edit,
	/// Running.
	Live,
}

static LIVE: AtomicBool = AtomicBool::new(false);

impl RunMode {
	/// Process-wide mode; starts in [`RunMode::Edit`].
	pub fn current() -> Self {
		if LIVE.load(Ordering::Acquire) { Self::Live } else { Self::Edit }
	}

	/// Switch the process-wide mode.
	pub fn set_current(mode: Self) {
		LIVE.store(mode == Self::Live, Ordering::Release);
	}
}

/// Lifecycle position of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
	/// No target object and no member.
	Unbound,
	/// Target object chosen, member not yet.
	TargetSelected,
	/// Member chosen; not yet bound to a live declaration.
	MemberSelected,
	/// Member bound to a live declaration.
	Resolved,
	/// Member no longer resolves.
	Dangling,
}

/// Why an invocation did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
	/// Call state is [`CallState::Disabled`].
	Disabled,
	/// Runtime-only entry outside [`RunMode::Live`].
	NotLive,
	/// No member selected.
	NoMember,
	/// Target object unset, never re-attached, or destroyed.
	TargetMissing,
	/// Member no longer resolves.
	Dangling,
}

/// Result of one entry invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
	/// The member ran; carries its return value (null for fields and void methods).
	Invoked(Value),
	/// The entry was gated off.
	Skipped(Skip),
}

/// One configured invocation: target object, member, arguments, and call state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionEntry {
	#[serde(default, rename = "targetObjectHandle")]
	target_object: Option<ObjectHandle>,
	#[serde(default)]
	call_state: CallState,
	#[serde(default)]
	target: Option<MemberSignature>,
	#[serde(default)]
	arguments: Vec<ArgumentSlot>,
	#[serde(skip)]
	binding: OnceCell<Resolution>,
}

impl ActionEntry {
	/// Empty entry: no target, [`CallState::RuntimeOnly`].
	pub fn new() -> Self {
		Self::default()
	}

	/// Entry calling `signature` on `target` with `args`.
	///
	/// Argument count and assignment compatibility are checked here.
	pub fn method(target: Option<ObjectHandle>, signature: MethodSignature, args: Vec<Value>) -> Result<Self> {
		let member = MemberSignature::Method(signature);
		if args.len() != member.arity() {
			return Err(ActionError::ArgumentCount {
				member: member.to_string(),
				expected: member.arity(),
				got: args.len(),
			});
		}

		let arguments = member
			.parameters()
			.into_iter()
			.zip(args)
			.map(|((name, ty), value)| ArgumentSlot::new(name, ty.clone(), value))
			.collect::<Result<Vec<_>>>()?;

		Ok(Self {
			target_object: target,
			target: Some(member),
			arguments,
			..Self::default()
		})
	}

	/// Entry assigning `value` to the field `signature` on `target`.
	pub fn field(target: ObjectHandle, signature: FieldSignature, value: Value) -> Result<Self> {
		let slot = ArgumentSlot::new(signature.name.clone(), signature.field_type.clone(), value)?;
		Ok(Self {
			target_object: Some(target),
			target: Some(MemberSignature::Field(signature)),
			arguments: vec![slot],
			..Self::default()
		})
	}

	/// Builder form of [`ActionEntry::set_call_state`].
	pub fn with_call_state(mut self, call_state: CallState) -> Self {
		self.call_state = call_state;
		self
	}

	/// Target object handle.
	pub fn target_object(&self) -> Option<&ObjectHandle> {
		self.target_object.as_ref()
	}

	/// Selected member.
	pub fn target(&self) -> Option<&MemberSignature> {
		self.target.as_ref()
	}

	/// Argument slots in parameter order.
	pub fn arguments(&self) -> &[ArgumentSlot] {
		&self.arguments
	}

	/// Invocation gate.
	pub fn call_state(&self) -> CallState {
		self.call_state
	}

	/// Change the invocation gate.
	pub fn set_call_state(&mut self, call_state: CallState) {
		self.call_state = call_state;
	}

	/// Current lifecycle position.
	pub fn state(&self) -> EntryState {
		match (&self.target_object, &self.target) {
			(None, None) => EntryState::Unbound,
			(Some(_), None) => EntryState::TargetSelected,
			(_, Some(_)) => match self.binding.get() {
				None => EntryState::MemberSelected,
				Some(Resolution::Dangling(_)) => EntryState::Dangling,
				Some(_) => EntryState::Resolved,
			},
		}
	}

	/// Choose a target object. A different object drops the member and arguments.
	pub fn set_target_object(&mut self, target: Option<ObjectHandle>) {
		let same = match (&self.target_object, &target) {
			(Some(old), Some(new)) => old.id() == new.id(),
			(None, None) => true,
			_ => false,
		};
		if !same {
			self.target = None;
			self.arguments.clear();
		}
		self.target_object = target;
		self.binding = OnceCell::new();
	}

	/// Choose a member and rebuild the argument list.
	///
	/// Positions whose declared type matches the previous member's keep their
	/// value; the rest start at the type's default.
	pub fn select_member(&mut self, member: MemberSignature) -> Result<()> {
		let mut arguments = Vec::with_capacity(member.arity());
		for (idx, (name, ty)) in member.parameters().into_iter().enumerate() {
			let slot = match self.arguments.get(idx) {
				Some(previous) if previous.declared_type() == ty => previous.renamed(name),
				_ => ArgumentSlot::new(name, ty.clone(), default_value_for(ty)?)?,
			};
			arguments.push(slot);
		}

		self.arguments = arguments;
		self.target = Some(member);
		self.binding = OnceCell::new();
		Ok(())
	}

	/// Replace the value of argument `idx`.
	pub fn set_argument(&mut self, idx: usize, value: Value) -> Result<()> {
		let len = self.arguments.len();
		let Some(slot) = self.arguments.get_mut(idx) else {
			return Err(ActionError::ArgumentCount {
				member: self.target.as_ref().map(ToString::to_string).unwrap_or_default(),
				expected: len,
				got: idx + 1,
			});
		};
		slot.set_value(value)
	}

	/// Re-link persisted handles against the object graph, then bind.
	pub fn attach(&mut self, objects: &dyn ObjectResolver) {
		if let Some(handle) = &self.target_object {
			self.target_object = Some(handle.attach(objects));
		}
		for slot in &mut self.arguments {
			slot.attach(objects);
		}
		self.binding = OnceCell::new();
		self.bind();
	}

	/// Bind the member against the target's runtime type, once.
	///
	/// `None` while the binding cannot be attempted: no member, or an instance
	/// member whose target object is unset or not yet attached.
	pub fn bind(&self) -> Option<&Resolution> {
		if let Some(hit) = self.binding.get() {
			return Some(hit);
		}
		let target = self.target.as_ref()?;

		let owner = match target {
			MemberSignature::Method(method) if method.is_static => method.declaring_type.resolve(),
			_ => {
				let handle = self.target_object.as_ref().filter(|handle| handle.is_attached())?;
				universe().type_of(&Value::Object(handle.clone())).and_then(|ty| {
					ty.ok_or_else(|| ActionError::TypeNotFound {
						qualified_name: handle.id().to_string(),
					})
				})
			}
		};

		let resolution = match owner {
			Ok(owner) => universe().resolver().resolve(&owner, target),
			Err(err) => Resolution::Dangling(Dangling {
				member: target.to_string(),
				reason: DanglingReason::TypeNotFound {
					qualified_name: match err {
						ActionError::TypeNotFound { qualified_name } => qualified_name,
						other => other.to_string(),
					},
				},
			}),
		};
		Some(self.binding.get_or_init(|| resolution))
	}

	/// Invoke under the process-wide [`RunMode`].
	pub fn invoke(&self) -> Result<Outcome> {
		self.invoke_in(RunMode::current())
	}

	/// Invoke under an explicit run mode.
	///
	/// Gated entries and dangling members are skipped. Errors from the invoked
	/// member come back unchanged inside [`ActionError::Target`].
	pub fn invoke_in(&self, mode: RunMode) -> Result<Outcome> {
		let skip = match self.call_state {
			CallState::Disabled => Some(Skip::Disabled),
			CallState::RuntimeOnly if mode != RunMode::Live => Some(Skip::NotLive),
			_ if self.target.is_none() => Some(Skip::NoMember),
			_ => None,
		};
		if let Some(skip) = skip {
			tracing::debug!(?skip, "action skipped");
			return Ok(Outcome::Skipped(skip));
		}

		let needs_target = !matches!(&self.target, Some(MemberSignature::Method(method)) if method.is_static);
		if needs_target && !self.target_object.as_ref().is_some_and(ObjectHandle::is_alive) {
			tracing::warn!(member = %self.member_label(), target = ?self.target_object, "action target object is missing");
			return Ok(Outcome::Skipped(Skip::TargetMissing));
		}

		let bound = match self.bind() {
			None => return Ok(Outcome::Skipped(Skip::TargetMissing)),
			Some(Resolution::Dangling(dangling)) => {
				tracing::warn!(member = %dangling.member, reason = %dangling.reason, "action target no longer resolves");
				return Ok(Outcome::Skipped(Skip::Dangling));
			}
			Some(bound) => bound,
		};

		let args = self
			.arguments
			.iter()
			.map(|slot| slot.unpack().cloned())
			.collect::<Result<Vec<_>>>()?;

		match bound {
			Resolution::Method(method) => method.invoke(self.target_object.as_ref(), &args).map(Outcome::Invoked),
			Resolution::Field(field) => {
				let (Some(handle), [value]) = (self.target_object.as_ref(), args.as_slice()) else {
					return Err(ActionError::ArgumentCount {
						member: self.member_label(),
						expected: 1,
						got: args.len(),
					});
				};
				field.set(handle, value.clone())?;
				Ok(Outcome::Invoked(Value::Null))
			}
			Resolution::Dangling(_) => Ok(Outcome::Skipped(Skip::Dangling)),
		}
	}

	fn member_label(&self) -> String {
		self.target.as_ref().map(ToString::to_string).unwrap_or_default()
	}
}
