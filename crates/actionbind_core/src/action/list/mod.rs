use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::action::{ActionEntry, CallState, MemberSignature, ObjectResolver, Outcome, Result, RunMode, ValueSnapshot};

/// Ordered list of entries, invoked front to back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionList {
	#[serde(default)]
	actions: Vec<ActionEntry>,
}

/// Invariant violation found in a persisted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuralIssue {
	/// Index of the offending entry.
	pub entry: usize,
	/// What is wrong.
	#[serde(flatten)]
	pub kind: IssueKind,
}

/// Kinds of structural issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum IssueKind {
	/// Enabled entry without a member.
	NoMember,
	/// Instance member without a target object.
	NoTargetObject,
	/// Argument count differs from the member's parameter count.
	ArgumentCount {
		/// Parameters the member declares.
		expected: usize,
		/// Stored arguments.
		got: usize,
	},
	/// Stored argument type differs from the member's parameter type.
	ArgumentType {
		/// Argument position.
		index: usize,
		/// Parameter type name.
		expected: String,
		/// Stored declared type name.
		got: String,
	},
	/// Encoded argument text is not well-formed.
	MalformedText {
		/// Argument position.
		index: usize,
		/// Parser message.
		reason: String,
	},
}

impl fmt::Display for StructuralIssue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "entry {}: ", self.entry)?;
		match &self.kind {
			IssueKind::NoMember => f.write_str("enabled entry has no member"),
			IssueKind::NoTargetObject => f.write_str("instance member has no target object"),
			IssueKind::ArgumentCount { expected, got } => write!(f, "expected {expected} arguments, found {got}"),
			IssueKind::ArgumentType { index, expected, got } => write!(f, "argument {index} is stored as {got}, member expects {expected}"),
			IssueKind::MalformedText { index, reason } => write!(f, "argument {index} text is malformed: {reason}"),
		}
	}
}

impl ActionList {
	/// Empty list.
	pub fn new() -> Self {
		Self::default()
	}

	/// Append an entry.
	pub fn push(&mut self, entry: ActionEntry) {
		self.actions.push(entry);
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.actions.len()
	}

	/// Whether the list has no entries.
	pub fn is_empty(&self) -> bool {
		self.actions.is_empty()
	}

	/// Entry at `idx`.
	pub fn get(&self, idx: usize) -> Option<&ActionEntry> {
		self.actions.get(idx)
	}

	/// Mutable entry at `idx`.
	pub fn get_mut(&mut self, idx: usize) -> Option<&mut ActionEntry> {
		self.actions.get_mut(idx)
	}

	/// Entries in invocation order.
	pub fn iter(&self) -> impl Iterator<Item = &ActionEntry> {
		self.actions.iter()
	}

	/// Parse a persisted list.
	pub fn from_json(text: &str) -> Result<Self> {
		Ok(serde_json::from_str(text)?)
	}

	/// Persisted form, pretty-printed.
	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string_pretty(self)?)
	}

	/// Read a persisted list from disk.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let text = std::fs::read_to_string(path)?;
		Self::from_json(&text)
	}

	/// Write the persisted form to disk.
	pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
		std::fs::write(path, self.to_json()?)?;
		Ok(())
	}

	/// Re-link every persisted handle against the object graph and bind every entry.
	pub fn attach(&mut self, objects: &dyn ObjectResolver) {
		for entry in &mut self.actions {
			entry.attach(objects);
		}
	}

	/// Bind every entry up front. Returns how many entries are dangling.
	pub fn prepare(&self) -> usize {
		self.actions.iter().filter(|entry| entry.bind().is_some_and(|binding| binding.is_dangling())).count()
	}

	/// Invoke every entry in order under the process-wide [`RunMode`].
	pub fn invoke(&self) -> Result<Vec<Outcome>> {
		self.invoke_in(RunMode::current())
	}

	/// Invoke every entry in order. The first member failure aborts the rest.
	pub fn invoke_in(&self, mode: RunMode) -> Result<Vec<Outcome>> {
		self.actions.iter().map(|entry| entry.invoke_in(mode)).collect()
	}

	/// Invariant violations visible in the document alone, without live types.
	pub fn structural_issues(&self) -> Vec<StructuralIssue> {
		let mut out = Vec::new();
		for (idx, entry) in self.actions.iter().enumerate() {
			let mut report = |kind| out.push(StructuralIssue { entry: idx, kind });

			let Some(target) = entry.target() else {
				if entry.call_state() != CallState::Disabled {
					report(IssueKind::NoMember);
				}
				continue;
			};

			let is_static = matches!(target, MemberSignature::Method(method) if method.is_static);
			if !is_static && entry.target_object().is_none() {
				report(IssueKind::NoTargetObject);
			}

			let params = target.parameters();
			let args = entry.arguments();
			if params.len() != args.len() {
				report(IssueKind::ArgumentCount {
					expected: params.len(),
					got: args.len(),
				});
			}

			for (index, ((_, param_ty), arg)) in params.iter().zip(args).enumerate() {
				if param_ty.type_name() != arg.declared_type().type_name() {
					report(IssueKind::ArgumentType {
						index,
						expected: param_ty.type_name().to_owned(),
						got: arg.declared_type().type_name().to_owned(),
					});
				}
			}

			for (index, arg) in args.iter().enumerate() {
				if let ValueSnapshot::Encoded(text) = arg.snapshot() {
					if let Err(err) = serde_json::from_str::<serde_json::Value>(text) {
						report(IssueKind::MalformedText {
							index,
							reason: err.to_string(),
						});
					}
				}
			}
		}
		out
	}
}
