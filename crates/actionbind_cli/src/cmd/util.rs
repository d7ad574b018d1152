use actionbind::action::{ArgumentSlot, CallState, ObjectHandle, ValueSnapshot};

pub(crate) fn emit_json<T: serde::Serialize>(payload: &T) {
	match serde_json::to_string_pretty(payload) {
		Ok(text) => println!("{text}"),
		Err(err) => eprintln!("error: json encode failed: {err}"),
	}
}

pub(crate) fn call_state_label(state: CallState) -> &'static str {
	match state {
		CallState::Always => "always",
		CallState::RuntimeOnly => "runtime_only",
		CallState::Disabled => "disabled",
	}
}

pub(crate) fn handle_label(handle: &ObjectHandle) -> String {
	handle.id().to_string()
}

/// Kind label and payload text of a stored argument.
pub(crate) fn snapshot_parts(slot: &ArgumentSlot) -> (&'static str, String) {
	match slot.snapshot() {
		ValueSnapshot::Encoded(text) => ("encoded", text.clone()),
		ValueSnapshot::LiveReference(handle) => ("live_ref", handle_label(handle)),
	}
}
