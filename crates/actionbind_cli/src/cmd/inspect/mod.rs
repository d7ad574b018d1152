use std::path::{Path, PathBuf};

use actionbind::action::{ActionEntry, ActionList, MemberSignature, Result};

use crate::cmd::util::{call_state_label, emit_json, handle_label, snapshot_parts};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long)]
	pub json: bool,
}

/// Print the entries of a persisted action list in invocation order.
pub fn run(args: Args) -> Result<()> {
	let Args { path, json } = args;

	let list = ActionList::load(&path)?;
	tracing::debug!(path = %path.display(), entries = list.len(), "loaded action list");
	let payload = build_payload(&path, &list);

	if json {
		emit_json(&payload);
		return Ok(());
	}

	println!("path: {}", payload.path);
	println!("entries: {}", payload.entries.len());
	for entry in &payload.entries {
		println!(
			"[{}] {}\ttarget={}\t{}",
			entry.index,
			entry.call_state,
			entry.target_object.as_deref().unwrap_or("-"),
			entry.member.as_deref().unwrap_or("<no member>")
		);
		for arg in &entry.arguments {
			println!("  {}: {} = {} ({})", arg.name, arg.declared_type, arg.payload, arg.kind);
		}
	}

	Ok(())
}

pub(crate) fn build_payload(path: &Path, list: &ActionList) -> InspectJson {
	InspectJson {
		path: path.display().to_string(),
		entries: list.iter().enumerate().map(|(index, entry)| entry_json(index, entry)).collect(),
	}
}

fn entry_json(index: usize, entry: &ActionEntry) -> EntryJson {
	EntryJson {
		index,
		call_state: call_state_label(entry.call_state()),
		target_object: entry.target_object().map(handle_label),
		member_kind: entry.target().map(|member| match member {
			MemberSignature::Method(method) if method.is_static => "static_method",
			MemberSignature::Method(_) => "method",
			MemberSignature::Field(_) => "field",
		}),
		member: entry.target().map(ToString::to_string),
		arguments: entry
			.arguments()
			.iter()
			.map(|slot| {
				let (kind, payload) = snapshot_parts(slot);
				ArgumentJson {
					name: slot.name().to_owned(),
					declared_type: slot.declared_type().to_string(),
					value_type: slot.value_type().to_string(),
					kind,
					payload,
				}
			})
			.collect(),
	}
}

#[derive(serde::Serialize)]
pub(crate) struct InspectJson {
	pub(crate) path: String,
	pub(crate) entries: Vec<EntryJson>,
}

#[derive(serde::Serialize)]
pub(crate) struct EntryJson {
	pub(crate) index: usize,
	pub(crate) call_state: &'static str,
	pub(crate) target_object: Option<String>,
	pub(crate) member_kind: Option<&'static str>,
	pub(crate) member: Option<String>,
	pub(crate) arguments: Vec<ArgumentJson>,
}

#[derive(serde::Serialize)]
pub(crate) struct ArgumentJson {
	pub(crate) name: String,
	pub(crate) declared_type: String,
	pub(crate) value_type: String,
	pub(crate) kind: &'static str,
	pub(crate) payload: String,
}
