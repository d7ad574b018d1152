use std::path::PathBuf;

use actionbind::action::{ActionError, ActionList, Result};

use crate::cmd::util::emit_json;

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long)]
	pub json: bool,
}

/// Report structural issues; fails when any are found.
pub fn run(args: Args) -> Result<()> {
	let Args { path, json } = args;

	let list = ActionList::load(&path)?;
	tracing::debug!(path = %path.display(), entries = list.len(), "loaded action list");
	let issues = list.structural_issues();

	if json {
		emit_json(&CheckJson {
			path: path.display().to_string(),
			entries: list.len(),
			issues: &issues,
		});
	} else {
		println!("path: {}", path.display());
		println!("entries: {}", list.len());
		println!("issues: {}", issues.len());
		for issue in &issues {
			println!("  {issue}");
		}
	}

	if issues.is_empty() {
		Ok(())
	} else {
		Err(ActionError::InvalidDocument {
			reason: format!("{} structural issue(s) in {}", issues.len(), path.display()),
		})
	}
}

#[derive(serde::Serialize)]
struct CheckJson<'a> {
	path: String,
	entries: usize,
	issues: &'a [actionbind::action::StructuralIssue],
}
