use std::path::PathBuf;

use actionbind::action::ActionList;
use actionbind_testkit::fixture_path as shared_fixture_path;

pub(crate) fn fixture_path(name: &str) -> PathBuf {
	shared_fixture_path(name)
}

pub(crate) fn load_fixture(name: &str) -> ActionList {
	ActionList::load(fixture_path(name)).expect("fixture list loads")
}
