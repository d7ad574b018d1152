/// Structural document check command.
pub mod check;
/// Entry listing command.
pub mod inspect;
/// Shared rendering helpers.
pub mod util;

#[cfg(test)]
mod test_support;
