//! Persisted member invocations that survive reloads and re-bind by signature.

/// Type universe, value codec, member resolution, and action entries.
pub mod action;
