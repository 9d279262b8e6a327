//! Blob storage: the collaborator contract, two backends, and the versioned
//! slot naming used by every settings record.

/// Blob store trait, entry types and key normalization.
pub mod blob;
/// Directory-backed store.
pub mod fs;
/// Slot/version key scheme under the `settings/` namespace.
pub mod keys;
/// In-process store.
pub mod memory;
