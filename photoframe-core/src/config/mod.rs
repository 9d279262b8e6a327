/// Persisted user photo placement.
pub mod layout_store;
/// Service configuration file and defaults.
pub mod service;
