/// Snapshot assembly for the admin UI and the generation path.
pub mod accessor;
