pub mod manifest;
pub mod schedule;

pub use manifest::{DefaultsUpdate, Manifest, ManifestDefaults, ManifestOverride};
pub use schedule::Schedule;
