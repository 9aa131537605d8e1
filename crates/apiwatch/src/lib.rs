//! apiwatch: endpoint extraction, normalization, snapshot diffing, and change archival.

pub mod archive;
pub mod diff;
pub mod extract;
pub mod normalize;
pub mod storage;
pub mod types;

pub use archive::{archive_key, write_latest, ChangeArchive};
pub use diff::{detect_change, registries_differ, ChangeRecord};
pub use extract::extract_endpoints;
pub use normalize::{Mismatch, Normalizer, SubstitutionRule};
pub use storage::{parse_snapshot, read_snapshot, to_snapshot_text, write_snapshot};
pub use types::*;
