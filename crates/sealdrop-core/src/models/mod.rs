pub mod file;

pub use file::{validate_upload, FileInfo, FileRecord, MILLIS_PER_HOUR};
