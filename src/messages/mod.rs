pub mod export;
pub mod storage;
pub mod types;

pub use export::{export_json, export_to_file, format_transcript};
pub use storage::TranscriptLog;
pub use types::{Speaker, TranscriptEntry};
