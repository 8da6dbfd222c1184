//! Session discovery and the global sample timeline

pub mod discovery;
pub mod index;

pub use discovery::{DiscoveredFile, FileDiscovery, TimestampSuffixDiscovery};
pub use index::{RecordingFile, TimelineIndex};
