//! Raw recordings and their calibration

pub mod metadata;
pub mod reader;

pub use metadata::{CalibrationParams, MatMetadataLoader, MetadataLoader};
pub use reader::RecordingMap;
