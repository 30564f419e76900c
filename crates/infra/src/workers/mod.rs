//! Background workers fed by the in-process event bus.

pub mod scan_recorder;

pub use scan_recorder::{ScanRecorder, WorkerHandle};
