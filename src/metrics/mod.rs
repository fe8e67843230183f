//! Prometheus metrics module
//!
//! Registry and text export for the `/metrics` endpoint.

mod registry;
mod system;

pub use registry::{EXPORTER_PREFIX, ExporterMetrics};
pub use system::ProcessMetrics;
