//! HTTP surface: metrics endpoint and landing page

pub mod services;

pub use services::exporter_routes;
