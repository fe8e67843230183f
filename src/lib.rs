//! FoxESS Cloud exporter - Prometheus metrics for FoxESS inverters
//!
//! Periodically polls the FoxESS Cloud realtime API for a fixed set of
//! inverters and serves the latest readings on a Prometheus endpoint.
//! Scrapes never trigger API calls; they read the last complete snapshot.
//!
//! # Architecture
//! - `client`: FoxESS Cloud API client and the data source trait
//! - `exporter`: metric catalogue, fetch loop and Prometheus collector
//! - `metrics`: registry and text export
//! - `api`: HTTP services
//! - `config`: Configuration management
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: Logging

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod errors;
pub mod exporter;
pub mod metrics;
pub mod runtime;
pub mod system;
