//! Prometheus metrics endpoint
//!
//! Exposes inverter and exporter metrics in Prometheus text format at the
//! configured telemetry path.

use actix_web::{HttpResponse, Responder, web};
use tracing::error;

use crate::metrics::ExporterMetrics;

/// Metrics service handler
pub struct MetricsService;

impl MetricsService {
    /// Handle metrics export request
    pub async fn metrics(metrics: web::Data<ExporterMetrics>) -> impl Responder {
        match metrics.export() {
            Ok(output) => HttpResponse::Ok()
                .content_type("text/plain; version=0.0.4; charset=utf-8")
                .body(output),
            Err(e) => {
                error!("Failed to export metrics: {}", e);
                HttpResponse::InternalServerError()
                    .content_type("text/plain; charset=utf-8")
                    .body(format!("An error has occurred while serving metrics:\n\n{}", e))
            }
        }
    }
}
