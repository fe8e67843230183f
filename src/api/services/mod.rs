pub mod landing;
pub mod metrics;

pub use landing::{LandingPage, LandingService};
pub use metrics::MetricsService;

use actix_web::web;

/// Route table: metrics at `telemetry_path`, the landing page everywhere else.
pub fn exporter_routes(telemetry_path: &str) -> impl FnOnce(&mut web::ServiceConfig) {
    let telemetry_path = telemetry_path.to_string();
    move |cfg| {
        cfg.app_data(web::Data::new(LandingPage::new(&telemetry_path)))
            .route(&telemetry_path, web::get().to(MetricsService::metrics))
            .route(&telemetry_path, web::head().to(MetricsService::metrics))
            .default_service(web::to(LandingService::landing));
    }
}
