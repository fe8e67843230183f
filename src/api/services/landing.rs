use actix_web::{HttpResponse, Responder, web};

use crate::exporter::NAMESPACE;

/// Pre-rendered landing page linking to the telemetry path.
#[derive(Debug, Clone)]
pub struct LandingPage(String);

impl LandingPage {
    pub fn new(telemetry_path: &str) -> Self {
        let name = format!("{}_exporter", NAMESPACE);
        Self(format!(
            concat!(
                "<html>\n<head>\n<title>{name}</title>\n</head>\n",
                "<body>\n<h1>{name}</h1>\n<p><a href=\"{path}\">Metrics</a></p>\n",
                "</body>\n</html>\n",
            ),
            name = name,
            path = telemetry_path
        ))
    }

    pub fn body(&self) -> &str {
        &self.0
    }
}

pub struct LandingService;

impl LandingService {
    /// Serves every path other than the telemetry path
    pub async fn landing(page: web::Data<LandingPage>) -> impl Responder {
        HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(page.body().to_string())
    }
}
