use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

impl HealthResponse {
    pub fn up() -> Self {
        Self {
            status: "up",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}
