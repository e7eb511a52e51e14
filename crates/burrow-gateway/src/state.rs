use std::sync::Arc;

use burrow_core::ShortCode;
use burrow_resolver::{Admission, Resolver};

#[derive(Clone)]
pub struct AppState {
    resolver: Arc<dyn Resolver>,
    public_base_url: String,
    admission: Option<Admission>,
}

impl AppState {
    pub fn new(resolver: Arc<dyn Resolver>, public_base_url: impl Into<String>) -> Self {
        Self {
            resolver,
            public_base_url: public_base_url.into(),
            admission: None,
        }
    }

    /// Admits every URL request before its body or path is parsed.
    pub fn with_admission(mut self, admission: Admission) -> Self {
        self.admission = Some(admission);
        self
    }

    pub fn admission(&self) -> Option<&Admission> {
        self.admission.as_ref()
    }

    pub fn resolver(&self) -> &dyn Resolver {
        self.resolver.as_ref()
    }

    /// The public address of `code`, e.g. `http://localhost:8080/abc123`.
    pub fn short_url(&self, code: &ShortCode) -> String {
        code.to_url(&self.public_base_url)
    }
}
