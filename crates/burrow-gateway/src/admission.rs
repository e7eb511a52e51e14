use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use burrow_resolver::Admission;

use crate::error::Result;

/// Takes a token before the request reaches its handler, so malformed
/// requests pay for admission like any other.
pub async fn admit(
    State(admission): State<Admission>,
    request: Request,
    next: Next,
) -> Result<Response> {
    admission.admit().await?;
    Ok(next.run(request).await)
}
