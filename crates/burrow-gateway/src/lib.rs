//! HTTP transport for the Burrow resolution core.

pub mod admission;
pub mod app;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use state::AppState;
