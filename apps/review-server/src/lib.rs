//! review-server
//!
//! HTTP surface of the review service: document uploads for the reviewer and
//! reviewee corpora, question synthesis, answering, document queries and
//! review comments.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
