pub mod auth;
pub mod conversations;
pub mod error;
pub mod middleware;
pub mod router;

pub use auth::{AppState, AppStateInner};
pub use router::router;
