pub mod catalog;
pub mod relay;
pub mod responses;
pub mod router;
pub mod session;
pub mod state;

pub use relay::RelayRequest;
pub use responses::{ApiError, ApiResult, browse_error, json_error, relay_error, status_for};
pub use router::build_router;
pub use session::{SESSION_COOKIE, caller_session};
pub use state::AppState;
