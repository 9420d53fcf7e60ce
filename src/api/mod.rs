pub mod coin_handlers;
pub mod handlers;
pub mod openapi;
pub mod responses;
pub mod routes;
pub mod sync_handlers;

pub use handlers::{ApiError, AppState};
pub use openapi::ApiDocV1;
pub use responses::*;
pub use routes::create_router;
