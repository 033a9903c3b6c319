pub mod conversion;
pub mod handlers;
pub mod media;
pub mod middleware;
pub mod preferences;
pub mod routes;
pub mod ws;

pub use routes::create_router;
pub use ws::{WsBroadcaster, WsMessage};
