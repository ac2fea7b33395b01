//! Dashboard backend client and the broker seam the session talks through.

mod backend_client;
mod broker;
mod types;

pub use backend_client::{BackendClient, DEFAULT_API_URL, DEFAULT_TIMEOUT};
pub use broker::Broker;
pub use types::*;
