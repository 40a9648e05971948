// =============================================================================
// Gateway webserver
// =============================================================================

mod server;

pub mod routes;
pub mod state;
pub mod utils;

pub use server::{shutdown, start_server};
