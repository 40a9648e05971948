// =============================================================================
// tradedeck - control surface and HTTP gateway for the trading daemon
// =============================================================================
//
// Layout:
//   daemon/     - the daemon command/query seam plus a simulated backend
//   webserver/  - axum gateway exposing the daemon over HTTP
//   control/    - client-side layer: cached resource store, status
//                 reconciliation, command dispatch, periodic refresh,
//                 and per-view loading
//   cache       - the TTL cache both layers are built on

pub mod arguments;
pub mod cache;
pub mod config;
pub mod control;
pub mod daemon;
pub mod errors;
pub mod logger;
pub mod webserver;

pub use errors::{ControlError, ControlResult};
