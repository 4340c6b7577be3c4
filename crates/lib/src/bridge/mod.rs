//! Bridge: loopback HTTP listener for the browser extension.
//!
//! One route, `POST /reminder`, gated by the per-run `X-Auth-Token`. `OPTIONS` on any path is
//! answered without auth so browser preflight succeeds; every other request is a 404.

mod server;

pub use server::{router, Bridge, BridgeState, AUTH_HEADER, REMINDER_PATH};
