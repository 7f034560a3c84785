//! Location relay
//!
//! Per-order live tracking: `hub` owns the rooms and fan-out, `service`
//! owns authorization (join once, re-authorize every publish). The
//! WebSocket transport lives in `api::tracking`.

pub mod hub;
pub mod service;

pub use hub::{LocationBroadcast, LocationHub};
pub use service::RelayService;
