//! Delivery domain
//!
//! - `matcher`: pure proximity/fee scoring of active runners
//! - `assignment`: the conditional-update state machine
//!   (PENDING → CONFIRMED → COMPLETED, PENDING → CANCELLED)

pub mod assignment;
pub mod matcher;

pub use assignment::AssignmentService;
pub use matcher::{DeliveryPoint, RunnerCandidate};
