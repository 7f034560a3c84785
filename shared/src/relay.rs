//! Wire messages for the live tracking channel
//!
//! One room per order. Clients send [`TrackingRequest`] frames, the server
//! answers with [`TrackingEvent`] frames. The coordinate payload is relayed
//! verbatim to every subscriber of the room.

use serde::{Deserialize, Serialize};

/// A single runner position sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPoint {
    pub lat: f64,
    pub lng: f64,
    /// Epoch millis, stamped server-side on publish
    pub recorded_at: i64,
}

/// Client → server frames
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackingRequest {
    /// Subscribe to an order's room (authorization enforced server-side)
    JoinOrder { order_id: i64 },
    /// Publish the runner's current position (assigned runner only)
    UpdateLocation { order_id: i64, lat: f64, lng: f64 },
    /// Unsubscribe from an order's room
    LeaveOrder { order_id: i64 },
}

/// Server → client frames
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackingEvent {
    /// Join succeeded; `trail` carries the positions seen so far
    Joined {
        order_id: i64,
        trail: Vec<LocationPoint>,
    },
    /// A position update for a joined room
    Location {
        order_id: i64,
        runner_id: i64,
        point: LocationPoint,
    },
    /// Left the room (or the room was closed)
    Left { order_id: i64 },
    /// A request failed; mirrors the HTTP error envelope
    Error { code: u16, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let frame = r#"{"type":"join_order","order_id":7}"#;
        let req: TrackingRequest = serde_json::from_str(frame).unwrap();
        match req {
            TrackingRequest::JoinOrder { order_id } => assert_eq!(order_id, 7),
            other => panic!("Expected JoinOrder, got {other:?}"),
        }
    }

    #[test]
    fn test_event_wire_format() {
        let event = TrackingEvent::Location {
            order_id: 3,
            runner_id: 9,
            point: LocationPoint {
                lat: 40.4168,
                lng: -3.7038,
                recorded_at: 1,
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"location\""));
        assert!(json.contains("\"order_id\":3"));
        assert!(json.contains("\"runner_id\":9"));
    }
}
