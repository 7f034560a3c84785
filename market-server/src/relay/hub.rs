//! LocationHub — per-order live position fan-out
//!
//! One room per order. Each room is a tokio broadcast channel plus a small
//! in-memory trail of recent positions so late joiners can render the path
//! so far. Nothing here is persisted; the trail dies with the room.
//!
//! ```text
//! Runner WS handler
//!       │ publish(order_id, runner_id, point)
//!       ▼
//! LocationHub
//!   ├── rooms: order_id → OrderRoom
//!   │     ├── tx: broadcast::Sender<LocationBroadcast> (fan-out)
//!   │     └── trail: bounded VecDeque<LocationPoint>
//!   │           │
//!   │           ▼
//!   └── Subscriber WS handlers (client / provider / admin)
//! ```

use dashmap::DashMap;
use parking_lot::RwLock;
use shared::relay::LocationPoint;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Broadcast channel capacity — enough to absorb a publish burst
const BROADCAST_CAPACITY: usize = 256;

/// Maximum positions kept per room
const TRAIL_CAPACITY: usize = 256;

/// A position update as fanned out to room subscribers
#[derive(Debug, Clone)]
pub struct LocationBroadcast {
    pub order_id: i64,
    pub runner_id: i64,
    pub point: LocationPoint,
}

/// One order's room
struct OrderRoom {
    tx: broadcast::Sender<LocationBroadcast>,
    trail: RwLock<VecDeque<LocationPoint>>,
}

impl OrderRoom {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tx,
            trail: RwLock::new(VecDeque::new()),
        }
    }
}

/// Global room registry
#[derive(Clone, Default)]
pub struct LocationHub {
    rooms: Arc<DashMap<i64, OrderRoom>>,
}

impl LocationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to an order's room, returning the event stream and a
    /// snapshot of the trail so far. Creates the room on first use.
    pub fn subscribe(
        &self,
        order_id: i64,
    ) -> (broadcast::Receiver<LocationBroadcast>, Vec<LocationPoint>) {
        let room = self
            .rooms
            .entry(order_id)
            .or_insert_with(OrderRoom::new)
            .downgrade();
        let rx = room.tx.subscribe();
        let trail = room.trail.read().iter().cloned().collect();
        (rx, trail)
    }

    /// Publish a position to an order's room
    ///
    /// The payload is fanned out verbatim; a send with no subscribers is
    /// not an error (the runner may be alone in the room).
    pub fn publish(&self, order_id: i64, runner_id: i64, point: LocationPoint) {
        let room = self
            .rooms
            .entry(order_id)
            .or_insert_with(OrderRoom::new)
            .downgrade();

        {
            let mut trail = room.trail.write();
            if trail.len() == TRAIL_CAPACITY {
                trail.pop_front();
            }
            trail.push_back(point.clone());
        }

        let _ = room.tx.send(LocationBroadcast {
            order_id,
            runner_id,
            point,
        });
    }

    /// Most recent position published to a room, if any
    pub fn last_position(&self, order_id: i64) -> Option<LocationPoint> {
        self.rooms
            .get(&order_id)
            .and_then(|room| room.trail.read().back().cloned())
    }

    /// Drop a room once nobody is listening (called when a subscriber
    /// disconnects). The trail is discarded with it.
    pub fn drop_if_idle(&self, order_id: i64) {
        if let Some(room) = self.rooms.get(&order_id) {
            if room.tx.receiver_count() == 0 {
                drop(room);
                self.rooms.remove(&order_id);
            }
        }
    }

    /// Number of live subscribers in a room
    pub fn subscriber_count(&self, order_id: i64) -> usize {
        self.rooms
            .get(&order_id)
            .map(|room| room.tx.receiver_count())
            .unwrap_or(0)
    }
}
