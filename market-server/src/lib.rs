//! Market Server — local-commerce marketplace backend
//!
//! # Architecture overview
//!
//! The core of the service is the order lifecycle and delivery-assignment
//! engine:
//!
//! - **Orders** (`orders`): order creation reserves inventory and money-
//!   bearing order state inside one transaction
//! - **Delivery** (`delivery`): proximity/fee matching of runners and the
//!   conditional-update state machine (PENDING → CONFIRMED → COMPLETED)
//! - **Relay** (`relay`): per-order authorized rooms rebroadcasting the
//!   assigned runner's live position
//! - **Auth** (`auth`): JWT validation and the purchase-PIN gate
//! - **DB** (`db`): SQLite storage behind per-aggregate repositories
//!
//! # Module structure
//!
//! ```text
//! market-server/src/
//! ├── core/          # configuration, state, server bootstrap
//! ├── auth/          # JWT validation, PIN hashing
//! ├── db/            # pool, models, repositories
//! ├── orders/        # creation service, money arithmetic
//! ├── delivery/      # matcher, assignment state machine
//! ├── relay/         # location rooms and authorization
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # logger, validation helpers
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod delivery;
pub mod orders;
pub mod relay;
pub mod utils;

// Re-export public types
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use delivery::AssignmentService;
pub use orders::OrderService;
pub use relay::{LocationHub, RelayService};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
