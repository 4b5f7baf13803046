//! Order lifecycle
//!
//! - **lifecycle**: [`OrderLifecycle`], submission and status transitions
//! - **money**: Decimal money helpers and request validation
//!
//! # Architecture
//!
//! ```text
//! Request → OrderLifecycle → SessionStore (redb, CAS) → StatusHub
//!                 ↓                                         ↓
//!          CatalogGateway                            Subscribers
//!        (price snapshot)                  (diner page, kitchen board)
//! ```
//!
//! # State Machine
//!
//! ```text
//! PENDING → CONFIRMED → PREPARING → ALMOST_DONE → READY → SERVED
//!    └──────────┴───────────┴────────────┴──────────┴──→ CANCELLED
//! ```

pub mod lifecycle;
pub mod money;

pub use lifecycle::OrderLifecycle;

// Re-export shared types for convenience
pub use shared::order::{ActorRole, CreateOrderRequest, Order, OrderStatus, UpdateStatusRequest};
