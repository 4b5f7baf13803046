//! 状态推送
//!
//! ```text
//! ┌───────────────────────────────────────┐
//! │              StatusHub                │
//! │  ┌─────────────────────────────────┐  │
//! │  │ broadcast::Sender<EventEnvelope>│  │
//! │  └─────────────────────────────────┘  │
//! └──────────────────┬────────────────────┘
//!                    │ Subscription (Topic 过滤)
//!         ┌──────────┴──────────┐
//!         ▼                     ▼
//!   WebSocket 推送         进程内订阅者
//!   (api::ws)              (测试 / 后台任务)
//! ```

pub mod hub;

pub use hub::{HubStats, StatusHub, Subscription, SubscriptionError};
pub use shared::message::{DiningEvent, EventEnvelope, PushCommand, PushMessage, Topic};
