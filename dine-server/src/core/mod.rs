//! 核心模块
//!
//! 启动与运行所需的部分：环境配置、服务单例、HTTP 服务生命周期、启动错误。
//! 领域逻辑 (订单、会话、账单) 不在这里，由 [`ServerState`] 组装。

pub mod config;
pub mod error;
pub mod server;
pub mod state;

pub use config::Config;
pub use error::{Result, ServerError};
pub use server::Server;
pub use state::ServerState;
