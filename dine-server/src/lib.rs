//! Dine Server - 堂食订单与会话生命周期引擎
//!
//! # 架构概述
//!
//! - **订单** (`orders`): 下单校验、菜单价格快照、状态机 (CAS 流转)
//! - **会话** (`sessions`): 每桌唯一的进行中会话、实时合计、结账
//! - **账单** (`billing`): 每个会话只生成一次、字节级一致
//! - **推送** (`message`): 按订单 version 排序的状态广播
//! - **存储** (`store`): redb 嵌入式存储
//! - **菜单** (`catalog`): 菜单目录网关
//! - **HTTP API** (`api`): REST + WebSocket 接口
//!
//! # 模块结构
//!
//! ```text
//! dine-server/src/
//! ├── core/          # 配置、状态、服务器、启动错误
//! ├── api/           # HTTP 路由和处理器
//! ├── orders/        # 订单生命周期
//! ├── sessions/      # 会话聚合
//! ├── billing/       # 账单生成
//! ├── message/       # 状态推送中心
//! ├── store/         # 存储层
//! ├── catalog/       # 菜单目录
//! └── utils/         # 日志等工具
//! ```

pub mod api;
pub mod billing;
pub mod catalog;
pub mod core;
pub mod error;
pub mod message;
pub mod orders;
pub mod sessions;
pub mod store;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerState};
pub use error::{DiningError, DiningResult};
pub use message::StatusHub;
pub use orders::OrderLifecycle;
pub use sessions::SessionAggregator;
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 加载 .env 并初始化日志
///
/// 返回从环境变量读取的配置
pub fn setup_environment() -> core::Result<Config> {
    dotenv::dotenv().ok();

    let config = Config::from_env()?;
    config.ensure_work_dir_structure()?;

    let log_dir = config.log_dir();
    init_logger_with_file(
        Some(&config.log_level),
        Some(config.log_json),
        log_dir.to_str(),
    );
    Ok(config)
}

pub fn print_banner() {
    println!(
        r#"
    ____  _
   / __ \(_)___  ___
  / / / / / __ \/ _ \
 / /_/ / / / / /  __/
/_____/_/_/ /_/\___/
    "#
    );
}
