use thiserror::Error;

use crate::store::StorageError;

/// 服务器启动与运行错误
///
/// 业务错误走 [`crate::DiningError`] → `AppError`；这里只覆盖启动、
/// 监听和关闭阶段。
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("存储初始化失败: {0}")]
    Storage(#[from] StorageError),

    #[error("菜单加载失败: {0}")]
    Catalog(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("内部服务器错误")]
    Internal(#[from] anyhow::Error),
}

/// 启动流程的 Result 类型别名
pub type Result<T> = std::result::Result<T, ServerError>;
