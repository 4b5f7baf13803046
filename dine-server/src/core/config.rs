use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;

use super::error::ServerError;

/// 默认税率 (5%)，整桌账单结算时统一计算一次
pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// 服务器配置 - 点餐引擎的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库、日志) |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | TAX_RATE | 0.05 | 账单税率 |
/// | POLL_INTERVAL_MS | 5000 | 推送断开后客户端的轮询间隔 |
/// | EVENT_CHANNEL_CAPACITY | 4096 | 广播通道缓冲 |
/// | MENU_FILE | (未设置) | 启动时加载的菜单 JSON |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_JSON | false | JSON 格式日志 |
/// | ENVIRONMENT | development | 运行环境 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/dine TAX_RATE=0.18 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库和日志
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 账单税率
    pub tax_rate: Decimal,
    /// 推荐轮询间隔 (毫秒)
    pub poll_interval_ms: u64,
    /// 事件广播通道容量
    pub event_channel_capacity: usize,
    /// 菜单文件路径
    pub menu_file: Option<String>,
    /// 日志级别
    pub log_level: String,
    /// 是否输出 JSON 日志
    pub log_json: bool,
    /// 运行环境: development | staging | production
    pub environment: String,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 未设置的变量取默认值；设置了但无法解析的变量 (如 `TAX_RATE=abc`)
    /// 直接报错，不回退默认值
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载配置 (测试中替代环境变量)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let tax_rate = parse_var(&raw, "TAX_RATE", DEFAULT_TAX_RATE)?;
        if tax_rate < Decimal::ZERO || tax_rate >= Decimal::ONE {
            return Err(ServerError::Config(format!(
                "TAX_RATE must be in [0, 1), got {}",
                tax_rate
            )));
        }

        let event_channel_capacity: usize = parse_var(&raw, "EVENT_CHANNEL_CAPACITY", 4096)?;
        if event_channel_capacity == 0 {
            return Err(ServerError::Config(
                "EVENT_CHANNEL_CAPACITY must be positive".into(),
            ));
        }

        Ok(Self {
            work_dir: raw("WORK_DIR").unwrap_or_else(|| "./data".into()),
            http_port: parse_var(&raw, "HTTP_PORT", 3000)?,
            tax_rate,
            poll_interval_ms: parse_var(&raw, "POLL_INTERVAL_MS", 5000)?,
            event_channel_capacity,
            menu_file: raw("MENU_FILE"),
            log_level: raw("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_json: parse_var(&raw, "LOG_JSON", false)?,
            environment: raw("ENVIRONMENT").unwrap_or_else(|| "development".into()),
        })
    }

    /// 数据库目录
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// 数据库文件路径
    pub fn database_path(&self) -> PathBuf {
        self.database_dir().join("dine.redb")
    }

    /// 日志目录
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> Result<(), ServerError> {
        for dir in [self.database_dir(), self.log_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| {
                ServerError::Config(format!("failed to create {}: {}", dir.display(), e))
            })?;
        }
        Ok(())
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// 解析单个变量：未设置取默认值，解析失败报错
fn parse_var<T, F>(raw: &F, key: &str, default: T) -> Result<T, ServerError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match raw(key) {
        Some(value) => value
            .parse()
            .map_err(|e| ServerError::Config(format!("invalid {} {:?}: {}", key, value, e))),
        None => Ok(default),
    }
}
