use std::sync::Arc;
use std::time::Instant;

use crate::billing::BillGenerator;
use crate::catalog::{DynCatalog, StaticCatalog};
use crate::core::{Config, Result, ServerError};
use crate::message::StatusHub;
use crate::orders::OrderLifecycle;
use crate::sessions::SessionAggregator;
use crate::store::{DynStore, RedbStore};

/// 服务器状态 - 持有所有服务的单例引用
///
/// 使用 Arc 实现浅拷贝，所有权成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | store | DynStore | 会话/订单/账单存储 (redb) |
/// | catalog | DynCatalog | 菜单目录 |
/// | hub | StatusHub | 状态推送中心 |
/// | orders | OrderLifecycle | 订单提交与状态机 |
/// | sessions | SessionAggregator | 桌台会话与结账 |
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 存储
    pub store: DynStore,
    /// 菜单目录
    pub catalog: DynCatalog,
    /// 状态推送中心
    pub hub: StatusHub,
    /// 订单生命周期
    pub orders: OrderLifecycle,
    /// 会话聚合
    pub sessions: SessionAggregator,
    /// 启动时间 (用于 uptime)
    pub started_at: Instant,
}

impl ServerState {
    /// 由已创建的存储和菜单组装状态
    pub fn from_parts(config: Config, store: DynStore, catalog: DynCatalog) -> Self {
        let hub = StatusHub::with_capacity(config.event_channel_capacity);
        let bills = BillGenerator::new(store.clone(), hub.clone(), config.tax_rate);
        let sessions = SessionAggregator::new(store.clone(), hub.clone(), bills);
        let orders = OrderLifecycle::new(
            store.clone(),
            catalog.clone(),
            sessions.clone(),
            hub.clone(),
        );

        Self {
            config,
            store,
            catalog,
            hub,
            orders,
            sessions,
            started_at: Instant::now(),
        }
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构
    /// 2. 数据库 (work_dir/database/dine.redb)
    /// 3. 菜单 (MENU_FILE，未配置时为空菜单)
    pub fn initialize(config: &Config) -> Result<Self> {
        config.ensure_work_dir_structure()?;

        let db_path = config.database_path();
        let store = RedbStore::open(&db_path)?;
        tracing::info!(path = %db_path.display(), "Database opened");

        let catalog = load_catalog(config)?;
        Ok(Self::from_parts(
            config.clone(),
            Arc::new(store),
            Arc::new(catalog),
        ))
    }

    /// 内存存储的状态 (测试用)
    pub fn in_memory(config: Config, catalog: DynCatalog) -> Result<Self> {
        let store = RedbStore::open_in_memory()?;
        Ok(Self::from_parts(config, Arc::new(store), catalog))
    }

    /// 运行时间 (秒)
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

fn load_catalog(config: &Config) -> Result<StaticCatalog> {
    match &config.menu_file {
        Some(path) => {
            StaticCatalog::load_from_file(path).map_err(|e| ServerError::Catalog(e.to_string()))
        }
        None => {
            tracing::warn!("MENU_FILE not set, starting with an empty menu");
            Ok(StaticCatalog::new())
        }
    }
}
