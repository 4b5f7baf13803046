//! 状态推送中心
//!
//! # 架构
//!
//! ```text
//! OrderLifecycle / SessionAggregator / BillGenerator
//!                 │ publish(DiningEvent)
//!                 ▼
//! ┌─────────────────────────────────────────────┐
//! │                 StatusHub                   │
//! │  Resequencer (按订单 version 排序)           │
//! │        │                                    │
//! │  broadcast::Sender<EventEnvelope>           │
//! └────────┬────────────────────────────────────┘
//!          │
//!   ┌──────┴───────┬──────────────┐
//!   ▼              ▼              ▼
//! Session(id)   Order(id)        All
//! (顾客页面)     (单个订单)       (厨房看板)
//! ```
//!
//! # 投递语义
//!
//! - 至少一次：订阅者可能收到重复事件，客户端用 `StatusTracker` 按 version 去重
//! - 同一订单的事件严格按 version 释放；提前到达的暂存，过期的丢弃
//! - 暂存超过 [`MAX_ORDER_BACKLOG`] 时跳过缺口，避免一个丢失的事件卡住整个订单
//! - 订单游标在终态或所属会话结束时回收（仅回收没有暂存事件的游标）
//! - 不同订单之间没有顺序保证
//! - 推送只是延迟优化，拉取 (GET) 才是真相；推送失败从不影响业务操作

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use futures::Stream;
use parking_lot::Mutex;
use serde::Serialize;
use shared::message::{DiningEvent, EventEnvelope, Topic};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// 默认广播容量
pub const DEFAULT_CHANNEL_CAPACITY: usize = 4096;

/// 单个订单允许暂存的乱序事件数
pub const MAX_ORDER_BACKLOG: usize = 16;

/// 订阅接收错误
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SubscriptionError {
    /// 订阅者落后，丢失了 n 条消息，必须重新拉取
    #[error("Subscriber lagged behind by {0} messages")]
    Lagged(u64),

    /// 推送中心已关闭
    #[error("Status hub closed")]
    Closed,

    /// 已取消订阅
    #[error("Subscription cancelled")]
    Unsubscribed,
}

/// 运行统计
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct HubStats {
    pub subscribers: usize,
    pub published: u64,
    pub stale_dropped: u64,
    pub gaps_skipped: u64,
    pub tracked_orders: usize,
}

// ============================================================================
// Resequencer
// ============================================================================

/// 单个订单的释放游标
#[derive(Debug, Default)]
struct OrderCursor {
    session_id: i64,
    /// 下一个可释放的 version
    next: u32,
    /// 提前到达的事件
    pending: BTreeMap<u32, DiningEvent>,
}

/// 按订单 version 重新排序
#[derive(Debug, Default)]
struct Resequencer {
    cursors: HashMap<i64, OrderCursor>,
    sequence: u64,
    stale_dropped: u64,
    gaps_skipped: u64,
}

impl Resequencer {
    /// 接收一个事件，返回现在可以释放的事件（按释放顺序）
    fn accept(&mut self, event: DiningEvent) -> Vec<DiningEvent> {
        let Some((order_id, version)) = event.order_version() else {
            if let DiningEvent::SessionFinished { session } = &event {
                self.evict_idle(session.session_id);
            }
            return vec![event];
        };

        // 游标惰性初始化：第一次见到的 version 即为起点
        let session_id = event.session_id();
        let cursor = self.cursors.entry(order_id).or_insert_with(|| OrderCursor {
            session_id,
            next: version,
            pending: BTreeMap::new(),
        });

        if version < cursor.next {
            self.stale_dropped += 1;
            tracing::debug!(order_id, version, next = cursor.next, "Dropping stale event");
            return Vec::new();
        }

        let mut released = Vec::new();
        if version == cursor.next {
            released.push(event);
            cursor.next += 1;
        } else {
            cursor.pending.insert(version, event);
            if cursor.pending.len() > MAX_ORDER_BACKLOG {
                // 跳过缺口：从最早的暂存事件继续
                if let Some((&first, _)) = cursor.pending.first_key_value() {
                    tracing::warn!(
                        order_id,
                        missing_from = cursor.next,
                        resume_at = first,
                        "Order event gap skipped"
                    );
                    cursor.next = first;
                    self.gaps_skipped += 1;
                }
            }
        }

        while let Some(next_event) = cursor.pending.remove(&cursor.next) {
            released.push(next_event);
            cursor.next += 1;
        }

        // 终态订单不会再有事件
        let finished = cursor.pending.is_empty()
            && released.iter().any(|e| match e {
                DiningEvent::OrderStatusChanged(change) => change.new_status.is_terminal(),
                _ => false,
            });
        if finished {
            self.cursors.remove(&order_id);
        }

        released
    }

    /// 会话结束后回收其订单的空闲游标；仍有暂存事件的游标保留，等缺口补齐或被跳过
    fn evict_idle(&mut self, session_id: i64) {
        let before = self.cursors.len();
        self.cursors
            .retain(|_, cursor| cursor.session_id != session_id || !cursor.pending.is_empty());
        let evicted = before - self.cursors.len();
        if evicted > 0 {
            tracing::debug!(session_id, evicted, "Released idle order cursors");
        }
    }

    fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }
}

// ============================================================================
// StatusHub
// ============================================================================

struct HubInner {
    tx: broadcast::Sender<EventEnvelope>,
    sequencer: Mutex<Resequencer>,
    /// 订阅 ID -> 取消令牌
    subscriptions: DashMap<u64, CancellationToken>,
    next_subscription_id: AtomicU64,
    published: AtomicU64,
    shutdown: CancellationToken,
}

/// 状态推送中心
///
/// 克隆开销很小，所有克隆共享同一个广播通道。
#[derive(Clone)]
pub struct StatusHub {
    inner: Arc<HubInner>,
}

impl std::fmt::Debug for StatusHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusHub")
            .field("subscribers", &self.inner.subscriptions.len())
            .field("published", &self.inner.published.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for StatusHub {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusHub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(HubInner {
                tx,
                sequencer: Mutex::new(Resequencer::default()),
                subscriptions: DashMap::new(),
                next_subscription_id: AtomicU64::new(1),
                published: AtomicU64::new(0),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// 发布事件
    ///
    /// 调用方必须在存储提交之后调用。从不失败：没有订阅者时事件直接丢弃。
    pub fn publish(&self, event: DiningEvent) {
        if self.inner.shutdown.is_cancelled() {
            tracing::debug!(kind = event.kind(), "Hub closed, event not published");
            return;
        }

        let mut sequencer = self.inner.sequencer.lock();
        for event in sequencer.accept(event) {
            let envelope = EventEnvelope {
                sequence: sequencer.next_sequence(),
                event,
            };
            let kind = envelope.event.kind();
            match self.inner.tx.send(envelope) {
                Ok(receivers) => {
                    tracing::trace!(kind, receivers, "Event published");
                }
                Err(_) => {
                    tracing::trace!(kind, "Event published with no subscribers");
                }
            }
            self.inner.published.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// 订阅一个主题
    pub fn subscribe(&self, topic: Topic) -> Subscription {
        let id = self
            .inner
            .next_subscription_id
            .fetch_add(1, Ordering::Relaxed);
        let cancel = self.inner.shutdown.child_token();
        self.inner.subscriptions.insert(id, cancel.clone());
        tracing::debug!(subscription_id = id, topic = %topic, "Subscribed");

        Subscription {
            id,
            topic,
            rx: self.inner.tx.subscribe(),
            cancel,
            shutdown: self.inner.shutdown.clone(),
            registry: Arc::clone(&self.inner),
        }
    }

    /// 取消订阅（幂等）
    ///
    /// 返回 `false` 表示该订阅不存在或已取消。
    pub fn unsubscribe(&self, subscription_id: u64) -> bool {
        match self.inner.subscriptions.remove(&subscription_id) {
            Some((_, token)) => {
                token.cancel();
                tracing::debug!(subscription_id, "Unsubscribed");
                true
            }
            None => false,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscriptions.len()
    }

    /// 关闭令牌，服务器关闭时用于结束推送连接
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.inner.shutdown
    }

    /// 关闭推送中心，所有订阅返回 `Closed`
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
        self.inner.subscriptions.clear();
        tracing::info!("Status hub shut down");
    }

    pub fn stats(&self) -> HubStats {
        let sequencer = self.inner.sequencer.lock();
        HubStats {
            subscribers: self.inner.subscriptions.len(),
            published: self.inner.published.load(Ordering::Relaxed),
            stale_dropped: sequencer.stale_dropped,
            gaps_skipped: sequencer.gaps_skipped,
            tracked_orders: sequencer.cursors.len(),
        }
    }
}

// ============================================================================
// Subscription
// ============================================================================

/// 主题订阅
///
/// Drop 时自动从注册表移除。
pub struct Subscription {
    id: u64,
    topic: Topic,
    rx: broadcast::Receiver<EventEnvelope>,
    cancel: CancellationToken,
    shutdown: CancellationToken,
    registry: Arc<HubInner>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .finish()
    }
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// 接收下一条匹配主题的事件
    pub async fn recv(&mut self) -> Result<EventEnvelope, SubscriptionError> {
        let topic = self.topic;
        let id = self.id;
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    return Err(if self.shutdown.is_cancelled() {
                        SubscriptionError::Closed
                    } else {
                        SubscriptionError::Unsubscribed
                    });
                }
                result = self.rx.recv() => match result {
                    Ok(envelope) if topic.matches(&envelope.event) => return Ok(envelope),
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(subscription_id = id, skipped = n, "Subscriber lagged");
                        return Err(SubscriptionError::Lagged(n));
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(SubscriptionError::Closed);
                    }
                },
            }
        }
    }

    /// 转为事件流；`Lagged` 作为流中的错误项，关闭或取消时流结束
    pub fn into_stream(self) -> impl Stream<Item = Result<EventEnvelope, SubscriptionError>> {
        futures::stream::unfold(self, |mut sub| async move {
            match sub.recv().await {
                Ok(envelope) => Some((Ok(envelope), sub)),
                Err(SubscriptionError::Lagged(n)) => Some((Err(SubscriptionError::Lagged(n)), sub)),
                Err(_) => None,
            }
        })
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.subscriptions.remove(&self.id);
    }
}
