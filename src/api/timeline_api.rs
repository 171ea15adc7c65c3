// ==========================================
// 酿造生命周期对账引擎 - 时间线刷新 API
// ==========================================
// 职责: 获取快照 → 对账 → 发布结果
// 并发: 每次刷新领取代次票据；完成时若已有更新的刷新开始，则丢弃本次结果（后写者胜）
// 说明: 引擎本身不感知被取代，只有本层判定
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::snapshot_source::SnapshotSource;
use crate::config::EngineConfig;
use crate::engine::orchestrator::{ReconcileEngine, ReconcileResult};
use chrono::NaiveDate;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// 已发布的对账结果
#[derive(Debug, Clone)]
struct Published {
    generation: u64,
    result: Arc<ReconcileResult>,
}

// ==========================================
// TimelineApi - 时间线刷新 API
// ==========================================
pub struct TimelineApi {
    source: Arc<dyn SnapshotSource>,
    engine: ReconcileEngine,
    generation: AtomicU64,
    latest: RwLock<Option<Published>>,
}

impl TimelineApi {
    /// 创建刷新 API
    ///
    /// # 参数
    /// - source: 快照源
    /// - config: 引擎配置（已校验）
    pub fn new(source: Arc<dyn SnapshotSource>, config: EngineConfig) -> Self {
        Self {
            source,
            engine: ReconcileEngine::new(config),
            generation: AtomicU64::new(0),
            latest: RwLock::new(None),
        }
    }

    /// 刷新一次
    ///
    /// # 返回
    /// - Ok(Some(result)): 本次结果已发布
    /// - Ok(None): 期间有更新的刷新开始，本次结果被丢弃
    /// - Err: 快照获取失败（已发布的结果保持不变）
    pub async fn refresh(&self, today: NaiveDate) -> ApiResult<Option<Arc<ReconcileResult>>> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(ticket, source = %self.source.describe(), "开始刷新");

        let snapshot = self.source.fetch().await?;

        // 对账为纯 CPU 计算，放到阻塞线程池
        let engine = self.engine.clone();
        let result = tokio::task::spawn_blocking(move || engine.reconcile(&snapshot, today))
            .await
            .map_err(|e| ApiError::Other(anyhow::anyhow!("对账任务异常终止: {}", e)))?;

        let mut latest = self.latest.write().await;
        let newest = self.generation.load(Ordering::SeqCst);
        let already_newer = latest.as_ref().is_some_and(|p| p.generation > ticket);
        if ticket != newest || already_newer {
            info!(ticket, newest, "刷新已被取代，丢弃结果");
            return Ok(None);
        }

        let result = Arc::new(result);
        *latest = Some(Published {
            generation: ticket,
            result: result.clone(),
        });
        info!(
            ticket,
            events = result.occupancy_events.len(),
            warnings = result.warnings.len(),
            "刷新结果已发布"
        );
        Ok(Some(result))
    }

    /// 最近一次发布的结果
    pub async fn latest(&self) -> Option<Arc<ReconcileResult>> {
        self.latest.read().await.as_ref().map(|p| p.result.clone())
    }

    /// 已领取的刷新代次
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &EngineConfig {
        self.engine.config()
    }
}
