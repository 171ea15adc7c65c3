// ==========================================
// 酿造生命周期对账引擎 - 快照源 Trait
// ==========================================
// 职责: 定义外部快照获取接口（异步、可被取代），实现依赖倒置
// 说明: 引擎只消费 Snapshot；获取方式（REST/文件/内存）由实现者决定
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::snapshot::Snapshot;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

// ==========================================
// SnapshotSource Trait
// ==========================================
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// 获取一份完整快照
    async fn fetch(&self) -> ApiResult<Snapshot>;

    /// 快照源描述（日志用）
    fn describe(&self) -> String;
}

// ==========================================
// JsonFileSnapshotSource - JSON 文件快照源
// ==========================================
#[derive(Debug, Clone)]
pub struct JsonFileSnapshotSource {
    path: PathBuf,
}

impl JsonFileSnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotSource for JsonFileSnapshotSource {
    async fn fetch(&self) -> ApiResult<Snapshot> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| ApiError::SnapshotRead {
                path: self.path.clone(),
                source,
            })?;
        let snapshot = Snapshot::from_json(&raw)?;
        tracing::debug!(
            path = %self.path.display(),
            batches = snapshot.batches.len(),
            resources = snapshot.resources.len(),
            "快照读取完成"
        );
        Ok(snapshot)
    }

    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }
}

// ==========================================
// StaticSnapshotSource - 内存快照源
// ==========================================
/// 固定快照（嵌入调用方已持有的数据）
#[derive(Debug, Clone, Default)]
pub struct StaticSnapshotSource {
    snapshot: Snapshot,
}

impl StaticSnapshotSource {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl SnapshotSource for StaticSnapshotSource {
    async fn fetch(&self) -> ApiResult<Snapshot> {
        Ok(self.snapshot.clone())
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}
