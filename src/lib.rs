// ==========================================
// 酿造生命周期对账引擎 - 核心库
// ==========================================
// 职责: 批次/酒批/罐位分配快照 → 设备占用时间线 + 看板阶段统计
// 系统定位: 纯同步对账核心；刷新与获取由外部协作方负责
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 快照实体与输出模型
pub mod domain;

// 引擎层 - 对账规则
pub mod engine;

// 配置层 - 引擎配置
pub mod config;

// API 层 - 快照源与刷新发布
pub mod api;

// 日志系统
pub mod logging;

// 性能统计
pub mod perf;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AssignmentStatus, BatchPhase, LotPhase, LotStatus, PhaseGroup, ResourceCategory,
};

// 领域实体
pub use domain::{
    Batch, BatchLot, DateValue, EventSource, Lot, PhaseCounts, Resource, ResourceOccupancyEvent,
    Snapshot, TankAssignment,
};

// 引擎
pub use engine::{ReconcileEngine, ReconcileResult, ReconcileWarning, ResourceLane};

// 配置
pub use config::{ConfigError, ConfigManager, EngineConfig};

// API
pub use api::{ApiError, ApiResult, JsonFileSnapshotSource, SnapshotSource, TimelineApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "酿造生命周期对账引擎";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_default_engine_on_empty_snapshot() {
        let result = ReconcileEngine::default().reconcile(
            &Snapshot::default(),
            chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        );
        assert!(result.occupancy_events.is_empty());
        assert_eq!(result.phase_counts, PhaseCounts::default());
    }
}
