// ==========================================
// 酿造生命周期对账引擎 - 领域模型层
// ==========================================
// 职责: 定义快照实体、引擎输出、领域类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod batch;
pub mod occupancy;
pub mod resource;
pub mod snapshot;
pub mod types;

// 重导出核心类型
pub use batch::{split_suffix_of, Batch, BatchLot, DateValue, Lot, TankAssignment, BLEND_CODE_PREFIX};
pub use occupancy::{EventSource, PhaseCounts, ResourceOccupancyEvent};
pub use resource::Resource;
pub use snapshot::Snapshot;
pub use types::{
    AssignmentStatus, BatchPhase, LotPhase, LotStatus, PhaseGroup, ResourceCategory,
};
