// ==========================================
// 酿造生命周期对账引擎 - API层
// ==========================================
// 职责: 外部协作方接缝（快照获取 + 刷新发布），引擎之外唯一的异步边界
// ==========================================

pub mod error;
pub mod snapshot_source;
pub mod timeline_api;

pub use error::{ApiError, ApiResult};
pub use snapshot_source::{JsonFileSnapshotSource, SnapshotSource, StaticSnapshotSource};
pub use timeline_api::TimelineApi;
