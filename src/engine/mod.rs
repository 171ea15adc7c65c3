// ==========================================
// 酿造生命周期对账引擎 - 引擎层
// ==========================================
// 职责: 快照 → 设备占用事件 + 阶段统计 的纯同步变换
// 红线: 不做 I/O，不读系统时钟，不因脏数据失败（只降级或丢弃单条事件）
// ==========================================

pub mod batch_case;
pub mod blend_detector;
pub mod conservation;
pub mod date_resolver;
pub mod event_synthesizer;
pub mod lot_history;
pub mod orchestrator;
pub mod phase_aggregator;
pub mod resource_resolver;
pub mod split_resolver;
pub mod unitank_merger;

// 重导出核心引擎
pub use batch_case::{BatchCase, BatchCases};
pub use blend_detector::{BlendIndex, BlendLot, BlendMember};
pub use conservation::check_conservation;
pub use date_resolver::{DateResolver, EndRequest};
pub use event_synthesizer::{DroppedEvent, EventSynthesizer, SynthesisOutput};
pub use orchestrator::{
    ConservationSubject, ReconcileEngine, ReconcileResult, ReconcileWarning, ResourceLane,
};
pub use phase_aggregator::PhaseAggregator;
pub use resource_resolver::{ResourceMatch, ResourceRefs, ResourceResolver};
pub use split_resolver::{ChildLot, SplitPlan, SplitResolver};
pub use unitank_merger::{PlacedAssignment, UnitankMerger, UnitankRun};
