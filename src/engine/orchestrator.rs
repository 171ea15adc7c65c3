// ==========================================
// 酿造生命周期对账引擎 - 引擎编排器
// ==========================================
// 用途: 对账唯一入口，协调各组件的执行顺序
// 流程:
//   第一遍: 构建只读分组表（混酿分组 → 批次分类）
//   第二遍: 纯折叠合成占用事件；独立计算阶段统计；体积守恒校验
// 红线: 纯同步、无 I/O、不读系统时钟（today 由调用方传入），同一快照结果逐字节一致
// ==========================================

use crate::config::EngineConfig;
use crate::domain::occupancy::{PhaseCounts, ResourceOccupancyEvent};
use crate::domain::resource::Resource;
use crate::domain::snapshot::Snapshot;
use crate::engine::batch_case::BatchCases;
use crate::engine::blend_detector::BlendIndex;
use crate::engine::conservation::check_conservation;
use crate::engine::date_resolver::DateResolver;
use crate::engine::event_synthesizer::EventSynthesizer;
use crate::engine::phase_aggregator::PhaseAggregator;
use crate::engine::resource_resolver::ResourceResolver;
use crate::perf::PerfGuard;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use tracing::{info, instrument};

// ==========================================
// ReconcileWarning - 对账告警（非致命）
// ==========================================

/// 体积守恒校验对象
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConservationSubject {
    BlendLot,   // 混酿酒批: Σ贡献量 vs 酒批体积
    SplitBatch, // 拆分批次: Σ子批体积 vs 批次体积
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconcileWarning {
    /// 体积不守恒
    VolumeMismatch {
        subject: ConservationSubject,
        id: String,
        expected: f64,
        actual: f64,
    },
    /// 设备无法解析，事件已丢弃
    UnresolvedResource {
        #[serde(rename = "eventId")]
        event_id: String,
        label: String,
    },
}

impl fmt::Display for ReconcileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileWarning::VolumeMismatch {
                subject,
                id,
                expected,
                actual,
            } => write!(
                f,
                "体积不守恒 {:?} {}: 期望 {:.2}, 实际 {:.2}",
                subject, id, expected, actual
            ),
            ReconcileWarning::UnresolvedResource { event_id, label } => {
                write!(f, "设备无法解析 {} ({})", event_id, label)
            }
        }
    }
}

// ==========================================
// ReconcileResult - 对账结果
// ==========================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileResult {
    pub occupancy_events: Vec<ResourceOccupancyEvent>,
    pub phase_counts: PhaseCounts,
    pub warnings: Vec<ReconcileWarning>,
}

/// 一个设备泳道及其事件
#[derive(Debug, Clone)]
pub struct ResourceLane<'r> {
    pub resource: &'r Resource,
    pub events: Vec<&'r ResourceOccupancyEvent>,
}

impl ReconcileResult {
    /// 按设备分组（泳道顺序: 糖化间 → 发酵罐 → 储酒罐，同类按 id）
    ///
    /// 没有事件的设备也返回空泳道
    pub fn lanes<'r>(&'r self, resources: &'r [Resource]) -> Vec<ResourceLane<'r>> {
        let mut ordered: Vec<&Resource> = resources.iter().collect();
        ordered.sort_by(|a, b| (a.category, &a.id).cmp(&(b.category, &b.id)));
        ordered.dedup_by(|a, b| a.id == b.id);

        ordered
            .into_iter()
            .map(|resource| ResourceLane {
                resource,
                events: self
                    .occupancy_events
                    .iter()
                    .filter(|e| e.resource_id == resource.id)
                    .collect(),
            })
            .collect()
    }

    pub fn events_for(&self, resource_id: &str) -> impl Iterator<Item = &ResourceOccupancyEvent> {
        let resource_id = resource_id.to_string();
        self.occupancy_events
            .iter()
            .filter(move |e| e.resource_id == resource_id)
    }
}

// ==========================================
// ReconcileEngine - 对账引擎
// ==========================================

#[derive(Debug, Clone, Default)]
pub struct ReconcileEngine {
    config: EngineConfig,
}

impl ReconcileEngine {
    /// 创建对账引擎
    ///
    /// # 参数
    /// - config: 引擎配置（调用方负责校验）
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 执行一次对账
    ///
    /// # 参数
    /// - snapshot: 批次与设备快照（只读）
    /// - today: 当前日期（"现在" = today 的参考小时）
    ///
    /// # 返回
    /// 占用事件、阶段统计与非致命告警
    #[instrument(
        skip(self, snapshot),
        fields(batches = snapshot.batches.len(), resources = snapshot.resources.len())
    )]
    pub fn reconcile(&self, snapshot: &Snapshot, today: NaiveDate) -> ReconcileResult {
        let _perf = PerfGuard::new("reconcile");

        let dates = DateResolver::new(&self.config, today);
        let resources = ResourceResolver::new(&snapshot.resources);

        // ==========================================
        // 第一遍: 只读分组表
        // ==========================================
        let blends = BlendIndex::build(&snapshot.batches, &dates);
        let cases = BatchCases::build(&snapshot.batches, &blends);

        // ==========================================
        // 第二遍: 事件合成 / 阶段统计 / 守恒校验
        // ==========================================
        let synthesis =
            EventSynthesizer::new(&dates, &resources, &blends, &cases).synthesize(&snapshot.batches);
        let phase_counts = PhaseAggregator::aggregate(&snapshot.batches);

        let mut warnings =
            check_conservation(&snapshot.batches, &blends, self.config.volume_tolerance_pct);
        warnings.extend(synthesis.dropped.into_iter().map(|d| {
            ReconcileWarning::UnresolvedResource {
                event_id: d.event_id,
                label: d.label,
            }
        }));

        info!(
            %today,
            events = synthesis.events.len(),
            warnings = warnings.len(),
            in_progress = phase_counts.in_progress(),
            "对账完成"
        );

        ReconcileResult {
            occupancy_events: synthesis.events,
            phase_counts,
            warnings,
        }
    }
}
