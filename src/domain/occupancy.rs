// ==========================================
// 酿造生命周期对账引擎 - 引擎输出模型
// ==========================================
// ResourceOccupancyEvent: 每次对账重新生成，不持久化，无独立生命周期
// PhaseCounts: 看板阶段统计（按酒批计数）
// ==========================================

use crate::domain::types::{BatchPhase, ResourceCategory};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// 事件来源
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventSource {
    Batch,        // 批次级（酿造日 / 无酒批记录）
    Lot,          // 酒批级（无罐位分配记录）
    Assignment,   // 单条罐位分配
    Unitank,      // 同罐多阶段合并
    Blend,        // 混酿合并事件
    SplitHistory, // 拆分母批的发酵历史
}

// ==========================================
// ResourceOccupancyEvent - 设备占用事件
// ==========================================
// 一条事件对应时间线上的一根条形
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceOccupancyEvent {
    pub id: String, // 确定性 ID（同一快照多次对账结果一致）
    pub resource_id: String,
    pub resource_name: String,
    pub lane: ResourceCategory,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub label: String,
    pub recipe_label: Option<String>,
    pub phase: BatchPhase,
    pub is_historical: bool,
    pub is_blend: bool,
    pub is_split_lot: bool,
    pub is_unitank: bool,
    pub lot_id: Option<String>,
    pub lot_code: Option<String>,
    pub batch_ids: Vec<String>,
    pub volume: Option<f64>,
    pub source: EventSource,
}

// ==========================================
// PhaseCounts - 阶段统计
// ==========================================
// 按酒批计数: 拆分批次每个子批计一次，混酿每个共享酒批计一次
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseCounts {
    pub planned: u32,
    pub brewing: u32,
    pub fermenting: u32,
    pub conditioning: u32,
    pub ready: u32,
    pub packaging: u32,
    pub blended: u32,
    pub split: u32,
}

impl PhaseCounts {
    /// 按阶段累加一次（BRIGHT 归入 ready；COMPLETED 不计）
    pub fn bump(&mut self, phase: BatchPhase) {
        match phase {
            BatchPhase::Planned => self.planned += 1,
            BatchPhase::Brewing => self.brewing += 1,
            BatchPhase::Fermenting => self.fermenting += 1,
            BatchPhase::Conditioning => self.conditioning += 1,
            BatchPhase::Bright | BatchPhase::Ready => self.ready += 1,
            BatchPhase::Packaging => self.packaging += 1,
            BatchPhase::Completed => {}
        }
    }

    /// 在制总数（不含 blended/split 标记计数）
    pub fn in_progress(&self) -> u32 {
        self.planned + self.brewing + self.fermenting + self.conditioning + self.ready + self.packaging
    }
}
