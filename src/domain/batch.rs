// ==========================================
// 酿造生命周期对账引擎 - 批次/酒批/罐位分配领域模型
// ==========================================
// 用途: 外部协作方提供的快照实体，引擎只读
// 对齐: 上游 REST 数据（camelCase 字段名）
// ==========================================

use crate::domain::types::{
    de_assignment_status, de_batch_phase, de_lot_phase, de_lot_status, AssignmentStatus,
    BatchPhase, LotPhase, LotStatus,
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

// ==========================================
// DateValue - 异构日期输入
// ==========================================
// 上游日期字段可能是结构化日期、纯日期字符串或完整时间戳
// 解析与归一化见 engine::date_resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateValue {
    Date(NaiveDate),               // 纯日历日期（本地，不做时区换算）
    Timestamp(DateTime<FixedOffset>), // 绝对时刻（换算到站点时区后取日历日）
    Text(String),                  // 其他文本（宽松解析，失败则走兜底链）
    Other(serde_json::Value),      // 数字/对象等，视为无法解析
}

impl From<NaiveDate> for DateValue {
    fn from(d: NaiveDate) -> Self {
        DateValue::Date(d)
    }
}

impl From<&str> for DateValue {
    fn from(s: &str) -> Self {
        DateValue::Text(s.to_string())
    }
}

// ==========================================
// Batch - 批次（一次生产）
// ==========================================
// 生命周期: 登记时创建，阶段由外部操作推进，COMPLETED 后除包装量外不可变
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Batch {
    // ===== 主键 =====
    pub id: String,
    pub code: String, // 批次号（人工编码）

    // ===== 基础信息 =====
    pub recipe_name: Option<String>,
    pub volume: Option<f64>, // 目标体积
    #[serde(deserialize_with = "de_batch_phase")]
    pub phase: BatchPhase,
    pub is_split: bool,

    // ===== 阶段时间戳 =====
    pub created_at: Option<DateValue>,
    pub planned_date: Option<DateValue>, // 计划酿造日
    pub brewed_at: Option<DateValue>,
    pub fermentation_started_at: Option<DateValue>,
    pub conditioning_started_at: Option<DateValue>,
    pub ready_at: Option<DateValue>,
    pub packaging_started_at: Option<DateValue>,
    pub completed_at: Option<DateValue>,
    pub estimated_end: Option<DateValue>, // 预计结束（活动阶段）

    // ===== 设备引用（多个重叠字段）=====
    pub current_tank_id: Option<String>,
    pub equipment_id: Option<String>,
    pub tank_name: Option<String>,

    // ===== 混酿合成视图 =====
    pub blend_member_codes: Vec<String>, // 非空表示此批次是混酿的合成展示

    // ===== 关联酒批 =====
    pub lots: Vec<BatchLot>,
}

impl Batch {
    pub fn is_completed(&self) -> bool {
        self.phase == BatchPhase::Completed
    }

    /// 是否为混酿合成视图批次
    pub fn is_synthetic_blend(&self) -> bool {
        !self.blend_member_codes.is_empty()
    }

    /// 阶段起始时间戳
    pub fn phase_started_at(&self, phase: BatchPhase) -> Option<&DateValue> {
        match phase {
            BatchPhase::Planned => self.planned_date.as_ref(),
            BatchPhase::Brewing => self.brewed_at.as_ref().or(self.planned_date.as_ref()),
            BatchPhase::Fermenting => self.fermentation_started_at.as_ref(),
            BatchPhase::Conditioning => self.conditioning_started_at.as_ref(),
            BatchPhase::Bright | BatchPhase::Ready => self.ready_at.as_ref(),
            BatchPhase::Packaging => self.packaging_started_at.as_ref(),
            BatchPhase::Completed => self.completed_at.as_ref(),
        }
    }

    /// 下一阶段起始时间戳（用于结束已完成阶段，如后熟开始即发酵结束）
    pub fn next_phase_started_at(&self, phase: BatchPhase) -> Option<&DateValue> {
        match phase {
            BatchPhase::Planned | BatchPhase::Brewing => self.fermentation_started_at.as_ref(),
            BatchPhase::Fermenting => self.conditioning_started_at.as_ref(),
            BatchPhase::Conditioning => self
                .ready_at
                .as_ref()
                .or(self.packaging_started_at.as_ref()),
            BatchPhase::Bright | BatchPhase::Ready => self.packaging_started_at.as_ref(),
            BatchPhase::Packaging => self.completed_at.as_ref(),
            BatchPhase::Completed => None,
        }
    }
}

// ==========================================
// BatchLot - 批次与酒批的关联（多对多）
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchLot {
    pub lot: Lot,
    pub volume_contribution: Option<f64>, // 本批次贡献到该酒批的体积
    pub batch_percentage: Option<f64>,    // 本批次占该酒批的比例（0~100）
}

// ==========================================
// Lot - 酒批（物理上连续的一份酒液）
// ==========================================
// 拆分子批: 编码形如 <parent>-<A..Z>
// 混酿酒批: 编码可带 BLEND- 前缀
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Lot {
    pub id: String,
    pub code: String,
    #[serde(deserialize_with = "de_lot_phase")]
    pub phase: Option<LotPhase>, // 与批次阶段独立
    #[serde(deserialize_with = "de_lot_status")]
    pub status: LotStatus,
    pub volume: Option<f64>,
    pub completed_at: Option<DateValue>,

    // ===== 混酿证据 =====
    pub is_blend_result: bool,
    pub batch_count: Option<u32>,

    pub assignments: Vec<TankAssignment>,
}

pub const BLEND_CODE_PREFIX: &str = "BLEND-";

impl Lot {
    pub fn is_active(&self) -> bool {
        self.status == LotStatus::Active
    }

    pub fn has_blend_code(&self) -> bool {
        self.code.starts_with(BLEND_CODE_PREFIX)
    }

    /// 拆分后缀：编码末尾的 `-<单个大写字母>`
    pub fn split_suffix(&self) -> Option<char> {
        split_suffix_of(&self.code)
    }
}

/// 解析拆分后缀（`L3-A` → `A`）
pub fn split_suffix_of(code: &str) -> Option<char> {
    let (head, tail) = code.rsplit_once('-')?;
    if head.is_empty() {
        return None;
    }
    let mut chars = tail.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_uppercase() => Some(c),
        _ => None,
    }
}

// ==========================================
// TankAssignment - 罐位分配
// ==========================================
// 一个酒批在一个阶段绑定到一个设备的区间
// 同一酒批至多一条非 COMPLETED 记录；COMPLETED 记录保留为历史
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TankAssignment {
    pub id: String,
    #[serde(deserialize_with = "de_lot_phase")]
    pub phase: Option<LotPhase>,
    #[serde(deserialize_with = "de_assignment_status")]
    pub status: AssignmentStatus,
    pub planned_start: Option<DateValue>,
    pub planned_end: Option<DateValue>,
    pub actual_end: Option<DateValue>, // 仅 COMPLETED 时设置
    pub updated_at: Option<DateValue>,
    pub resource_id: Option<String>,
    pub resource_name: Option<String>,
}

impl TankAssignment {
    pub fn is_completed(&self) -> bool {
        self.status == AssignmentStatus::Completed
    }

    pub fn is_active(&self) -> bool {
        self.status == AssignmentStatus::Active
    }
}
