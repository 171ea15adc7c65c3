// ==========================================
// 酿造生命周期对账引擎 - 领域类型定义
// ==========================================
// 批次阶段 / 酒批阶段 / 酒批状态 / 罐位分配状态 / 设备类别
// 序列化格式: SCREAMING_SNAKE_CASE (与上游数据一致)
// 反序列化: 阶段/状态一律宽松解析，未知值不拒绝整个快照
// ==========================================

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ==========================================
// 批次阶段 (Batch Phase)
// ==========================================
// 严格有序、只进不退，由外部操作推进；引擎只读
// PLANNED → BREWING → FERMENTING → CONDITIONING → BRIGHT|READY → PACKAGING → COMPLETED
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchPhase {
    #[default]
    Planned,      // 已计划
    Brewing,      // 糖化/煮沸（酿造日）
    Fermenting,   // 发酵
    Conditioning, // 后熟/储酒
    Bright,       // 清酒罐
    Ready,        // 待包装
    Packaging,    // 包装中
    Completed,    // 终态
}

impl BatchPhase {
    /// 从字符串解析阶段（大小写不敏感，未知值按 PLANNED 处理）
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "BREWING" => BatchPhase::Brewing,
            "FERMENTING" | "FERMENTATION" => BatchPhase::Fermenting,
            "CONDITIONING" => BatchPhase::Conditioning,
            "BRIGHT" => BatchPhase::Bright,
            "READY" => BatchPhase::Ready,
            "PACKAGING" => BatchPhase::Packaging,
            "COMPLETED" => BatchPhase::Completed,
            _ => BatchPhase::Planned,
        }
    }

    /// 酿造日阶段（PLANNED/BREWING）固定占用一天
    pub fn is_brew_day(&self) -> bool {
        matches!(self, BatchPhase::Planned | BatchPhase::Brewing)
    }
}

impl fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchPhase::Planned => write!(f, "PLANNED"),
            BatchPhase::Brewing => write!(f, "BREWING"),
            BatchPhase::Fermenting => write!(f, "FERMENTING"),
            BatchPhase::Conditioning => write!(f, "CONDITIONING"),
            BatchPhase::Bright => write!(f, "BRIGHT"),
            BatchPhase::Ready => write!(f, "READY"),
            BatchPhase::Packaging => write!(f, "PACKAGING"),
            BatchPhase::Completed => write!(f, "COMPLETED"),
        }
    }
}

// ==========================================
// 酒批阶段 (Lot Phase)
// ==========================================
// 与批次阶段相互独立；罐位分配记录也使用此枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LotPhase {
    Fermentation, // 发酵
    Conditioning, // 后熟
    Bright,       // 清酒
    Ready,        // 待包装
    Packaging,    // 包装
}

impl LotPhase {
    /// 从字符串解析阶段（兼容批次阶段写法）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "FERMENTATION" | "FERMENTING" => Some(LotPhase::Fermentation),
            "CONDITIONING" => Some(LotPhase::Conditioning),
            "BRIGHT" => Some(LotPhase::Bright),
            "READY" => Some(LotPhase::Ready),
            "PACKAGING" => Some(LotPhase::Packaging),
            _ => None,
        }
    }

    /// 映射到批次阶段（事件展示口径）
    pub fn as_batch_phase(&self) -> BatchPhase {
        match self {
            LotPhase::Fermentation => BatchPhase::Fermenting,
            LotPhase::Conditioning => BatchPhase::Conditioning,
            LotPhase::Bright => BatchPhase::Bright,
            LotPhase::Ready => BatchPhase::Ready,
            LotPhase::Packaging => BatchPhase::Packaging,
        }
    }

    /// 所属混酿阶段组
    pub fn group(&self) -> PhaseGroup {
        match self {
            LotPhase::Fermentation => PhaseGroup::Fermentation,
            _ => PhaseGroup::PostFermentation,
        }
    }
}

impl fmt::Display for LotPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LotPhase::Fermentation => write!(f, "FERMENTATION"),
            LotPhase::Conditioning => write!(f, "CONDITIONING"),
            LotPhase::Bright => write!(f, "BRIGHT"),
            LotPhase::Ready => write!(f, "READY"),
            LotPhase::Packaging => write!(f, "PACKAGING"),
        }
    }
}

// ==========================================
// 混酿阶段组 (Phase Group)
// ==========================================
// 两组互不相交: {CONDITIONING, BRIGHT, READY, PACKAGING} 与 {FERMENTATION}
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseGroup {
    PostFermentation,
    Fermentation,
}

impl PhaseGroup {
    pub const ALL: [PhaseGroup; 2] = [PhaseGroup::PostFermentation, PhaseGroup::Fermentation];

    pub fn contains(&self, phase: LotPhase) -> bool {
        phase.group() == *self
    }
}

impl fmt::Display for PhaseGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseGroup::PostFermentation => write!(f, "POST_FERMENTATION"),
            PhaseGroup::Fermentation => write!(f, "FERMENTATION"),
        }
    }
}

// ==========================================
// 酒批状态 (Lot Status)
// ==========================================
// 与阶段正交，由显式的"完成酒批"操作设置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LotStatus {
    #[default]
    Active,
    Completed,
}

impl LotStatus {
    /// 未知值按 ACTIVE 处理
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "COMPLETED" => LotStatus::Completed,
            _ => LotStatus::Active,
        }
    }
}

impl fmt::Display for LotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LotStatus::Active => write!(f, "ACTIVE"),
            LotStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

// ==========================================
// 罐位分配状态 (Assignment Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    #[default]
    Planned,
    Active,
    Completed,
}

impl AssignmentStatus {
    /// 未知值按 PLANNED 处理
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "ACTIVE" => AssignmentStatus::Active,
            "COMPLETED" => AssignmentStatus::Completed,
            _ => AssignmentStatus::Planned,
        }
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignmentStatus::Planned => write!(f, "PLANNED"),
            AssignmentStatus::Active => write!(f, "ACTIVE"),
            AssignmentStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

// ==========================================
// 设备类别 (Resource Category)
// ==========================================
// 决定事件在时间线上的泳道；顺序即泳道顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceCategory {
    Brewhouse,    // 糖化间
    Fermenter,    // 发酵罐
    Conditioning, // 储酒/清酒罐
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceCategory::Brewhouse => write!(f, "brewhouse"),
            ResourceCategory::Fermenter => write!(f, "fermenter"),
            ResourceCategory::Conditioning => write!(f, "conditioning"),
        }
    }
}

// ==========================================
// 宽松反序列化（字段级 deserialize_with）
// ==========================================
// 上游字段可能是小写、别名、null 或数字；取字符串后走 from_str

fn text_of<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let v = serde_json::Value::deserialize(d)?;
    Ok(match v {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Null => None,
        other => {
            tracing::debug!(value = %other, "枚举字段不是字符串，按缺失处理");
            None
        }
    })
}

pub fn de_batch_phase<'de, D: Deserializer<'de>>(d: D) -> Result<BatchPhase, D::Error> {
    Ok(text_of(d)?.map(|s| BatchPhase::from_str(&s)).unwrap_or_default())
}

pub fn de_lot_phase<'de, D: Deserializer<'de>>(d: D) -> Result<Option<LotPhase>, D::Error> {
    Ok(text_of(d)?.and_then(|s| LotPhase::from_str(&s)))
}

pub fn de_lot_status<'de, D: Deserializer<'de>>(d: D) -> Result<LotStatus, D::Error> {
    Ok(text_of(d)?.map(|s| LotStatus::from_str(&s)).unwrap_or_default())
}

pub fn de_assignment_status<'de, D: Deserializer<'de>>(d: D) -> Result<AssignmentStatus, D::Error> {
    Ok(text_of(d)?
        .map(|s| AssignmentStatus::from_str(&s))
        .unwrap_or_default())
}
