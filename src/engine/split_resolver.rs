// ==========================================
// 酿造生命周期对账引擎 - 拆分解析器
// ==========================================
// 职责: 对 isSplit=true 且 ≥2 个酒批的批次，区分母批与子批
// 规则:
//   - 子批: 编码末尾为 -<A..Z>
//   - 母批: 无后缀且存在编码为 <母批编码>-<后缀> 的子批；不出当前占用事件，
//           只把 COMPLETED 的 FERMENTATION 分配作为整批历史输出
//   - 无子批时不激活（按普通批次处理，不报错）
// ==========================================

use crate::domain::batch::{Batch, BatchLot, Lot, TankAssignment};
use crate::domain::types::LotPhase;

/// 子批
#[derive(Debug, Clone, Copy)]
pub struct ChildLot<'a> {
    pub link: &'a BatchLot,
    pub suffix: char,
}

/// 拆分计划（第一遍确定，之后只读）
#[derive(Debug, Clone, Default)]
pub struct SplitPlan<'a> {
    pub parents: Vec<&'a BatchLot>,
    /// 按后缀排序
    pub children: Vec<ChildLot<'a>>,
    /// 既非母批也非子批的酒批，按普通酒批处理
    pub others: Vec<&'a BatchLot>,
}

// ==========================================
// SplitResolver - 拆分解析器
// ==========================================
pub struct SplitResolver;

impl SplitResolver {
    /// 解析拆分批次；不满足激活条件返回 None
    pub fn resolve(batch: &Batch) -> Option<SplitPlan<'_>> {
        if !batch.is_split || batch.lots.len() < 2 {
            return None;
        }

        let mut plan = SplitPlan::default();
        for link in &batch.lots {
            if let Some(suffix) = link.lot.split_suffix() {
                plan.children.push(ChildLot { link, suffix });
            } else if Self::is_parent_of_any(&link.lot, batch) {
                plan.parents.push(link);
            } else {
                plan.others.push(link);
            }
        }

        if plan.children.is_empty() {
            tracing::debug!(batch_code = %batch.code, "拆分标记存在但无子批，按普通批次处理");
            return None;
        }

        plan.children
            .sort_by(|a, b| (a.suffix, &a.link.lot.code).cmp(&(b.suffix, &b.link.lot.code)));
        Some(plan)
    }

    /// 子批标签: <批次号>-<后缀>；批次同时是混酿成员时只显示首个混酿成员的批次号
    pub fn child_label(batch: &Batch, suffix: char, blend_label: Option<&str>) -> String {
        match blend_label {
            Some(code) => code.to_string(),
            None => format!("{}-{}", batch.code, suffix),
        }
    }

    /// 母批可输出的历史: 仅 COMPLETED 的 FERMENTATION 分配
    pub fn parent_history(parent: &Lot) -> impl Iterator<Item = &TankAssignment> {
        parent
            .assignments
            .iter()
            .filter(|a| a.is_completed() && a.phase == Some(LotPhase::Fermentation))
    }

    /// 是否呈现拆分迹象（显式标记或子批编码）
    pub fn exhibits_split(batch: &Batch) -> bool {
        batch.is_split || batch.lots.iter().any(|l| l.lot.split_suffix().is_some())
    }

    /// 同批次内存在 <code>-<后缀> 子批（L1 不是 L10-A 的母批）
    fn is_parent_of_any(lot: &Lot, batch: &Batch) -> bool {
        !lot.code.is_empty()
            && batch.lots.iter().any(|other| {
                other.lot.id != lot.id
                    && other.lot.split_suffix().is_some()
                    && other
                        .lot
                        .code
                        .strip_prefix(lot.code.as_str())
                        .is_some_and(|rest| rest.len() == 2 && rest.starts_with('-'))
            })
    }
}
