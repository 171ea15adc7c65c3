// ==========================================
// 酿造生命周期对账引擎 - 酒批分配历史规则
// ==========================================
// 职责: 分配记录排序 + 历史/当前判定（各解析器共用）
// 规则: 酒批阶段是酒批级渲染的权威，而非批次状态
// ==========================================

use crate::domain::batch::{Batch, Lot, TankAssignment};
use crate::engine::date_resolver::DateResolver;

/// 按计划开始排序的分配记录（缺失日期排最后，同日按 id）
pub fn ordered_assignments<'a>(lot: &'a Lot, dates: &DateResolver) -> Vec<&'a TankAssignment> {
    let mut list: Vec<&TankAssignment> = lot.assignments.iter().collect();
    list.sort_by(|a, b| {
        let da = dates.day_of(a.planned_start.as_ref());
        let db = dates.day_of(b.planned_start.as_ref());
        (da.is_none(), da, &a.id).cmp(&(db.is_none(), db, &b.id))
    });
    list
}

/// 分配记录是否应按历史（只读）渲染
///
/// 例外: 酒批仍 ACTIVE 且其阶段与分配阶段一致时，COMPLETED 标记视为沿袭的陈旧标记，按当前渲染
pub fn is_historical_assignment(lot: &Lot, assignment: &TankAssignment) -> bool {
    if !assignment.is_completed() {
        return false;
    }
    let stale_flag = lot.is_active() && lot.phase.is_some() && lot.phase == assignment.phase;
    if stale_flag {
        tracing::debug!(
            lot_id = %lot.id,
            assignment_id = %assignment.id,
            "酒批仍在该阶段，忽略分配上的 COMPLETED 标记"
        );
    }
    !stale_flag
}

/// 事件是否整体为历史: 批次完成、酒批完成或分配本身为历史
pub fn is_historical_event(batch: &Batch, lot: &Lot, assignment: &TankAssignment) -> bool {
    batch.is_completed() || !lot.is_active() || is_historical_assignment(lot, assignment)
}
