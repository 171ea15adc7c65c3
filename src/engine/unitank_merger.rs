// ==========================================
// 酿造生命周期对账引擎 - 同罐合并器 (Unitank)
// ==========================================
// 职责: 非拆分、非混酿酒批的多条分配全部落在同一设备时，合并为一个占用区间
// 规则:
//   - 开始 = 各分配解析后开始的最早值
//   - 锚点分配 = ACTIVE 分配，否则最后一条；结束与当前阶段取自锚点
//   - 历史 = 全部分配为历史，或批次/酒批已完成（由调用方合并）
//   - 设备不同 → 不合并（真实转罐，逐条出事件）
// ==========================================

use crate::domain::batch::{Lot, TankAssignment};
use crate::domain::resource::Resource;
use crate::engine::lot_history::is_historical_assignment;
use chrono::NaiveDateTime;

/// 已解析设备与开始时刻的分配
#[derive(Debug, Clone, Copy)]
pub struct PlacedAssignment<'a> {
    pub assignment: &'a TankAssignment,
    pub resource: &'a Resource,
    pub start: NaiveDateTime,
}

/// 合并结果
#[derive(Debug, Clone, Copy)]
pub struct UnitankRun<'a> {
    pub resource: &'a Resource,
    pub start: NaiveDateTime,
    pub anchor: PlacedAssignment<'a>,
    pub all_historical: bool,
}

// ==========================================
// UnitankMerger - 同罐合并器
// ==========================================
pub struct UnitankMerger;

impl UnitankMerger {
    /// 检测同罐序列；不满足合并条件返回 None
    ///
    /// # 参数
    /// - lot: 所属酒批（用于历史判定的例外规则）
    /// - placed: 按计划开始排序的分配（已剔除无法解析设备的记录）
    pub fn detect<'a>(lot: &Lot, placed: &[PlacedAssignment<'a>]) -> Option<UnitankRun<'a>> {
        let first = placed.first()?;
        if placed.len() < 2 || placed.iter().any(|p| p.resource.id != first.resource.id) {
            return None;
        }

        let start = placed.iter().map(|p| p.start).min()?;
        let anchor = placed
            .iter()
            .find(|p| p.assignment.is_active())
            .or_else(|| placed.last())
            .copied()?;
        let all_historical = placed
            .iter()
            .all(|p| is_historical_assignment(lot, p.assignment));

        tracing::debug!(
            lot_id = %lot.id,
            resource_id = %first.resource.id,
            merged = placed.len(),
            anchor = %anchor.assignment.id,
            "同罐多阶段合并"
        );

        Some(UnitankRun {
            resource: first.resource,
            start,
            anchor,
            all_historical,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{AssignmentStatus, LotPhase, LotStatus, ResourceCategory};
    use chrono::NaiveDate;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn asg(id: &str, phase: LotPhase, status: AssignmentStatus) -> TankAssignment {
        TankAssignment {
            id: id.to_string(),
            phase: Some(phase),
            status,
            ..Default::default()
        }
    }

    fn lot(phase: LotPhase) -> Lot {
        Lot {
            id: "L4".to_string(),
            phase: Some(phase),
            status: LotStatus::Active,
            ..Default::default()
        }
    }

    #[test]
    fn test_same_tank_sequence_merges_to_active_anchor() {
        let t5 = Resource::new("T5", "Unitank 5", ResourceCategory::Fermenter);
        let a1 = asg("a1", LotPhase::Fermentation, AssignmentStatus::Completed);
        let a2 = asg("a2", LotPhase::Conditioning, AssignmentStatus::Completed);
        let a3 = asg("a3", LotPhase::Bright, AssignmentStatus::Active);
        let placed = vec![
            PlacedAssignment { assignment: &a1, resource: &t5, start: at(1) },
            PlacedAssignment { assignment: &a2, resource: &t5, start: at(15) },
            PlacedAssignment { assignment: &a3, resource: &t5, start: at(22) },
        ];

        let run = UnitankMerger::detect(&lot(LotPhase::Bright), &placed).unwrap();
        assert_eq!(run.start, at(1));
        assert_eq!(run.anchor.assignment.id, "a3");
        assert!(!run.all_historical);
    }

    #[test]
    fn test_anchor_falls_back_to_last_when_none_active() {
        let t5 = Resource::new("T5", "Unitank 5", ResourceCategory::Fermenter);
        let a1 = asg("a1", LotPhase::Fermentation, AssignmentStatus::Completed);
        let a2 = asg("a2", LotPhase::Conditioning, AssignmentStatus::Completed);
        let placed = vec![
            PlacedAssignment { assignment: &a1, resource: &t5, start: at(1) },
            PlacedAssignment { assignment: &a2, resource: &t5, start: at(15) },
        ];

        let run = UnitankMerger::detect(&lot(LotPhase::Packaging), &placed).unwrap();
        assert_eq!(run.anchor.assignment.id, "a2");
        assert!(run.all_historical);
    }

    #[test]
    fn test_different_tanks_do_not_merge() {
        let t1 = Resource::new("T1", "FV 1", ResourceCategory::Fermenter);
        let t2 = Resource::new("T2", "BBT 2", ResourceCategory::Conditioning);
        let a1 = asg("a1", LotPhase::Fermentation, AssignmentStatus::Completed);
        let a2 = asg("a2", LotPhase::Conditioning, AssignmentStatus::Active);
        let placed = vec![
            PlacedAssignment { assignment: &a1, resource: &t1, start: at(1) },
            PlacedAssignment { assignment: &a2, resource: &t2, start: at(15) },
        ];
        assert!(UnitankMerger::detect(&lot(LotPhase::Conditioning), &placed).is_none());
    }

    #[test]
    fn test_single_assignment_does_not_merge() {
        let t1 = Resource::new("T1", "FV 1", ResourceCategory::Fermenter);
        let a1 = asg("a1", LotPhase::Fermentation, AssignmentStatus::Active);
        let placed = vec![PlacedAssignment { assignment: &a1, resource: &t1, start: at(1) }];
        assert!(UnitankMerger::detect(&lot(LotPhase::Fermentation), &placed).is_none());
        assert!(UnitankMerger::detect(&lot(LotPhase::Fermentation), &[]).is_none());
    }
}
