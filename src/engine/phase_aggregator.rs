// ==========================================
// 酿造生命周期对账引擎 - 阶段统计聚合器
// ==========================================
// 职责: 按酒批（而非批次）计数的看板阶段统计，独立于事件列表
// 规则:
//   - PLANNED/BREWING 的批次按批次计一次（尚无酒批）
//   - 之后按 ACTIVE 酒批去重计数: 拆分批次每个子批一次，混酿共享酒批只计一次
//   - 拆分母批不计；已完成批次不计
//   - blended = 有任一混酿证据的去重酒批数；split = 呈现拆分迹象的批次数
// ==========================================

use crate::domain::batch::{Batch, Lot};
use crate::domain::occupancy::PhaseCounts;
use crate::engine::split_resolver::SplitResolver;
use std::collections::{BTreeMap, BTreeSet};

// ==========================================
// PhaseAggregator - 阶段统计聚合器
// ==========================================
pub struct PhaseAggregator;

impl PhaseAggregator {
    /// 计算阶段统计
    pub fn aggregate(batches: &[Batch]) -> PhaseCounts {
        let known_codes: BTreeSet<&str> = batches
            .iter()
            .filter(|b| !b.is_synthetic_blend())
            .map(|b| b.code.as_str())
            .collect();

        // 混酿合成视图: 成员都在快照中时由成员计数
        let counted: Vec<&Batch> = batches
            .iter()
            .filter(|b| {
                !b.is_synthetic_blend()
                    || !b
                        .blend_member_codes
                        .iter()
                        .all(|c| known_codes.contains(c.as_str()))
            })
            .collect();

        let mut counts = PhaseCounts::default();
        let mut seen_lots: BTreeSet<&str> = BTreeSet::new();

        for batch in counted.iter().copied().filter(|b| !b.is_completed()) {
            if batch.phase.is_brew_day() || batch.lots.is_empty() {
                counts.bump(batch.phase);
                continue;
            }

            let parents: BTreeSet<&str> = SplitResolver::resolve(batch)
                .map(|plan| plan.parents.into_iter().map(|p| p.lot.id.as_str()).collect())
                .unwrap_or_default();

            for link in &batch.lots {
                let lot = &link.lot;
                if !lot.is_active() || parents.contains(lot.id.as_str()) {
                    continue;
                }
                if seen_lots.insert(lot.id.as_str()) {
                    counts.bump(lot.phase.map(|p| p.as_batch_phase()).unwrap_or(batch.phase));
                }
            }
        }

        counts.blended = Self::blended_lots(&counted).len() as u32;
        counts.split = counted
            .iter()
            .filter(|b| SplitResolver::exhibits_split(b))
            .count() as u32;

        tracing::debug!(
            in_progress = counts.in_progress(),
            blended = counts.blended,
            split = counts.split,
            "阶段统计完成"
        );
        counts
    }

    /// 有混酿证据的去重酒批: ≥2 个批次引用、混酿结果标记、批次数元数据或 BLEND- 编码
    fn blended_lots<'a>(batches: &[&'a Batch]) -> BTreeSet<&'a str> {
        let mut referencing: BTreeMap<&'a str, BTreeSet<&'a str>> = BTreeMap::new();
        let mut flagged: BTreeSet<&'a str> = BTreeSet::new();

        for batch in batches.iter().copied().filter(|b| !b.is_synthetic_blend()) {
            for link in &batch.lots {
                let lot = &link.lot;
                referencing
                    .entry(lot.id.as_str())
                    .or_default()
                    .insert(batch.id.as_str());
                if has_blend_marker(lot) {
                    flagged.insert(lot.id.as_str());
                }
            }
        }

        referencing
            .into_iter()
            .filter(|(_, ids)| ids.len() >= 2)
            .map(|(lot_id, _)| lot_id)
            .chain(flagged)
            .collect()
    }
}

fn has_blend_marker(lot: &Lot) -> bool {
    lot.is_blend_result || lot.batch_count.is_some_and(|n| n >= 2) || lot.has_blend_code()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::batch::BatchLot;
    use crate::domain::types::{BatchPhase, LotPhase, LotStatus};

    fn link(id: &str, code: &str, phase: LotPhase, status: LotStatus) -> BatchLot {
        BatchLot {
            lot: Lot {
                id: id.to_string(),
                code: code.to_string(),
                phase: Some(phase),
                status,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn batch(id: &str, phase: BatchPhase, lots: Vec<BatchLot>) -> Batch {
        Batch {
            id: id.to_string(),
            code: id.to_uppercase(),
            phase,
            lots,
            ..Default::default()
        }
    }

    #[test]
    fn test_split_counts_each_child_and_skips_parent() {
        let mut split = batch(
            "b3",
            BatchPhase::Conditioning,
            vec![
                link("l3", "L3", LotPhase::Fermentation, LotStatus::Active),
                link("l3a", "L3-A", LotPhase::Conditioning, LotStatus::Active),
                link("l3b", "L3-B", LotPhase::Bright, LotStatus::Active),
            ],
        );
        split.is_split = true;

        let counts = PhaseAggregator::aggregate(&[split]);
        assert_eq!(counts.fermenting, 0);
        assert_eq!(counts.conditioning, 1);
        assert_eq!(counts.ready, 1);
        assert_eq!(counts.split, 1);
        assert_eq!(counts.in_progress(), 2);
    }

    #[test]
    fn test_blend_counts_shared_lot_once() {
        let shared = || link("L", "L", LotPhase::Conditioning, LotStatus::Active);
        let batches = vec![
            batch("b1", BatchPhase::Conditioning, vec![shared()]),
            batch("b2", BatchPhase::Conditioning, vec![shared()]),
        ];
        let counts = PhaseAggregator::aggregate(&batches);
        assert_eq!(counts.conditioning, 1);
        assert_eq!(counts.blended, 1);
    }

    #[test]
    fn test_brew_day_and_lotless_batches_count_by_batch() {
        let batches = vec![
            batch("b1", BatchPhase::Planned, vec![]),
            batch("b2", BatchPhase::Brewing, vec![]),
            batch("b3", BatchPhase::Fermenting, vec![]),
            batch("b4", BatchPhase::Completed, vec![]),
        ];
        let counts = PhaseAggregator::aggregate(&batches);
        assert_eq!(counts.planned, 1);
        assert_eq!(counts.brewing, 1);
        assert_eq!(counts.fermenting, 1);
        assert_eq!(counts.in_progress(), 3);
    }

    #[test]
    fn test_completed_lots_are_not_counted() {
        let b = batch(
            "b1",
            BatchPhase::Packaging,
            vec![
                link("l1", "L1", LotPhase::Packaging, LotStatus::Active),
                link("l2", "L2", LotPhase::Conditioning, LotStatus::Completed),
            ],
        );
        let counts = PhaseAggregator::aggregate(&[b]);
        assert_eq!(counts.packaging, 1);
        assert_eq!(counts.conditioning, 0);
    }

    #[test]
    fn test_blend_markers_without_second_batch() {
        let mut flagged = link("l1", "L1", LotPhase::Conditioning, LotStatus::Active);
        flagged.lot.is_blend_result = true;
        let coded = link("l2", "BLEND-2", LotPhase::Conditioning, LotStatus::Active);
        let mut counted = link("l3", "L3", LotPhase::Conditioning, LotStatus::Active);
        counted.lot.batch_count = Some(3);

        let batches = vec![
            batch("b1", BatchPhase::Conditioning, vec![flagged]),
            batch("b2", BatchPhase::Conditioning, vec![coded]),
            batch("b3", BatchPhase::Conditioning, vec![counted]),
        ];
        assert_eq!(PhaseAggregator::aggregate(&batches).blended, 3);
    }

    #[test]
    fn test_synthetic_blend_view_is_not_double_counted() {
        let shared = || link("L", "L", LotPhase::Conditioning, LotStatus::Active);
        let view = Batch {
            id: "v".to_string(),
            code: "B1+B2".to_string(),
            phase: BatchPhase::Conditioning,
            blend_member_codes: vec!["B1".to_string(), "B2".to_string()],
            lots: vec![shared()],
            ..Default::default()
        };
        let batches = vec![
            batch("b1", BatchPhase::Conditioning, vec![shared()]),
            batch("b2", BatchPhase::Conditioning, vec![shared()]),
            view,
        ];
        let counts = PhaseAggregator::aggregate(&batches);
        assert_eq!(counts.conditioning, 1);
        assert_eq!(counts.blended, 1);
    }
}
