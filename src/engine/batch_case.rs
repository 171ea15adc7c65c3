// ==========================================
// 酿造生命周期对账引擎 - 批次处理分类
// ==========================================
// 职责: 每个批次只分类一次，下游按枚举穷尽匹配，不再逐字段判空
// 分类: Simple | Split | BlendMember | BlendOrigin | SyntheticBlend | Skipped
// ==========================================

use crate::domain::batch::Batch;
use crate::engine::blend_detector::BlendIndex;
use crate::engine::split_resolver::{SplitPlan, SplitResolver};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone)]
pub enum BatchCase<'a> {
    /// 普通批次
    Simple,
    /// 拆分批次；同时是混酿成员时 blend_label 为首个混酿成员批次号
    Split {
        plan: SplitPlan<'a>,
        blend_label: Option<&'a str>,
    },
    /// 混酿成员（有自己的独立酒批），不渲染共享酒批的组外历史
    BlendMember,
    /// 混酿起源批次（唯一酒批即共享酒批），负责共享酒批的组外历史
    BlendOrigin,
    /// 混酿合成视图，但成员不在快照中 → 以成员批次号拼接标签按普通批次渲染
    SyntheticBlend { label: String },
    /// 混酿合成视图，成员已在快照中渲染
    Skipped,
}

impl fmt::Display for BatchCase<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchCase::Simple => write!(f, "SIMPLE"),
            BatchCase::Split { .. } => write!(f, "SPLIT"),
            BatchCase::BlendMember => write!(f, "BLEND_MEMBER"),
            BatchCase::BlendOrigin => write!(f, "BLEND_ORIGIN"),
            BatchCase::SyntheticBlend { .. } => write!(f, "SYNTHETIC_BLEND"),
            BatchCase::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// 批次分类表（第一遍构建，之后只读）
#[derive(Debug, Clone, Default)]
pub struct BatchCases<'a> {
    cases: BTreeMap<&'a str, BatchCase<'a>>,
}

impl<'a> BatchCases<'a> {
    pub fn build(batches: &'a [Batch], blends: &BlendIndex<'a>) -> Self {
        let known_codes: BTreeSet<&str> = batches
            .iter()
            .filter(|b| !b.is_synthetic_blend())
            .map(|b| b.code.as_str())
            .collect();

        let cases = batches
            .iter()
            .map(|batch| {
                let case = classify(batch, blends, &known_codes);
                tracing::debug!(batch_code = %batch.code, case = %case, "批次分类");
                (batch.id.as_str(), case)
            })
            .collect();

        Self { cases }
    }

    pub fn get(&self, batch_id: &str) -> Option<&BatchCase<'a>> {
        self.cases.get(batch_id)
    }
}

/// 分类单个批次
pub fn classify<'a>(
    batch: &'a Batch,
    blends: &BlendIndex<'a>,
    known_codes: &BTreeSet<&str>,
) -> BatchCase<'a> {
    if batch.is_synthetic_blend() {
        let all_present = batch
            .blend_member_codes
            .iter()
            .all(|c| known_codes.contains(c.as_str()));
        return if all_present {
            BatchCase::Skipped
        } else {
            BatchCase::SyntheticBlend {
                label: batch.blend_member_codes.join(" + "),
            }
        };
    }

    let memberships = blends.blends_of_batch(&batch.id);
    let blend_label = memberships.first().map(|b| {
        let lead: &'a Batch = b.renderer().batch;
        lead.code.as_str()
    });

    if let Some(plan) = SplitResolver::resolve(batch) {
        return BatchCase::Split {
            plan,
            blend_label,
        };
    }

    if memberships.is_empty() {
        BatchCase::Simple
    } else if memberships
        .iter()
        .any(|b| b.origin_batch().is_some_and(|o| o.id == batch.id))
    {
        BatchCase::BlendOrigin
    } else {
        BatchCase::BlendMember
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::domain::batch::{BatchLot, Lot, TankAssignment};
    use crate::domain::types::{AssignmentStatus, LotPhase};
    use crate::engine::date_resolver::DateResolver;
    use chrono::NaiveDate;

    fn lot(id: &str, code: &str, phase: LotPhase) -> BatchLot {
        BatchLot {
            lot: Lot {
                id: id.to_string(),
                code: code.to_string(),
                phase: Some(phase),
                assignments: vec![TankAssignment {
                    id: format!("a-{}", id),
                    phase: Some(phase),
                    status: AssignmentStatus::Active,
                    ..Default::default()
                }],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn batch(id: &str, code: &str, lots: Vec<BatchLot>) -> Batch {
        Batch {
            id: id.to_string(),
            code: code.to_string(),
            lots,
            ..Default::default()
        }
    }

    #[test]
    fn test_classification() {
        let mut split = batch(
            "b3",
            "B3",
            vec![
                lot("l3", "L3", LotPhase::Fermentation),
                lot("l3a", "L3-A", LotPhase::Conditioning),
            ],
        );
        split.is_split = true;

        let synthetic_known = Batch {
            id: "v1".to_string(),
            code: "B1+B2".to_string(),
            blend_member_codes: vec!["B1".to_string(), "B2".to_string()],
            ..Default::default()
        };
        let synthetic_orphan = Batch {
            id: "v2".to_string(),
            code: "X+Y".to_string(),
            blend_member_codes: vec!["X".to_string(), "Y".to_string()],
            ..Default::default()
        };

        let batches = vec![
            batch("b1", "B1", vec![lot("L", "L", LotPhase::Conditioning)]),
            batch(
                "b2",
                "B2",
                vec![
                    lot("l2", "L2", LotPhase::Fermentation),
                    lot("L", "L", LotPhase::Conditioning),
                ],
            ),
            split,
            batch("b4", "B4", vec![lot("l4", "L4", LotPhase::Fermentation)]),
            synthetic_known,
            synthetic_orphan,
        ];

        let dates = DateResolver::new(
            &EngineConfig::default(),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        );
        let blends = BlendIndex::build(&batches, &dates);
        let cases = BatchCases::build(&batches, &blends);

        assert!(matches!(cases.get("b1"), Some(BatchCase::BlendOrigin)));
        assert!(matches!(cases.get("b2"), Some(BatchCase::BlendMember)));
        assert!(matches!(
            cases.get("b3"),
            Some(BatchCase::Split { blend_label: None, .. })
        ));
        assert!(matches!(cases.get("b4"), Some(BatchCase::Simple)));
        assert!(matches!(cases.get("v1"), Some(BatchCase::Skipped)));
        assert!(
            matches!(cases.get("v2"), Some(BatchCase::SyntheticBlend { label }) if label == "X + Y")
        );
    }
}
