// ==========================================
// 酿造生命周期对账引擎 - 体积守恒校验
// ==========================================
// 职责: 校验混酿酒批 Σ贡献量 ≈ 酒批体积、拆分批次 Σ子批体积 ≈ 批次体积
// 红线: 只产出告警，从不中断对账
// ==========================================

use crate::domain::batch::Batch;
use crate::engine::blend_detector::BlendIndex;
use crate::engine::orchestrator::{ConservationSubject, ReconcileWarning};
use crate::engine::split_resolver::SplitResolver;
use std::collections::BTreeSet;

/// 体积守恒校验
///
/// # 参数
/// - tolerance_pct: 相对容差（0.02 = 2%）
///
/// 缺少任一参与体积时跳过，不做推测
pub fn check_conservation(
    batches: &[Batch],
    blends: &BlendIndex<'_>,
    tolerance_pct: f64,
) -> Vec<ReconcileWarning> {
    let mut warnings = Vec::new();

    // ===== 混酿酒批（跨阶段组按酒批去重）=====
    let mut checked: BTreeSet<&str> = BTreeSet::new();
    for blend in blends.iter() {
        if !checked.insert(blend.lot_id()) {
            continue;
        }
        let Some(expected) = blend.lot.volume else {
            continue;
        };
        let parts: Option<Vec<f64>> = blend
            .members
            .iter()
            .map(|m| m.link.volume_contribution)
            .collect();
        let Some(parts) = parts else {
            continue;
        };
        let actual: f64 = parts.iter().sum();
        if exceeds(expected, actual, tolerance_pct) {
            tracing::warn!(
                lot_id = %blend.lot_id(),
                expected,
                actual,
                "混酿酒批体积不守恒"
            );
            warnings.push(ReconcileWarning::VolumeMismatch {
                subject: ConservationSubject::BlendLot,
                id: blend.lot_id().to_string(),
                expected,
                actual,
            });
        }
    }

    // ===== 拆分批次（按批次号稳定顺序）=====
    let mut ordered: Vec<&Batch> = batches.iter().collect();
    ordered.sort_by(|a, b| (&a.code, &a.id).cmp(&(&b.code, &b.id)));
    for batch in ordered {
        let Some(expected) = batch.volume else {
            continue;
        };
        let Some(plan) = SplitResolver::resolve(batch) else {
            continue;
        };
        let parts: Option<Vec<f64>> = plan.children.iter().map(|c| c.link.lot.volume).collect();
        let Some(parts) = parts else {
            continue;
        };
        let actual: f64 = parts.iter().sum();
        if exceeds(expected, actual, tolerance_pct) {
            tracing::warn!(
                batch_code = %batch.code,
                expected,
                actual,
                "拆分批次体积不守恒"
            );
            warnings.push(ReconcileWarning::VolumeMismatch {
                subject: ConservationSubject::SplitBatch,
                id: batch.id.clone(),
                expected,
                actual,
            });
        }
    }

    warnings
}

/// 相对偏差是否超出容差
fn exceeds(expected: f64, actual: f64, tolerance_pct: f64) -> bool {
    (actual - expected).abs() > expected.abs() * tolerance_pct
}
