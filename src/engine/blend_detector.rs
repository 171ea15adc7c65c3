// ==========================================
// 酿造生命周期对账引擎 - 混酿识别器
// ==========================================
// 职责: 按阶段组构建 lot → 引用批次 映射，识别被 ≥2 个批次引用的混酿酒批
// 阶段组: {CONDITIONING, BRIGHT, READY, PACKAGING} 与 {FERMENTATION}
// 规则:
//   - 成员按稳定键排序（创建日 → 批次号 → id），与快照顺序无关
//   - 排序后首个成员负责渲染合并事件，其余成员在该阶段组不出事件
//   - 起源批次 = 只有这一个酒批的成员，仅它可渲染共享酒批的组外历史
// ==========================================

use crate::domain::batch::{Batch, BatchLot, Lot, TankAssignment};
use crate::domain::types::PhaseGroup;
use crate::engine::date_resolver::DateResolver;
use crate::engine::lot_history::ordered_assignments;
use std::collections::{BTreeMap, BTreeSet};

// ==========================================
// BlendMember - 混酿成员
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct BlendMember<'a> {
    pub batch: &'a Batch,
    pub link: &'a BatchLot,
}

impl<'a> BlendMember<'a> {
    /// 成员贡献体积: 关联贡献量 → 占比 × 酒批体积 → 批次目标体积
    pub fn contribution(&self) -> Option<f64> {
        self.link
            .volume_contribution
            .or_else(|| {
                let pct = self.link.batch_percentage?;
                Some(self.link.lot.volume? * pct / 100.0)
            })
            .or(self.batch.volume)
    }
}

// ==========================================
// BlendLot - 一个阶段组内的混酿酒批
// ==========================================
#[derive(Debug, Clone)]
pub struct BlendLot<'a> {
    pub group: PhaseGroup,
    /// 渲染成员持有的酒批副本
    pub lot: &'a Lot,
    /// 已按稳定键排序
    pub members: Vec<BlendMember<'a>>,
    /// 起源成员在 members 中的下标
    pub origin: Option<usize>,
    /// 代表该混酿的分配记录
    pub representative: Option<&'a TankAssignment>,
}

impl<'a> BlendLot<'a> {
    pub fn lot_id(&self) -> &'a str {
        self.lot.id.as_str()
    }

    pub fn renderer(&self) -> &BlendMember<'a> {
        &self.members[0]
    }

    pub fn is_renderer(&self, batch_id: &str) -> bool {
        self.renderer().batch.id == batch_id
    }

    pub fn origin_batch(&self) -> Option<&'a Batch> {
        self.origin.map(|i| self.members[i].batch)
    }

    pub fn member_codes(&self) -> Vec<&'a str> {
        self.members.iter().map(|m| m.batch.code.as_str()).collect()
    }

    pub fn batch_ids(&self) -> Vec<String> {
        self.members.iter().map(|m| m.batch.id.clone()).collect()
    }

    /// 合并标签: "B1 + B2"，酒批带 BLEND- 编码时加前缀
    pub fn label(&self) -> String {
        let joined = self.member_codes().join(" + ");
        if self.lot.has_blend_code() {
            format!("{}: {}", self.lot.code, joined)
        } else {
            joined
        }
    }

    /// 合并配方标签: 成员配方去重并集
    pub fn recipe_label(&self) -> Option<String> {
        let mut seen = BTreeSet::new();
        let names: Vec<&str> = self
            .members
            .iter()
            .filter_map(|m| m.batch.recipe_name.as_deref())
            .filter(|n| seen.insert(*n))
            .collect();
        if names.is_empty() {
            None
        } else {
            Some(names.join(" + "))
        }
    }

    /// 合并体积: 成员贡献之和，均缺失时取酒批记录体积
    pub fn total_volume(&self) -> Option<f64> {
        let parts: Vec<f64> = self.members.iter().filter_map(|m| m.contribution()).collect();
        if parts.is_empty() {
            self.lot.volume
        } else {
            Some(parts.iter().sum())
        }
    }
}

// ==========================================
// BlendIndex - 混酿分组表（第一遍构建，之后只读）
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct BlendIndex<'a> {
    /// 阶段组 → lot id → 混酿
    blends: BTreeMap<PhaseGroup, BTreeMap<&'a str, BlendLot<'a>>>,
}

impl<'a> BlendIndex<'a> {
    /// 构建混酿分组表
    pub fn build(batches: &'a [Batch], dates: &DateResolver) -> Self {
        // lot → 引用它的 (批次, 关联)，按阶段组分开
        let mut refs: BTreeMap<(PhaseGroup, &'a str), Vec<BlendMember<'a>>> = BTreeMap::new();

        for batch in batches.iter().filter(|b| !b.is_synthetic_blend()) {
            for link in &batch.lots {
                for group in PhaseGroup::ALL {
                    if !batch_references_in_group(batch, &link.lot, group) {
                        continue;
                    }
                    let members = refs.entry((group, link.lot.id.as_str())).or_default();
                    if !members.iter().any(|m| m.batch.id == batch.id) {
                        members.push(BlendMember { batch, link });
                    }
                }
            }
        }

        let mut blends: BTreeMap<PhaseGroup, BTreeMap<&'a str, BlendLot<'a>>> = BTreeMap::new();
        for ((group, lot_id), mut members) in refs {
            if members.len() < 2 {
                continue;
            }
            members.sort_by_cached_key(|m| member_sort_key(m.batch, dates));
            let blend = Self::assemble(group, members, dates);
            tracing::debug!(
                lot_id,
                group = %group,
                members = ?blend.member_codes(),
                origin = ?blend.origin_batch().map(|b| b.code.as_str()),
                "识别到混酿酒批"
            );
            blends.entry(group).or_default().insert(lot_id, blend);
        }

        Self { blends }
    }

    fn assemble(
        group: PhaseGroup,
        members: Vec<BlendMember<'a>>,
        dates: &DateResolver,
    ) -> BlendLot<'a> {
        let link: &'a BatchLot = members[0].link;
        let lot = &link.lot;

        // 起源批次: 从未拥有独立酒批（唯一酒批即共享酒批）
        let origin = members.iter().position(|m| m.batch.lots.len() == 1);

        // 代表分配: 组内 ACTIVE 优先，否则组内第一条
        let in_group: Vec<&'a TankAssignment> = ordered_assignments(lot, dates)
            .into_iter()
            .filter(|a| a.phase.is_some_and(|p| group.contains(p)))
            .collect();
        let representative = in_group
            .iter()
            .find(|a| a.is_active())
            .or_else(|| in_group.first())
            .copied();

        BlendLot {
            group,
            lot,
            members,
            origin,
            representative,
        }
    }

    pub fn get(&self, lot_id: &str, group: PhaseGroup) -> Option<&BlendLot<'a>> {
        self.blends.get(&group)?.get(lot_id)
    }

    /// 批次参与的全部混酿
    pub fn blends_of_batch(&self, batch_id: &str) -> Vec<&BlendLot<'a>> {
        self.iter()
            .filter(|b| b.members.iter().any(|m| m.batch.id == batch_id))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlendLot<'a>> {
        self.blends.values().flat_map(|by_lot| by_lot.values())
    }
}

/// 批次是否在阶段组内引用该酒批
///
/// 发酵组额外要求: 该批次没有其他带发酵证据的酒批。
/// 每个批次只发酵一次，自有发酵酒批的成员不计入共享酒批上起源批次的发酵历史
fn batch_references_in_group(batch: &Batch, lot: &Lot, group: PhaseGroup) -> bool {
    if !references_in_group(lot, group) {
        return false;
    }
    match group {
        PhaseGroup::Fermentation => !batch
            .lots
            .iter()
            .any(|other| other.lot.id != lot.id && references_in_group(&other.lot, group)),
        PhaseGroup::PostFermentation => true,
    }
}

/// 酒批在阶段组内是否有证据: 有组内分配记录；无分配记录时看酒批阶段
fn references_in_group(lot: &Lot, group: PhaseGroup) -> bool {
    if lot.assignments.iter().any(|a| a.phase.is_some()) {
        lot.assignments
            .iter()
            .any(|a| a.phase.is_some_and(|p| group.contains(p)))
    } else {
        lot.phase.is_some_and(|p| group.contains(p))
    }
}

/// 成员稳定排序键: 创建日（缺失排后）→ 批次号 → id
fn member_sort_key(batch: &Batch, dates: &DateResolver) -> (bool, Option<chrono::NaiveDate>, String, String) {
    let created = dates.day_of(batch.created_at.as_ref());
    (created.is_none(), created, batch.code.clone(), batch.id.clone())
}
