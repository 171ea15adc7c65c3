// ==========================================
// 酿造生命周期对账引擎 - 占用事件合成器
// ==========================================
// 职责: 第二遍纯折叠，按批次分类输出设备占用事件（时间线上每根条形一条）
// 输入: 第一遍构建的只读表（BlendIndex / BatchCases）+ 日期/设备解析器
// 输出: 去重（确定性 ID）并按 (泳道, 设备, 开始, ID) 排序的事件列表
// 红线: 设备无法解析的事件丢弃并记录，不渲染空设备
// ==========================================

use crate::domain::batch::{Batch, BatchLot, DateValue, Lot, TankAssignment};
use crate::domain::occupancy::{EventSource, ResourceOccupancyEvent};
use crate::domain::resource::Resource;
use crate::domain::types::{BatchPhase, LotPhase, PhaseGroup};
use crate::engine::batch_case::{BatchCase, BatchCases};
use crate::engine::blend_detector::{BlendIndex, BlendLot};
use crate::engine::date_resolver::{DateResolver, EndRequest};
use crate::engine::lot_history::{is_historical_assignment, is_historical_event, ordered_assignments};
use crate::engine::resource_resolver::{ResourceRefs, ResourceResolver};
use crate::engine::split_resolver::{SplitPlan, SplitResolver};
use crate::engine::unitank_merger::{PlacedAssignment, UnitankMerger, UnitankRun};
use chrono::NaiveDateTime;
use std::collections::BTreeSet;

// ==========================================
// 合成输出
// ==========================================

/// 因设备无法解析而丢弃的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedEvent {
    pub event_id: String,
    pub label: String,
}

#[derive(Debug, Clone, Default)]
pub struct SynthesisOutput {
    pub events: Vec<ResourceOccupancyEvent>,
    pub dropped: Vec<DroppedEvent>,
}

impl SynthesisOutput {
    fn emit(&mut self, resource: Option<&Resource>, draft: EventDraft) {
        match resource {
            Some(resource) => self.events.push(draft.place(resource)),
            None => {
                tracing::debug!(event_id = %draft.id, label = %draft.label, "设备无法解析，丢弃事件");
                self.dropped.push(DroppedEvent {
                    event_id: draft.id,
                    label: draft.label,
                });
            }
        }
    }

    /// 按确定性 ID 去重（先到先得），再按泳道顺序排序
    fn finish(mut self) -> Self {
        let mut seen = BTreeSet::new();
        self.events.retain(|e| seen.insert(e.id.clone()));
        self.events.sort_by(|a, b| {
            (a.lane, &a.resource_id, a.start, &a.id).cmp(&(b.lane, &b.resource_id, b.start, &b.id))
        });

        let mut seen = BTreeSet::new();
        self.dropped.retain(|d| seen.insert(d.event_id.clone()));
        self.dropped.sort_by(|a, b| a.event_id.cmp(&b.event_id));
        self
    }
}

/// 设备确定之前的事件草稿
#[derive(Debug, Clone)]
struct EventDraft {
    id: String,
    label: String,
    recipe_label: Option<String>,
    phase: BatchPhase,
    start: NaiveDateTime,
    end: NaiveDateTime,
    is_historical: bool,
    is_blend: bool,
    is_split_lot: bool,
    is_unitank: bool,
    lot: Option<(String, String)>, // (lot id, lot code)
    batch_ids: Vec<String>,
    volume: Option<f64>,
    source: EventSource,
}

impl EventDraft {
    fn place(self, resource: &Resource) -> ResourceOccupancyEvent {
        let (lot_id, lot_code) = match self.lot {
            Some((id, code)) => (Some(id), Some(code)),
            None => (None, None),
        };
        ResourceOccupancyEvent {
            id: self.id,
            resource_id: resource.id.clone(),
            resource_name: resource.name.clone(),
            lane: resource.category,
            start: self.start,
            end: self.end,
            label: self.label,
            recipe_label: self.recipe_label,
            phase: self.phase,
            is_historical: self.is_historical,
            is_blend: self.is_blend,
            is_split_lot: self.is_split_lot,
            is_unitank: self.is_unitank,
            lot_id,
            lot_code,
            batch_ids: self.batch_ids,
            volume: self.volume,
            source: self.source,
        }
    }
}

fn lot_key(lot: &Lot) -> Option<(String, String)> {
    Some((lot.id.clone(), lot.code.clone()))
}

// ==========================================
// EventSynthesizer - 占用事件合成器
// ==========================================
pub struct EventSynthesizer<'a> {
    dates: &'a DateResolver,
    resources: &'a ResourceResolver<'a>,
    blends: &'a BlendIndex<'a>,
    cases: &'a BatchCases<'a>,
}

impl<'a> EventSynthesizer<'a> {
    pub fn new(
        dates: &'a DateResolver,
        resources: &'a ResourceResolver<'a>,
        blends: &'a BlendIndex<'a>,
        cases: &'a BatchCases<'a>,
    ) -> Self {
        Self {
            dates,
            resources,
            blends,
            cases,
        }
    }

    /// 合成全部事件
    ///
    /// 批次按 (批次号, id) 稳定顺序处理，输出与快照顺序无关
    pub fn synthesize(&self, batches: &'a [Batch]) -> SynthesisOutput {
        let mut ordered: Vec<&'a Batch> = batches.iter().collect();
        ordered.sort_by(|a, b| (&a.code, &a.id).cmp(&(&b.code, &b.id)));

        let mut out = SynthesisOutput::default();
        for batch in ordered {
            self.batch_events(batch, &mut out);
        }
        out.finish()
    }

    fn batch_events(&self, batch: &'a Batch, out: &mut SynthesisOutput) {
        let Some(case) = self.cases.get(&batch.id) else {
            return;
        };
        let label_override = match case {
            BatchCase::SyntheticBlend { label } => Some(label.as_str()),
            _ => None,
        };

        match case {
            BatchCase::Skipped => {}
            // 酿造日与无酒批记录的批次: 批次级单一事件
            _ if batch.phase.is_brew_day() || batch.lots.is_empty() => {
                self.batch_level_event(batch, label_override, out);
            }
            BatchCase::Split { plan, blend_label } => {
                self.split_events(batch, plan, *blend_label, out);
            }
            // 起源批次的唯一酒批即共享酒批，由它输出共享酒批的组外历史
            BatchCase::BlendOrigin => {
                for link in &batch.lots {
                    self.lot_events(batch, link, None, None, true, out);
                }
            }
            BatchCase::Simple | BatchCase::SyntheticBlend { .. } | BatchCase::BlendMember => {
                for link in &batch.lots {
                    self.lot_events(batch, link, label_override, None, false, out);
                }
            }
        }
    }

    // ==========================================
    // 批次级 / 酒批级事件
    // ==========================================

    fn batch_level_event(&self, batch: &'a Batch, label: Option<&str>, out: &mut SynthesisOutput) {
        let phase = batch.phase;
        let resource = self.resources.resolve(&ResourceRefs::of_batch(batch), phase);
        let start = self
            .dates
            .resolve_start(None, batch_phase_start(batch), &fallback_dates(batch));
        let req = EndRequest {
            phase,
            owner_completed: batch.is_completed(),
            completed_at: batch.completed_at.as_ref(),
            estimated_end: batch.estimated_end.as_ref(),
            ..Default::default()
        };
        let end = self.dates.resolve_end(&req, start);

        out.emit(
            resource,
            EventDraft {
                id: format!("batch:{}", batch.id),
                label: label.unwrap_or(&batch.code).to_string(),
                recipe_label: batch.recipe_name.clone(),
                phase,
                start,
                end,
                is_historical: batch.is_completed(),
                is_blend: false,
                is_split_lot: false,
                is_unitank: false,
                lot: None,
                batch_ids: vec![batch.id.clone()],
                volume: batch.volume,
                source: EventSource::Batch,
            },
        );
    }

    /// 无罐位分配记录的酒批: 取批次设备字段 + 酒批阶段
    fn lot_level_event(
        &self,
        batch: &'a Batch,
        link: &'a BatchLot,
        label: String,
        split_child: bool,
        out: &mut SynthesisOutput,
    ) {
        let lot = &link.lot;
        let phase = lot
            .phase
            .map(|p| p.as_batch_phase())
            .unwrap_or(batch.phase);
        let resource = self.resources.resolve(&ResourceRefs::of_batch(batch), phase);
        let start = self
            .dates
            .resolve_start(None, batch.phase_started_at(phase), &fallback_dates(batch));
        let owner_completed = batch.is_completed() || !lot.is_active();
        let req = EndRequest {
            phase,
            owner_completed,
            completed_at: lot.completed_at.as_ref().or(batch.completed_at.as_ref()),
            estimated_end: estimated_end_for(batch, phase),
            ..Default::default()
        };
        let end = self.dates.resolve_end(&req, start);

        out.emit(
            resource,
            EventDraft {
                id: format!("lot:{}", lot.id),
                label,
                recipe_label: batch.recipe_name.clone(),
                phase,
                start,
                end,
                is_historical: owner_completed,
                is_blend: false,
                is_split_lot: split_child,
                is_unitank: false,
                lot: lot_key(lot),
                batch_ids: vec![batch.id.clone()],
                volume: lot_volume(batch, link, true),
                source: EventSource::Lot,
            },
        );
    }

    // ==========================================
    // 普通酒批 / 混酿共享酒批
    // ==========================================

    /// 单个酒批的事件；共享酒批走混酿规则
    ///
    /// is_origin: 批次是该共享酒批的起源批次
    fn lot_events(
        &self,
        batch: &'a Batch,
        link: &'a BatchLot,
        label: Option<&str>,
        split_suffix: Option<char>,
        is_origin: bool,
        out: &mut SynthesisOutput,
    ) {
        let shared: Vec<&BlendLot<'a>> = PhaseGroup::ALL
            .iter()
            .filter_map(|g| self.blends.get(&link.lot.id, *g))
            .collect();

        if shared.is_empty() {
            self.plain_lot_events(batch, link, label.unwrap_or(&batch.code), split_suffix, out);
        } else {
            self.shared_lot_events(batch, link, &shared, is_origin, out);
        }
    }

    /// 非共享酒批: 同罐合并，否则逐条分配
    fn plain_lot_events(
        &self,
        batch: &'a Batch,
        link: &'a BatchLot,
        label: &str,
        split_suffix: Option<char>,
        out: &mut SynthesisOutput,
    ) {
        let lot = &link.lot;
        let assignments = ordered_assignments(lot, self.dates);
        if assignments.is_empty() {
            self.lot_level_event(batch, link, label.to_string(), split_suffix.is_some(), out);
            return;
        }

        let mut placed = Vec::with_capacity(assignments.len());
        for a in assignments {
            let phase = assignment_phase(batch, lot, a);
            let start = self.assignment_start(batch, a, phase);
            match self.resources.resolve(&assignment_refs(batch, a), phase) {
                Some(resource) => placed.push(PlacedAssignment {
                    assignment: a,
                    resource,
                    start,
                }),
                None => out.emit(None, self.assignment_draft(batch, link, a, label.to_string(), start)),
            }
        }

        // 拆分子批逐条出事件，不做同罐合并
        if split_suffix.is_none() {
            if let Some(run) = UnitankMerger::detect(lot, &placed) {
                self.unitank_event(batch, link, &run, label, out);
                return;
            }
        }

        for p in placed {
            let mut draft = self.assignment_draft(batch, link, p.assignment, label.to_string(), p.start);
            if split_suffix.is_some() {
                draft.is_split_lot = true;
                draft.volume = lot_volume(batch, link, false);
            }
            out.emit(Some(p.resource), draft);
        }
    }

    fn unitank_event(
        &self,
        batch: &'a Batch,
        link: &'a BatchLot,
        run: &UnitankRun<'a>,
        label: &str,
        out: &mut SynthesisOutput,
    ) {
        let lot = &link.lot;
        let anchor = run.anchor;
        let phase = assignment_phase(batch, lot, anchor.assignment);
        let end = self.assignment_end(batch, lot, anchor.assignment, phase, anchor.start);

        out.emit(
            Some(run.resource),
            EventDraft {
                id: format!("unitank:{}", lot.id),
                label: label.to_string(),
                recipe_label: batch.recipe_name.clone(),
                phase,
                start: run.start,
                end,
                is_historical: run.all_historical || batch.is_completed() || !lot.is_active(),
                is_blend: false,
                is_split_lot: false,
                is_unitank: true,
                lot: lot_key(lot),
                batch_ids: vec![batch.id.clone()],
                volume: lot_volume(batch, link, true),
                source: EventSource::Unitank,
            },
        );
    }

    /// 共享酒批: 组内只由渲染成员出合并事件
    ///
    /// 组外历史归起源批次；混酿没有起源批次时由渲染成员兜底
    fn shared_lot_events(
        &self,
        batch: &'a Batch,
        link: &'a BatchLot,
        shared: &[&BlendLot<'a>],
        is_origin: bool,
        out: &mut SynthesisOutput,
    ) {
        for blend in shared.iter().filter(|b| b.is_renderer(&batch.id)) {
            self.blend_event(blend, out);
        }

        let owns_history =
            is_origin || (shared[0].origin.is_none() && shared[0].is_renderer(&batch.id));
        if !owns_history {
            return;
        }

        let lot = &link.lot;
        let in_shared_group = |phase: Option<LotPhase>| {
            phase.is_some_and(|p| shared.iter().any(|b| b.group.contains(p)))
        };
        for a in ordered_assignments(lot, self.dates) {
            if in_shared_group(a.phase.or(lot.phase)) {
                continue;
            }
            let phase = assignment_phase(batch, lot, a);
            let start = self.assignment_start(batch, a, phase);
            let resource = self.resources.resolve(&assignment_refs(batch, a), phase);
            out.emit(
                resource,
                self.assignment_draft(batch, link, a, batch.code.clone(), start),
            );
        }
    }

    fn blend_event(&self, blend: &BlendLot<'a>, out: &mut SynthesisOutput) {
        let lead = blend.renderer().batch;
        let lot = blend.lot;
        let representative = blend.representative;

        let phase = representative
            .and_then(|a| a.phase)
            .or(lot.phase.filter(|p| blend.group.contains(*p)))
            .map(|p| p.as_batch_phase())
            .unwrap_or(match blend.group {
                PhaseGroup::Fermentation => BatchPhase::Fermenting,
                PhaseGroup::PostFermentation => BatchPhase::Conditioning,
            });

        let refs = match representative {
            Some(a) => assignment_refs(lead, a),
            None => ResourceRefs::of_batch(lead),
        };
        let resource = self.resources.resolve(&refs, phase);

        let start = self.dates.resolve_start(
            representative.and_then(|a| a.planned_start.as_ref()),
            lead.phase_started_at(phase),
            &fallback_dates(lead),
        );
        let all_members_completed = blend.members.iter().all(|m| m.batch.is_completed());
        let owner_completed = all_members_completed || !lot.is_active();
        let assignment_completed = representative.is_some_and(|a| is_historical_assignment(lot, a));
        let req = EndRequest {
            phase,
            owner_completed,
            completed_at: lot.completed_at.as_ref().or(lead.completed_at.as_ref()),
            assignment_completed,
            actual_end: representative.and_then(|a| a.actual_end.as_ref()),
            next_phase_start: lead.next_phase_started_at(phase),
            updated_at: representative.and_then(|a| a.updated_at.as_ref()),
            planned_end: representative.and_then(|a| a.planned_end.as_ref()),
            estimated_end: estimated_end_for(lead, phase),
        };
        let end = self.dates.resolve_end(&req, start);

        out.emit(
            resource,
            EventDraft {
                id: format!("blend:{}:{}", lot.id, blend.group),
                label: blend.label(),
                recipe_label: blend.recipe_label(),
                phase,
                start,
                end,
                is_historical: owner_completed || assignment_completed,
                is_blend: true,
                is_split_lot: false,
                is_unitank: false,
                lot: lot_key(lot),
                batch_ids: blend.batch_ids(),
                volume: blend.total_volume(),
                source: EventSource::Blend,
            },
        );
    }

    // ==========================================
    // 拆分批次
    // ==========================================

    fn split_events(
        &self,
        batch: &'a Batch,
        plan: &SplitPlan<'a>,
        blend_label: Option<&str>,
        out: &mut SynthesisOutput,
    ) {
        // 母批: 只输出已完成的发酵历史，归属整个批次
        for parent in plan.parents.iter().copied() {
            for a in SplitResolver::parent_history(&parent.lot) {
                let phase = assignment_phase(batch, &parent.lot, a);
                let start = self.assignment_start(batch, a, phase);
                let resource = self.resources.resolve(&assignment_refs(batch, a), phase);
                let mut draft = self.assignment_draft(batch, parent, a, batch.code.clone(), start);
                draft.is_historical = true;
                draft.volume = batch.volume;
                draft.source = EventSource::SplitHistory;
                out.emit(resource, draft);
            }
        }

        for child in &plan.children {
            let label = SplitResolver::child_label(batch, child.suffix, blend_label);
            self.lot_events(batch, child.link, Some(label.as_str()), Some(child.suffix), false, out);
        }

        for link in plan.others.iter().copied() {
            self.lot_events(batch, link, blend_label, None, false, out);
        }
    }

    // ==========================================
    // 单条分配
    // ==========================================

    fn assignment_start(&self, batch: &Batch, a: &TankAssignment, phase: BatchPhase) -> NaiveDateTime {
        self.dates.resolve_start(
            a.planned_start.as_ref(),
            batch.phase_started_at(phase),
            &fallback_dates(batch),
        )
    }

    fn assignment_end(
        &self,
        batch: &Batch,
        lot: &Lot,
        a: &TankAssignment,
        phase: BatchPhase,
        start: NaiveDateTime,
    ) -> NaiveDateTime {
        let req = EndRequest {
            phase,
            owner_completed: batch.is_completed() || !lot.is_active(),
            completed_at: lot.completed_at.as_ref().or(batch.completed_at.as_ref()),
            assignment_completed: is_historical_assignment(lot, a),
            actual_end: a.actual_end.as_ref(),
            next_phase_start: batch.next_phase_started_at(phase),
            updated_at: a.updated_at.as_ref(),
            planned_end: a.planned_end.as_ref(),
            estimated_end: estimated_end_for(batch, phase),
        };
        self.dates.resolve_end(&req, start)
    }

    fn assignment_draft(
        &self,
        batch: &Batch,
        link: &BatchLot,
        a: &TankAssignment,
        label: String,
        start: NaiveDateTime,
    ) -> EventDraft {
        let lot = &link.lot;
        let phase = assignment_phase(batch, lot, a);
        EventDraft {
            id: format!("asg:{}", a.id),
            label,
            recipe_label: batch.recipe_name.clone(),
            phase,
            start,
            end: self.assignment_end(batch, lot, a, phase, start),
            is_historical: is_historical_event(batch, lot, a),
            is_blend: false,
            is_split_lot: false,
            is_unitank: false,
            lot: lot_key(lot),
            batch_ids: vec![batch.id.clone()],
            volume: lot_volume(batch, link, true),
            source: EventSource::Assignment,
        }
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 分配阶段: 分配记录 → 酒批阶段 → 批次阶段
fn assignment_phase(batch: &Batch, lot: &Lot, a: &TankAssignment) -> BatchPhase {
    a.phase
        .or(lot.phase)
        .map(|p| p.as_batch_phase())
        .unwrap_or(batch.phase)
}

/// 分配的设备引用；未完成且未记录设备的分配沿用批次的当前设备字段
fn assignment_refs<'b>(batch: &'b Batch, a: &'b TankAssignment) -> ResourceRefs<'b> {
    let own = ResourceRefs::of_assignment(a);
    if a.is_completed() || own.current_tank_id.is_some() || own.tank_name.is_some() {
        own
    } else {
        ResourceRefs::of_batch(batch)
    }
}

/// 开始兜底的末段: 批次计划日期 → 创建时间
fn fallback_dates(batch: &Batch) -> [Option<&DateValue>; 2] {
    [batch.planned_date.as_ref(), batch.created_at.as_ref()]
}

/// 批次级事件的阶段开始；已完成批次取最后一个有记录的阶段开始
fn batch_phase_start(batch: &Batch) -> Option<&DateValue> {
    if !batch.is_completed() {
        return batch.phase_started_at(batch.phase);
    }
    [
        BatchPhase::Packaging,
        BatchPhase::Ready,
        BatchPhase::Conditioning,
        BatchPhase::Fermenting,
        BatchPhase::Brewing,
    ]
    .into_iter()
    .find_map(|p| batch.phase_started_at(p))
}

/// 预计结束只作用于批次当前阶段
fn estimated_end_for(batch: &Batch, phase: BatchPhase) -> Option<&DateValue> {
    if batch.phase == phase {
        batch.estimated_end.as_ref()
    } else {
        None
    }
}

/// 事件体积: 酒批体积 → 本批次贡献量 → (可选) 批次目标体积
fn lot_volume(batch: &Batch, link: &BatchLot, batch_fallback: bool) -> Option<f64> {
    link.lot
        .volume
        .or(link.volume_contribution)
        .or(if batch_fallback { batch.volume } else { None })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::domain::types::{AssignmentStatus, LotStatus, ResourceCategory};
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn resources() -> Vec<Resource> {
        vec![
            Resource::new("BH1", "Brewhouse", ResourceCategory::Brewhouse),
            Resource::new("T1", "FV 1", ResourceCategory::Fermenter),
            Resource::new("T2", "BBT 2", ResourceCategory::Conditioning),
            Resource::new("T5", "Unitank 5", ResourceCategory::Fermenter),
        ]
    }

    fn asg(id: &str, phase: LotPhase, status: AssignmentStatus, tank: &str, start: &str) -> TankAssignment {
        TankAssignment {
            id: id.to_string(),
            phase: Some(phase),
            status,
            planned_start: Some(DateValue::from(start)),
            resource_id: Some(tank.to_string()),
            ..Default::default()
        }
    }

    fn lot(id: &str, code: &str, phase: LotPhase, assignments: Vec<TankAssignment>) -> BatchLot {
        BatchLot {
            lot: Lot {
                id: id.to_string(),
                code: code.to_string(),
                phase: Some(phase),
                status: LotStatus::Active,
                assignments,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn batch(id: &str, code: &str, phase: BatchPhase, lots: Vec<BatchLot>) -> Batch {
        Batch {
            id: id.to_string(),
            code: code.to_string(),
            phase,
            volume: Some(20.0),
            lots,
            ..Default::default()
        }
    }

    fn run(batches: &[Batch]) -> SynthesisOutput {
        let res = resources();
        let dates = DateResolver::new(&EngineConfig::default(), today());
        let resolver = ResourceResolver::new(&res);
        let blends = BlendIndex::build(batches, &dates);
        let cases = BatchCases::build(batches, &blends);
        EventSynthesizer::new(&dates, &resolver, &blends, &cases).synthesize(batches)
    }

    #[test]
    fn test_brew_day_batch_renders_on_brewhouse() {
        let mut b = batch("b1", "B1", BatchPhase::Brewing, vec![]);
        b.brewed_at = Some(DateValue::from("2025-03-09"));
        let out = run(&[b]);

        assert_eq!(out.events.len(), 1);
        let e = &out.events[0];
        assert_eq!(e.id, "batch:b1");
        assert_eq!(e.resource_id, "BH1");
        assert_eq!(e.source, EventSource::Batch);
        assert_eq!((e.end - e.start).num_days(), 1);
    }

    #[test]
    fn test_unresolved_resource_is_dropped_and_reported() {
        let b = batch(
            "b1",
            "B1",
            BatchPhase::Fermenting,
            vec![lot(
                "l1",
                "L1",
                LotPhase::Fermentation,
                vec![asg("a1", LotPhase::Fermentation, AssignmentStatus::Active, "GONE", "2025-03-01")],
            )],
        );
        let out = run(&[b]);
        assert!(out.events.is_empty());
        assert_eq!(
            out.dropped,
            vec![DroppedEvent {
                event_id: "asg:a1".to_string(),
                label: "B1".to_string()
            }]
        );
    }

    #[test]
    fn test_origin_renders_pre_blend_history_once() {
        let shared = || {
            lot(
                "L",
                "L",
                LotPhase::Conditioning,
                vec![
                    asg("a-ferm", LotPhase::Fermentation, AssignmentStatus::Completed, "T1", "2025-02-01"),
                    asg("a-cond", LotPhase::Conditioning, AssignmentStatus::Active, "T2", "2025-02-15"),
                ],
            )
        };
        let own = lot(
            "l2",
            "L2",
            LotPhase::Conditioning,
            vec![asg("a-own", LotPhase::Fermentation, AssignmentStatus::Completed, "T5", "2025-02-01")],
        );
        let batches = vec![
            batch("b2", "B2", BatchPhase::Conditioning, vec![own, shared()]),
            batch("b1", "B1", BatchPhase::Conditioning, vec![shared()]),
        ];
        let out = run(&batches);

        let ids: Vec<&str> = out.events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["asg:a-ferm", "asg:a-own", "blend:L:POST_FERMENTATION"]);

        let blend = out.events.iter().find(|e| e.is_blend).unwrap();
        assert_eq!(blend.label, "B1 + B2");
        assert_eq!(blend.resource_id, "T2");
        assert_eq!(blend.batch_ids, vec!["b1", "b2"]);
        assert!(!blend.is_historical);

        let history = out.events.iter().find(|e| e.id == "asg:a-ferm").unwrap();
        assert_eq!(history.label, "B1");
        assert!(history.is_historical);
    }

    #[test]
    fn test_split_parent_without_history_renders_only_children() {
        let mut split = batch(
            "b3",
            "B3",
            BatchPhase::Conditioning,
            vec![
                lot("l3", "L3", LotPhase::Fermentation, vec![]),
                lot(
                    "l3a",
                    "L3-A",
                    LotPhase::Conditioning,
                    vec![asg("a3a", LotPhase::Conditioning, AssignmentStatus::Active, "T2", "2025-03-01")],
                ),
            ],
        );
        split.is_split = true;
        let out = run(&[split]);

        assert_eq!(out.events.len(), 1);
        assert_eq!(out.events[0].label, "B3-A");
        assert!(out.events[0].is_split_lot);
    }

    #[test]
    fn test_lot_without_assignments_uses_batch_resource() {
        let mut b = batch(
            "b1",
            "B1",
            BatchPhase::Conditioning,
            vec![lot("l1", "L1", LotPhase::Conditioning, vec![])],
        );
        b.current_tank_id = Some("T2".to_string());
        let out = run(&[b]);

        assert_eq!(out.events.len(), 1);
        assert_eq!(out.events[0].id, "lot:l1");
        assert_eq!(out.events[0].lane, ResourceCategory::Conditioning);
        assert_eq!(out.events[0].phase, BatchPhase::Conditioning);
    }

    #[test]
    fn test_output_sorted_by_lane_then_resource() {
        let b1 = batch(
            "b1",
            "B1",
            BatchPhase::Conditioning,
            vec![lot(
                "l1",
                "L1",
                LotPhase::Conditioning,
                vec![asg("a1", LotPhase::Conditioning, AssignmentStatus::Active, "T2", "2025-03-01")],
            )],
        );
        let b2 = batch(
            "b2",
            "A0",
            BatchPhase::Fermenting,
            vec![lot(
                "l2",
                "L2",
                LotPhase::Fermentation,
                vec![asg("a2", LotPhase::Fermentation, AssignmentStatus::Active, "T1", "2025-03-05")],
            )],
        );
        let b0 = batch("b0", "Z9", BatchPhase::Planned, vec![]);

        let out = run(&[b1, b2, b0]);
        let lanes: Vec<ResourceCategory> = out.events.iter().map(|e| e.lane).collect();
        assert_eq!(
            lanes,
            vec![
                ResourceCategory::Brewhouse,
                ResourceCategory::Fermenter,
                ResourceCategory::Conditioning
            ]
        );
    }
}
