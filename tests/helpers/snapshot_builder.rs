// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================
// 日期约定: day(n) = 2025-03-01 + n 天（Day0 = 2025-03-01）
// ==========================================

use brew_occupancy::domain::{
    AssignmentStatus, Batch, BatchLot, BatchPhase, DateValue, Lot, LotPhase, LotStatus, Resource,
    ResourceCategory, Snapshot, TankAssignment,
};
use brew_occupancy::{EngineConfig, ReconcileEngine, ReconcileResult};
use chrono::{Duration, NaiveDate, NaiveDateTime};

// ==========================================
// 日期辅助
// ==========================================

pub fn day(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 1).unwrap() + Duration::days(offset)
}

/// 日历日锚定到默认参考小时（12:00）
pub fn at(offset: i64) -> NaiveDateTime {
    day(offset).and_hms_opt(12, 0, 0).unwrap()
}

pub fn date_value(offset: i64) -> DateValue {
    DateValue::Text(day(offset).format("%Y-%m-%d").to_string())
}

// ==========================================
// 设备
// ==========================================

/// 标准酒厂设备表
pub fn brewery() -> Vec<Resource> {
    vec![
        Resource::new("BH1", "Brewhouse 1", ResourceCategory::Brewhouse),
        Resource::new("T1", "FV 1", ResourceCategory::Fermenter),
        Resource::new("T3", "FV 3", ResourceCategory::Fermenter),
        Resource::new("T5", "Unitank 5", ResourceCategory::Fermenter),
        Resource::new("T2", "BBT 2", ResourceCategory::Conditioning),
        Resource::new("T6", "BBT 6", ResourceCategory::Conditioning),
    ]
}

// ==========================================
// TankAssignment 构建器
// ==========================================

pub struct AssignmentBuilder {
    inner: TankAssignment,
}

impl AssignmentBuilder {
    pub fn new(id: &str, phase: LotPhase) -> Self {
        Self {
            inner: TankAssignment {
                id: id.to_string(),
                phase: Some(phase),
                ..Default::default()
            },
        }
    }

    pub fn active(mut self) -> Self {
        self.inner.status = AssignmentStatus::Active;
        self
    }

    pub fn completed(mut self) -> Self {
        self.inner.status = AssignmentStatus::Completed;
        self
    }

    pub fn tank(mut self, resource_id: &str) -> Self {
        self.inner.resource_id = Some(resource_id.to_string());
        self
    }

    pub fn tank_name(mut self, name: &str) -> Self {
        self.inner.resource_name = Some(name.to_string());
        self
    }

    pub fn planned(mut self, start: i64, end: i64) -> Self {
        self.inner.planned_start = Some(date_value(start));
        self.inner.planned_end = Some(date_value(end));
        self
    }

    pub fn planned_start(mut self, start: i64) -> Self {
        self.inner.planned_start = Some(date_value(start));
        self
    }

    pub fn actual_end(mut self, end: i64) -> Self {
        self.inner.actual_end = Some(date_value(end));
        self
    }

    pub fn build(self) -> TankAssignment {
        self.inner
    }
}

// ==========================================
// Lot 构建器（产出批次关联）
// ==========================================

pub struct LotBuilder {
    lot: Lot,
    contribution: Option<f64>,
}

impl LotBuilder {
    pub fn new(id: &str, code: &str) -> Self {
        Self {
            lot: Lot {
                id: id.to_string(),
                code: code.to_string(),
                status: LotStatus::Active,
                ..Default::default()
            },
            contribution: None,
        }
    }

    pub fn phase(mut self, phase: LotPhase) -> Self {
        self.lot.phase = Some(phase);
        self
    }

    pub fn completed(mut self) -> Self {
        self.lot.status = LotStatus::Completed;
        self
    }

    pub fn volume(mut self, volume: f64) -> Self {
        self.lot.volume = Some(volume);
        self
    }

    pub fn contribution(mut self, volume: f64) -> Self {
        self.contribution = Some(volume);
        self
    }

    pub fn assignment(mut self, assignment: TankAssignment) -> Self {
        self.lot.assignments.push(assignment);
        self
    }

    pub fn build(self) -> BatchLot {
        BatchLot {
            lot: self.lot,
            volume_contribution: self.contribution,
            batch_percentage: None,
        }
    }
}

// ==========================================
// Batch 构建器
// ==========================================

pub struct BatchBuilder {
    batch: Batch,
}

impl BatchBuilder {
    pub fn new(id: &str, code: &str) -> Self {
        Self {
            batch: Batch {
                id: id.to_string(),
                code: code.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn phase(mut self, phase: BatchPhase) -> Self {
        self.batch.phase = phase;
        self
    }

    pub fn volume(mut self, volume: f64) -> Self {
        self.batch.volume = Some(volume);
        self
    }

    pub fn recipe(mut self, name: &str) -> Self {
        self.batch.recipe_name = Some(name.to_string());
        self
    }

    pub fn split(mut self) -> Self {
        self.batch.is_split = true;
        self
    }

    pub fn created(mut self, offset: i64) -> Self {
        self.batch.created_at = Some(date_value(offset));
        self
    }

    pub fn brewed(mut self, offset: i64) -> Self {
        self.batch.brewed_at = Some(date_value(offset));
        self
    }

    pub fn packaging_started(mut self, offset: i64) -> Self {
        self.batch.packaging_started_at = Some(date_value(offset));
        self
    }

    pub fn completed_at(mut self, offset: i64) -> Self {
        self.batch.completed_at = Some(date_value(offset));
        self
    }

    pub fn current_tank(mut self, resource_id: &str) -> Self {
        self.batch.current_tank_id = Some(resource_id.to_string());
        self
    }

    pub fn blend_members(mut self, codes: &[&str]) -> Self {
        self.batch.blend_member_codes = codes.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn lot(mut self, link: BatchLot) -> Self {
        self.batch.lots.push(link);
        self
    }

    pub fn build(self) -> Batch {
        self.batch
    }
}

// ==========================================
// 对账辅助
// ==========================================

pub fn snapshot(batches: Vec<Batch>) -> Snapshot {
    Snapshot::new(batches, brewery())
}

pub fn reconcile(batches: Vec<Batch>, today_offset: i64) -> ReconcileResult {
    ReconcileEngine::new(EngineConfig::default()).reconcile(&snapshot(batches), day(today_offset))
}

/// 混合场景快照: 普通 / 混酿 / 拆分 / 同罐 / 酿造日 / 已完成
pub fn mixed_brewery_batches() -> Vec<Batch> {
    let shared = || {
        LotBuilder::new("L-BLEND", "BLEND-1")
            .phase(LotPhase::Conditioning)
            .volume(45.0)
            .assignment(
                AssignmentBuilder::new("a-blend-ferm", LotPhase::Fermentation)
                    .completed()
                    .tank("T3")
                    .planned(0, 12)
                    .actual_end(12)
                    .build(),
            )
            .assignment(
                AssignmentBuilder::new("a-blend-cond", LotPhase::Conditioning)
                    .active()
                    .tank("T2")
                    .planned(12, 19)
                    .build(),
            )
    };

    vec![
        BatchBuilder::new("b-simple", "B100")
            .phase(BatchPhase::Fermenting)
            .volume(20.0)
            .recipe("Pale Ale")
            .lot(
                LotBuilder::new("l-simple", "L100")
                    .phase(LotPhase::Fermentation)
                    .assignment(
                        AssignmentBuilder::new("a-simple", LotPhase::Fermentation)
                            .active()
                            .tank("T1")
                            .planned(0, 14)
                            .build(),
                    )
                    .build(),
            )
            .build(),
        BatchBuilder::new("b-origin", "B200")
            .phase(BatchPhase::Conditioning)
            .volume(20.0)
            .recipe("Stout")
            .created(-5)
            .lot(shared().contribution(20.0).build())
            .build(),
        BatchBuilder::new("b-member", "B201")
            .phase(BatchPhase::Conditioning)
            .volume(25.0)
            .recipe("Porter")
            .created(-4)
            .lot(
                LotBuilder::new("l-member-ferm", "L201")
                    .phase(LotPhase::Fermentation)
                    .completed()
                    .assignment(
                        AssignmentBuilder::new("a-member-ferm", LotPhase::Fermentation)
                            .completed()
                            .tank("T1")
                            .planned(-14, -2)
                            .actual_end(-2)
                            .build(),
                    )
                    .build(),
            )
            .lot(shared().contribution(25.0).build())
            .build(),
        BatchBuilder::new("b-split", "B300")
            .phase(BatchPhase::Conditioning)
            .volume(30.0)
            .split()
            .lot(
                LotBuilder::new("l-split", "L300")
                    .phase(LotPhase::Fermentation)
                    .completed()
                    .assignment(
                        AssignmentBuilder::new("a-split-ferm", LotPhase::Fermentation)
                            .completed()
                            .tank("T3")
                            .planned(-20, -6)
                            .actual_end(-6)
                            .build(),
                    )
                    .build(),
            )
            .lot(
                LotBuilder::new("l-split-a", "L300-A")
                    .phase(LotPhase::Conditioning)
                    .volume(15.0)
                    .assignment(
                        AssignmentBuilder::new("a-split-a", LotPhase::Conditioning)
                            .active()
                            .tank("T6")
                            .planned(-6, 1)
                            .build(),
                    )
                    .build(),
            )
            .lot(
                LotBuilder::new("l-split-b", "L300-B")
                    .phase(LotPhase::Bright)
                    .volume(15.0)
                    .assignment(
                        AssignmentBuilder::new("a-split-b", LotPhase::Bright)
                            .active()
                            .tank("T2")
                            .planned(-6, 8)
                            .build(),
                    )
                    .build(),
            )
            .build(),
        BatchBuilder::new("b-unitank", "B400")
            .phase(BatchPhase::Bright)
            .volume(20.0)
            .lot(
                LotBuilder::new("l-unitank", "L400")
                    .phase(LotPhase::Bright)
                    .assignment(
                        AssignmentBuilder::new("a-u1", LotPhase::Fermentation)
                            .completed()
                            .tank("T5")
                            .planned(-21, -7)
                            .build(),
                    )
                    .assignment(
                        AssignmentBuilder::new("a-u2", LotPhase::Conditioning)
                            .completed()
                            .tank("T5")
                            .planned(-7, 0)
                            .build(),
                    )
                    .assignment(
                        AssignmentBuilder::new("a-u3", LotPhase::Bright)
                            .active()
                            .tank("T5")
                            .planned(0, 7)
                            .build(),
                    )
                    .build(),
            )
            .build(),
        BatchBuilder::new("b-brew", "B500")
            .phase(BatchPhase::Brewing)
            .volume(20.0)
            .brewed(2)
            .build(),
        BatchBuilder::new("b-done", "B050")
            .phase(BatchPhase::Completed)
            .volume(20.0)
            .current_tank("T6")
            .packaging_started(-10)
            .completed_at(-8)
            .build(),
    ]
}
