// ==========================================
// 酿造生命周期对账引擎 - 设备解析器
// ==========================================
// 优先级: 当前罐位引用 → 通用设备ID → 按罐名查找 → (仅酿造日阶段) 首个糖化间
// 红线: 解析失败返回 None，由调用方丢弃事件（从不渲染空设备）
// ==========================================

use crate::domain::batch::{Batch, TankAssignment};
use crate::domain::resource::Resource;
use crate::domain::types::{BatchPhase, ResourceCategory};
use std::collections::HashMap;

/// 设备引用字段（多个重叠字段）
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceRefs<'a> {
    pub current_tank_id: Option<&'a str>,
    pub equipment_id: Option<&'a str>,
    pub tank_name: Option<&'a str>,
}

impl<'a> ResourceRefs<'a> {
    pub fn of_batch(batch: &'a Batch) -> Self {
        Self {
            current_tank_id: batch.current_tank_id.as_deref(),
            equipment_id: batch.equipment_id.as_deref(),
            tank_name: batch.tank_name.as_deref(),
        }
    }

    pub fn of_assignment(assignment: &'a TankAssignment) -> Self {
        Self {
            current_tank_id: assignment.resource_id.as_deref(),
            equipment_id: None,
            tank_name: assignment.resource_name.as_deref(),
        }
    }
}

/// 命中的解析规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceMatch {
    CurrentTank,
    EquipmentId,
    TankName,
    BrewhouseFallback,
}

// ==========================================
// ResourceResolver - 设备解析器
// ==========================================
pub struct ResourceResolver<'a> {
    by_id: HashMap<&'a str, &'a Resource>,
    by_name: HashMap<String, &'a Resource>,
    first_brewhouse: Option<&'a Resource>,
}

impl<'a> ResourceResolver<'a> {
    /// 构建只读查找表
    pub fn new(resources: &'a [Resource]) -> Self {
        let mut by_id = HashMap::new();
        let mut by_name = HashMap::new();
        for r in resources {
            by_id.entry(r.id.as_str()).or_insert(r);
            by_name.entry(normalize_name(&r.name)).or_insert(r);
        }

        // 与输入顺序无关: 按 id 取最小的糖化间
        let first_brewhouse = resources
            .iter()
            .filter(|r| r.category == ResourceCategory::Brewhouse)
            .min_by(|a, b| a.id.cmp(&b.id));

        Self {
            by_id,
            by_name,
            first_brewhouse,
        }
    }

    /// 按优先级解析设备
    pub fn resolve(&self, refs: &ResourceRefs<'_>, phase: BatchPhase) -> Option<&'a Resource> {
        let (resource, rule) = self.resolve_with_match(refs, phase)?;
        tracing::trace!(resource_id = %resource.id, rule = ?rule, phase = %phase, "设备解析命中");
        Some(resource)
    }

    /// 按优先级解析设备，并返回命中的规则
    pub fn resolve_with_match(
        &self,
        refs: &ResourceRefs<'_>,
        phase: BatchPhase,
    ) -> Option<(&'a Resource, ResourceMatch)> {
        // 1) 当前罐位引用
        if let Some(r) = self.lookup_id(refs.current_tank_id) {
            return Some((r, ResourceMatch::CurrentTank));
        }

        // 2) 通用设备ID
        if let Some(r) = self.lookup_id(refs.equipment_id) {
            return Some((r, ResourceMatch::EquipmentId));
        }

        // 3) 记录了罐名但丢失了ID
        if let Some(r) = refs
            .tank_name
            .map(normalize_name)
            .filter(|n| !n.is_empty())
            .and_then(|n| self.by_name.get(&n).copied())
        {
            return Some((r, ResourceMatch::TankName));
        }

        // 4) 酿造日通常不记录设备 → 首个糖化间
        if phase.is_brew_day() {
            if let Some(r) = self.first_brewhouse {
                return Some((r, ResourceMatch::BrewhouseFallback));
            }
        }

        None
    }

    pub fn get(&self, id: &str) -> Option<&'a Resource> {
        self.by_id.get(id).copied()
    }

    fn lookup_id(&self, id: Option<&str>) -> Option<&'a Resource> {
        let id = id.map(str::trim).filter(|s| !s.is_empty())?;
        self.get(id)
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
