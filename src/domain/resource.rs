// ==========================================
// 酿造生命周期对账引擎 - 设备领域模型
// ==========================================
// 用途: 只读查找表（糖化间/发酵罐/储酒罐）
// ==========================================

use crate::domain::types::ResourceCategory;
use serde::{Deserialize, Serialize};

// ==========================================
// Resource - 物理容器
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub capacity: Option<f64>,
    pub category: ResourceCategory,
}

impl Resource {
    pub fn new(id: &str, name: &str, category: ResourceCategory) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            capacity: None,
            category,
        }
    }
}
