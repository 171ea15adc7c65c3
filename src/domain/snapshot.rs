// ==========================================
// 酿造生命周期对账引擎 - 输入快照
// ==========================================
// 外部数据获取协作方每次刷新提供一份不可变快照
// ==========================================

use crate::domain::batch::Batch;
use crate::domain::resource::Resource;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub batches: Vec<Batch>,
    pub resources: Vec<Resource>,
}

impl Snapshot {
    pub fn new(batches: Vec<Batch>, resources: Vec<Resource>) -> Self {
        Self { batches, resources }
    }

    /// 从 JSON 文本解析快照
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
