// ==========================================
// 酿造生命周期对账引擎 - 引擎配置项
// ==========================================
// 所有字段均有默认值，配置文件可只写需要覆写的部分
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::domain::types::BatchPhase;
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// PhaseDurations - 各阶段默认时长（天）
// ==========================================
// 用途: 活动阶段既无计划结束也无预计结束时，start + 默认时长
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseDurations {
    pub brew_day: i64,     // PLANNED / BREWING
    pub fermenting: i64,
    pub conditioning: i64,
    pub bright: i64,       // BRIGHT / READY
    pub packaging: i64,
    pub completed: i64,
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self {
            brew_day: 1,
            fermenting: 14,
            conditioning: 7,
            bright: 7,
            packaging: 1,
            completed: 1,
        }
    }
}

impl PhaseDurations {
    /// 获取阶段默认时长
    pub fn days_for(&self, phase: BatchPhase) -> i64 {
        match phase {
            BatchPhase::Planned | BatchPhase::Brewing => self.brew_day,
            BatchPhase::Fermenting => self.fermenting,
            BatchPhase::Conditioning => self.conditioning,
            BatchPhase::Bright | BatchPhase::Ready => self.bright,
            BatchPhase::Packaging => self.packaging,
            BatchPhase::Completed => self.completed,
        }
    }

    fn entries(&self) -> [(&'static str, i64); 6] {
        [
            ("default_durations.brew_day", self.brew_day),
            ("default_durations.fermenting", self.fermenting),
            ("default_durations.conditioning", self.conditioning),
            ("default_durations.bright", self.bright),
            ("default_durations.packaging", self.packaging),
            ("default_durations.completed", self.completed),
        ]
    }
}

// ==========================================
// EngineConfig - 对账引擎配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 日历日锚定的参考小时（0~23），避免时区导致跨日比较偏差
    pub reference_hour: u32,

    /// 站点本地时区相对 UTC 的偏移（分钟），用于从时间戳提取本地日历日
    pub utc_offset_minutes: i32,

    /// 各阶段默认时长
    pub default_durations: PhaseDurations,

    /// 是否对逾期的活动事件延长到今天
    pub extend_overdue: bool,

    /// 体积守恒校验的相对容差（0~1）
    pub volume_tolerance_pct: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reference_hour: 12,
            utc_offset_minutes: 0,
            default_durations: PhaseDurations::default(),
            extend_overdue: true,
            volume_tolerance_pct: 0.02,
        }
    }
}

const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

impl EngineConfig {
    /// 站点时区
    pub fn site_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    /// 校验配置取值范围
    pub fn validate(&self) -> ConfigResult<()> {
        if self.reference_hour > 23 {
            return Err(ConfigError::OutOfRange {
                key: "reference_hour".to_string(),
                message: format!("{} 不在 [0, 23] 内", self.reference_hour),
            });
        }

        if self.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ConfigError::OutOfRange {
                key: "utc_offset_minutes".to_string(),
                message: format!(
                    "{} 超出 ±{} 分钟",
                    self.utc_offset_minutes, MAX_UTC_OFFSET_MINUTES
                ),
            });
        }

        for (key, days) in self.default_durations.entries() {
            if days < 1 {
                return Err(ConfigError::OutOfRange {
                    key: key.to_string(),
                    message: format!("时长至少 1 天，实际 {}", days),
                });
            }
        }

        if !(0.0..=1.0).contains(&self.volume_tolerance_pct) {
            return Err(ConfigError::OutOfRange {
                key: "volume_tolerance_pct".to_string(),
                message: format!("{} 不在 [0, 1] 内", self.volume_tolerance_pct),
            });
        }

        Ok(())
    }
}
