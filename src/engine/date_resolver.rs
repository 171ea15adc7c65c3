// ==========================================
// 酿造生命周期对账引擎 - 日期解析器
// ==========================================
// 职责: 异构日期输入归一化为"日历日 + 参考小时"的时刻，并执行兜底链与逾期延长
// 开始兜底: 显式计划开始 → 批次阶段开始 → 批次计划/创建日期 → 今天
// 结束兜底: 按完成状态与阶段分支（见 resolve_end）
// 红线: 永不失败；所有缺失/无法解析的情况最终落到"今天"
// ==========================================

use crate::config::{EngineConfig, PhaseDurations};
use crate::domain::batch::DateValue;
use crate::domain::types::BatchPhase;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

/// 宽松解析的纯日期格式
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

/// 宽松解析的无时区时间格式（视为站点本地时间）
const NAIVE_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

// ==========================================
// 结束日期请求
// ==========================================
/// 结束日期解析的全部候选输入（按阶段作用域收集）
#[derive(Debug, Clone, Copy, Default)]
pub struct EndRequest<'a> {
    pub phase: BatchPhase,
    /// 批次或酒批已 COMPLETED
    pub owner_completed: bool,
    /// 显式完成时间（酒批完成时间优先，其次批次完成时间）
    pub completed_at: Option<&'a DateValue>,
    /// 罐位分配已 COMPLETED
    pub assignment_completed: bool,
    pub actual_end: Option<&'a DateValue>,
    pub next_phase_start: Option<&'a DateValue>,
    pub updated_at: Option<&'a DateValue>,
    pub planned_end: Option<&'a DateValue>,
    pub estimated_end: Option<&'a DateValue>,
}

// ==========================================
// DateResolver - 日期解析器
// ==========================================
#[derive(Debug, Clone)]
pub struct DateResolver {
    today: NaiveDate,
    reference_time: NaiveTime,
    offset: FixedOffset,
    durations: PhaseDurations,
    extend_overdue: bool,
}

impl DateResolver {
    /// 创建日期解析器（每次对账创建一次，today 由调用方传入）
    pub fn new(config: &EngineConfig, today: NaiveDate) -> Self {
        let reference_time =
            NaiveTime::from_hms_opt(config.reference_hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
        Self {
            today,
            reference_time,
            offset: config.site_offset(),
            durations: config.default_durations.clone(),
            extend_overdue: config.extend_overdue,
        }
    }

    /// "现在" = 今天的参考小时
    pub fn now(&self) -> NaiveDateTime {
        self.anchor(self.today)
    }

    /// 日历日锚定到参考小时
    pub fn anchor(&self, day: NaiveDate) -> NaiveDateTime {
        day.and_time(self.reference_time)
    }

    // ==========================================
    // 输入归一化
    // ==========================================

    /// 提取站点本地日历日；无法解析返回 None
    pub fn calendar_day(&self, value: &DateValue) -> Option<NaiveDate> {
        match value {
            DateValue::Date(d) => Some(*d),
            DateValue::Timestamp(ts) => Some(self.local_day(ts)),
            DateValue::Text(raw) => self.parse_text(raw),
            DateValue::Other(raw) => {
                tracing::debug!(raw = %raw, "日期不是文本，走兜底链");
                None
            }
        }
    }

    /// 可选输入的日历日
    pub fn day_of(&self, value: Option<&DateValue>) -> Option<NaiveDate> {
        value.and_then(|v| self.calendar_day(v))
    }

    /// 候选链中第一个可解析的日历日
    pub fn first_day(&self, candidates: &[Option<&DateValue>]) -> Option<NaiveDate> {
        candidates.iter().find_map(|c| self.day_of(*c))
    }

    fn local_day(&self, ts: &DateTime<FixedOffset>) -> NaiveDate {
        ts.with_timezone(&self.offset).date_naive()
    }

    fn parse_text(&self, raw: &str) -> Option<NaiveDate> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }

        // 纯日期: 按本地日历日解析，不做时区换算
        for fmt in DATE_FORMATS {
            if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
                return Some(d);
            }
        }

        // 完整时间戳: 先解析为绝对时刻，再取站点本地日历日
        if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
            return Some(self.local_day(&ts));
        }

        for fmt in NAIVE_DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(dt.date());
            }
        }

        tracing::debug!(raw = %s, "日期无法解析，走兜底链");
        None
    }

    // ==========================================
    // 开始 / 结束解析
    // ==========================================

    /// 解析开始时刻
    ///
    /// # 兜底顺序
    /// 显式计划开始 → 批次阶段开始 → 批次计划日期/创建时间 → 今天
    pub fn resolve_start(
        &self,
        explicit: Option<&DateValue>,
        phase_start: Option<&DateValue>,
        planned_or_created: &[Option<&DateValue>],
    ) -> NaiveDateTime {
        let day = self
            .day_of(explicit)
            .or_else(|| self.day_of(phase_start))
            .or_else(|| self.first_day(planned_or_created))
            .unwrap_or(self.today);
        self.anchor(day)
    }

    /// 解析结束时刻
    ///
    /// # 规则
    /// - PLANNED/BREWING: 固定 start + 1 天（忽略任何预计结束字段）
    /// - 已完成分配且有 actual_end: actual_end
    /// - 批次/酒批已完成: 完成时间 → 今天
    /// - 分配已完成: actual_end → 下一阶段开始 → updated_at → 计划结束 → 今天
    /// - 活动中: 计划结束 → 批次预计结束 → start + 阶段默认时长；逾期则延长到今天
    ///
    /// 结果不早于 start + 1 天
    pub fn resolve_end(&self, req: &EndRequest<'_>, start: NaiveDateTime) -> NaiveDateTime {
        if req.phase.is_brew_day() {
            return start + Duration::days(self.durations.days_for(req.phase));
        }

        let end = if req.assignment_completed && self.day_of(req.actual_end).is_some() {
            self.anchor_opt(req.actual_end)
        } else if req.owner_completed {
            self.anchor_opt(req.completed_at)
        } else if req.assignment_completed {
            self.day_of(req.next_phase_start)
                .or_else(|| self.day_of(req.updated_at))
                .or_else(|| self.day_of(req.planned_end))
                .map(|d| self.anchor(d))
        } else {
            let projected = self
                .day_of(req.planned_end)
                .or_else(|| self.day_of(req.estimated_end))
                .map(|d| self.anchor(d))
                .unwrap_or_else(|| start + Duration::days(self.durations.days_for(req.phase)));
            Some(self.extend_if_overdue(projected))
        };

        let end = end.unwrap_or_else(|| self.now());
        self.clamp_after(start, end)
    }

    /// 逾期延长: 活动事件的结束早于今天 → 今天
    pub fn extend_if_overdue(&self, end: NaiveDateTime) -> NaiveDateTime {
        if self.extend_overdue && end.date() < self.today {
            self.now()
        } else {
            end
        }
    }

    fn anchor_opt(&self, value: Option<&DateValue>) -> Option<NaiveDateTime> {
        self.day_of(value).map(|d| self.anchor(d))
    }

    fn clamp_after(&self, start: NaiveDateTime, end: NaiveDateTime) -> NaiveDateTime {
        if end <= start {
            start + Duration::days(1)
        } else {
            end
        }
    }
}
