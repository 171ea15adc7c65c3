// ==========================================
// 酿造生命周期对账引擎 - 配置层
// ==========================================
// 职责: 引擎配置加载、环境变量覆写、校验
// 来源: 显式路径 → 环境变量 → 用户配置目录 → 内置默认值
// ==========================================

pub mod config_manager;
pub mod engine_config;
pub mod error;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, ConfigSource};
pub use engine_config::{EngineConfig, PhaseDurations};
pub use error::{ConfigError, ConfigResult};
