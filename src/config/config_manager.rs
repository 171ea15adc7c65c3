// ==========================================
// 酿造生命周期对账引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、环境变量覆写、校验
// 存储: JSON 配置文件（可缺省，缺省时使用内置默认值）
// ==========================================

use crate::config::engine_config::EngineConfig;
use crate::config::error::{ConfigError, ConfigResult};
use std::path::{Path, PathBuf};

// ==========================================
// 配置键 / 环境变量
// ==========================================
pub mod config_keys {
    /// 配置文件路径
    pub const ENV_CONFIG_PATH: &str = "BREW_OCCUPANCY_CONFIG";
    /// 参考小时覆写
    pub const ENV_REFERENCE_HOUR: &str = "BREW_OCCUPANCY_REFERENCE_HOUR";
    /// 站点时区偏移覆写（分钟）
    pub const ENV_UTC_OFFSET_MINUTES: &str = "BREW_OCCUPANCY_UTC_OFFSET_MINUTES";

    /// 用户配置目录下的子目录与文件名
    pub const APP_DIR_NAME: &str = "brew-occupancy";
    pub const CONFIG_FILE_NAME: &str = "config.json";
}

/// 配置来源（用于日志与排查）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: EngineConfig,
    source: ConfigSource,
}

impl ConfigManager {
    /// 按优先级加载配置
    ///
    /// # 顺序
    /// 1. 显式路径（必须存在）
    /// 2. 环境变量 BREW_OCCUPANCY_CONFIG（必须存在）
    /// 3. 用户配置目录下的 brew-occupancy/config.json（不存在则跳过）
    /// 4. 内置默认值
    ///
    /// 之后应用环境变量覆写并校验
    pub fn load(explicit_path: Option<&Path>) -> ConfigResult<Self> {
        let env = |key: &str| std::env::var(key).ok();

        let path = explicit_path
            .map(Path::to_path_buf)
            .or_else(|| env(config_keys::ENV_CONFIG_PATH).map(PathBuf::from))
            .or_else(|| Self::default_config_path().filter(|p| p.exists()));

        let (mut config, source) = match path {
            Some(p) => (Self::read_file(&p)?, ConfigSource::File(p)),
            None => (EngineConfig::default(), ConfigSource::Defaults),
        };

        Self::apply_overrides(&mut config, env)?;
        config.validate()?;

        tracing::info!(source = ?source, "引擎配置加载完成");
        Ok(Self { config, source })
    }

    /// 从指定文件加载（不读取环境变量）
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(Self {
            config,
            source: ConfigSource::File(path.to_path_buf()),
        })
    }

    /// 从内存配置创建（测试与嵌入场景）
    pub fn from_config(config: EngineConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            source: ConfigSource::Defaults,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    pub fn into_config(self) -> EngineConfig {
        self.config
    }

    /// 默认配置文件路径: <config_dir>/brew-occupancy/config.json
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| {
            dir.join(config_keys::APP_DIR_NAME)
                .join(config_keys::CONFIG_FILE_NAME)
        })
    }

    fn read_file(path: &Path) -> ConfigResult<EngineConfig> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 应用覆写（lookup 抽象环境变量读取，便于测试）
    pub fn apply_overrides<F>(config: &mut EngineConfig, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(config_keys::ENV_REFERENCE_HOUR) {
            config.reference_hour = parse_value(config_keys::ENV_REFERENCE_HOUR, &raw)?;
        }

        if let Some(raw) = lookup(config_keys::ENV_UTC_OFFSET_MINUTES) {
            config.utc_offset_minutes = parse_value(config_keys::ENV_UTC_OFFSET_MINUTES, &raw)?;
        }

        Ok(())
    }
}

fn parse_value<T>(key: &str, raw: &str) -> ConfigResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::ValueError {
        key: key.to_string(),
        value: raw.to_string(),
        message: e.to_string(),
    })
}
