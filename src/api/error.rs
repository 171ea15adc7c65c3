// ==========================================
// 酿造生命周期对账引擎 - API层错误类型
// ==========================================
// 职责: 快照获取与配置加载的可失败边界；引擎本身不失败
// ==========================================

use crate::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 快照获取错误
    // ==========================================
    #[error("快照读取失败: path={path}, {source}")]
    SnapshotRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("快照解析失败: {0}")]
    SnapshotParse(#[from] serde_json::Error),

    #[error("快照源不可用: {0}")]
    SourceUnavailable(String),

    // ==========================================
    // 配置错误
    // ==========================================
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_reason() {
        let err = ApiError::SnapshotRead {
            path: PathBuf::from("/tmp/missing.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("/tmp/missing.json"));

        let parse: ApiError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(parse, ApiError::SnapshotParse(_)));

        let other: ApiError = anyhow::anyhow!("boom").into();
        assert_eq!(other.to_string(), "boom");
    }
}
