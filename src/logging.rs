// ==========================================
// 日志系统初始化
// ==========================================
// 工具: tracing + tracing-subscriber
// 输出: 一律写 stderr（stdout 留给 CLI 的 JSON 结果）
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 日志输出格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// 人读格式（带 target 与行号）
    #[default]
    Text,
    /// JSON 行，附带当前 span（供日志采集）
    Json,
}

/// RUST_LOG 未设置时的默认过滤器
const DEFAULT_FILTER: &str = "info";

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// 按格式初始化全局日志
///
/// # 环境变量
/// - RUST_LOG: 过滤器，例如 `brew_occupancy=debug,perf=info`（默认 info）
///
/// # 示例
/// ```no_run
/// use brew_occupancy::logging::{self, LogFormat};
/// logging::init_with(LogFormat::Json);
/// ```
pub fn init_with(format: LogFormat) {
    let builder = fmt()
        .with_env_filter(env_filter(DEFAULT_FILTER))
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.with_target(true).with_line_number(true).init(),
        LogFormat::Json => builder.json().with_current_span(true).init(),
    }
}

/// 人读格式日志
pub fn init() {
    init_with(LogFormat::Text);
}

/// 测试日志: debug 级别，走测试输出捕获；重复调用无副作用
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(env_filter("debug"))
        .with_test_writer()
        .try_init();
}
