// ==========================================
// 酿造生命周期对账引擎 - 命令行入口
// ==========================================
// 用法:
//   brew-occupancy <snapshot.json> [--today YYYY-MM-DD] [--config PATH] [--log-json]
//
// 输出: 对账结果 JSON（stdout）；日志走 stderr
// ==========================================

use anyhow::{bail, Context, Result};
use brew_occupancy::api::{JsonFileSnapshotSource, TimelineApi};
use brew_occupancy::logging::{self, LogFormat};
use brew_occupancy::ConfigManager;
use chrono::{Local, NaiveDate};
use std::path::PathBuf;
use std::sync::Arc;

/// 命令行参数
#[derive(Debug)]
struct CliArgs {
    snapshot: PathBuf,
    today: Option<NaiveDate>,
    config: Option<PathBuf>,
    log_json: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<CliArgs> {
    let mut snapshot = None;
    let mut today = None;
    let mut config = None;
    let mut log_json = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--today" => {
                let raw = args.next().context("--today 缺少日期参数")?;
                let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .with_context(|| format!("--today 日期格式错误: {}", raw))?;
                today = Some(date);
            }
            "--config" => {
                let raw = args.next().context("--config 缺少路径参数")?;
                config = Some(PathBuf::from(raw));
            }
            "--log-json" => log_json = true,
            other if other.starts_with("--") => bail!("未知参数: {}", other),
            other => {
                if snapshot.is_some() {
                    bail!("只能指定一个快照文件: {}", other);
                }
                snapshot = Some(PathBuf::from(other));
            }
        }
    }

    Ok(CliArgs {
        snapshot: snapshot
            .context("用法: brew-occupancy <snapshot.json> [--today YYYY-MM-DD] [--config PATH] [--log-json]")?,
        today,
        config,
        log_json,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args(std::env::args().skip(1))?;

    logging::init_with(if args.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    });

    tracing::info!(version = brew_occupancy::VERSION, "{}", brew_occupancy::APP_NAME);

    let manager = ConfigManager::load(args.config.as_deref()).context("加载引擎配置失败")?;
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());

    let source = Arc::new(JsonFileSnapshotSource::new(&args.snapshot));
    let api = TimelineApi::new(source, manager.into_config());

    let result = api
        .refresh(today)
        .await
        .with_context(|| format!("对账失败: {}", args.snapshot.display()))?
        .context("刷新结果被取代")?;

    let json = serde_json::to_string_pretty(result.as_ref()).context("序列化对账结果失败")?;
    println!("{}", json);
    Ok(())
}
