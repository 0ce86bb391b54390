// ==========================================
// 车间停机工时核算 - 命令行入口
// ==========================================
// 用法:
//   shift-downtime-ledger <request.json> [db_path]
//
// - 未提供 db_path: 使用内置默认配置, 不落库
// - 提供 db_path: 从 config_kv 读取配置, 结算后覆盖写入故障核算明细
// 结算结果以 JSON 输出到 stdout
// ==========================================

use anyhow::{anyhow, Context};
use shift_downtime_ledger::config::{ConfigManager, EngineSettings};
use shift_downtime_ledger::db::open_sqlite_connection;
use shift_downtime_ledger::engine::{ShiftFinalizationRequest, ShiftFinalizer};
use shift_downtime_ledger::logging;
use shift_downtime_ledger::reasoning::ReasoningClient;
use shift_downtime_ledger::repository::FaultEvaluationRepository;
use std::sync::{Arc, Mutex};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let request_path = args
        .next()
        .ok_or_else(|| anyhow!("用法: shift-downtime-ledger <request.json> [db_path]"))?;
    let db_path = args.next().filter(|s| !s.trim().is_empty());

    tracing::info!("==================================================");
    tracing::info!("{} v{}", shift_downtime_ledger::APP_NAME, shift_downtime_ledger::VERSION);
    tracing::info!("==================================================");

    let raw = std::fs::read_to_string(&request_path)
        .with_context(|| format!("读取结算请求失败: {}", request_path))?;
    let request: ShiftFinalizationRequest =
        serde_json::from_str(&raw).with_context(|| format!("结算请求格式错误: {}", request_path))?;

    // 配置与仓储共用同一连接
    let (settings, repo) = match &db_path {
        Some(path) => {
            tracing::info!("使用数据库: {}", path);
            let conn = Arc::new(Mutex::new(
                open_sqlite_connection(path).with_context(|| format!("打开数据库失败: {}", path))?,
            ));
            let config = ConfigManager::from_connection(conn.clone())
                .map_err(|e| anyhow!("初始化配置失败: {}", e))?;
            let settings = EngineSettings::load(&config)
                .await
                .map_err(|e| anyhow!("加载引擎配置失败: {}", e))?;
            (settings, Some(FaultEvaluationRepository::from_connection(conn)))
        }
        None => {
            tracing::info!("未指定数据库, 使用内置默认配置");
            (EngineSettings::default(), None)
        }
    };

    let client = match ReasoningClient::from_settings(&settings) {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::warn!(error = %e, "推理服务客户端初始化失败, 滚动决策仅使用离线估算");
            None
        }
    };

    let finalizer = ShiftFinalizer::from_settings(&settings, client);
    let finalization = finalizer.finalize(request).await;

    if let Some(repo) = &repo {
        let written = repo
            .replace_for_shift(&finalization.shift, &finalization.fault_evaluations)
            .context("写入故障核算明细失败")?;
        tracing::info!(written, "故障核算明细已落库");
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&finalization).context("序列化结算结果失败")?
    );
    Ok(())
}
