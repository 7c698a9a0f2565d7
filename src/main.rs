// ==========================================
// 发票导入系统 - 命令行入口
// ==========================================
// 用法: invoice-import <file> [db_path]
// 输出: 成功时向 stdout 打印 JSON 汇总；失败时退出码非 0
// ==========================================

use anyhow::{bail, Context};
use invoice_import::api::ImportApi;
use invoice_import::db::get_default_db_path;
use invoice_import::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    logging::init();

    let mut args = std::env::args().skip(1);
    let Some(file_path) = args.next() else {
        bail!("用法: invoice-import <file> [db_path]");
    };
    let db_path = args.next().unwrap_or_else(get_default_db_path);

    tracing::info!("==================================================");
    tracing::info!("{} v{}", invoice_import::APP_NAME, invoice_import::VERSION);
    tracing::info!("使用数据库: {}", db_path);
    tracing::info!("==================================================");

    let api = ImportApi::new(db_path);
    let response = api
        .import_file(&file_path)
        .await
        .with_context(|| format!("导入失败: {}", file_path))?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
