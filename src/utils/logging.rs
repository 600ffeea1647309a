//! 日志工具模块
//!
//! 提供日志初始化、格式化和输出的辅助函数

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化日志
///
/// `RUST_LOG` 优先，否则使用 `default_filter`；重复调用不会报错
pub fn init(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批量股票潜力分析");
    info!("🤖 模型: {}", config.llm_model_name);
    info!(
        "📊 每批 {} 只 | 批次并发: {} | 数据集并发: {}",
        config.batch_size, config.batch_concurrency, config.file_concurrency
    );
    info!("{}", "=".repeat(60));
}

/// 记录数据集发现信息
///
/// # 参数
/// - `total`: 数据集总数
/// - `folder`: 数据目录
pub fn log_datasets_found(total: usize, folder: &str) {
    info!("✓ 在 {} 中找到 {} 个待分析的数据集\n", folder, total);
}

/// 记录单个数据集完成信息
pub fn log_file_complete(dataset_id: &str, batches: usize, failed: usize, selected: usize) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ [数据集 {}] 完成: 批次 {} (失败 {}), 入选 {} 只",
        dataset_id, batches, failed, selected
    );
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(
    datasets: usize,
    failed_datasets: usize,
    batches: usize,
    failed_batches: usize,
    report_location: &str,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 数据集: {} (失败 {})", datasets, failed_datasets);
    info!("📦 批次: {} (失败 {})", batches, failed_batches);
    info!("{}", "=".repeat(60));
    info!("\n报告已保存至: {}", report_location);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
