use std::process::ExitCode;

use stock_analyzer::utils::logging;
use stock_analyzer::{App, Config};

#[tokio::main]
async fn main() -> ExitCode {
    // 加载配置
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ 配置加载失败: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // 初始化日志
    logging::init(&config.log_filter);

    // 初始化并运行应用
    let result = match App::new(config) {
        Ok(app) => app.run().await,
        Err(e) => Err(e),
    };

    match result {
        Ok(summary) => {
            println!("{}", summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ 分析失败: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
