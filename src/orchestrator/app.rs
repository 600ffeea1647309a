//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **组装组件**：按配置创建加载器、打分服务和报告输出
//! 2. **扫描数据**：找出数据目录下所有待分析的数据集
//! 3. **批量处理**：委托 `PipelineOrchestrator` 并发处理所有数据集
//! 4. **汇总排名**：委托 `Aggregator` 生成最终报告
//! 5. **输出报告**：渲染 Markdown 并交给 `ReportSink`
//!
//! 报告写入失败时会把报告打印到标准输出，避免结果丢失

use std::fmt;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::models::{discover_datasets, AutoDatasetLoader, DatasetLoader, FileResult, FinalReport};
use crate::orchestrator::aggregator::Aggregator;
use crate::orchestrator::file_pipeline::FilePipeline;
use crate::orchestrator::pipeline::PipelineOrchestrator;
use crate::services::{render_report, LlmService, MarkdownFileSink, ReportSink, ScoringOracle};
use crate::utils::logging::{log_datasets_found, log_startup, print_final_stats};

/// 应用主结构
pub struct App {
    config: Config,
    orchestrator: PipelineOrchestrator,
    aggregator: Aggregator,
    sink: Arc<dyn ReportSink>,
}

impl App {
    /// 使用默认组件初始化：按扩展名选择的加载器、OpenAI 兼容服务、Markdown 文件
    pub fn new(config: Config) -> Result<Self> {
        let loader = Arc::new(AutoDatasetLoader::new());
        let oracle = Arc::new(LlmService::new(&config));
        let sink = Arc::new(MarkdownFileSink::new(&config.report_path));
        Self::with_components(config, loader, oracle, sink)
    }

    /// 使用自定义组件初始化
    pub fn with_components(
        config: Config,
        loader: Arc<dyn DatasetLoader>,
        oracle: Arc<dyn ScoringOracle>,
        sink: Arc<dyn ReportSink>,
    ) -> Result<Self> {
        config.validate().context("配置校验失败")?;

        let file_pipeline = FilePipeline::new(loader, Arc::clone(&oracle), &config)?;
        let orchestrator = PipelineOrchestrator::new(Arc::new(file_pipeline), config.file_concurrency);
        let aggregator = Aggregator::new(oracle, &config)?;

        Ok(Self {
            config,
            orchestrator,
            aggregator,
            sink,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunSummary> {
        log_startup(&self.config);

        info!("\n📁 正在扫描待分析的数据集...");
        let paths = discover_datasets(&self.config.data_folder, &self.config.dataset_extensions)
            .await
            .context("扫描数据目录失败")?;

        if paths.is_empty() {
            warn!("⚠️ 没有找到待分析的数据集，程序结束");
            bail!(
                "目录 {} 中没有 {} 数据集",
                self.config.data_folder,
                self.config.dataset_extensions.join("/")
            );
        }
        log_datasets_found(paths.len(), &self.config.data_folder);

        let mut results = self.orchestrator.run(paths).await;
        results.sort_by(|a, b| a.dataset_id.cmp(&b.dataset_id));

        let report = self
            .aggregator
            .aggregate(&results)
            .await
            .inspect_err(|e| error!("❌ 汇总失败: {}", e))?;

        let report_text = render_report(&report, &results, chrono::Local::now());
        if let Err(e) = self.sink.write(&report_text).await {
            error!("❌ 报告写入失败: {}，报告内容输出到标准输出", e);
            println!("{}", report_text);
            return Err(e).context("报告写入失败");
        }

        let summary = RunSummary::new(&results, report);
        print_final_stats(
            summary.datasets,
            summary.failed_datasets,
            summary.batches,
            summary.failed_batches,
            &self.sink.location(),
        );

        Ok(summary)
    }
}

/// 一次运行的汇总统计
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub datasets: usize,
    pub failed_datasets: usize,
    pub batches: usize,
    pub failed_batches: usize,
    pub report: FinalReport,
}

impl RunSummary {
    pub fn new(results: &[FileResult], report: FinalReport) -> Self {
        Self {
            datasets: results.len(),
            failed_datasets: results.iter().filter(|r| !r.is_ok()).count(),
            batches: results.iter().map(FileResult::batch_count).sum(),
            failed_batches: results.iter().map(FileResult::failure_count).sum(),
            report,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "✅ 分析完成: {} 个数据集 (失败 {}), {} 个批次 (失败 {}), 候选 {} 只, 入选 {} 只",
            self.datasets,
            self.failed_datasets,
            self.batches,
            self.failed_batches,
            self.report.candidate_count,
            self.report.entries.len()
        )
    }
}
