//! # Stock Analyzer
//!
//! 批量股票潜力分析：把多个数据集切成批次交给 LLM 初选，
//! 再对所有入选股票做一次汇总排名，输出 Markdown 报告
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 数据层（Models）
//! - `models/` - 记录、数据集、批次结果、报告等数据结构
//! - `DatasetLoader` - 数据集加载能力（CSV / xlsx，按扩展名选择）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `LlmService` - 打分能力（`ScoringOracle`）
//! - `SelectionExtractor` - 解析入选列表
//! - `MarkdownFileSink` - 写报告能力（`ReportSink`）
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个批次"的完整处理流程
//! - `BatchCtx` - 上下文封装（数据集 + 批次序号）
//! - `BatchWorker` - 流程编排（提示词 → 打分 → 提取）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/pipeline` - 批量数据集处理器，控制数据集并发
//! - `orchestrator/file_pipeline` - 单个数据集处理器，控制批次并发
//! - `orchestrator/aggregator` - 汇总排名
//! - `orchestrator/app` - 应用入口

pub mod config;
pub mod error;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, PoolWidth};
pub use error::{AggregationError, LoadError, OracleError, SinkError};
pub use models::{Dataset, DatasetLoader, FileResult, FinalReport, Record};
pub use orchestrator::{App, RunSummary};
pub use services::{ReportSink, ScoringOracle, ScoringRequest};
pub use workflow::{BatchCtx, BatchWorker};
