//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责并发调度和流程汇总，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 组装加载器、打分服务、报告输出
//! - 扫描数据集、汇总、写报告
//! - 输出全局统计信息
//!
//! ### `pipeline` - 批量数据集处理器
//! - 并发处理所有数据集（Vec<PathBuf>）
//! - 任务 panic 时记为失败数据集
//!
//! ### `file_pipeline` - 单个数据集处理器
//! - 加载、校验、切分批次
//! - 并发处理批次，合并入选记录
//!
//! ### `aggregator` - 汇总器
//! - 一次汇总调用，产出最终排名
//!
//! ### `pool` - 有界工作池
//!
//! ## 层次关系
//!
//! ```text
//! app
//!     ↓
//! pipeline (处理 Vec<Dataset>)
//!     ↓
//! file_pipeline (处理 Vec<Batch>)
//!     ↓
//! workflow::BatchWorker (处理单个 Batch)
//!     ↓
//! services (能力层：llm / selection / report)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：pipeline 管批量，file_pipeline 管单个数据集
//! 2. **失败隔离**：批次失败不影响数据集，数据集失败不影响整体
//! 3. **向下依赖**：编排层 → workflow → services → models

pub mod aggregator;
pub mod app;
pub mod file_pipeline;
pub mod pipeline;
pub mod pool;

// 重新导出主要类型
pub use aggregator::Aggregator;
pub use app::{App, RunSummary};
pub use file_pipeline::FilePipeline;
pub use pipeline::PipelineOrchestrator;
pub use pool::WorkerPool;
