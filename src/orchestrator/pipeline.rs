//! 批量数据集处理器 - 编排层
//!
//! 所有数据集在有界工作池中并发运行 `FilePipeline`，
//! 每个路径恰好产出一个 `FileResult`，结果按完成顺序返回

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info};

use crate::config::PoolWidth;
use crate::models::loaders::dataset_id_for;
use crate::models::FileResult;
use crate::orchestrator::file_pipeline::FilePipeline;
use crate::orchestrator::pool::WorkerPool;

pub struct PipelineOrchestrator {
    file_pipeline: Arc<FilePipeline>,
    pool: WorkerPool,
}

impl PipelineOrchestrator {
    pub fn new(file_pipeline: Arc<FilePipeline>, width: PoolWidth) -> Self {
        Self {
            file_pipeline,
            pool: WorkerPool::new(width),
        }
    }

    /// 并发处理所有数据集
    ///
    /// 某个数据集任务 panic 时，该数据集记为失败，其他数据集不受影响
    pub async fn run(&self, paths: Vec<PathBuf>) -> Vec<FileResult> {
        info!(
            "📋 开始处理 {} 个数据集 (并发: {})",
            paths.len(),
            self.pool.width()
        );

        let tasks: Vec<_> = paths
            .into_iter()
            .map(|path| {
                let pipeline = Arc::clone(&self.file_pipeline);
                let dataset_id = dataset_id_for(&path);
                (dataset_id, async move { pipeline.run(&path).await })
            })
            .collect();

        self.pool
            .run_all(tasks)
            .await
            .into_iter()
            .map(|(dataset_id, joined)| {
                joined.unwrap_or_else(|e| {
                    error!("[数据集 {}] ❌ 任务执行失败: {}", dataset_id, e);
                    FileResult::failed(dataset_id, format!("任务执行失败: {}", e))
                })
            })
            .collect()
    }
}
