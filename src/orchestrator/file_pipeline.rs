//! 单个数据集处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责处理单个数据集的所有批次，是数据集级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **加载校验**：通过 `DatasetLoader` 读取并校验数据集
//! 2. **切分批次**：按 `batch_size` 切成连续批次
//! 3. **并发调度**：批次在有界工作池中并发执行 `BatchWorker`
//! 4. **汇集结果**：按完成顺序收集，用批次序号关联
//! 5. **选出记录**：合并所有成功批次的代码，按原顺序取出记录
//!
//! 单个批次失败（包括任务 panic）只影响该批次，数据集仍为 `Ok`

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::{Config, PoolWidth};
use crate::error::ConfigError;
use crate::models::loaders::dataset_id_for;
use crate::models::{validate_dataset, BatchOutcome, Dataset, DatasetLoader, FailureKind, FileResult, FileStatus, Record};
use crate::orchestrator::pool::WorkerPool;
use crate::services::ScoringOracle;
use crate::utils::logging::log_file_complete;
use crate::workflow::{partition, BatchCtx, BatchWorker};

/// 单个数据集处理器
///
/// 可被多个数据集任务共享（内部只读）。批次工作池在每次 `process` 时新建，
/// 所以 `batch_concurrency` 限制的是单个数据集内的并发
pub struct FilePipeline {
    loader: Arc<dyn DatasetLoader>,
    worker: Arc<BatchWorker>,
    batch_size: NonZeroUsize,
    batch_width: PoolWidth,
}

impl FilePipeline {
    pub fn new(
        loader: Arc<dyn DatasetLoader>,
        oracle: Arc<dyn ScoringOracle>,
        config: &Config,
    ) -> Result<Self, ConfigError> {
        let batch_size = NonZeroUsize::new(config.batch_size)
            .ok_or_else(|| ConfigError::invalid("batch_size", config.batch_size, "必须大于 0"))?;
        let worker = BatchWorker::new(oracle, config)
            .map_err(|e| ConfigError::invalid("selection_marker", &config.selection_marker, e.to_string()))?;

        Ok(Self {
            loader,
            worker: Arc::new(worker),
            batch_size,
            batch_width: config.batch_concurrency,
        })
    }

    /// 加载并处理一个数据集文件
    ///
    /// 加载或校验失败时返回 `FileStatus::Failed`，不会向外抛错
    pub async fn run(&self, path: &Path) -> FileResult {
        let dataset_id = dataset_id_for(path);
        info!("[数据集 {}] 📂 开始加载: {}", dataset_id, path.display());

        match self.loader.load(path).await {
            Ok(dataset) => self.process(dataset).await,
            Err(e) => {
                error!("[数据集 {}] ❌ 加载失败: {}", dataset_id, e);
                FileResult::failed(dataset_id, e.to_string())
            }
        }
    }

    /// 处理已加载的数据集
    pub async fn process(&self, dataset: Dataset) -> FileResult {
        let dataset_id = dataset.id.clone();
        let dataset = match validate_dataset(dataset) {
            Ok(dataset) => dataset,
            Err(e) => {
                error!("[数据集 {}] ❌ 校验失败: {}", dataset_id, e);
                return FileResult::failed(dataset_id, e.to_string());
            }
        };

        let batches = partition(&dataset.records, self.batch_size);
        let total_batches = batches.len();
        info!(
            "[数据集 {}] 共 {} 只股票，切分为 {} 批 (每批最多 {} 只)",
            dataset.id,
            dataset.len(),
            total_batches,
            self.batch_size
        );

        let shared_id: Arc<str> = Arc::from(dataset.id.as_str());
        let columns: Arc<[String]> = Arc::from(dataset.columns.as_slice());

        let tasks: Vec<_> = batches
            .into_iter()
            .map(|batch| {
                let key = (batch.seq, batch.len());
                let worker = Arc::clone(&self.worker);
                let ctx = BatchCtx::new(shared_id.clone(), batch.seq, total_batches, columns.clone());
                (key, async move { worker.process(&ctx, &batch).await })
            })
            .collect();

        let pool = WorkerPool::new(self.batch_width);
        let mut outcomes = Vec::with_capacity(total_batches);
        for ((seq, record_count), joined) in pool.run_all(tasks).await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!("[数据集 {}] 批次 {} 任务执行失败: {}", dataset.id, seq, e);
                    outcomes.push(BatchOutcome::failure(
                        seq,
                        record_count,
                        FailureKind::TaskAborted,
                        format!("任务执行失败: {}", e),
                    ));
                }
            }
        }

        let selected = select_records(&dataset.id, &dataset.records, &outcomes);
        let result = FileResult {
            dataset_id: dataset.id,
            status: FileStatus::Ok,
            columns: dataset.columns,
            outcomes,
            selected,
        };

        log_file_complete(
            &result.dataset_id,
            result.batch_count(),
            result.failure_count(),
            result.selected.len(),
        );
        result
    }
}

/// 合并成功批次选出的代码，按数据集原顺序取出对应记录
///
/// 不在数据集中的代码直接忽略
fn select_records(dataset_id: &str, records: &[Record], outcomes: &[BatchOutcome]) -> Vec<Record> {
    let codes: HashSet<&str> = outcomes
        .iter()
        .flat_map(|o| o.codes())
        .map(String::as_str)
        .collect();

    let selected: Vec<Record> = records
        .iter()
        .filter(|r| codes.contains(r.code()))
        .cloned()
        .collect();

    let known: HashSet<&str> = selected.iter().map(Record::code).collect();
    let unknown: Vec<&&str> = codes.iter().filter(|c| !known.contains(**c)).collect();
    if !unknown.is_empty() {
        warn!("[数据集 {}] ⚠️ 忽略 {} 个不存在的代码: {:?}", dataset_id, unknown.len(), unknown);
    }
    debug!("[数据集 {}] 入选代码: {:?}", dataset_id, known);

    selected
}
