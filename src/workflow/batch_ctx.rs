//! 批次处理上下文
//!
//! 封装"我正在处理哪个数据集的第几批"这一信息

use std::fmt::Display;
use std::sync::Arc;

/// 批次处理上下文
#[derive(Debug, Clone)]
pub struct BatchCtx {
    /// 数据集标识
    pub dataset_id: Arc<str>,

    /// 批次序号（从1开始）
    pub seq: usize,

    /// 本数据集的批次总数（仅用于日志显示）
    pub total_batches: usize,

    /// 数据集的规范化列名，用于渲染批次数据
    pub columns: Arc<[String]>,
}

impl BatchCtx {
    pub fn new(dataset_id: Arc<str>, seq: usize, total_batches: usize, columns: Arc<[String]>) -> Self {
        Self {
            dataset_id,
            seq,
            total_batches,
            columns,
        }
    }
}

impl Display for BatchCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[数据集 {} 批次 {}/{}]",
            self.dataset_id, self.seq, self.total_batches
        )
    }
}
