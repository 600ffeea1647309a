//! 批次划分
//!
//! 纯函数：相同输入总是得到相同的批次和顺序

use std::num::NonZeroUsize;

use crate::models::{Batch, Record};

/// 默认每批记录数
pub const DEFAULT_BATCH_SIZE: usize = 200;

/// 把记录按固定大小切分为连续、保序、不重叠的批次
///
/// 共 `ceil(len / batch_size)` 批，序号从1开始；空输入得到空列表
pub fn partition(records: &[Record], batch_size: NonZeroUsize) -> Vec<Batch> {
    records
        .chunks(batch_size.get())
        .enumerate()
        .map(|(idx, chunk)| Batch {
            seq: idx + 1,
            records: chunk.to_vec(),
        })
        .collect()
}
