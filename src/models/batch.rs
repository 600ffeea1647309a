use std::fmt;

use crate::error::OracleError;
use crate::models::record::Record;

/// 一个批次：数据集中连续、保序的一段记录
#[derive(Debug, Clone)]
pub struct Batch {
    /// 批次序号（从1开始，仅在所属数据集内有效）
    pub seq: usize,
    pub records: Vec<Record>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// 批次失败类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Transport,
    MalformedResponse,
    EmptyResponse,
    MissingMarker,
    /// 任务本身异常退出
    TaskAborted,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Timeout => "超时",
            FailureKind::Transport => "接口错误",
            FailureKind::MalformedResponse => "返回格式异常",
            FailureKind::EmptyResponse => "返回为空",
            FailureKind::MissingMarker => "缺少入选标记",
            FailureKind::TaskAborted => "任务异常",
        };
        f.write_str(label)
    }
}

impl From<&OracleError> for FailureKind {
    fn from(err: &OracleError) -> Self {
        match err {
            OracleError::Timeout { .. } => FailureKind::Timeout,
            OracleError::Transport(_) => FailureKind::Transport,
            OracleError::MalformedResponse(_) => FailureKind::MalformedResponse,
        }
    }
}

/// 批次处理状态
#[derive(Debug, Clone, PartialEq)]
pub enum BatchStatus {
    Success {
        narrative: String,
        /// 按出现顺序提取的股票代码
        codes: Vec<String>,
    },
    Failure {
        kind: FailureKind,
        message: String,
    },
}

/// 单个批次的结果，每个批次恰好产生一次，产生后不再修改
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub seq: usize,
    pub record_count: usize,
    pub status: BatchStatus,
}

impl BatchOutcome {
    pub fn success(seq: usize, record_count: usize, narrative: String, codes: Vec<String>) -> Self {
        Self {
            seq,
            record_count,
            status: BatchStatus::Success { narrative, codes },
        }
    }

    pub fn failure(
        seq: usize,
        record_count: usize,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            seq,
            record_count,
            status: BatchStatus::Failure {
                kind,
                message: message.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, BatchStatus::Success { .. })
    }

    /// 提取到的代码；失败批次为空
    pub fn codes(&self) -> &[String] {
        match &self.status {
            BatchStatus::Success { codes, .. } => codes,
            BatchStatus::Failure { .. } => &[],
        }
    }

    /// 成功时为叙述原文，失败时为嵌入的失败标记
    pub fn narrative_text(&self) -> String {
        match &self.status {
            BatchStatus::Success { narrative, .. } => narrative.clone(),
            BatchStatus::Failure { kind, message } => {
                format!("[批次 {} 分析失败: {}] {}", self.seq, kind, message)
            }
        }
    }
}
