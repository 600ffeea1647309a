use thiserror::Error;

/// 数据集加载错误
///
/// 单个数据集级别，可恢复：该数据集被排除，其他数据集继续处理
#[derive(Debug, Error)]
pub enum LoadError {
    /// 缺少必需列
    #[error("数据集 {dataset} 缺少必需列: {}", missing.join(", "))]
    MissingColumns {
        dataset: String,
        missing: Vec<String>,
    },
    /// 没有任何带代码的记录
    #[error("数据集 {dataset} 没有有效记录（代码列为空）")]
    EmptyData { dataset: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// CSV 解析失败
    #[error("解析文件失败 ({path}): {source}")]
    Parse {
        path: String,
        #[source]
        source: csv::Error,
    },
    /// xlsx 工作簿解析失败
    #[error("解析工作簿失败 ({path}): {source}")]
    Workbook {
        path: String,
        #[source]
        source: calamine::Error,
    },
    /// 工作簿中没有工作表
    #[error("工作簿中没有工作表: {path}")]
    NoWorksheet { path: String },
    /// 不支持的文件格式
    #[error("不支持的数据集格式: {path}")]
    UnsupportedFormat { path: String },
    /// 多个文件映射到同一个数据集标识
    #[error("数据集标识 {dataset} 重复: {}", paths.join(", "))]
    DuplicateDataset { dataset: String, paths: Vec<String> },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

/// 评分服务（LLM）错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// 调用超时
    #[error("调用超时 ({secs} 秒)")]
    Timeout { secs: u64 },
    /// 网络/接口调用失败
    #[error("接口调用失败: {0}")]
    Transport(String),
    /// 返回内容无法使用
    #[error("返回内容异常: {0}")]
    MalformedResponse(String),
}

impl OracleError {
    /// 是否值得重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, OracleError::Timeout { .. } | OracleError::Transport(_))
    }
}

/// 汇总阶段错误，出现即终止本次运行
#[derive(Debug, Error)]
pub enum AggregationError {
    /// 所有数据集都没有产生候选股票
    #[error("没有任何候选股票可供汇总")]
    NoCandidates,
    /// 汇总调用失败
    #[error("汇总调用失败: {0}")]
    OracleFailed(#[source] OracleError),
}

/// 报告写入错误
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("写入报告失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 配置文件解析失败
    #[error("配置文件解析失败 ({path}): {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 配置值非法
    #[error("配置项 {key} 的值 '{value}' 非法: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

// ========== 便捷构造函数 ==========

impl ConfigError {
    pub fn invalid(key: impl Into<String>, value: impl ToString, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl LoadError {
    pub fn read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        LoadError::Read {
            path: path.into(),
            source,
        }
    }
}
