use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// 配置文件路径对应的环境变量
pub const CONFIG_PATH_ENV: &str = "STOCK_ANALYZER_CONFIG";
/// 默认配置文件
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 工作池宽度
///
/// 不限并发必须显式写成 `unbounded`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "PoolWidthRepr")]
pub enum PoolWidth {
    Bounded(usize),
    Unbounded,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PoolWidthRepr {
    Number(usize),
    Word(String),
}

impl TryFrom<PoolWidthRepr> for PoolWidth {
    type Error = String;

    fn try_from(repr: PoolWidthRepr) -> Result<Self, Self::Error> {
        match repr {
            PoolWidthRepr::Number(n) => Ok(PoolWidth::Bounded(n)),
            PoolWidthRepr::Word(word) => word.parse(),
        }
    }
}

impl FromStr for PoolWidth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("unbounded") {
            return Ok(PoolWidth::Unbounded);
        }
        s.parse::<usize>()
            .map(PoolWidth::Bounded)
            .map_err(|_| format!("应为正整数或 unbounded，实际为 '{}'", s))
    }
}

impl fmt::Display for PoolWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolWidth::Bounded(n) => write!(f, "{}", n),
            PoolWidth::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// 程序配置
///
/// 在构造各组件时显式传入，不使用全局状态
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    /// 单次调用超时（秒）
    pub oracle_timeout_secs: u64,
    /// 超时/网络错误的最大重试次数
    pub oracle_max_retries: usize,
    /// 重试基础退避（毫秒），每次翻倍
    pub retry_backoff_ms: u64,

    // --- 流水线配置 ---
    /// 每批记录数
    pub batch_size: usize,
    /// 单个数据集内的批次并发
    pub batch_concurrency: PoolWidth,
    /// 数据集之间的并发
    pub file_concurrency: PoolWidth,
    /// 提示词中"重点候选"列表的长度
    pub head_candidates: usize,
    /// 最终报告的股票数量
    pub top_n: usize,
    /// 批次叙述中必须出现的入选标记
    pub selection_marker: String,
    /// 汇总提示词中是否保留失败批次的标记
    pub include_failure_markers: bool,

    // --- 文件配置 ---
    /// 数据集目录
    pub data_folder: String,
    /// 参与分析的数据集扩展名（不区分大小写）
    pub dataset_extensions: Vec<String>,
    /// 报告输出路径
    pub report_path: String,
    /// 默认日志过滤（RUST_LOG 优先）
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            llm_temperature: 0.2,
            llm_max_tokens: 2048,
            oracle_timeout_secs: 120,
            oracle_max_retries: 2,
            retry_backoff_ms: 1000,
            batch_size: 200,
            batch_concurrency: PoolWidth::Bounded(4),
            file_concurrency: PoolWidth::Bounded(2),
            head_candidates: 10,
            top_n: 3,
            selection_marker: "【入选】".to_string(),
            include_failure_markers: true,
            data_folder: "data".to_string(),
            dataset_extensions: vec!["xlsx".to_string(), "csv".to_string()],
            report_path: "stock_analysis_report.md".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// 加载配置：默认值 → TOML 文件（存在时）→ 环境变量，最后校验
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::from_toml_file(path)?
        } else {
            Self::default()
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// 从 `STOCK_ANALYZER_CONFIG`（默认 config.toml）加载
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        Self::load(path)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 用环境变量覆盖配置
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        override_string(&mut self.llm_api_key, "LLM_API_KEY");
        override_string(&mut self.llm_api_base_url, "LLM_API_BASE_URL");
        override_string(&mut self.llm_model_name, "LLM_MODEL_NAME");
        override_parsed(&mut self.llm_temperature, "LLM_TEMPERATURE")?;
        override_parsed(&mut self.llm_max_tokens, "LLM_MAX_TOKENS")?;
        override_parsed(&mut self.oracle_timeout_secs, "ORACLE_TIMEOUT_SECS")?;
        override_parsed(&mut self.oracle_max_retries, "ORACLE_MAX_RETRIES")?;
        override_parsed(&mut self.retry_backoff_ms, "RETRY_BACKOFF_MS")?;
        override_parsed(&mut self.batch_size, "BATCH_SIZE")?;
        override_parsed(&mut self.batch_concurrency, "BATCH_CONCURRENCY")?;
        override_parsed(&mut self.file_concurrency, "FILE_CONCURRENCY")?;
        override_parsed(&mut self.head_candidates, "HEAD_CANDIDATES")?;
        override_parsed(&mut self.top_n, "TOP_N")?;
        override_string(&mut self.selection_marker, "SELECTION_MARKER");
        override_parsed(&mut self.include_failure_markers, "INCLUDE_FAILURE_MARKERS")?;
        override_string(&mut self.data_folder, "DATA_FOLDER");
        override_list(&mut self.dataset_extensions, "DATASET_EXTENSIONS");
        override_string(&mut self.report_path, "REPORT_PATH");
        override_string(&mut self.log_filter, "LOG_FILTER");
        Ok(())
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::invalid("batch_size", 0, "必须大于 0"));
        }
        if self.batch_concurrency == PoolWidth::Bounded(0) {
            return Err(ConfigError::invalid("batch_concurrency", 0, "必须大于 0 或为 unbounded"));
        }
        if self.file_concurrency == PoolWidth::Bounded(0) {
            return Err(ConfigError::invalid("file_concurrency", 0, "必须大于 0 或为 unbounded"));
        }
        if self.top_n == 0 {
            return Err(ConfigError::invalid("top_n", 0, "必须大于 0"));
        }
        if self.oracle_timeout_secs == 0 {
            return Err(ConfigError::invalid("oracle_timeout_secs", 0, "必须大于 0"));
        }
        if self.dataset_extensions.iter().all(|ext| ext.trim().is_empty()) {
            return Err(ConfigError::invalid("dataset_extensions", "", "至少需要一个扩展名"));
        }
        if self.selection_marker.trim().is_empty() {
            return Err(ConfigError::invalid("selection_marker", &self.selection_marker, "不能为空"));
        }
        Ok(())
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

fn override_string(field: &mut String, var_name: &str) {
    if let Ok(value) = std::env::var(var_name) {
        *field = value;
    }
}

/// 逗号分隔的列表，例如 `xlsx,csv`
fn override_list(field: &mut Vec<String>, var_name: &str) {
    if let Ok(value) = std::env::var(var_name) {
        *field = split_list(&value);
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim().trim_start_matches('.').to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn override_parsed<T>(field: &mut T, var_name: &str) -> Result<(), ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    if let Ok(value) = std::env::var(var_name) {
        *field = value
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(var_name, &value, e.to_string()))?;
    }
    Ok(())
}
