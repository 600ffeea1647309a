#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use stock_analyzer::error::{OracleError, SinkError};
use stock_analyzer::{Config, PoolWidth, ReportSink, ScoringOracle, ScoringRequest};

pub const HEADER: &str = "代码,名称,最新价,涨跌幅,成交量(手),市盈率(动态),市净率,换手率,量比";

/// 生成一行 CSV 数据
pub fn row(code: &str, name: &str, pct_change: f64) -> String {
    format!("{},{},10.5,{},120000,15.2,1.3,2.5,1.1", code, name, pct_change)
}

/// 在目录中写入一个 CSV 数据集
pub fn write_dataset(dir: &Path, file_name: &str, rows: &[String]) {
    let mut content = String::from(HEADER);
    for r in rows {
        content.push('\n');
        content.push_str(r);
    }
    content.push('\n');
    std::fs::write(dir.join(file_name), content).unwrap();
}

/// 测试用配置：无重试、无退避
pub fn test_config(data_folder: &Path) -> Config {
    Config {
        data_folder: data_folder.display().to_string(),
        batch_size: 2,
        batch_concurrency: PoolWidth::Bounded(2),
        file_concurrency: PoolWidth::Bounded(2),
        oracle_max_retries: 0,
        retry_backoff_ms: 0,
        top_n: 3,
        ..Config::default()
    }
}

/// 按请求内容匹配回复的打分服务
///
/// 依次检查规则，第一个出现在 user 消息里的关键字决定回复
pub struct RuleOracle {
    rules: Vec<(String, Result<String, OracleError>)>,
    calls: AtomicUsize,
    requests: Mutex<Vec<ScoringRequest>>,
}

impl RuleOracle {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn when(mut self, needle: &str, reply: Result<String, OracleError>) -> Self {
        self.rules.push((needle.to_string(), reply));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ScoringRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScoringOracle for RuleOracle {
    async fn score(&self, request: &ScoringRequest, _timeout: Duration) -> Result<String, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        self.rules
            .iter()
            .find(|(needle, _)| request.user.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| Err(OracleError::MalformedResponse("没有匹配的预设回复".into())))
    }
}

/// 把报告保存在内存中的输出
#[derive(Default)]
pub struct MemorySink {
    pub reports: Mutex<Vec<String>>,
}

#[async_trait]
impl ReportSink for MemorySink {
    async fn write(&self, report_text: &str) -> Result<(), SinkError> {
        self.reports.lock().unwrap().push(report_text.to_string());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// 总是写入失败的输出
pub struct BrokenSink;

#[async_trait]
impl ReportSink for BrokenSink {
    async fn write(&self, _report_text: &str) -> Result<(), SinkError> {
        Err(SinkError::WriteFailed {
            path: "broken".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }

    fn location(&self) -> String {
        "broken".to_string()
    }
}
