//! 报告写入服务 - 业务能力层
//!
//! 只负责"持久化报告"能力，不关心报告如何生成

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::error::SinkError;

/// 报告持久化能力
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn write(&self, report_text: &str) -> Result<(), SinkError>;

    /// 报告位置描述（用于日志）
    fn location(&self) -> String;
}

/// 写入 Markdown 文件，父目录不存在时自动创建
pub struct MarkdownFileSink {
    report_path: PathBuf,
}

impl MarkdownFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            report_path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.report_path
    }

    fn write_failed(&self, source: std::io::Error) -> SinkError {
        SinkError::WriteFailed {
            path: self.report_path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl ReportSink for MarkdownFileSink {
    async fn write(&self, report_text: &str) -> Result<(), SinkError> {
        debug!(
            "写入报告: {} | 长度: {} 字符",
            self.report_path.display(),
            report_text.len()
        );

        if let Some(parent) = self.report_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.write_failed(e))?;
        }

        fs::write(&self.report_path, report_text)
            .await
            .map_err(|e| self.write_failed(e))
    }

    fn location(&self) -> String {
        self.report_path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("daily.md");
        let sink = MarkdownFileSink::new(&path);

        sink.write("# 报告\n").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# 报告\n");
        assert_eq!(sink.location(), path.display().to_string());
    }

    #[tokio::test]
    async fn test_write_overwrites_previous_report() {
        let dir = tempfile::tempdir().unwrap();
        let sink = MarkdownFileSink::new(dir.path().join("r.md"));

        sink.write("旧").await.unwrap();
        sink.write("新").await.unwrap();

        assert_eq!(std::fs::read_to_string(sink.path()).unwrap(), "新");
    }

    #[tokio::test]
    async fn test_write_into_directory_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let sink = MarkdownFileSink::new(dir.path());

        let err = sink.write("x").await.unwrap_err();
        assert!(matches!(err, SinkError::WriteFailed { .. }));
    }
}
