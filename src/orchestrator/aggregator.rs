//! 汇总器 - 编排层
//!
//! 把所有成功数据集的候选记录和批次叙述合成一次汇总请求，
//! 由打分服务给出最终排名。汇总请求只调用一次，不重试

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AggregationError, ConfigError, OracleError};
use crate::models::{AggregationInput, CandidateSection, FileResult, FinalReport, ReportEntry};
use crate::services::{ScoringOracle, SelectionExtractor};
use crate::utils::logging::truncate_text;
use crate::workflow::prompts::build_consolidation_request;

pub struct Aggregator {
    oracle: Arc<dyn ScoringOracle>,
    extractor: SelectionExtractor,
    timeout: Duration,
    top_n: usize,
    include_failure_markers: bool,
}

impl Aggregator {
    pub fn new(oracle: Arc<dyn ScoringOracle>, config: &Config) -> Result<Self, ConfigError> {
        let extractor = SelectionExtractor::new(config.selection_marker.clone())
            .map_err(|e| ConfigError::invalid("selection_marker", &config.selection_marker, e.to_string()))?;

        Ok(Self {
            oracle,
            extractor,
            timeout: config.oracle_timeout(),
            top_n: config.top_n,
            include_failure_markers: config.include_failure_markers,
        })
    }

    /// 收集所有成功数据集的候选记录与叙述，按数据集标识排序
    pub fn build_input(&self, results: &[FileResult]) -> AggregationInput {
        let mut sections: Vec<CandidateSection> = results
            .iter()
            .filter(|r| r.is_ok())
            .map(|r| CandidateSection {
                dataset_id: r.dataset_id.clone(),
                columns: r.columns.clone(),
                selected: r.selected.clone(),
                narratives: r.narratives(self.include_failure_markers),
            })
            .collect();
        sections.sort_by(|a, b| a.dataset_id.cmp(&b.dataset_id));

        AggregationInput { sections }
    }

    /// 生成最终报告
    ///
    /// - 没有任何候选记录时返回 `NoCandidates`，不调用打分服务
    /// - 排名中不在候选集里的代码被丢弃，重复代码只保留第一次出现
    pub async fn aggregate(&self, results: &[FileResult]) -> Result<FinalReport, AggregationError> {
        let input = self.build_input(results);
        if input.is_empty() {
            warn!("⚠️ 没有任何候选股票，跳过汇总");
            return Err(AggregationError::NoCandidates);
        }

        info!(
            "🧮 开始汇总: {} 个数据集, {} 只候选股票",
            input.sections.len(),
            input.candidate_count()
        );

        let request = build_consolidation_request(&input, self.top_n).map_err(|e| {
            AggregationError::OracleFailed(OracleError::MalformedResponse(format!("渲染候选数据失败: {}", e)))
        })?;

        let reply = match tokio::time::timeout(self.timeout, self.oracle.score(&request, self.timeout)).await {
            Ok(reply) => reply,
            Err(_) => Err(OracleError::Timeout {
                secs: self.timeout.as_secs(),
            }),
        }
        .map_err(AggregationError::OracleFailed)?;

        let entries = self.rank_entries(&input, &reply);
        if entries.is_empty() {
            warn!("⚠️ 汇总结果中没有有效排名: {}", truncate_text(&reply, 120));
            return Err(AggregationError::OracleFailed(OracleError::MalformedResponse(
                "汇总结果中没有有效的候选股票排名".into(),
            )));
        }

        info!("✓ 汇总完成，最终入选 {} 只", entries.len());
        Ok(FinalReport {
            entries,
            candidate_count: input.candidate_count(),
        })
    }

    fn rank_entries(&self, input: &AggregationInput, reply: &str) -> Vec<ReportEntry> {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for line in self.extractor.parse_ranked(reply) {
            if entries.len() == self.top_n {
                break;
            }
            let Some(record) = input.find(&line.code) else {
                warn!("⚠️ 忽略不在候选集中的代码: {}", line.code);
                continue;
            };
            if !seen.insert(line.code.clone()) {
                continue;
            }
            entries.push(ReportEntry {
                rank: entries.len() + 1,
                code: line.code,
                name: record.name().to_string(),
                highlight: line.highlight,
                risk: line.risk,
            });
        }

        entries
    }
}
