use std::collections::HashSet;

use crate::models::batch::BatchOutcome;
use crate::models::record::Record;

/// 数据集级别状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Ok,
    /// 数据集本身无法加载或校验失败
    Failed { reason: String },
}

/// 单个数据集的处理结果
#[derive(Debug, Clone)]
pub struct FileResult {
    pub dataset_id: String,
    pub status: FileStatus,
    pub columns: Vec<String>,
    /// 每个批次一条，按完成顺序存放，用 `seq` 关联批次
    pub outcomes: Vec<BatchOutcome>,
    /// 原数据集中被任一成功批次选中的记录（保持原顺序）
    pub selected: Vec<Record>,
}

impl FileResult {
    pub fn failed(dataset_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            status: FileStatus::Failed {
                reason: reason.into(),
            },
            columns: Vec::new(),
            outcomes: Vec::new(),
            selected: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == FileStatus::Ok
    }

    pub fn batch_count(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }

    /// 按批次序号排序后的结果
    pub fn outcomes_by_seq(&self) -> Vec<&BatchOutcome> {
        let mut outcomes: Vec<&BatchOutcome> = self.outcomes.iter().collect();
        outcomes.sort_by_key(|o| o.seq);
        outcomes
    }

    /// 批次叙述（失败批次为失败标记），按批次序号排列
    pub fn narratives(&self, include_failures: bool) -> Vec<String> {
        self.outcomes_by_seq()
            .into_iter()
            .filter(|o| include_failures || o.is_success())
            .map(BatchOutcome::narrative_text)
            .collect()
    }
}

/// 汇总输入中来自一个数据集的部分
#[derive(Debug, Clone)]
pub struct CandidateSection {
    pub dataset_id: String,
    pub columns: Vec<String>,
    pub selected: Vec<Record>,
    pub narratives: Vec<String>,
}

/// 所有成功数据集的候选记录与批次叙述
#[derive(Debug, Clone, Default)]
pub struct AggregationInput {
    pub sections: Vec<CandidateSection>,
}

impl AggregationInput {
    /// 参与汇总的不同股票代码数
    ///
    /// 同一代码在多个数据集中入选只计一次
    pub fn candidate_count(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|s| s.selected.iter())
            .map(Record::code)
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.selected.is_empty())
    }

    /// 按代码查找候选记录
    ///
    /// 同一代码出现在多个数据集时，返回 `sections` 中最先出现的记录
    pub fn find(&self, code: &str) -> Option<&Record> {
        self.sections
            .iter()
            .flat_map(|s| s.selected.iter())
            .find(|r| r.code() == code)
    }
}

/// 最终排名中的一项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub rank: usize,
    pub code: String,
    pub name: String,
    /// 核心优势
    pub highlight: String,
    /// 风险提示
    pub risk: String,
}

/// 最终报告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalReport {
    pub entries: Vec<ReportEntry>,
    /// 参与汇总的不同候选代码数
    pub candidate_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::batch::FailureKind;

    fn sample_result() -> FileResult {
        FileResult {
            dataset_id: "股票_科创板".into(),
            status: FileStatus::Ok,
            columns: vec!["code".into(), "name".into()],
            outcomes: vec![
                BatchOutcome::failure(2, 10, FailureKind::Timeout, "超时"),
                BatchOutcome::success(1, 10, "叙述一".into(), vec!["688001".into()]),
            ],
            selected: vec![Record::new("688001", "华兴源创")],
        }
    }

    #[test]
    fn test_counts_and_ordering() {
        let result = sample_result();
        assert_eq!(result.batch_count(), 2);
        assert_eq!(result.failure_count(), 1);

        let seqs: Vec<usize> = result.outcomes_by_seq().iter().map(|o| o.seq).collect();
        assert_eq!(seqs, vec![1, 2]);
    }

    #[test]
    fn test_narratives_with_and_without_failures() {
        let result = sample_result();
        let all = result.narratives(true);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], "叙述一");
        assert!(all[1].contains("批次 2 分析失败"));

        assert_eq!(result.narratives(false), vec!["叙述一".to_string()]);
    }

    #[test]
    fn test_aggregation_input_counts() {
        let empty = AggregationInput::default();
        assert!(empty.is_empty());

        let input = AggregationInput {
            sections: vec![CandidateSection {
                dataset_id: "a".into(),
                columns: vec![],
                selected: vec![Record::new("1", "x"), Record::new("2", "y")],
                narratives: vec![],
            }],
        };
        assert_eq!(input.candidate_count(), 2);
        assert!(!input.is_empty());
        assert_eq!(input.find("2").map(Record::name), Some("y"));
        assert!(input.find("3").is_none());
    }

    #[test]
    fn test_code_selected_in_two_datasets_counts_once() {
        let section = |id: &str, name: &str| CandidateSection {
            dataset_id: id.into(),
            columns: vec![],
            selected: vec![Record::new("600519", name), Record::new(format!("{}-only", id), "z")],
            narratives: vec![],
        };
        let input = AggregationInput {
            sections: vec![section("沪深京A股", "贵州茅台"), section("沪股通", "茅台")],
        };

        assert_eq!(input.candidate_count(), 3);
        assert_eq!(input.find("600519").map(Record::name), Some("贵州茅台"));
    }
}
