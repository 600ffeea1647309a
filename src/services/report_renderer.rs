//! 报告渲染
//!
//! 把最终排名和各数据集的批次分析整理成 Markdown

use chrono::{DateTime, Local};

use crate::models::{FileResult, FileStatus, FinalReport};

pub const REPORT_TITLE: &str = "# 每日股票潜力分析报告";

/// 渲染完整报告：最终排名 + 按数据集排列的附录
pub fn render_report(
    report: &FinalReport,
    file_results: &[FileResult],
    generated_at: DateTime<Local>,
) -> String {
    let mut out = String::new();
    out.push_str(REPORT_TITLE);
    out.push_str("\n\n");
    out.push_str(&format!(
        "生成时间: {}\n\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));

    out.push_str(&format!("## 综合排名 Top {}\n\n", report.entries.len()));
    for entry in &report.entries {
        out.push_str(&format!("### {}. {} {}\n\n", entry.rank, entry.code, entry.name));
        out.push_str(&format!("- 核心优势: {}\n", or_dash(&entry.highlight)));
        out.push_str(&format!("- 风险提示: {}\n\n", or_dash(&entry.risk)));
    }
    out.push_str(&format!("候选股票总数: {}\n", report.candidate_count));

    let mut results: Vec<&FileResult> = file_results.iter().collect();
    results.sort_by(|a, b| a.dataset_id.cmp(&b.dataset_id));

    for result in results {
        out.push_str(&format!("\n## {} 分析结果\n\n", result.dataset_id));
        match &result.status {
            FileStatus::Failed { reason } => {
                out.push_str(&format!("[数据集处理失败] {}\n", reason));
            }
            FileStatus::Ok => {
                out.push_str(&format!(
                    "批次: {} (失败 {}), 入选: {}\n\n",
                    result.batch_count(),
                    result.failure_count(),
                    result.selected.len()
                ));
                for outcome in result.outcomes_by_seq() {
                    out.push_str(&format!("### 批次 {}\n\n", outcome.seq));
                    out.push_str(outcome.narrative_text().trim());
                    out.push_str("\n\n");
                }
            }
        }
    }

    out
}

fn or_dash(text: &str) -> &str {
    if text.trim().is_empty() {
        "-"
    } else {
        text
    }
}
