//! 提示词构建
//!
//! 只负责把数据渲染为提示词，不调用服务

use serde_json::json;

use crate::models::columns::PCT_CHANGE;
use crate::models::{AggregationInput, Batch, Record};
use crate::services::ScoringRequest;
use crate::workflow::batch_ctx::BatchCtx;

/// 每批要求 LLM 选出的股票数
pub const BATCH_PICKS: usize = 3;

const BATCH_SYSTEM_MESSAGE: &str = "你是一名专业的A股分析师，擅长结合量价、估值和资金活跃度筛选短线潜力股。\
    你只能从给定数据中选择股票，不得编造股票代码。";

const CONSOLIDATION_SYSTEM_MESSAGE: &str = "你是一名资深的投资组合经理，负责对多位分析师的初选结果做最终排序。\
    你只能从给定的候选股票中选择，不得编造股票代码。";

const REPLY_FORMAT: &str = "1. [股票代码] [股票名称]\n   核心优势: (50字内简要说明主要优势)\n   风险提示: (30字内说明主要风险)\n2. ...";

/// 把记录渲染为 CSV（首行为列名）
pub fn render_records_csv(columns: &[String], records: &[Record]) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(columns)?;
    for record in records {
        writer.write_record(columns.iter().map(|c| record.render_column(c)))?;
    }
    let bytes = writer.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// 批次开头的重点候选列表（JSON）
pub fn head_candidates_json(records: &[Record], limit: usize) -> String {
    let head: Vec<_> = records
        .iter()
        .take(limit)
        .map(|r| {
            json!({
                "code": r.code(),
                "name": r.name(),
                "pct_change": r.field(PCT_CHANGE).and_then(|v| v.as_f64()),
            })
        })
        .collect();
    serde_json::to_string_pretty(&head).unwrap_or_default()
}

/// 构建单个批次的打分请求
pub fn build_batch_request(
    ctx: &BatchCtx,
    batch: &Batch,
    marker: &str,
    head_candidates: usize,
) -> Result<ScoringRequest, csv::Error> {
    let table = render_records_csv(&ctx.columns, &batch.records)?;
    let head = head_candidates_json(&batch.records, head_candidates);

    let user_message = format!(
        r#"请分析以下股票数据（数据集: {dataset}，第 {seq}/{total} 批，共 {count} 只），找出今日最具潜力的{picks}只股票，按潜力排序。分析时请综合考虑：
- 涨跌幅（近期趋势）
- 成交量（市场关注度）
- 市盈率/市净率（估值水平）
- 换手率（资金活跃度）
- 量比（短期交易动能）

本批重点候选（前 {head_len} 只）：
{head}

股票数据：
{table}
请先给出简要分析，然后单独一行输出"{marker}"，再用以下格式返回结果：
{format}"#,
        dataset = ctx.dataset_id,
        seq = ctx.seq,
        total = ctx.total_batches,
        count = batch.len(),
        picks = BATCH_PICKS,
        head_len = head_candidates.min(batch.len()),
        head = head,
        table = table,
        marker = marker,
        format = REPLY_FORMAT,
    );

    Ok(ScoringRequest::new(BATCH_SYSTEM_MESSAGE, user_message))
}

/// 构建汇总请求（固定权重评分）
pub fn build_consolidation_request(
    input: &AggregationInput,
    top_n: usize,
) -> Result<ScoringRequest, csv::Error> {
    let mut sections = String::new();
    for section in &input.sections {
        sections.push_str(&format!("\n### 数据集: {}\n候选股票:\n", section.dataset_id));
        sections.push_str(&render_records_csv(&section.columns, &section.selected)?);
        if !section.narratives.is_empty() {
            sections.push_str("\n各批次分析:\n");
            for narrative in &section.narratives {
                sections.push_str(narrative.trim());
                sections.push_str("\n---\n");
            }
        }
    }

    let user_message = format!(
        r#"以下是从 {datasets} 个数据集中初选出的 {candidates} 只候选股票，以及各批次分析师的意见。
请按以下权重综合评分，选出最具潜力的 {top_n} 只股票并排序：
- 技术面（涨跌幅、量比、振幅）: 35%
- 基本面（市盈率、市净率）: 25%
- 市场关注度（成交量、换手率）: 20%
- 风险收益比: 20%

注意：标记为"分析失败"的批次没有结论，仅供参考。
{sections}
请直接用以下格式返回结果，不要输出其他内容：
{format}"#,
        datasets = input.sections.len(),
        candidates = input.candidate_count(),
        top_n = top_n,
        sections = sections,
        format = REPLY_FORMAT,
    );

    Ok(ScoringRequest::new(CONSOLIDATION_SYSTEM_MESSAGE, user_message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CandidateSection, FieldValue};
    use std::sync::Arc;

    fn columns() -> Vec<String> {
        vec!["code".into(), "name".into(), "pct_change".into()]
    }

    fn record(code: &str, name: &str, pct: f64) -> Record {
        Record::new(code, name).with_field("pct_change", FieldValue::Number(pct))
    }

    #[test]
    fn test_render_records_csv() {
        let csv = render_records_csv(
            &columns(),
            &[record("600104", "上汽集团", 1.5), record("000001", "平安, 银行", -0.2)],
        )
        .unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "code,name,pct_change");
        assert_eq!(lines[1], "600104,上汽集团,1.5");
        assert_eq!(lines[2], "000001,\"平安, 银行\",-0.2");
    }

    #[test]
    fn test_head_candidates_limit() {
        let records = vec![record("1", "a", 1.0), record("2", "b", 2.0), record("3", "c", 3.0)];
        let head: serde_json::Value = serde_json::from_str(&head_candidates_json(&records, 2)).unwrap();
        assert_eq!(head.as_array().unwrap().len(), 2);
        assert_eq!(head[1]["code"], "2");
        assert_eq!(head[1]["pct_change"], 2.0);
    }

    #[test]
    fn test_batch_request_contains_marker_and_rows() {
        let ctx = BatchCtx::new(Arc::from("股票_创业板"), 2, 3, Arc::from(columns()));
        let batch = Batch {
            seq: 2,
            records: vec![record("300750", "宁德时代", 3.2)],
        };

        let request = build_batch_request(&ctx, &batch, "【入选】", 10).unwrap();
        assert!(request.user.contains("第 2/3 批"));
        assert!(request.user.contains("\"【入选】\""));
        assert!(request.user.contains("300750,宁德时代,3.2"));
        assert!(request.user.contains("前 1 只"));
        assert!(!request.system.is_empty());
    }

    #[test]
    fn test_consolidation_request_lists_sections() {
        let input = AggregationInput {
            sections: vec![CandidateSection {
                dataset_id: "股票_科创板".into(),
                columns: columns(),
                selected: vec![record("688981", "中芯国际", 4.4)],
                narratives: vec!["[批次 1 分析失败: 超时] 调用超时".into()],
            }],
        };

        let request = build_consolidation_request(&input, 3).unwrap();
        assert!(request.user.contains("1 个数据集"));
        assert!(request.user.contains("1 只候选股票"));
        assert!(request.user.contains("### 数据集: 股票_科创板"));
        assert!(request.user.contains("688981,中芯国际,4.4"));
        assert!(request.user.contains("批次 1 分析失败"));
        assert!(request.user.contains("技术面"));
    }
}
