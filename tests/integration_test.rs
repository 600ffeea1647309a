mod common;

use std::sync::Arc;

use common::{row, test_config, write_dataset, BrokenSink, MemorySink, RuleOracle};
use stock_analyzer::error::OracleError;
use stock_analyzer::models::AutoDatasetLoader;
use stock_analyzer::services::MarkdownFileSink;
use stock_analyzer::{App, Config};
use tempfile::tempdir;
use tokio_test::{assert_err, assert_ok};

const CONSOLIDATION_NEEDLE: &str = "综合评分";

/// 主板 5 只（3 批，第 3 批超时）、创业板 2 只（1 批）、一个缺列数据集
fn seed_data(dir: &std::path::Path) {
    write_dataset(
        dir,
        "主板.csv",
        &[
            row("600001", "甲股份", 1.2),
            row("600002", "乙股份", -0.5),
            row("600003", "丙股份", 0.0),
            row("600004", "丁股份", 3.4),
            row("600005", "戊股份", 2.1),
        ],
    );
    write_dataset(
        dir,
        "创业板.csv",
        &[row("300750", "宁德时代", 4.2), row("300059", "东方财富", 1.0)],
    );
    std::fs::write(dir.join("坏数据.csv"), "代码,名称\n000001,平安银行\n").unwrap();
}

fn scripted_oracle() -> RuleOracle {
    RuleOracle::new()
        .when(
            CONSOLIDATION_NEEDLE,
            Ok("综合来看如下。\n【入选】\n\
                1. 300750 宁德时代\n   核心优势: 行业龙头，放量上涨\n   风险提示: 估值偏高\n\
                2. 888888 编造股份\n\
                3. 600004 丁股份\n   核心优势: 涨幅居前\n\
                4. 600001 甲股份\n\
                5. 300750 宁德时代\n"
                .into()),
        )
        .when(
            "数据集: 主板，第 1/3 批",
            Ok("量能温和。\n【入选】\n1. 600001 甲股份\n   核心优势: 低估值".into()),
        )
        .when(
            "数据集: 主板，第 2/3 批",
            Ok("【入选】\n1. 600004 丁股份\n2. 600009 不在本批".into()),
        )
        .when("数据集: 主板，第 3/3 批", Err(OracleError::Timeout { secs: 120 }))
        .when(
            "数据集: 创业板，第 1/1 批",
            Ok("【入选】\n1. 300750 宁德时代".into()),
        )
}

#[tokio::test]
async fn test_end_to_end_with_partial_failures() {
    let dir = tempdir().unwrap();
    seed_data(dir.path());

    let oracle = Arc::new(scripted_oracle());
    let sink = Arc::new(MemorySink::default());
    let app = assert_ok!(App::with_components(
        test_config(dir.path()),
        Arc::new(AutoDatasetLoader::new()),
        oracle.clone(),
        sink.clone(),
    ));

    let summary = assert_ok!(app.run().await);

    assert_eq!(summary.datasets, 3);
    assert_eq!(summary.failed_datasets, 1);
    assert_eq!(summary.batches, 4);
    assert_eq!(summary.failed_batches, 1);
    assert_eq!(summary.report.candidate_count, 3);

    let codes: Vec<&str> = summary.report.entries.iter().map(|e| e.code.as_str()).collect();
    assert_eq!(codes, vec!["300750", "600004", "600001"]);
    let ranks: Vec<usize> = summary.report.entries.iter().map(|e| e.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
    assert_eq!(summary.report.entries[0].risk, "估值偏高");

    // 4 个批次请求 + 1 次汇总
    assert_eq!(oracle.calls(), 5);
    let consolidation: Vec<_> = oracle
        .requests()
        .into_iter()
        .filter(|r| r.user.contains(CONSOLIDATION_NEEDLE))
        .collect();
    assert_eq!(consolidation.len(), 1);
    assert!(consolidation[0].user.contains("分析失败"));
    assert!(!consolidation[0].user.contains("600002"));

    let reports = sink.reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert!(report.contains("## 综合排名 Top 3"));
    assert!(report.contains("### 1. 300750 宁德时代"));
    assert!(report.contains("候选股票总数: 3"));
    assert!(report.contains("## 坏数据 分析结果"));
    assert!(report.contains("[数据集处理失败]"));
    assert!(report.contains("批次: 3 (失败 1), 入选: 2"));

    assert_eq!(
        summary.to_string(),
        "✅ 分析完成: 3 个数据集 (失败 1), 4 个批次 (失败 1), 候选 3 只, 入选 3 只"
    );
}

#[tokio::test]
async fn test_failed_dataset_contributes_no_candidates() {
    let dir = tempdir().unwrap();
    write_dataset(
        dir.path(),
        "科创板.csv",
        &[row("688001", "华兴源创", 2.0), row("688002", "睿创微纳", 1.5)],
    );
    std::fs::write(dir.path().join("残缺.csv"), "代码,名称,涨跌幅\n000001,平安银行,1.0\n").unwrap();

    let oracle = Arc::new(
        RuleOracle::new()
            .when(
                CONSOLIDATION_NEEDLE,
                Ok("1. 688002 睿创微纳\n   核心优势: 弹性大\n2. 688001 华兴源创".into()),
            )
            .when(
                "数据集: 科创板，第 1/1 批",
                Ok("【入选】\n1. 688001 华兴源创\n2. 688002 睿创微纳".into()),
            ),
    );
    let sink = Arc::new(MemorySink::default());
    let app = assert_ok!(App::with_components(
        test_config(dir.path()),
        Arc::new(AutoDatasetLoader::new()),
        oracle.clone(),
        sink.clone(),
    ));

    let summary = assert_ok!(app.run().await);

    assert_eq!(summary.failed_datasets, 1);
    assert_eq!(summary.report.candidate_count, 2);
    assert_eq!(summary.report.entries.len(), 2);
    assert_eq!(summary.report.entries[0].code, "688002");

    let requests = oracle.requests();
    let consolidation = requests
        .iter()
        .find(|r| r.user.contains(CONSOLIDATION_NEEDLE))
        .unwrap();
    assert!(!consolidation.user.contains("000001"));
}

#[tokio::test]
async fn test_no_candidates_fails_run_without_report() {
    let dir = tempdir().unwrap();
    write_dataset(dir.path(), "主板.csv", &[row("600001", "甲股份", 1.2)]);

    let oracle = Arc::new(RuleOracle::new().when("第 1/1 批", Ok("今天没有值得买的。".into())));
    let sink = Arc::new(MemorySink::default());
    let app = assert_ok!(App::with_components(
        test_config(dir.path()),
        Arc::new(AutoDatasetLoader::new()),
        oracle.clone(),
        sink.clone(),
    ));

    assert_err!(app.run().await);
    assert_eq!(oracle.calls(), 1);
    assert!(sink.reports.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_data_folder_is_an_error() {
    let dir = tempdir().unwrap();

    let app = assert_ok!(App::with_components(
        test_config(dir.path()),
        Arc::new(AutoDatasetLoader::new()),
        Arc::new(RuleOracle::new()),
        Arc::new(MemorySink::default()),
    ));

    assert_err!(app.run().await);
}

#[tokio::test]
async fn test_same_dataset_id_in_two_formats_is_rejected() {
    let dir = tempdir().unwrap();
    write_dataset(dir.path(), "主板.csv", &[row("600001", "甲股份", 1.2)]);
    std::fs::write(dir.path().join("主板.xlsx"), "").unwrap();

    let oracle = Arc::new(RuleOracle::new());
    let app = assert_ok!(App::with_components(
        test_config(dir.path()),
        Arc::new(AutoDatasetLoader::new()),
        oracle.clone(),
        Arc::new(MemorySink::default()),
    ));

    let err = assert_err!(app.run().await);
    assert!(format!("{:#}", err).contains("数据集标识 主板 重复"));
    assert_eq!(oracle.calls(), 0);
}

#[tokio::test]
async fn test_sink_failure_is_reported() {
    let dir = tempdir().unwrap();
    seed_data(dir.path());

    let app = assert_ok!(App::with_components(
        test_config(dir.path()),
        Arc::new(AutoDatasetLoader::new()),
        Arc::new(scripted_oracle()),
        Arc::new(BrokenSink),
    ));

    let err = assert_err!(app.run().await);
    assert!(format!("{:#}", err).contains("报告写入失败"));
}

#[tokio::test]
async fn test_report_written_to_markdown_file() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    std::fs::create_dir(&data).unwrap();
    seed_data(&data);
    let report_path = dir.path().join("out").join("report.md");

    let config = Config {
        report_path: report_path.display().to_string(),
        ..test_config(&data)
    };
    let app = assert_ok!(App::with_components(
        config.clone(),
        Arc::new(AutoDatasetLoader::new()),
        Arc::new(scripted_oracle()),
        Arc::new(MarkdownFileSink::new(&config.report_path)),
    ));

    assert_ok!(app.run().await);

    let written = std::fs::read_to_string(&report_path).unwrap();
    assert!(written.starts_with("# 每日股票潜力分析报告"));
    assert!(written.contains("## 创业板 分析结果"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = tempdir().unwrap();
    let config = Config {
        top_n: 0,
        ..test_config(dir.path())
    };

    let built = App::with_components(
        config,
        Arc::new(AutoDatasetLoader::new()),
        Arc::new(RuleOracle::new()),
        Arc::new(MemorySink::default()),
    );
    assert!(built.is_err());
}

#[tokio::test]
#[ignore] // 默认忽略，需要 LLM_API_KEY 和 data/ 目录：cargo test -- --ignored
async fn test_live_run() {
    stock_analyzer::utils::logging::init("info");

    let config = Config::from_env().expect("加载配置失败");
    let summary = App::new(config)
        .expect("初始化失败")
        .run()
        .await
        .expect("分析失败");

    println!("{}", summary);
}
