//! 批次处理流程 - 流程层
//!
//! 核心职责：定义"一个批次"的完整处理流程
//!
//! 流程顺序：
//! 1. 构建提示词
//! 2. 调用打分服务（超时/网络错误按退避重试）
//! 3. 校验入选标记
//! 4. 提取股票代码
//!
//! 任何一步失败都转成 `BatchStatus::Failure`，不会向外抛错

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::OracleError;
use crate::models::{Batch, BatchOutcome, FailureKind};
use crate::services::{ScoringOracle, ScoringRequest, SelectionExtractor};
use crate::utils::logging::truncate_text;
use crate::workflow::batch_ctx::BatchCtx;
use crate::workflow::prompts::build_batch_request;

/// 批次处理流程
///
/// - 持有共享的打分服务（只读）
/// - 只处理单个批次
/// - 永远返回一个 `BatchOutcome`
pub struct BatchWorker {
    oracle: Arc<dyn ScoringOracle>,
    extractor: SelectionExtractor,
    timeout: Duration,
    max_retries: usize,
    retry_backoff: Duration,
    head_candidates: usize,
}

impl BatchWorker {
    pub fn new(oracle: Arc<dyn ScoringOracle>, config: &Config) -> Result<Self, regex::Error> {
        Ok(Self {
            oracle,
            extractor: SelectionExtractor::new(config.selection_marker.clone())?,
            timeout: config.oracle_timeout(),
            max_retries: config.oracle_max_retries,
            retry_backoff: config.retry_backoff(),
            head_candidates: config.head_candidates,
        })
    }

    pub async fn process(&self, ctx: &BatchCtx, batch: &Batch) -> BatchOutcome {
        info!("{} 🔍 开始分析 {} 只股票", ctx, batch.len());

        let request = match build_batch_request(ctx, batch, self.extractor.marker(), self.head_candidates) {
            Ok(request) => request,
            Err(e) => {
                warn!("{} ⚠️ 渲染批次数据失败: {}", ctx, e);
                return BatchOutcome::failure(
                    batch.seq,
                    batch.len(),
                    FailureKind::TaskAborted,
                    format!("渲染批次数据失败: {}", e),
                );
            }
        };

        let narrative = match self.call_with_retry(ctx, &request).await {
            Ok(narrative) => narrative,
            Err(e) => {
                warn!("{} ❌ 打分失败: {}", ctx, e);
                return BatchOutcome::failure(batch.seq, batch.len(), FailureKind::from(&e), e.to_string());
            }
        };

        if narrative.trim().is_empty() {
            warn!("{} ⚠️ 返回内容为空", ctx);
            return BatchOutcome::failure(batch.seq, batch.len(), FailureKind::EmptyResponse, "返回内容为空");
        }

        if !self.extractor.has_marker(&narrative) {
            warn!(
                "{} ⚠️ 返回内容缺少入选标记: {}",
                ctx,
                truncate_text(&narrative, 80)
            );
            return BatchOutcome::failure(
                batch.seq,
                batch.len(),
                FailureKind::MissingMarker,
                format!("返回内容缺少入选标记 {}", self.extractor.marker()),
            );
        }

        let codes = self.extractor.extract(&narrative);
        debug!("{} 叙述: {}", ctx, narrative);
        info!("{} ✓ 分析完成，入选: {:?}", ctx, codes);

        BatchOutcome::success(batch.seq, batch.len(), narrative, codes)
    }

    /// 调用打分服务，超时/网络错误按指数退避重试
    async fn call_with_retry(&self, ctx: &BatchCtx, request: &ScoringRequest) -> Result<String, OracleError> {
        let mut attempt = 0;
        loop {
            // 外层超时，不依赖实现方遵守 timeout 参数
            let result = match tokio::time::timeout(self.timeout, self.oracle.score(request, self.timeout)).await {
                Ok(result) => result,
                Err(_) => Err(OracleError::Timeout {
                    secs: self.timeout.as_secs(),
                }),
            };

            match result {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let backoff = self.retry_backoff.saturating_mul(2u32.saturating_pow(attempt as u32));
                    attempt += 1;
                    warn!(
                        "{} 打分失败: {} (尝试 {}/{}), {:?} 后重试...",
                        ctx,
                        e,
                        attempt,
                        self.max_retries + 1,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
                other => return other,
            }
        }
    }
}
