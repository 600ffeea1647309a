pub mod llm_service;
pub mod report_renderer;
pub mod report_writer;
pub mod selection;

pub use llm_service::{LlmService, ScoringOracle, ScoringRequest};
pub use report_renderer::render_report;
pub use report_writer::{MarkdownFileSink, ReportSink};
pub use selection::{RankedLine, SelectionExtractor};
