pub mod batch;
pub mod columns;
pub mod loaders;
pub mod record;
pub mod report;

pub use batch::{Batch, BatchOutcome, BatchStatus, FailureKind};
pub use loaders::{
    discover_datasets, validate_dataset, AutoDatasetLoader, CsvDatasetLoader, DatasetLoader, XlsxDatasetLoader,
};
pub use record::{Dataset, FieldValue, Record};
pub use report::{AggregationInput, CandidateSection, FileResult, FileStatus, FinalReport, ReportEntry};
