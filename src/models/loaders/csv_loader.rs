use std::path::Path;

use async_trait::async_trait;
use tokio::fs;

use crate::error::LoadError;
use crate::models::columns::{canonical_column, CODE, NAME};
use crate::models::loaders::{dataset_id_for, validate_dataset, DatasetLoader};
use crate::models::record::{Dataset, FieldValue, Record};

/// CSV 数据集加载器
///
/// 表头经过规范化，缺少必需列或代码列全空时返回对应的 `LoadError`
#[derive(Debug, Clone, Default)]
pub struct CsvDatasetLoader;

impl CsvDatasetLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DatasetLoader for CsvDatasetLoader {
    async fn load(&self, path: &Path) -> Result<Dataset, LoadError> {
        let bytes = fs::read(path)
            .await
            .map_err(|e| LoadError::read_failed(path.display().to_string(), e))?;

        let dataset = parse_csv(&dataset_id_for(path), path, &bytes)?;
        validate_dataset(dataset)
    }
}

/// 从 CSV 字节解析数据集（不做校验）
pub fn parse_csv(dataset_id: &str, path: &Path, bytes: &[u8]) -> Result<Dataset, LoadError> {
    let parse_err = |source: csv::Error| LoadError::Parse {
        path: path.display().to_string(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let columns: Vec<String> = reader
        .headers()
        .map_err(parse_err)?
        .iter()
        .map(canonical_column)
        .collect();

    let code_idx = columns.iter().position(|c| c == CODE);
    let name_idx = columns.iter().position(|c| c == NAME);

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(parse_err)?;
        let code = code_idx.and_then(|i| row.get(i)).unwrap_or_default();
        let name = name_idx.and_then(|i| row.get(i)).unwrap_or_default();

        let mut record = Record::new(code, name);
        for (idx, column) in columns.iter().enumerate() {
            if Some(idx) == code_idx || Some(idx) == name_idx {
                continue;
            }
            let value = row.get(idx).map(FieldValue::parse).unwrap_or(FieldValue::Missing);
            record = record.with_field(column.clone(), value);
        }
        records.push(record);
    }

    Ok(Dataset::new(dataset_id, columns, records))
}
