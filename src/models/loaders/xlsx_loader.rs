use std::io::Cursor;
use std::path::Path;

use async_trait::async_trait;
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use tokio::fs;

use crate::error::LoadError;
use crate::models::columns::{canonical_column, CODE, NAME};
use crate::models::loaders::{dataset_id_for, validate_dataset, DatasetLoader};
use crate::models::record::{Dataset, FieldValue, Record};

/// A 股代码位数，数值单元格按此补零
const CODE_WIDTH: usize = 6;

/// Excel 数据集加载器
///
/// 读取第一个工作表，第一行为表头。代码列始终按文本处理，
/// 被存成数字的代码会补回前导零
#[derive(Debug, Clone, Default)]
pub struct XlsxDatasetLoader;

impl XlsxDatasetLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DatasetLoader for XlsxDatasetLoader {
    async fn load(&self, path: &Path) -> Result<Dataset, LoadError> {
        let bytes = fs::read(path)
            .await
            .map_err(|e| LoadError::read_failed(path.display().to_string(), e))?;

        let dataset = parse_xlsx(&dataset_id_for(path), path, bytes)?;
        validate_dataset(dataset)
    }
}

/// 从工作簿字节解析数据集（不做校验）
pub fn parse_xlsx(dataset_id: &str, path: &Path, bytes: Vec<u8>) -> Result<Dataset, LoadError> {
    let workbook_err = |source: calamine::Error| LoadError::Workbook {
        path: path.display().to_string(),
        source,
    };

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(workbook_err)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadError::NoWorksheet {
            path: path.display().to_string(),
        })?
        .map_err(workbook_err)?;

    Ok(parse_range(dataset_id, &range))
}

/// 把工作表区域转换成数据集
pub fn parse_range(dataset_id: &str, range: &Range<Data>) -> Dataset {
    let mut rows = range.rows();
    let columns: Vec<String> = rows
        .next()
        .map(|header| header.iter().map(|cell| canonical_column(&cell_text(cell))).collect())
        .unwrap_or_default();

    let code_idx = columns.iter().position(|c| c == CODE);
    let name_idx = columns.iter().position(|c| c == NAME);

    let records = rows
        .map(|row| {
            let code = code_idx.and_then(|i| row.get(i)).map(code_text).unwrap_or_default();
            let name = name_idx.and_then(|i| row.get(i)).map(cell_text).unwrap_or_default();

            let mut record = Record::new(code, name);
            for (idx, column) in columns.iter().enumerate() {
                if Some(idx) == code_idx || Some(idx) == name_idx {
                    continue;
                }
                let value = row.get(idx).map(field_value).unwrap_or(FieldValue::Missing);
                record = record.with_field(column.clone(), value);
            }
            record
        })
        .collect();

    Dataset::new(dataset_id, columns, records)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

fn code_text(cell: &Data) -> String {
    match cell {
        Data::Int(n) if *n >= 0 => format!("{:0width$}", n, width = CODE_WIDTH),
        Data::Float(f) if *f >= 0.0 && f.fract() == 0.0 => {
            format!("{:0width$}", *f as u64, width = CODE_WIDTH)
        }
        other => cell_text(other),
    }
}

fn field_value(cell: &Data) -> FieldValue {
    match cell {
        Data::Int(n) => FieldValue::Number(*n as f64),
        Data::Float(f) if f.is_finite() => FieldValue::Number(*f),
        Data::Empty | Data::Error(_) => FieldValue::Missing,
        other => FieldValue::parse(&other.to_string()),
    }
}
