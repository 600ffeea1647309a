pub mod csv_loader;
pub mod xlsx_loader;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{info, warn};

use crate::error::LoadError;
use crate::models::columns::missing_required;
use crate::models::record::Dataset;

pub use csv_loader::CsvDatasetLoader;
pub use xlsx_loader::XlsxDatasetLoader;

/// 数据集加载能力
///
/// 必须保证必需列存在（否则 `MissingColumns`），代码列全空时返回 `EmptyData`
#[async_trait]
pub trait DatasetLoader: Send + Sync {
    async fn load(&self, path: &Path) -> Result<Dataset, LoadError>;
}

/// 按扩展名选择加载器：`.csv` 走 CSV，`.xlsx`/`.xls` 走工作簿
#[derive(Debug, Clone, Default)]
pub struct AutoDatasetLoader {
    csv: CsvDatasetLoader,
    xlsx: XlsxDatasetLoader,
}

impl AutoDatasetLoader {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DatasetLoader for AutoDatasetLoader {
    async fn load(&self, path: &Path) -> Result<Dataset, LoadError> {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => self.csv.load(path).await,
            "xlsx" | "xls" => self.xlsx.load(path).await,
            _ => Err(LoadError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }
}

/// 数据集标识：文件名主干
pub fn dataset_id_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// 校验数据集：必需列齐全，且至少有一条带代码的记录
///
/// 代码为空的记录会被丢弃
pub fn validate_dataset(mut dataset: Dataset) -> Result<Dataset, LoadError> {
    let missing = missing_required(&dataset.columns);
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns {
            dataset: dataset.id,
            missing,
        });
    }

    let before = dataset.records.len();
    dataset.records.retain(|r| r.has_code());
    let dropped = before - dataset.records.len();
    if dropped > 0 {
        warn!("[数据集 {}] 丢弃 {} 条无代码记录", dataset.id, dropped);
    }

    if dataset.records.is_empty() {
        return Err(LoadError::EmptyData {
            dataset: dataset.id,
        });
    }

    Ok(dataset)
}

/// 扫描目录下所有符合扩展名的数据集文件，按文件名排序
///
/// 扩展名不区分大小写。两个文件映射到同一个数据集标识时返回 `DuplicateDataset`
pub async fn discover_datasets(folder_path: &str, extensions: &[String]) -> Result<Vec<PathBuf>, LoadError> {
    let folder = PathBuf::from(folder_path);

    if !folder.is_dir() {
        return Err(LoadError::DirectoryNotFound {
            path: folder_path.to_string(),
        });
    }

    let mut files = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .map_err(|e| LoadError::read_failed(folder_path, e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| LoadError::read_failed(folder_path, e))?
    {
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| extensions.iter().any(|wanted| ext.eq_ignore_ascii_case(wanted)));
        if matches && path.is_file() {
            info!(
                "发现数据集: {}",
                path.file_name().unwrap_or_default().to_string_lossy()
            );
            files.push(path);
        }
    }

    files.sort();
    reject_duplicate_ids(&files)?;
    Ok(files)
}

fn reject_duplicate_ids(files: &[PathBuf]) -> Result<(), LoadError> {
    let mut by_id: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for path in files {
        by_id
            .entry(dataset_id_for(path))
            .or_default()
            .push(path.display().to_string());
    }

    match by_id.into_iter().find(|(_, paths)| paths.len() > 1) {
        Some((dataset, paths)) => Err(LoadError::DuplicateDataset { dataset, paths }),
        None => Ok(()),
    }
}
