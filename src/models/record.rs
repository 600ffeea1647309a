use std::collections::BTreeMap;
use std::fmt;

use crate::models::columns::{CODE, NAME};

/// 单元格取值
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Missing,
}

impl FieldValue {
    /// 解析原始单元格：空、`-`、`null` 视为缺失
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == "-" || raw.eq_ignore_ascii_case("null") {
            return FieldValue::Missing;
        }
        match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => FieldValue::Number(n),
            _ => FieldValue::Text(raw.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Missing => Ok(()),
        }
    }
}

/// 一只股票的快照
///
/// 由加载器创建，此后只读。身份由 `code` 决定（在同一数据集内唯一）
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    code: String,
    name: String,
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into().trim().to_string(),
            name: name.into().trim().to_string(),
            fields: BTreeMap::new(),
        }
    }

    /// 构造时附加字段
    pub fn with_field(mut self, key: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// 按列名取渲染后的文本，`code` / `name` 也可以通过此方法取得
    pub fn render_column(&self, key: &str) -> String {
        match key {
            CODE => self.code.clone(),
            NAME => self.name.clone(),
            _ => self
                .fields
                .get(key)
                .map(ToString::to_string)
                .unwrap_or_default(),
        }
    }

    pub fn has_code(&self) -> bool {
        !self.code.is_empty()
    }
}

/// 一个数据集（一个输入文件）
#[derive(Debug, Clone)]
pub struct Dataset {
    /// 数据集标识（文件名主干）
    pub id: String,
    /// 规范化后的列名，保持文件中的顺序
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn new(id: impl Into<String>, columns: Vec<String>, records: Vec<Record>) -> Self {
        Self {
            id: id.into(),
            columns,
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_parse() {
        assert_eq!(FieldValue::parse("3.25"), FieldValue::Number(3.25));
        assert_eq!(FieldValue::parse(" -1.5 "), FieldValue::Number(-1.5));
        assert_eq!(FieldValue::parse("-"), FieldValue::Missing);
        assert_eq!(FieldValue::parse(""), FieldValue::Missing);
        assert_eq!(FieldValue::parse("NULL"), FieldValue::Missing);
        assert_eq!(FieldValue::parse("NaN"), FieldValue::Text("NaN".into()));
        assert_eq!(FieldValue::parse("平安银行"), FieldValue::Text("平安银行".into()));
    }

    #[test]
    fn test_render_column() {
        let record = Record::new(" 000001 ", "平安银行")
            .with_field("pct_change", FieldValue::Number(2.5))
            .with_field("pe_ratio", FieldValue::Missing);

        assert_eq!(record.code(), "000001");
        assert_eq!(record.render_column("code"), "000001");
        assert_eq!(record.render_column("name"), "平安银行");
        assert_eq!(record.render_column("pct_change"), "2.5");
        assert_eq!(record.render_column("pe_ratio"), "");
        assert_eq!(record.render_column("unknown"), "");
    }
}
