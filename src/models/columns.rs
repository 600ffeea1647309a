//! 列名规范化
//!
//! 行情抓取得到的表头是中文，这里统一映射到规范列名

use phf::phf_map;

pub const CODE: &str = "code";
pub const NAME: &str = "name";
pub const PCT_CHANGE: &str = "pct_change";

/// 必需列
pub const REQUIRED_COLUMNS: &[&str] = &[
    CODE,
    NAME,
    PCT_CHANGE,
    "volume",
    "pe_ratio",
    "pb_ratio",
    "turnover_rate",
    "volume_ratio",
];

/// 中文表头 → 规范列名
static HEADER_ALIASES: phf::Map<&'static str, &'static str> = phf_map! {
    "代码" => "code",
    "股票代码" => "code",
    "名称" => "name",
    "股票名称" => "name",
    "最新价" => "price",
    "涨跌幅" => "pct_change",
    "涨跌额" => "change",
    "成交量（手）" => "volume",
    "成交量(手)" => "volume",
    "成交量" => "volume",
    "成交额" => "amount",
    "振幅(%)" => "amplitude",
    "最高" => "high",
    "最低" => "low",
    "今开" => "open",
    "昨收" => "prev_close",
    "量比" => "volume_ratio",
    "换手率" => "turnover_rate",
    "市盈率(动态)" => "pe_ratio",
    "市盈率" => "pe_ratio",
    "市净率" => "pb_ratio",
};

/// 把表头映射为规范列名；未知列原样保留
pub fn canonical_column(header: &str) -> String {
    let header = header.trim().trim_start_matches('\u{feff}');
    HEADER_ALIASES
        .get(header)
        .map(|s| s.to_string())
        .unwrap_or_else(|| header.to_string())
}

/// 返回缺失的必需列
pub fn missing_required(columns: &[String]) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|required| !columns.iter().any(|c| c == *required))
        .map(|s| s.to_string())
        .collect()
}
