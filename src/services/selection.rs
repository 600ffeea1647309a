//! 入选解析服务 - 业务能力层
//!
//! 从 LLM 的自由文本中解析编号列表。输出不是严格语法，
//! 不匹配的行一律忽略，异常输入只会得到空结果

use regex::Regex;

/// 编号行：`1. 600104 上汽集团`、`2、[000001] [平安银行]`、`**3.** 300750 宁德时代`、
/// `1. **600104 上汽集团**`、`2. **000001** 平安银行`
const NUMBERED_LINE: &str = r"^\s*(?:\*\*)?\d{1,3}\s*[.、．)）](?:\*\*)?\s*\*{0,2}\s*[\[【]?\s*([A-Za-z0-9]{1,10}(?:\.[A-Za-z]{2})?)\s*[\]】]?\s*\*{0,2}\s*(.*)$";

/// 说明行：`核心优势: ...`、`- 风险提示：...`
const LABEL_LINE: &str = r"(?i)^\s*[-*•]?\s*(?:\*\*)?(核心优势|优势|亮点|highlight|风险提示|风险|risk)(?:\*\*)?\s*[:：]\s*(.*)$";

/// 解析出的一条排名
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankedLine {
    pub code: String,
    pub name: String,
    pub highlight: String,
    pub risk: String,
}

/// 入选解析器
#[derive(Debug, Clone)]
pub struct SelectionExtractor {
    marker: String,
    numbered: Regex,
    label: Regex,
}

impl SelectionExtractor {
    pub fn new(marker: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            marker: marker.into(),
            numbered: Regex::new(NUMBERED_LINE)?,
            label: Regex::new(LABEL_LINE)?,
        })
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn has_marker(&self, narrative: &str) -> bool {
        narrative.contains(&self.marker)
    }

    /// 提取入选标记之后的股票代码，按出现顺序去重
    ///
    /// 没有标记时返回空列表
    pub fn extract(&self, narrative: &str) -> Vec<String> {
        let Some(pos) = narrative.find(&self.marker) else {
            return Vec::new();
        };
        let after_marker = &narrative[pos + self.marker.len()..];

        let mut codes: Vec<String> = Vec::new();
        for line in self.parse_ranked(after_marker) {
            if !codes.contains(&line.code) {
                codes.push(line.code);
            }
        }
        codes
    }

    /// 解析整段文本中的编号列表，附带每项后面的优势/风险说明
    pub fn parse_ranked(&self, text: &str) -> Vec<RankedLine> {
        let mut lines: Vec<RankedLine> = Vec::new();

        for raw in text.lines() {
            if let Some(caps) = self.numbered.captures(raw) {
                lines.push(RankedLine {
                    code: caps[1].to_string(),
                    name: leading_name(&caps[2]),
                    ..Default::default()
                });
                continue;
            }

            let (Some(current), Some(caps)) = (lines.last_mut(), self.label.captures(raw)) else {
                continue;
            };
            let content = caps[2].trim().to_string();
            match caps[1].to_lowercase().as_str() {
                "核心优势" | "优势" | "亮点" | "highlight" => current.highlight = content,
                _ => current.risk = content,
            }
        }

        lines
    }

    /// 把解析结果重新渲染为带标记的编号列表
    pub fn render(&self, lines: &[RankedLine]) -> String {
        let mut out = format!("{}\n", self.marker);
        for (idx, line) in lines.iter().enumerate() {
            out.push_str(&format!("{}. {} {}\n", idx + 1, line.code, line.name));
            if !line.highlight.is_empty() {
                out.push_str(&format!("   核心优势: {}\n", line.highlight));
            }
            if !line.risk.is_empty() {
                out.push_str(&format!("   风险提示: {}\n", line.risk));
            }
        }
        out
    }
}

/// 取编号行代码之后的名称（第一个词，去掉括号和加粗）
fn leading_name(rest: &str) -> String {
    let rest = rest.trim_start_matches(|c: char| c == '[' || c == '【' || c == '*' || c.is_whitespace());
    rest.split(|c: char| c == ']' || c == '】' || c == '*' || c.is_whitespace())
        .next()
        .unwrap_or_default()
        .to_string()
}
