//! 常见ETF代码与名称

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::PopularEtf;

static EMBEDDED_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]{6})").unwrap());

/// 代码 → 名称
const ETF_NAMES: &[(&str, &str)] = &[
    // 宽基
    ("510300", "沪深300ETF"),
    ("159919", "沪深300ETF"),
    ("510500", "中证500ETF"),
    ("159915", "创业板ETF"),
    ("510050", "上证50ETF"),
    ("159901", "深证100ETF"),
    ("159902", "中小板ETF"),
    ("159949", "创业板50ETF"),
    ("159845", "中证1000ETF"),
    ("512100", "中证1000ETF"),
    ("588000", "科创50ETF"),
    ("588080", "科创板50ETF"),
    ("159781", "沪深300增强ETF"),
    ("510310", "HS300ETF"),
    ("510330", "华夏300ETF"),
    // 红利 / 消费
    ("510880", "红利ETF"),
    ("159928", "消费ETF"),
    ("512690", "酒ETF"),
    // 港股
    ("510900", "H股ETF"),
    ("159742", "恒生ETF"),
    // 行业
    ("512000", "券商ETF"),
    ("512880", "证券ETF"),
    ("515030", "新能源车ETF"),
    ("515700", "新能车ETF"),
    ("159995", "芯片ETF"),
    ("512480", "半导体ETF"),
    ("159870", "化工ETF"),
    ("159825", "农业ETF"),
    ("159992", "创新药ETF"),
    ("512010", "医药ETF"),
    ("159938", "医药卫生ETF"),
    ("515050", "5GETF"),
    ("159869", "人工智能ETF"),
    ("516160", "新能源ETF"),
    ("159790", "碳中和ETF"),
    ("512660", "军工ETF"),
    ("159967", "科技ETF"),
];

/// 引擎不可用时展示的热门列表
const POPULAR_CODES: &[&str] = &[
    "510300", "510500", "159915", "588000", "159919", "510050", "159901", "159902",
    "510880", "159928", "512000", "512660", "515030", "159967", "159742",
];

/// 已知名称
pub fn known_name(code: &str) -> Option<&'static str> {
    ETF_NAMES.iter().find(|(c, _)| *c == code).map(|(_, name)| *name)
}

/// ETF名称，未知代码返回代码本身
pub fn etf_name(code: &str) -> String {
    known_name(code).map_or_else(|| code.to_string(), str::to_string)
}

/// 本地热门ETF列表
pub fn popular_etfs() -> Vec<PopularEtf> {
    POPULAR_CODES
        .iter()
        .map(|code| PopularEtf {
            code: code.to_string(),
            name: etf_name(code),
        })
        .collect()
}

/// 从 "沪深300ETF (510300)" 这类输入中取出6位代码，取不到时原样返回
pub fn extract_etf_code(input: &str) -> String {
    let input = input.trim();
    EMBEDDED_CODE
        .captures(input)
        .and_then(|c| c.get(1))
        .map_or_else(|| input.to_string(), |m| m.as_str().to_string())
}
