//! 分析参数的 URL 编解码
//!
//! 分析页面地址形如 `/analysis/510300?capital=100000&grid=geometric&risk=balanced&adjustment=1`，
//! 便于分享和收藏。解码时丢弃越界数值，补全时再统一回填默认值并记录修正说明。

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use url::form_urlencoded;

use crate::models::{
    AnalysisParameters, GridType, PartialParameters, RiskPreference, ADJUSTMENT_MAX, ADJUSTMENT_MIN,
    DEFAULT_ADJUSTMENT, DEFAULT_CAPITAL,
};
use super::validation::{validate_etf_code, CapitalBounds, URL_CAPITAL_BOUNDS};

/// 允许带前缀，如 `/api/v1/analysis/510300`
static ANALYSIS_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|/)analysis/([0-9]{6})$").unwrap());
/// 字符串开头的数字部分，`150000元` → `150000`
static LEADING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?").unwrap());

const KEY_CAPITAL: &str = "capital";
const KEY_GRID: &str = "grid";
const KEY_RISK: &str = "risk";
const KEY_ADJUSTMENT: &str = "adjustment";

/// 补全结果：合法的完整参数 + 每个被修正字段的说明
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Completion {
    pub params: AnalysisParameters,
    pub errors: Vec<String>,
}

impl Completion {
    /// 是否有字段被自动修正
    pub fn corrected(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// 分析页面地址的解析结果
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAnalysisUrl {
    pub etf_code: Option<String>,
    pub params: PartialParameters,
    pub is_valid: bool,
}

/// 参数编解码器
///
/// 投资金额的合法区间来自配置，默认 1万-100万
#[derive(Debug, Clone, Copy)]
pub struct ParamCodec {
    capital_bounds: CapitalBounds,
}

impl Default for ParamCodec {
    fn default() -> Self {
        Self::new(URL_CAPITAL_BOUNDS)
    }
}

impl ParamCodec {
    pub fn new(capital_bounds: CapitalBounds) -> Self {
        Self { capital_bounds }
    }

    /// 参数 → 查询字符串，只输出存在的字段
    pub fn encode(&self, params: &PartialParameters) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());

        if let Some(capital) = params.total_capital {
            serializer.append_pair(KEY_CAPITAL, &capital.to_string());
        }
        if let Some(grid) = params.grid_type.as_deref() {
            let code = match GridType::from_label(grid) {
                Some(grid_type) => grid_type.url_code(),
                None => grid,
            };
            serializer.append_pair(KEY_GRID, code);
        }
        if let Some(risk) = params.risk_preference.as_deref() {
            let code = match RiskPreference::from_label(risk) {
                Some(risk_preference) => risk_preference.url_code(),
                None => risk,
            };
            serializer.append_pair(KEY_RISK, code);
        }
        if let Some(adjustment) = params.adjustment_coefficient {
            serializer.append_pair(KEY_ADJUSTMENT, &adjustment.to_string());
        }

        serializer.finish()
    }

    /// 完整参数 → 查询字符串
    pub fn encode_complete(&self, params: &AnalysisParameters) -> String {
        self.encode(&PartialParameters::from(params))
    }

    /// 查询字符串 → 部分参数
    ///
    /// 越界或无法解析的数值直接丢弃；无法识别的枚举编码原样保留，留给补全阶段报告
    pub fn decode(&self, query: &str) -> PartialParameters {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut capital = None;
        let mut grid = None;
        let mut risk = None;
        let mut adjustment = None;

        // 同名参数只取第一个
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let slot = match key.as_ref() {
                KEY_CAPITAL => &mut capital,
                KEY_GRID => &mut grid,
                KEY_RISK => &mut risk,
                KEY_ADJUSTMENT => &mut adjustment,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }

        let total_capital = capital
            .and_then(|c| parse_leading_number(&c))
            .filter(|c| self.capital_bounds.contains(*c));

        let grid_type = grid.filter(|g| !g.is_empty()).map(|g| match GridType::from_url_code(&g) {
            Some(grid_type) => grid_type.label().to_string(),
            None => g,
        });

        let risk_preference = risk.filter(|r| !r.is_empty()).map(|r| match RiskPreference::from_url_code(&r) {
            Some(risk) => risk.label().to_string(),
            None => r,
        });

        let adjustment_coefficient = adjustment
            .and_then(|a| parse_leading_number(&a))
            .filter(|a| (ADJUSTMENT_MIN..=ADJUSTMENT_MAX).contains(a));

        PartialParameters {
            total_capital,
            grid_type,
            risk_preference,
            adjustment_coefficient,
        }
    }

    /// 校验并补全参数
    ///
    /// 缺失字段静默填入默认值；存在但无效的字段填入默认值并记录一条修正说明
    pub fn validate_and_complete(&self, etf_code: &str, params: &PartialParameters) -> Completion {
        let mut errors = Vec::new();

        let total_capital = match params.total_capital {
            None => DEFAULT_CAPITAL,
            Some(capital) if self.capital_bounds.contains(capital) => capital,
            Some(_) => {
                errors.push(format!("投资金额应在{}之间", self.capital_bounds.range_label()));
                DEFAULT_CAPITAL
            }
        };

        let grid_type = match params.grid_type.as_deref() {
            None | Some("") => GridType::default(),
            Some(label) => GridType::from_label(label).unwrap_or_else(|| {
                errors.push("网格类型参数无效".to_string());
                GridType::default()
            }),
        };

        let risk_preference = match params.risk_preference.as_deref() {
            None | Some("") => RiskPreference::default(),
            Some(label) => RiskPreference::from_label(label).unwrap_or_else(|| {
                errors.push("频率偏好参数无效".to_string());
                RiskPreference::default()
            }),
        };

        let adjustment_coefficient = match params.adjustment_coefficient {
            None => DEFAULT_ADJUSTMENT,
            Some(a) if (ADJUSTMENT_MIN..=ADJUSTMENT_MAX).contains(&a) => a,
            Some(_) => {
                errors.push(format!("调节系数应在{:.1}-{:.1}之间", ADJUSTMENT_MIN, ADJUSTMENT_MAX));
                DEFAULT_ADJUSTMENT
            }
        };

        Completion {
            params: AnalysisParameters {
                etf_code: etf_code.to_string(),
                total_capital,
                grid_type,
                risk_preference,
                adjustment_coefficient,
            },
            errors,
        }
    }

    /// 生成分析页面的完整地址
    pub fn analysis_url(&self, origin: &str, etf_code: &str, params: &AnalysisParameters) -> String {
        format!(
            "{}{}",
            origin.trim_end_matches('/'),
            self.analysis_path(etf_code, params)
        )
    }

    /// 生成分析页面的站内路径
    pub fn analysis_path(&self, etf_code: &str, params: &AnalysisParameters) -> String {
        format!("/analysis/{}?{}", etf_code, self.encode_complete(params))
    }

    /// 解析分析页面的路径与查询字符串
    pub fn parse_analysis_url(&self, path: &str, query: &str) -> ParsedAnalysisUrl {
        let etf_code = ANALYSIS_PATH
            .captures(path)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string());

        let is_valid = validate_etf_code(etf_code.as_deref());

        ParsedAnalysisUrl {
            etf_code,
            params: self.decode(query),
            is_valid,
        }
    }
}

/// 取字符串开头的数字，其后的内容忽略；开头不是数字时返回 None
fn parse_leading_number(text: &str) -> Option<f64> {
    LEADING_NUMBER
        .find(text.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|n| n.is_finite())
}
