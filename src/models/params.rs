//! 分析参数模型
//!
//! 网格类型、频率偏好两个封闭枚举，以及完整/部分分析参数

use serde::{Deserialize, Serialize};

/// 默认投资金额
pub const DEFAULT_CAPITAL: f64 = 100_000.0;
/// 默认调节系数
pub const DEFAULT_ADJUSTMENT: f64 = 1.0;
/// 调节系数下限
pub const ADJUSTMENT_MIN: f64 = 0.0;
/// 调节系数上限
pub const ADJUSTMENT_MAX: f64 = 2.0;

/// 网格类型
///
/// 序列化为中文标签（与分析引擎约定一致），URL 中使用英文编码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GridType {
    /// 等比网格
    #[default]
    #[serde(rename = "等比")]
    Geometric,
    /// 等差网格
    #[serde(rename = "等差")]
    Arithmetic,
}

impl GridType {
    pub const ALL: [GridType; 2] = [GridType::Geometric, GridType::Arithmetic];

    /// 中文标签
    pub fn label(self) -> &'static str {
        match self {
            GridType::Geometric => "等比",
            GridType::Arithmetic => "等差",
        }
    }

    /// URL 参数编码
    pub fn url_code(self) -> &'static str {
        match self {
            GridType::Geometric => "geometric",
            GridType::Arithmetic => "arithmetic",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.label() == label)
    }

    pub fn from_url_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.url_code() == code)
    }
}

/// 频率偏好
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RiskPreference {
    /// 低频
    #[serde(rename = "低频")]
    Conservative,
    /// 均衡
    #[default]
    #[serde(rename = "均衡")]
    Balanced,
    /// 高频
    #[serde(rename = "高频")]
    Aggressive,
}

impl RiskPreference {
    pub const ALL: [RiskPreference; 3] = [
        RiskPreference::Conservative,
        RiskPreference::Balanced,
        RiskPreference::Aggressive,
    ];

    /// 中文标签
    pub fn label(self) -> &'static str {
        match self {
            RiskPreference::Conservative => "低频",
            RiskPreference::Balanced => "均衡",
            RiskPreference::Aggressive => "高频",
        }
    }

    /// URL 参数编码
    pub fn url_code(self) -> &'static str {
        match self {
            RiskPreference::Conservative => "conservative",
            RiskPreference::Balanced => "balanced",
            RiskPreference::Aggressive => "aggressive",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.label() == label)
    }

    pub fn from_url_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.url_code() == code)
    }
}

/// 完整的分析参数
///
/// 发往分析引擎前所有字段都必须是合法值，字段名使用 camelCase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisParameters {
    /// ETF代码（6位数字）
    pub etf_code: String,
    /// 投资金额
    pub total_capital: f64,
    /// 网格类型
    pub grid_type: GridType,
    /// 频率偏好
    pub risk_preference: RiskPreference,
    /// 调节系数（0.0-2.0）
    pub adjustment_coefficient: f64,
}

impl AnalysisParameters {
    /// 使用默认参数构造
    pub fn with_defaults(etf_code: impl Into<String>) -> Self {
        Self {
            etf_code: etf_code.into(),
            total_capital: DEFAULT_CAPITAL,
            grid_type: GridType::default(),
            risk_preference: RiskPreference::default(),
            adjustment_coefficient: DEFAULT_ADJUSTMENT,
        }
    }
}

/// 从 URL 或表单解析出的部分参数
///
/// 枚举字段保留原始字符串：未知取值属于"存在但无效"，需要在补全时给出提示
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialParameters {
    pub total_capital: Option<f64>,
    /// 中文标签，或无法识别的原始值
    pub grid_type: Option<String>,
    /// 中文标签，或无法识别的原始值
    pub risk_preference: Option<String>,
    pub adjustment_coefficient: Option<f64>,
}

impl From<&AnalysisParameters> for PartialParameters {
    fn from(params: &AnalysisParameters) -> Self {
        Self {
            total_capital: Some(params.total_capital),
            grid_type: Some(params.grid_type.label().to_string()),
            risk_preference: Some(params.risk_preference.label().to_string()),
            adjustment_coefficient: Some(params.adjustment_coefficient),
        }
    }
}

/// 参数表单提交数据（HTTP 表单接口使用）
///
/// 字段保留原始取值，类型错误和未知标签由表单校验给出字段级提示
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisForm {
    pub etf_code: Option<String>,
    /// 数字或数字字符串
    pub total_capital: Option<serde_json::Value>,
    /// 中文标签，如 "等比"
    pub grid_type: Option<String>,
    /// 中文标签，如 "均衡"
    pub risk_preference: Option<String>,
    pub adjustment_coefficient: Option<serde_json::Value>,
}
