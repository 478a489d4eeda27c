//! 分析引擎返回的数据模型
//!
//! 引擎统一以 `{success, data, error}` 包装返回，这里只对客户端
//! 真正读取的字段做强类型定义，其余部分保留为 JSON

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 分析引擎的统一响应包装
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineResponse<T> {
    /// 请求是否成功
    #[serde(default)]
    pub success: bool,
    /// 响应数据
    pub data: Option<T>,
    /// 失败原因
    pub error: Option<String>,
    /// 部分接口使用 message 字段
    pub message: Option<String>,
}

impl<T> EngineResponse<T> {
    /// 失败原因，优先 error 字段
    pub fn failure_reason(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}

/// ETF基础信息
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EtfInfo {
    /// ETF代码
    pub code: String,
    /// ETF名称
    pub name: String,
    /// 管理人
    pub management_company: String,
    /// 最新价
    pub current_price: f64,
    /// 涨跌幅
    pub change_pct: f64,
    /// 成交量
    pub volume: f64,
    /// 成交额
    pub amount: f64,
    /// 成立日期
    pub setup_date: String,
    /// 上市日期
    pub list_date: String,
    pub fund_type: String,
    pub status: String,
    /// 行情日期
    pub trade_date: String,
    /// 数据滞后天数
    pub data_age_days: i64,
}

/// 热门ETF
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularEtf {
    pub code: String,
    pub name: String,
}

/// 历史行情（日线）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoricalBar {
    /// 日期
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// 引擎版本信息
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionInfo {
    pub version: String,
    pub timestamp: Option<String>,
}

/// 引擎健康检查结果（该接口不使用统一包装）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: Option<String>,
    pub service: Option<String>,
    pub version: Option<String>,
    pub environment: Option<String>,
}

/// 策略分析结果
///
/// 各部分的结构由分析引擎决定，客户端只负责透传与分组展示
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisResult {
    /// ETF基础信息
    pub etf_info: Value,
    /// 适宜度评估
    pub suitability_evaluation: Value,
    /// 网格策略参数
    pub grid_strategy: Value,
    /// 策略依据
    pub strategy_rationale: Value,
    /// 调整建议
    pub adjustment_suggestions: Value,
    /// 数据质量
    pub data_quality: Value,
    /// 输入参数回显
    pub input_parameters: Value,
}

impl AnalysisResult {
    /// 结果中的ETF名称
    pub fn etf_name(&self) -> Option<&str> {
        self.etf_info
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
    }
}
