//! 分析历史记录模型

use serde::{Deserialize, Serialize};

use super::AnalysisParameters;

/// 一条分析历史
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    /// ETF代码
    pub etf_code: String,
    /// ETF名称（缺失时补为 "ETF {代码}"）
    pub etf_name: String,
    /// 本次分析使用的参数
    pub params: AnalysisParameters,
    /// 分析时间（毫秒时间戳）
    pub timestamp: i64,
    /// 可分享的分析页面地址
    pub url: String,
}

impl HistoryRecord {
    /// 历史记录是否对应同一组参数（用于去重）
    pub fn same_analysis(&self, other: &HistoryRecord) -> bool {
        self.etf_code == other.etf_code && self.params == other.params
    }
}
