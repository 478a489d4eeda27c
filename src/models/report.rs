//! 分析报告标签页

use serde::Serialize;
use serde_json::{Map, Value};

use super::AnalysisResult;

/// 分析结果的各个分区
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportSection {
    EtfInfo,
    SuitabilityEvaluation,
    GridStrategy,
    StrategyRationale,
    AdjustmentSuggestions,
    DataQuality,
    InputParameters,
}

impl ReportSection {
    /// 分区在结果 JSON 中的键名
    pub fn key(self) -> &'static str {
        match self {
            ReportSection::EtfInfo => "etf_info",
            ReportSection::SuitabilityEvaluation => "suitability_evaluation",
            ReportSection::GridStrategy => "grid_strategy",
            ReportSection::StrategyRationale => "strategy_rationale",
            ReportSection::AdjustmentSuggestions => "adjustment_suggestions",
            ReportSection::DataQuality => "data_quality",
            ReportSection::InputParameters => "input_parameters",
        }
    }

    pub fn value(self, result: &AnalysisResult) -> &Value {
        match self {
            ReportSection::EtfInfo => &result.etf_info,
            ReportSection::SuitabilityEvaluation => &result.suitability_evaluation,
            ReportSection::GridStrategy => &result.grid_strategy,
            ReportSection::StrategyRationale => &result.strategy_rationale,
            ReportSection::AdjustmentSuggestions => &result.adjustment_suggestions,
            ReportSection::DataQuality => &result.data_quality,
            ReportSection::InputParameters => &result.input_parameters,
        }
    }
}

/// 报告标签页
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportTab {
    /// 概览
    Overview,
    /// 适宜度评估
    Suitability,
    /// 网格策略
    Strategy,
}

impl ReportTab {
    pub const ALL: [ReportTab; 3] = [ReportTab::Overview, ReportTab::Suitability, ReportTab::Strategy];

    pub fn id(self) -> &'static str {
        match self {
            ReportTab::Overview => "overview",
            ReportTab::Suitability => "suitability",
            ReportTab::Strategy => "strategy",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReportTab::Overview => "概览",
            ReportTab::Suitability => "适宜度评估",
            ReportTab::Strategy => "网格策略",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tab| tab.id() == id)
    }

    /// 标签页展示的结果分区
    pub fn sections(self) -> &'static [ReportSection] {
        match self {
            ReportTab::Overview => &[
                ReportSection::EtfInfo,
                ReportSection::InputParameters,
                ReportSection::DataQuality,
            ],
            ReportTab::Suitability => &[ReportSection::SuitabilityEvaluation],
            ReportTab::Strategy => &[
                ReportSection::GridStrategy,
                ReportSection::StrategyRationale,
                ReportSection::AdjustmentSuggestions,
            ],
        }
    }

    /// 从分析结果中取出本标签页的内容
    pub fn select(self, result: &AnalysisResult) -> Value {
        let content: Map<String, Value> = self
            .sections()
            .iter()
            .map(|section| (section.key().to_string(), section.value(result).clone()))
            .collect();
        Value::Object(content)
    }
}
