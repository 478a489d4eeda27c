//! 参数表单的持久化输入
//!
//! 每个字段单独保存一个存储键（`etfCode`、`totalCapital`、`gridType`、
//! `riskPreference`、`adjustmentCoefficient`），值为 JSON 文本。
//! 投资金额按输入框的习惯保存为字符串。读取时缺失或无法识别的字段取默认值。

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::models::{AnalysisParameters, GridType, RiskPreference};
use super::storage::StoragePort;

pub const ETF_CODE_KEY: &str = "etfCode";
pub const TOTAL_CAPITAL_KEY: &str = "totalCapital";
pub const GRID_TYPE_KEY: &str = "gridType";
pub const RISK_PREFERENCE_KEY: &str = "riskPreference";
pub const ADJUSTMENT_KEY: &str = "adjustmentCoefficient";

/// 表单首次打开时的ETF
pub const DEFAULT_FORM_ETF: &str = "510300";

/// 表单上次提交的输入
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    pub etf_code: String,
    pub total_capital: f64,
    pub grid_type: GridType,
    pub risk_preference: RiskPreference,
    pub adjustment_coefficient: f64,
}

impl From<AnalysisParameters> for FormState {
    fn from(params: AnalysisParameters) -> Self {
        Self {
            etf_code: params.etf_code,
            total_capital: params.total_capital,
            grid_type: params.grid_type,
            risk_preference: params.risk_preference,
            adjustment_coefficient: params.adjustment_coefficient,
        }
    }
}

pub struct FormStateStore {
    storage: Arc<dyn StoragePort>,
}

impl FormStateStore {
    pub fn new(storage: Arc<dyn StoragePort>) -> Self {
        Self { storage }
    }

    fn read(&self, key: &str) -> Option<Value> {
        let raw = self.storage.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("表单字段 {} 无法解析，使用默认值: {}", key, e);
                None
            }
        }
    }

    fn read_text(&self, key: &str) -> Option<String> {
        match self.read(key)? {
            Value::String(text) => Some(text),
            _ => None,
        }
    }

    /// 数字或数字字符串
    fn read_number(&self, key: &str) -> Option<f64> {
        let number = match self.read(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        };
        number.filter(|n| n.is_finite())
    }

    /// 读取表单输入
    pub fn load(&self) -> FormState {
        let mut state = FormState::from(AnalysisParameters::with_defaults(DEFAULT_FORM_ETF));

        if let Some(code) = self.read_text(ETF_CODE_KEY) {
            state.etf_code = code;
        }
        if let Some(capital) = self.read_number(TOTAL_CAPITAL_KEY) {
            state.total_capital = capital;
        }
        if let Some(grid_type) = self.read_text(GRID_TYPE_KEY).as_deref().and_then(GridType::from_label) {
            state.grid_type = grid_type;
        }
        if let Some(risk) = self.read_text(RISK_PREFERENCE_KEY).as_deref().and_then(RiskPreference::from_label) {
            state.risk_preference = risk;
        }
        if let Some(adjustment) = self.read_number(ADJUSTMENT_KEY) {
            state.adjustment_coefficient = adjustment;
        }
        state
    }

    /// 保存一次提交的输入
    pub fn save(&self, params: &AnalysisParameters) -> Result<()> {
        let entries = [
            (ETF_CODE_KEY, Value::from(params.etf_code.as_str())),
            (TOTAL_CAPITAL_KEY, Value::from(params.total_capital.to_string())),
            (GRID_TYPE_KEY, Value::from(params.grid_type.label())),
            (RISK_PREFERENCE_KEY, Value::from(params.risk_preference.label())),
            (ADJUSTMENT_KEY, Value::from(params.adjustment_coefficient)),
        ];
        for (key, value) in entries {
            self.storage.set(key, &value.to_string())?;
        }
        Ok(())
    }
}
