//! 分析流程
//!
//! 三个入口：
//! - `run_from_path`: 分享链接 `/analysis/{code}?capital=..&grid=..` 打开的分析，
//!   参数越界时自动修正并给出修正后的查询串
//! - `run_from_url`: 已拆出ETF代码的同一流程
//! - `run_from_form`: 参数表单提交，先按表单规则校验并保存表单输入
//!
//! 之后的步骤相同：检查免责声明 → 请求分析引擎 → 写入历史

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{
    AnalysisForm, AnalysisParameters, AnalysisResult, GridType, HistoryRecord, PartialParameters, RiskPreference,
    ADJUSTMENT_MAX, ADJUSTMENT_MIN, DEFAULT_ADJUSTMENT,
};
use super::api_client::ApiClient;
use super::codec::ParamCodec;
use super::disclaimer::DisclaimerGate;
use super::form_state::FormStateStore;
use super::history::HistoryStore;
use super::validation::{
    capital_rule, etf_code_rule, labelled_rule, number_range_rule, required_rule, validate_etf_code, validate_form,
    CapitalBounds, FieldValue, FormValidation, Rule, Validation,
};

const ETF_CODE_FIELD: &str = "etfCode";
const CAPITAL_FIELD: &str = "totalCapital";
const GRID_TYPE_FIELD: &str = "gridType";
const RISK_FIELD: &str = "riskPreference";
const ADJUSTMENT_FIELD: &str = "adjustmentCoefficient";

/// 一次完成的分析
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedAnalysis {
    pub etf_name: String,
    pub params: AnalysisParameters,
    pub result: AnalysisResult,
    /// 自动修正说明，未修正时为空
    pub corrections: Vec<String>,
    /// 参数被修正时，修正后的查询串
    pub corrected_query: Option<String>,
    /// 可分享的分析地址
    pub share_url: String,
}

/// 分析流程的结果
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    /// ETF代码无效，应返回首页
    Rejected { etf_code: String },
    /// 表单校验未通过
    InvalidForm(FormValidation),
    /// 尚未确认免责声明（或已过期），未发起分析请求
    DisclaimerRequired {
        params: AnalysisParameters,
        corrections: Vec<String>,
    },
    Completed(CompletedAnalysis),
}

pub struct AnalysisService {
    codec: ParamCodec,
    form_capital: CapitalBounds,
    public_origin: String,
    client: ApiClient,
    disclaimer: DisclaimerGate,
    history: HistoryStore,
    form_state: FormStateStore,
}

impl AnalysisService {
    pub fn new(
        codec: ParamCodec,
        form_capital: CapitalBounds,
        public_origin: impl Into<String>,
        client: ApiClient,
        disclaimer: DisclaimerGate,
        history: HistoryStore,
        form_state: FormStateStore,
    ) -> Self {
        Self {
            codec,
            form_capital,
            public_origin: public_origin.into(),
            client,
            disclaimer,
            history,
            form_state,
        }
    }

    /// 表单使用的投资金额上下限
    pub fn form_capital(&self) -> CapitalBounds {
        self.form_capital
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn disclaimer(&self) -> &DisclaimerGate {
        &self.disclaimer
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn form_state(&self) -> &FormStateStore {
        &self.form_state
    }

    /// 从分享链接的路径与查询串发起分析
    pub async fn run_from_path(&self, path: &str, query: &str, now: DateTime<Utc>) -> Result<AnalysisOutcome> {
        let parsed = self.codec.parse_analysis_url(path, query);
        match parsed.etf_code {
            Some(etf_code) if parsed.is_valid => self.complete_and_run(&etf_code, &parsed.params, now).await,
            _ => {
                let etf_code = path.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
                log::warn!("无效的分析链接: {}", path);
                Ok(AnalysisOutcome::Rejected {
                    etf_code: etf_code.to_string(),
                })
            }
        }
    }

    /// 从已拆出的ETF代码与查询串发起分析
    pub async fn run_from_url(&self, etf_code: &str, query: &str, now: DateTime<Utc>) -> Result<AnalysisOutcome> {
        if !validate_etf_code(Some(etf_code)) {
            log::warn!("无效的ETF代码: {}", etf_code);
            return Ok(AnalysisOutcome::Rejected {
                etf_code: etf_code.to_string(),
            });
        }

        let partial = self.codec.decode(query);
        self.complete_and_run(etf_code, &partial, now).await
    }

    async fn complete_and_run(
        &self,
        etf_code: &str,
        partial: &PartialParameters,
        now: DateTime<Utc>,
    ) -> Result<AnalysisOutcome> {
        let completion = self.codec.validate_and_complete(etf_code, partial);
        if completion.corrected() {
            log::warn!("URL参数已自动修正 [{}]: {}", etf_code, completion.errors.join("; "));
        }

        self.run(completion.params, completion.errors, now).await
    }

    /// 从参数表单发起分析
    pub async fn run_from_form(&self, form: &AnalysisForm, now: DateTime<Utc>) -> Result<AnalysisOutcome> {
        let fields = form_fields(form);
        let validation = self.validate_fields(&fields);
        if !validation.is_valid {
            return Ok(AnalysisOutcome::InvalidForm(validation));
        }

        let number = |key: &str| fields.get(key).and_then(FieldValue::as_number);
        let params = AnalysisParameters {
            etf_code: form.etf_code.clone().unwrap_or_default(),
            total_capital: number(CAPITAL_FIELD).unwrap_or_default(),
            grid_type: form.grid_type.as_deref().and_then(GridType::from_label).unwrap_or_default(),
            risk_preference: form
                .risk_preference
                .as_deref()
                .and_then(RiskPreference::from_label)
                .unwrap_or_default(),
            adjustment_coefficient: number(ADJUSTMENT_FIELD).unwrap_or(DEFAULT_ADJUSTMENT),
        };

        if let Err(e) = self.form_state.save(&params) {
            log::error!("保存表单输入失败: {}", e);
        }

        self.run(params, Vec::new(), now).await
    }

    /// 表单校验：代码与金额必填，其余字段可选
    pub fn validate_form(&self, form: &AnalysisForm) -> FormValidation {
        self.validate_fields(&form_fields(form))
    }

    fn validate_fields(&self, fields: &BTreeMap<String, FieldValue>) -> FormValidation {
        let rules: Vec<(&str, Vec<Rule>)> = vec![
            (ETF_CODE_FIELD, vec![labelled_rule(required_rule(), "ETF代码"), etf_code_rule()]),
            (
                CAPITAL_FIELD,
                vec![labelled_rule(required_rule(), "投资金额"), capital_rule(self.form_capital)],
            ),
            (GRID_TYPE_FIELD, vec![label_rule(|label| GridType::from_label(label).is_some(), "网格类型参数无效")]),
            (RISK_FIELD, vec![label_rule(|label| RiskPreference::from_label(label).is_some(), "频率偏好参数无效")]),
            (ADJUSTMENT_FIELD, vec![labelled_rule(number_range_rule(ADJUSTMENT_MIN, ADJUSTMENT_MAX), "调节系数")]),
        ];

        validate_form(fields, &rules)
    }

    async fn run(
        &self,
        params: AnalysisParameters,
        corrections: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<AnalysisOutcome> {
        if !self.disclaimer.check_status(now) {
            return Ok(AnalysisOutcome::DisclaimerRequired { params, corrections });
        }

        log::info!(
            "开始分析 {}: 金额={} 网格={} 频率={} 系数={}",
            params.etf_code,
            params.total_capital,
            params.grid_type.label(),
            params.risk_preference.label(),
            params.adjustment_coefficient
        );

        let response = self.client.analyze_etf(&params).await?;
        let result = match (response.success, response.data) {
            (true, Some(result)) => result,
            (true, None) => return Err(anyhow!("分析失败")),
            (false, _) => {
                let reason = response.error.or(response.message).unwrap_or_else(|| "分析失败".to_string());
                log::error!("分析引擎返回失败 [{}]: {}", params.etf_code, reason);
                return Err(anyhow!(reason));
            }
        };

        let etf_name = result
            .etf_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("ETF {}", params.etf_code));
        let share_url = self.codec.analysis_url(&self.public_origin, &params.etf_code, &params);
        let corrected_query = (!corrections.is_empty()).then(|| self.codec.encode_complete(&params));

        let record = HistoryRecord {
            etf_code: params.etf_code.clone(),
            etf_name: etf_name.clone(),
            params: params.clone(),
            timestamp: now.timestamp_millis(),
            url: self.codec.analysis_path(&params.etf_code, &params),
        };
        if let Err(e) = self.history.save(record) {
            log::error!("保存分析历史失败: {}", e);
        }

        Ok(AnalysisOutcome::Completed(CompletedAnalysis {
            etf_name,
            params,
            result,
            corrections,
            corrected_query,
            share_url,
        }))
    }
}

/// 表单各字段的取值；缺失的调节系数按默认值处理
fn form_fields(form: &AnalysisForm) -> BTreeMap<String, FieldValue> {
    let adjustment = match FieldValue::from(form.adjustment_coefficient.as_ref()) {
        FieldValue::Missing => FieldValue::Number(DEFAULT_ADJUSTMENT),
        value => value,
    };

    BTreeMap::from([
        (ETF_CODE_FIELD.to_string(), FieldValue::from(form.etf_code.clone())),
        (CAPITAL_FIELD.to_string(), FieldValue::from(form.total_capital.as_ref())),
        (GRID_TYPE_FIELD.to_string(), FieldValue::from(form.grid_type.clone())),
        (RISK_FIELD.to_string(), FieldValue::from(form.risk_preference.clone())),
        (ADJUSTMENT_FIELD.to_string(), adjustment),
    ])
}

/// 可选的枚举标签：未填写有效，填写时必须是已知标签
fn label_rule<'a>(known: fn(&str) -> bool, error: &'a str) -> Rule<'a> {
    Box::new(move |value: &FieldValue, _: &str| match value {
        FieldValue::Missing => Validation::ok(),
        FieldValue::Text(label) if known(label) => Validation::ok(),
        _ => Validation::fail(error),
    })
}

/// 构建测试用的分析服务
#[cfg(test)]
pub(crate) fn test_service(base_url: &str) -> (std::sync::Arc<crate::services::storage::MemoryStorage>, AnalysisService) {
    use std::sync::Arc;
    use super::validation::{FORM_CAPITAL_BOUNDS, URL_CAPITAL_BOUNDS};
    use crate::services::disclaimer::DEFAULT_VALID_DAYS;
    use crate::services::history::DEFAULT_HISTORY_LIMIT;
    use crate::services::storage::MemoryStorage;

    let storage = Arc::new(MemoryStorage::new());
    let service = AnalysisService::new(
        ParamCodec::new(URL_CAPITAL_BOUNDS),
        FORM_CAPITAL_BOUNDS,
        "https://grid.example.com",
        ApiClient::new(base_url),
        DisclaimerGate::new(storage.clone(), DEFAULT_VALID_DAYS),
        HistoryStore::new(storage.clone(), DEFAULT_HISTORY_LIMIT),
        FormStateStore::new(storage.clone()),
    );
    (storage, service)
}
