//! 校验工具
//!
//! 表单与业务规则校验，全部是无副作用的纯函数。
//! 校验失败是正常结果而不是错误，统一以 [`Validation`] 返回。

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::format::format_wan;

static ETF_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{6}$").unwrap());
static DASHED_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").unwrap());
static COMPACT_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{8}$").unwrap());

/// 投资金额上下限（闭区间）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapitalBounds {
    pub min: f64,
    pub max: f64,
}

impl CapitalBounds {
    pub fn contains(&self, amount: f64) -> bool {
        amount.is_finite() && amount >= self.min && amount <= self.max
    }

    /// 如 "1万-100万"
    pub fn range_label(&self) -> String {
        format!("{}-{}", format_wan(self.min), format_wan(self.max))
    }
}

/// 参数表单使用的上下限：10万-500万
pub const FORM_CAPITAL_BOUNDS: CapitalBounds = CapitalBounds { min: 100_000.0, max: 5_000_000.0 };

/// URL 解析与自动修正使用的上下限：1万-100万，与分析引擎的入参校验一致
pub const URL_CAPITAL_BOUNDS: CapitalBounds = CapitalBounds { min: 10_000.0, max: 1_000_000.0 };

/// 单项校验结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    pub is_valid: bool,
    pub error: String,
}

impl Validation {
    pub fn ok() -> Self {
        Self { is_valid: true, error: String::new() }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self { is_valid: false, error: error.into() }
    }
}

/// 表单字段取值
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Missing,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl FieldValue {
    /// 仅数字类型返回数值
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        value.map(FieldValue::Text).unwrap_or(FieldValue::Missing)
    }
}

/// JSON 请求体中的字段
///
/// 数字字符串按数字处理，空字符串保留为文本以便必填校验识别
impl From<Option<&Value>> for FieldValue {
    fn from(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => FieldValue::Missing,
            Some(Value::Number(n)) => n.as_f64().map(FieldValue::Number).unwrap_or(FieldValue::Missing),
            Some(Value::Bool(b)) => FieldValue::Bool(*b),
            Some(Value::String(s)) => match s.trim().parse::<f64>() {
                Ok(n) => FieldValue::Number(n),
                Err(_) => FieldValue::Text(s.clone()),
            },
            Some(other) => FieldValue::Text(other.to_string()),
        }
    }
}

/// 数值的简洁文本，去掉多余的小数位
fn trim_number(value: f64) -> String {
    let text = format!("{:.4}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// ETF代码是否为6位数字
pub fn validate_etf_code(etf_code: Option<&str>) -> bool {
    etf_code.map_or(false, |code| ETF_CODE.is_match(code))
}

/// 校验投资金额
pub fn validate_capital(amount: Option<f64>, bounds: &CapitalBounds) -> Validation {
    let amount = match amount {
        Some(a) if a.is_finite() => a,
        _ => return Validation::fail("请输入有效的投资金额"),
    };

    if amount < bounds.min {
        return Validation::fail(format!("投资金额不能少于{}元", format_wan(bounds.min)));
    }
    if amount > bounds.max {
        return Validation::fail(format!("投资金额不能超过{}元", format_wan(bounds.max)));
    }
    Validation::ok()
}

/// 校验百分比（0-1 的小数）
pub fn validate_percentage(value: Option<f64>, min: f64, max: f64) -> Validation {
    let value = match value {
        Some(v) if !v.is_nan() => v,
        _ => return Validation::fail("请输入有效的百分比值"),
    };

    if value < min {
        return Validation::fail(format!("百分比值不能小于{}%", trim_number(min * 100.0)));
    }
    if value > max {
        return Validation::fail(format!("百分比值不能大于{}%", trim_number(max * 100.0)));
    }
    Validation::ok()
}

/// 使用默认区间 [0, 1] 校验百分比
pub fn validate_ratio(value: Option<f64>) -> Validation {
    validate_percentage(value, 0.0, 1.0)
}

/// 日期格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFormat {
    /// YYYY-MM-DD
    #[default]
    Dashed,
    /// YYYYMMDD
    Compact,
}

impl DateFormat {
    fn pattern(self) -> (&'static Regex, &'static str, &'static str) {
        match self {
            DateFormat::Dashed => (&*DASHED_DATE, "%Y-%m-%d", "YYYY-MM-DD"),
            DateFormat::Compact => (&*COMPACT_DATE, "%Y%m%d", "YYYYMMDD"),
        }
    }
}

/// 校验日期字符串，拒绝 2月30日 这类不存在的日期
pub fn validate_date(date: Option<&str>, format: DateFormat) -> Validation {
    let date = match date {
        Some(d) if !d.is_empty() => d,
        _ => return Validation::fail("请输入日期"),
    };

    let (shape, chrono_format, label) = format.pattern();
    if !shape.is_match(date) {
        return Validation::fail(format!("日期格式应为 {}", label));
    }
    if NaiveDate::parse_from_str(date, chrono_format).is_err() {
        return Validation::fail("请输入有效的日期");
    }
    Validation::ok()
}

/// 必填校验：缺失与空字符串无效，0 和 false 有效
pub fn validate_required(value: &FieldValue, field_name: &str) -> Validation {
    match value {
        FieldValue::Missing => Validation::fail(format!("{}是必填项", field_name)),
        FieldValue::Text(s) if s.is_empty() => Validation::fail(format!("{}是必填项", field_name)),
        _ => Validation::ok(),
    }
}

/// 数字范围校验
pub fn validate_number_range(value: &FieldValue, min: f64, max: f64, field_name: &str) -> Validation {
    let value = match value.as_number() {
        Some(v) if !v.is_nan() => v,
        _ => return Validation::fail(format!("{}必须是有效的数字", field_name)),
    };

    if value < min {
        return Validation::fail(format!("{}不能小于{}", field_name, trim_number(min)));
    }
    if value > max {
        return Validation::fail(format!("{}不能大于{}", field_name, trim_number(max)));
    }
    Validation::ok()
}

/// 表单校验规则：接收字段值与字段名
pub type Rule<'a> = Box<dyn Fn(&FieldValue, &str) -> Validation + 'a>;

/// 必填规则
pub fn required_rule<'a>() -> Rule<'a> {
    Box::new(validate_required)
}

/// ETF代码规则
pub fn etf_code_rule<'a>() -> Rule<'a> {
    Box::new(|value: &FieldValue, _: &str| {
        if validate_etf_code(value.as_text()) {
            Validation::ok()
        } else {
            Validation::fail("请输入6位数字ETF代码")
        }
    })
}

/// 投资金额规则
pub fn capital_rule<'a>(bounds: CapitalBounds) -> Rule<'a> {
    Box::new(move |value: &FieldValue, _: &str| validate_capital(value.as_number(), &bounds))
}

/// 数字范围规则
pub fn number_range_rule<'a>(min: f64, max: f64) -> Rule<'a> {
    Box::new(move |value: &FieldValue, field_name: &str| validate_number_range(value, min, max, field_name))
}

/// 以指定字段名执行规则，错误信息使用该名称而不是表单键
pub fn labelled_rule<'a>(rule: Rule<'a>, label: &'a str) -> Rule<'a> {
    Box::new(move |value: &FieldValue, _: &str| rule(value, label))
}

/// 表单校验结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormValidation {
    pub is_valid: bool,
    /// 每个失败字段一条错误信息
    pub errors: BTreeMap<String, String>,
}

/// 按字段依次执行规则，每个字段遇到第一条失败即停止
pub fn validate_form(data: &BTreeMap<String, FieldValue>, rules: &[(&str, Vec<Rule<'_>>)]) -> FormValidation {
    let mut errors = BTreeMap::new();

    for (field_name, field_rules) in rules {
        let value = data.get(*field_name).unwrap_or(&FieldValue::Missing);

        if let Some(failure) = field_rules
            .iter()
            .map(|rule| rule(value, *field_name))
            .find(|result| !result.is_valid)
        {
            errors.insert(field_name.to_string(), failure.error);
        }
    }

    FormValidation { is_valid: errors.is_empty(), errors }
}
