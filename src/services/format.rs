//! 格式化工具
//!
//! 金额、百分比、日期、千分位、万/亿简写、相对时间

use anyhow::{anyhow, Result};
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Asia::Shanghai;
use once_cell::sync::Lazy;
use regex::Regex;

static COMPACT_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{8}$").unwrap());
static DASHED_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").unwrap());

/// 给整数部分加千分位
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// 四舍五入到指定小数位，0.5 远离零进位
fn round_half_away(value: f64, digits: usize) -> f64 {
    let factor = 10f64.powi(digits as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

/// 按小数位数范围格式化绝对值，返回 (是否为负, 带千分位的数字)
fn format_decimal(value: f64, min_fraction: usize, max_fraction: usize) -> (bool, String) {
    let max_fraction = max_fraction.max(min_fraction);
    let rounded = format!("{:.*}", max_fraction, round_half_away(value.abs(), max_fraction));

    let (int_part, frac_part) = match rounded.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (rounded.as_str(), ""),
    };

    let mut frac = frac_part.to_string();
    while frac.len() > min_fraction && frac.ends_with('0') {
        frac.pop();
    }

    let mut text = group_thousands(int_part);
    if !frac.is_empty() {
        text.push('.');
        text.push_str(&frac);
    }

    let is_zero = rounded.chars().all(|c| c == '0' || c == '.');
    (value < 0.0 && !is_zero, text)
}

/// 人民币金额，如 `¥100,000`
///
/// 非有限数返回错误
pub fn format_currency(amount: f64, min_fraction: usize, max_fraction: usize) -> Result<String> {
    if !amount.is_finite() {
        return Err(anyhow!("Amount must be a valid number"));
    }

    let (negative, text) = format_decimal(amount, min_fraction, max_fraction);
    Ok(if negative { format!("-¥{}", text) } else { format!("¥{}", text) })
}

/// 整数金额，如 `¥1,235`
pub fn format_yuan(amount: f64) -> Result<String> {
    format_currency(amount, 0, 0)
}

/// 百分比，`0.1234` → `12.34%`
pub fn format_percent(value: f64, digits: usize) -> Result<String> {
    if !value.is_finite() {
        return Err(anyhow!("Value must be a valid number"));
    }
    Ok(format!("{:.*}%", digits, round_half_away(value * 100.0, digits)))
}

/// 统一日期为 `YYYY-MM-DD`
///
/// 支持 `YYYYMMDD` 与 `YYYY-MM-DD`，其他输入返回 None
pub fn format_date(date: &str) -> Option<String> {
    if COMPACT_DATE.is_match(date) {
        return Some(format!("{}-{}-{}", &date[0..4], &date[4..6], &date[6..8]));
    }
    if DASHED_DATE.is_match(date) {
        return Some(date.to_string());
    }
    None
}

/// 千分位数字，最多保留三位小数；非有限数返回 "0"
pub fn format_number(number: f64) -> String {
    if !number.is_finite() {
        return "0".to_string();
    }
    let (negative, text) = format_decimal(number, 0, 3);
    if negative { format!("-{}", text) } else { text }
}

/// 大数字简写，如 `1.23万`、`1.00亿`
pub fn format_large_number(number: f64) -> String {
    if !number.is_finite() {
        return "0".to_string();
    }

    let magnitude = number.abs();
    if magnitude >= 100_000_000.0 {
        format!("{:.2}亿", number / 100_000_000.0)
    } else if magnitude >= 10_000.0 {
        format!("{:.2}万", number / 10_000.0)
    } else {
        format_number(number)
    }
}

/// 以"万"为单位的简洁金额标签，如 `1万`、`100万`、`1.5万`
pub fn format_wan(amount: f64) -> String {
    let wan = format!("{:.4}", amount / 10_000.0);
    let trimmed = wan.trim_end_matches('0').trim_end_matches('.');
    format!("{}万", trimmed)
}

/// 相对时间标签
///
/// 一周以内显示"N分钟前"等，更早的显示北京时间的月日时分
pub fn format_relative_time(timestamp_ms: i64, now: DateTime<Utc>) -> String {
    let diff_ms = now.timestamp_millis() - timestamp_ms;
    let minutes = diff_ms.div_euclid(60_000);
    let hours = diff_ms.div_euclid(3_600_000);
    let days = diff_ms.div_euclid(86_400_000);

    if minutes < 1 {
        return "刚刚".to_string();
    }
    if minutes < 60 {
        return format!("{}分钟前", minutes);
    }
    if hours < 24 {
        return format!("{}小时前", hours);
    }
    if days < 7 {
        return format!("{}天前", days);
    }

    match Utc.timestamp_millis_opt(timestamp_ms).single() {
        Some(time) => time.with_timezone(&Shanghai).format("%-m月%-d日 %H:%M").to_string(),
        None => "未知时间".to_string(),
    }
}
