//! 分析历史
//!
//! 以 JSON 数组保存在存储键 `analysisHistory` 下，最新的记录在最前。
//! 旧版本写入的记录可能缺少调节系数或ETF名称，读取时补齐；
//! 缺少必要字段的记录直接跳过，不影响其余记录。

use anyhow::Result;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use crate::models::{AnalysisParameters, GridType, HistoryRecord, RiskPreference, DEFAULT_ADJUSTMENT};
use super::codec::ParamCodec;
use super::storage::{StoragePort, HISTORY_KEY};

/// 默认保留条数
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// 分析历史存储
pub struct HistoryStore {
    storage: Arc<dyn StoragePort>,
    limit: usize,
    /// 读-改-写期间持有
    write_lock: Mutex<()>,
}

impl HistoryStore {
    pub fn new(storage: Arc<dyn StoragePort>, limit: usize) -> Self {
        Self {
            storage,
            limit,
            write_lock: Mutex::new(()),
        }
    }

    /// 读取全部历史，补齐旧记录并跳过无效记录
    pub fn load(&self) -> Vec<HistoryRecord> {
        let raw = match self.storage.get(HISTORY_KEY) {
            Some(raw) => raw,
            None => return Vec::new(),
        };

        let items = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => items,
            Ok(_) => {
                log::error!("加载分析历史失败: 存储内容不是数组");
                return Vec::new();
            }
            Err(e) => {
                log::error!("加载分析历史失败: {}", e);
                return Vec::new();
            }
        };

        items
            .into_iter()
            .filter_map(|item| {
                let record = repair_record(&item);
                if record.is_none() {
                    log::warn!("发现无效的历史记录，已跳过: {}", item);
                }
                record
            })
            .collect()
    }

    /// 保存一条记录
    ///
    /// 同一ETF、同一组参数的记录原位替换（刷新时间戳），否则插入最前；超出上限的旧记录被丢弃
    pub fn save(&self, record: HistoryRecord) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());

        let mut history = self.load();
        match history.iter_mut().find(|item| item.same_analysis(&record)) {
            Some(existing) => *existing = record,
            None => history.insert(0, record),
        }
        history.truncate(self.limit);

        self.write(&history)
    }

    /// 删除指定位置的记录，返回被删除的记录
    pub fn remove(&self, index: usize) -> Result<Option<HistoryRecord>> {
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());

        let mut history = self.load();
        if index >= history.len() {
            return Ok(None);
        }
        let removed = history.remove(index);
        self.write(&history)?;
        Ok(Some(removed))
    }

    /// 清空全部历史
    pub fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());
        self.storage.remove(HISTORY_KEY)
    }

    fn write(&self, history: &[HistoryRecord]) -> Result<()> {
        let content = serde_json::to_string(history)?;
        self.storage.set(HISTORY_KEY, &content)
    }
}

/// 非空字符串
fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// 非零数字，兼容以字符串保存的数字
fn non_zero_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (number.is_finite() && number != 0.0).then_some(number)
}

/// 校验并补齐一条存储的记录
fn repair_record(item: &Value) -> Option<HistoryRecord> {
    let etf_code = non_empty_str(item.get("etfCode"))?;
    let params = item.get("params").filter(|p| p.is_object())?;
    let timestamp = non_zero_number(item.get("timestamp"))? as i64;

    let total_capital = non_zero_number(params.get("totalCapital"))?;
    let grid_type = GridType::from_label(non_empty_str(params.get("gridType"))?)?;
    let risk_preference = RiskPreference::from_label(non_empty_str(params.get("riskPreference"))?)?;
    let adjustment_coefficient = params
        .get("adjustmentCoefficient")
        .and_then(Value::as_f64)
        .unwrap_or(DEFAULT_ADJUSTMENT);

    let params = AnalysisParameters {
        etf_code: non_empty_str(params.get("etfCode")).unwrap_or(etf_code).to_string(),
        total_capital,
        grid_type,
        risk_preference,
        adjustment_coefficient,
    };

    let etf_name = non_empty_str(item.get("etfName"))
        .map(str::to_string)
        .unwrap_or_else(|| format!("ETF {}", etf_code));

    let url = non_empty_str(item.get("url"))
        .map(str::to_string)
        .unwrap_or_else(|| ParamCodec::default().analysis_path(etf_code, &params));

    Some(HistoryRecord {
        etf_code: etf_code.to_string(),
        etf_name,
        params,
        timestamp,
        url,
    })
}
