//! 免责声明确认
//!
//! 确认时间以 RFC 3339 字符串保存，超过有效天数后需要重新确认。
//! 所有判断都接收当前时间参数，便于测试。

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::storage::{StoragePort, DISCLAIMER_KEY};

/// 默认有效天数
pub const DEFAULT_VALID_DAYS: i64 = 30;

pub struct DisclaimerGate {
    storage: Arc<dyn StoragePort>,
    valid_days: i64,
}

impl DisclaimerGate {
    pub fn new(storage: Arc<dyn StoragePort>, valid_days: i64) -> Self {
        Self { storage, valid_days }
    }

    /// 记录用户已确认
    pub fn accept(&self, now: DateTime<Utc>) -> Result<()> {
        self.storage.set(DISCLAIMER_KEY, &now.to_rfc3339())
    }

    /// 已确认的完整天数；未确认或时间无法解析时返回 None
    fn days_since_accepted(&self, now: DateTime<Utc>) -> Option<i64> {
        let raw = self.storage.get(DISCLAIMER_KEY)?;
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(accepted) => {
                let elapsed = now - accepted.with_timezone(&Utc);
                Some(elapsed.num_milliseconds().div_euclid(86_400_000))
            }
            Err(e) => {
                log::error!("解析免责声明日期失败: {} ({})", raw, e);
                None
            }
        }
    }

    /// 是否已确认且仍在有效期内
    pub fn check_status(&self, now: DateTime<Utc>) -> bool {
        self.days_since_accepted(now)
            .map_or(false, |days| days <= self.valid_days)
    }

    /// 剩余有效天数，未确认或已过期返回 0
    pub fn remaining_days(&self, now: DateTime<Utc>) -> i64 {
        self.days_since_accepted(now)
            .map_or(0, |days| (self.valid_days - days).max(0))
    }
}
