//! 应用层配置
//!
//! 结构体自带默认值，可由 serde 反序列化，也可从环境变量读取：
//! - `CASCADE_PAGE_SIZE`：单次运行最多处理的待发送条目数（默认 100）；
//! - `CASCADE_POLL_INTERVAL_SECS`：周期任务的间隔秒数（默认 30）。
//!
//! 未设置的变量回落到默认值，无法解析的值返回 `ConfigError`。
//!
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

pub const PAGE_SIZE_ENV: &str = "CASCADE_PAGE_SIZE";
pub const POLL_INTERVAL_ENV: &str = "CASCADE_POLL_INTERVAL_SECS";

pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("failed to parse {key}: {details}")]
    Parse { key: String, details: String },

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// 批处理器配置
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// 单次运行选取的最大条目数
    pub page_size: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ProcessorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let page_size = parse_or(&lookup, PAGE_SIZE_ENV, DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            return Err(ConfigError::Invalid {
                key: PAGE_SIZE_ENV.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(Self { page_size })
    }
}

/// 周期任务配置
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// 两次运行之间的间隔
    pub interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let secs = parse_or(&lookup, POLL_INTERVAL_ENV, DEFAULT_POLL_INTERVAL.as_secs())?;
        if secs == 0 {
            return Err(ConfigError::Invalid {
                key: POLL_INTERVAL_ENV.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(Self {
            interval: Duration::from_secs(secs),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Parse {
            key: key.to_string(),
            details: e.to_string(),
        }),
        None => Ok(default),
    }
}
