//! 领域层统一错误定义
//!
//! 聚焦序列化、事件分发、事务/持久化与状态校验等最小必要集合，
//! 便于在各实现层统一转换为 `DomainError`。
//!
use thiserror::Error;

/// 统一错误类型（基础库最小必要集）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DomainError {
    // --- 序列化 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
    #[error("parse error: {reason}")]
    Parse { reason: String },
    #[error("type mismatch: expected={expected}, found={found}")]
    TypeMismatch { expected: String, found: String },

    // --- 事件分发 ---
    #[error("event handler error: handler={handler}, event={event_type}, reason={reason}")]
    EventHandler {
        handler: String,
        event_type: String,
        reason: String,
    },
    /// 级联分发超过最大波次仍未收敛，属于配置级（处理器互相无限触发）错误
    #[error("event cascade did not converge: waves={waves}, limit={limit}")]
    CascadeDiverged { waves: usize, limit: usize },
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // --- 事务/持久化 ---
    #[error("transaction error: {reason}")]
    Transaction { reason: String },
    #[error("persistence error: {reason}")]
    Persistence { reason: String },
    #[error("version conflict: aggregate={aggregate}, expected={expected}, actual={actual}")]
    VersionConflict {
        aggregate: String,
        expected: usize,
        actual: usize,
    },

    // --- 变更集/状态 ---
    #[error("aggregate already tracked: {aggregate_type}/{aggregate_id}")]
    AlreadyTracked {
        aggregate_type: String,
        aggregate_id: String,
    },
    #[error("invalid state: {reason}")]
    InvalidState { reason: String },
    #[error("not found: {reason}")]
    NotFound { reason: String },

    // --- 通用 ---
    #[error("invalid aggregate id: {0}")]
    InvalidAggregateId(String),
}

impl DomainError {
    pub fn transaction(reason: impl Into<String>) -> Self {
        Self::Transaction {
            reason: reason.into(),
        }
    }

    pub fn persistence(reason: impl Into<String>) -> Self {
        Self::Persistence {
            reason: reason.into(),
        }
    }

    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }

    /// 配置级错误：重试无法恢复，需要修正处理器或配置
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::CascadeDiverged { .. } | Self::InvalidConfig { .. })
    }
}

/// 统一 Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;

impl From<uuid::Error> for DomainError {
    fn from(err: uuid::Error) -> Self {
        DomainError::Parse {
            reason: err.to_string(),
        }
    }
}

impl From<chrono::ParseError> for DomainError {
    fn from(err: chrono::ParseError) -> Self {
        DomainError::Parse {
            reason: err.to_string(),
        }
    }
}
