use crate::config::ConfigError;
use cascade_domain::error::DomainError;

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("domain: {0}")]
    Domain(#[from] DomainError),

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("infra: {0}")]
    Infra(String),
}

impl AppError {
    /// 配置级错误（级联不收敛、配置非法）：重试无意义
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Domain(err) => err.is_fatal(),
            Self::Config(_) => true,
            Self::Infra(_) => false,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
