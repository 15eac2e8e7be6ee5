//! 对象存储适配器边界
//!
//! 只约定上传、签名链接与读取三个操作；任何满足该协议的对象存储客户端都可接入。
//!
use crate::error::AppResult;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// 签名链接的默认有效期
pub fn default_url_ttl() -> TimeDelta {
    TimeDelta::minutes(30)
}

/// 对象位置：存储桶及可选的子目录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectLocation {
    bucket: String,
    folder: Option<String>,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            folder: None,
        }
    }

    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn folder(&self) -> Option<&str> {
        self.folder.as_deref()
    }

    /// `bucket` 或 `bucket/folder`（空目录等同于无目录）
    pub fn bucket_path(&self) -> String {
        match self.folder.as_deref().map(|f| f.trim_matches('/')) {
            Some(folder) if !folder.is_empty() => format!("{}/{folder}", self.bucket),
            _ => self.bucket.clone(),
        }
    }
}

/// 有时效的签名链接
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

impl SignedUrl {
    pub fn expiring_in(url: impl Into<String>, ttl: TimeDelta) -> Self {
        Self {
            url: url.into(),
            expires_at: Utc::now() + ttl,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, id: &str, content: Vec<u8>, destination: &ObjectLocation) -> AppResult<()>;

    /// 生成下载链接，`file_name` 作为下载时的文件名
    async fn url(&self, id: &str, file_name: &str, destination: &ObjectLocation) -> AppResult<SignedUrl>;

    async fn content(&self, id: &str, destination: &ObjectLocation) -> AppResult<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryObjects {
        objects: Mutex<HashMap<String, Vec<u8>>>,
    }

    fn key(id: &str, destination: &ObjectLocation) -> String {
        format!("{}/{id}", destination.bucket_path())
    }

    #[async_trait]
    impl ObjectStore for MemoryObjects {
        async fn upload(&self, id: &str, content: Vec<u8>, destination: &ObjectLocation) -> AppResult<()> {
            self.objects.lock().unwrap().insert(key(id, destination), content);
            Ok(())
        }

        async fn url(&self, id: &str, file_name: &str, destination: &ObjectLocation) -> AppResult<SignedUrl> {
            let key = key(id, destination);
            if !self.objects.lock().unwrap().contains_key(&key) {
                return Err(AppError::Infra(format!("object {key} not found")));
            }
            Ok(SignedUrl::expiring_in(
                format!("memory://{key}?download={file_name}"),
                default_url_ttl(),
            ))
        }

        async fn content(&self, id: &str, destination: &ObjectLocation) -> AppResult<Vec<u8>> {
            let key = key(id, destination);
            self.objects
                .lock()
                .unwrap()
                .get(&key)
                .cloned()
                .ok_or_else(|| AppError::Infra(format!("object {key} not found")))
        }
    }

    #[test]
    fn bucket_path_joins_optional_folder() {
        assert_eq!(ObjectLocation::new("media").bucket_path(), "media");
        assert_eq!(ObjectLocation::new("media").with_folder("avatars").bucket_path(), "media/avatars");
        assert_eq!(ObjectLocation::new("media").with_folder("").bucket_path(), "media");
    }

    #[tokio::test]
    async fn urls_expire_after_the_default_window() {
        let store = MemoryObjects::default();
        let location = ObjectLocation::new("reports").with_folder("2026");
        store.upload("r-1", b"csv".to_vec(), &location).await.unwrap();

        let url = store.url("r-1", "report.csv", &location).await.unwrap();
        assert_eq!(url.url, "memory://reports/2026/r-1?download=report.csv");
        assert!(!url.is_expired_at(Utc::now()));
        assert!(url.is_expired_at(Utc::now() + default_url_ttl() + TimeDelta::seconds(1)));

        assert_eq!(store.content("r-1", &location).await.unwrap(), b"csv");
        assert!(store.content("missing", &location).await.is_err());
    }
}
