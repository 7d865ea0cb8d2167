use crate::domain::models::ShortenedLink;
use chrono::{DateTime, Utc};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("short code already in use")]
    AlreadyExists,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub trait LinkRepository {
    async fn create(
        &self,
        target_url: Url,
        custom_id: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ShortenedLink, RepoError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<ShortenedLink>, RepoError>;
}

impl<T: LinkRepository> LinkRepository for std::sync::Arc<T> {
    async fn create(
        &self,
        target_url: Url,
        custom_id: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ShortenedLink, RepoError> {
        (**self).create(target_url, custom_id, expires_at).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ShortenedLink>, RepoError> {
        (**self).find_by_id(id).await
    }
}
