use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use url::Url;

use crate::domain::{
    id::ID,
    models::ShortenedLink,
    repository::{LinkRepository, RepoError},
};

// A custom alias can squat on a code the sequence has not reached yet.
const GENERATE_ATTEMPTS: u32 = 10;

/// In-memory link store. The repository seam for a real database; state
/// lives only as long as the process. Expired entries are kept until
/// restart — a store-backed implementation owns TTL eviction.
pub struct DB {
    links: Mutex<HashMap<String, ShortenedLink>>,
    seq: AtomicU64,
}

impl DB {
    pub fn new() -> Self {
        DB {
            links: Mutex::new(HashMap::new()),
            seq: AtomicU64::new(0),
        }
    }
}

impl Default for DB {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkRepository for DB {
    async fn create(
        &self,
        target_url: Url,
        custom_id: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ShortenedLink, RepoError> {
        let mut links = self
            .links
            .lock()
            .map_err(|_| RepoError::Other(anyhow!("link map mutex poisoned")))?;

        let id = match custom_id {
            Some(custom) => {
                let id = ID::new(custom);
                if links.contains_key(id.as_str()) {
                    return Err(RepoError::AlreadyExists);
                }
                id
            }
            None => {
                let mut generated = None;
                for _ in 0..GENERATE_ATTEMPTS {
                    let seq = self.seq.fetch_add(1, Ordering::Relaxed);
                    let candidate = ID::generate(seq)?;
                    if !links.contains_key(candidate.as_str()) {
                        generated = Some(candidate);
                        break;
                    }
                }
                generated
                    .ok_or_else(|| RepoError::Other(anyhow!("failed to find a free short code")))?
            }
        };

        let link = ShortenedLink {
            id: id.clone(),
            target_url,
            created_at: Utc::now(),
            expires_at,
        };
        links.insert(id.0.clone(), link.clone());
        Ok(link)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ShortenedLink>, RepoError> {
        let links = self
            .links
            .lock()
            .map_err(|_| RepoError::Other(anyhow!("link map mutex poisoned")))?;
        Ok(links.get(id).cloned())
    }
}
