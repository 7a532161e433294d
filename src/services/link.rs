// Link store: the set of tracked URLs kept under one key namespace
// Each link is stored as `streamtape_urls/<url>` -> `<url>`

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::{
    db::KeyValueStore,
    models::link::{namespace_prefix, parse_bulk, store_key_for, BulkAddOutcome, TrackedUrl},
    utils::{trim_and_validate_field, ServiceError, ServiceResult},
};

#[derive(Clone)]
pub struct LinkService {
    store: Arc<dyn KeyValueStore>,
}

impl LinkService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Track a single link. Input that fails validation is ignored and `None`
    /// is returned; re-adding an existing link overwrites it.
    #[instrument(skip(self))]
    pub async fn add(&self, raw: &str) -> ServiceResult<Option<TrackedUrl>> {
        let Some(url) = TrackedUrl::parse(raw) else {
            debug!("Ignoring link without the required host");
            return Ok(None);
        };

        self.store.set(&url.store_key(), url.as_str()).await?;
        info!("Tracking link {}", url);
        Ok(Some(url))
    }

    /// Track every valid line of newline-delimited input.
    ///
    /// Lines are written one by one; a failed write does not undo earlier ones.
    /// All lines are attempted and the first store error is returned afterwards.
    #[instrument(skip(self, text), fields(bytes = text.len()))]
    pub async fn bulk_add(&self, text: &str) -> ServiceResult<BulkAddOutcome> {
        let (urls, skipped) = parse_bulk(text);
        let mut outcome = BulkAddOutcome { added: 0, skipped };
        let mut first_error: Option<ServiceError> = None;

        for url in urls {
            match self.store.set(&url.store_key(), url.as_str()).await {
                Ok(()) => outcome.added += 1,
                Err(e) => {
                    warn!("Failed to store link {}: {}", url, e);
                    first_error.get_or_insert(e);
                },
            }
        }

        info!(
            "Bulk add stored {} links, skipped {}",
            outcome.added, outcome.skipped
        );

        match first_error {
            Some(e) => Err(e),
            None => Ok(outcome),
        }
    }

    /// Stop tracking a link. Unknown links are a no-op.
    #[instrument(skip(self))]
    pub async fn remove(&self, raw: &str) -> ServiceResult<()> {
        let Ok(url) = trim_and_validate_field(raw, true) else {
            return Ok(());
        };

        self.store.delete(&store_key_for(&url)).await?;
        info!("Removed link {}", url);
        Ok(())
    }

    /// Every tracked link in store order
    pub async fn list(&self) -> ServiceResult<Vec<TrackedUrl>> {
        let entries = self.store.list(&namespace_prefix()).await?;
        Ok(entries
            .into_iter()
            .map(|(_, value)| TrackedUrl::from_stored(value))
            .collect())
    }
}
