use anyhow::{Context, Result};
use reqwest::Client;

use crate::common::{ITEMS_TABLE, ITEM_SELECT_COLUMNS};
use crate::storage::{ItemId, ItemRecord, ItemUpdate, MetadataStore, ensure_success};

/// Metadata store speaking the PostgREST dialect exposed under `/rest/v1`.
#[derive(Clone)]
pub struct RestMetadataStore {
    base_url: String,
    service_key: String,
    client: Client,
}

impl RestMetadataStore {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into(),
            service_key: service_key.into(),
            client,
        }
    }

    fn items_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.base_url.trim_end_matches('/'),
            ITEMS_TABLE
        )
    }

    fn id_filter(id: &ItemId) -> (&'static str, String) {
        ("id", format!("eq.{}", id))
    }
}

#[rocket::async_trait]
impl MetadataStore for RestMetadataStore {
    async fn fetch_item(&self, id: &ItemId) -> Result<Option<ItemRecord>> {
        let response = self
            .client
            .get(self.items_url())
            .query(&[Self::id_filter(id), ("select", ITEM_SELECT_COLUMNS.to_string())])
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .send()
            .await
            .with_context(|| format!("Failed to reach metadata store for item {}", id))?;

        let response = ensure_success(response, "Item lookup").await?;
        let rows: Vec<ItemRecord> = response
            .json()
            .await
            .context("Failed to decode item rows")?;

        Ok(rows.into_iter().next())
    }

    async fn update_item(&self, id: &ItemId, update: &ItemUpdate) -> Result<()> {
        let response = self
            .client
            .patch(self.items_url())
            .query(&[Self::id_filter(id)])
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header("Prefer", "return=minimal")
            .json(update)
            .send()
            .await
            .with_context(|| format!("Failed to reach metadata store for item {}", id))?;

        ensure_success(response, "Item update").await?;
        Ok(())
    }
}
