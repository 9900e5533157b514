use crate::dynamo::{self, Item, BATCH_GET_LIMIT};
use crate::error::{dynamo_err, StoreError};
use crate::types::Roadmap;
use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, KeysAndAttributes};
use aws_sdk_dynamodb::Client as DynamoClient;
use std::collections::{HashMap, HashSet};

/// Roadmap records keyed by `id`. Records come back with `courses` empty;
/// joining is the catalog's job.
#[async_trait]
pub trait RoadmapStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Roadmap, StoreError>;

    /// Best-effort batch read; ids without a record are dropped.
    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Roadmap>, StoreError>;

    async fn put(&self, roadmap: &Roadmap) -> Result<(), StoreError>;

    async fn list_all(&self) -> Result<Vec<Roadmap>, StoreError>;
}

pub struct DynamoRoadmapStore {
    client: DynamoClient,
    table_name: String,
}

impl DynamoRoadmapStore {
    pub fn new(client: DynamoClient, table_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
        }
    }

    fn key(id: &str) -> Item {
        let mut key = HashMap::new();
        key.insert("id".to_string(), AttributeValue::S(id.to_string()));
        key
    }
}

#[async_trait]
impl RoadmapStore for DynamoRoadmapStore {
    async fn get(&self, id: &str) -> Result<Roadmap, StoreError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(id)))
            .send()
            .await
            .map_err(dynamo_err)?;

        match result.item() {
            Some(item) => dynamo::roadmap_from_item(item),
            None => Err(StoreError::not_found("roadmap", id)),
        }
    }

    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Roadmap>, StoreError> {
        let mut seen = HashSet::new();
        let distinct: Vec<&String> = ids.iter().filter(|id| seen.insert(id.as_str())).collect();

        let mut roadmaps = Vec::new();
        for chunk in distinct.chunks(BATCH_GET_LIMIT) {
            let request = KeysAndAttributes::builder()
                .set_keys(Some(chunk.iter().map(|id| Self::key(id)).collect()))
                .build()
                .map_err(dynamo_err)?;

            let result = self
                .client
                .batch_get_item()
                .request_items(&self.table_name, request)
                .send()
                .await
                .map_err(dynamo_err)?;

            if let Some(items) = result
                .responses()
                .and_then(|responses| responses.get(&self.table_name))
            {
                for item in items {
                    roadmaps.push(dynamo::roadmap_from_item(item)?);
                }
            }
        }

        // BatchGetItem does not preserve request order
        let position: HashMap<&str, usize> = distinct
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        roadmaps.sort_by_key(|r| position.get(r.id.as_str()).copied().unwrap_or(usize::MAX));

        Ok(roadmaps)
    }

    async fn put(&self, roadmap: &Roadmap) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(dynamo::roadmap_to_item(roadmap)))
            .send()
            .await
            .map_err(dynamo_err)?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Roadmap>, StoreError> {
        let mut roadmaps = Vec::new();
        let mut start_key = None;
        loop {
            let result = self
                .client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(dynamo_err)?;

            for item in result.items() {
                roadmaps.push(dynamo::roadmap_from_item(item)?);
            }

            match result.last_evaluated_key() {
                Some(key) => start_key = Some(key.clone()),
                None => break,
            }
        }
        Ok(roadmaps)
    }
}
