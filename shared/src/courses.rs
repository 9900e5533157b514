use crate::dynamo::{self, Item, BATCH_GET_LIMIT, BATCH_WRITE_LIMIT};
use crate::error::{dynamo_err, StoreError};
use crate::types::{Course, Pagination};
use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, KeysAndAttributes, PutRequest, WriteRequest};
use aws_sdk_dynamodb::Client as DynamoClient;
use base64::{engine::general_purpose, Engine as _};
use std::collections::{HashMap, HashSet};

pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Course records keyed by `id`, with a secondary lookup by `url`.
#[async_trait]
pub trait CourseStore: Send + Sync {
    /// Courses whose url is in `urls`. Unknown urls are simply absent.
    async fn get_by_urls(&self, urls: &[String]) -> Result<Vec<Course>, StoreError>;

    /// Writes every course as given. No existence check: callers dedup first.
    async fn bulk_insert(&self, courses: &[Course]) -> Result<(), StoreError>;

    async fn get_by_id(&self, id: &str) -> Result<Course, StoreError>;

    /// Best-effort batch read; ids without a record are dropped.
    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Course>, StoreError>;

    /// Full overwrite, no concurrency check.
    async fn upsert(&self, course: &Course) -> Result<(), StoreError>;

    async fn list(&self, page: &Pagination) -> Result<(Vec<Course>, Option<String>), StoreError>;
}

/// Encodes the last evaluated course id as an opaque cursor.
pub fn encode_cursor(last_id: &str) -> String {
    let key = serde_json::json!({ "id": last_id });
    general_purpose::STANDARD.encode(key.to_string())
}

pub fn decode_cursor(cursor: &str) -> Result<String, StoreError> {
    let raw = general_purpose::STANDARD
        .decode(cursor)
        .map_err(|e| StoreError::InvalidCursor(e.to_string()))?;
    let key: serde_json::Value =
        serde_json::from_slice(&raw).map_err(|e| StoreError::InvalidCursor(e.to_string()))?;
    key.get("id")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| StoreError::InvalidCursor("cursor has no id".to_string()))
}

pub fn page_size(page: &Pagination) -> i64 {
    if page.per_page > 0 {
        page.per_page
    } else {
        DEFAULT_PAGE_SIZE
    }
}

pub struct DynamoCourseStore {
    client: DynamoClient,
    table_name: String,
    url_index: String,
}

impl DynamoCourseStore {
    pub fn new(client: DynamoClient, table_name: &str, url_index: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
            url_index: url_index.to_string(),
        }
    }

    async fn query_url(&self, url: &str) -> Result<Vec<Course>, StoreError> {
        let result = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(&self.url_index)
            .key_condition_expression("#u = :url")
            .expression_attribute_names("#u", "url")
            .expression_attribute_values(":url", AttributeValue::S(url.to_string()))
            .send()
            .await
            .map_err(dynamo_err)?;

        result.items().iter().map(dynamo::course_from_item).collect()
    }

    fn key(id: &str) -> Item {
        let mut key = HashMap::new();
        key.insert("id".to_string(), AttributeValue::S(id.to_string()));
        key
    }
}

#[async_trait]
impl CourseStore for DynamoCourseStore {
    async fn get_by_urls(&self, urls: &[String]) -> Result<Vec<Course>, StoreError> {
        let distinct: Vec<&String> = {
            let mut seen = HashSet::new();
            urls.iter().filter(|u| seen.insert(u.as_str())).collect()
        };

        // One GSI query per url, issued concurrently
        let results =
            futures::future::try_join_all(distinct.iter().map(|url| self.query_url(url))).await?;

        Ok(results.into_iter().flatten().collect())
    }

    async fn bulk_insert(&self, courses: &[Course]) -> Result<(), StoreError> {
        for chunk in courses.chunks(BATCH_WRITE_LIMIT) {
            let requests = chunk
                .iter()
                .map(|course| {
                    let put = PutRequest::builder()
                        .set_item(Some(dynamo::course_to_item(course)))
                        .build()
                        .map_err(dynamo_err)?;
                    Ok(WriteRequest::builder().put_request(put).build())
                })
                .collect::<Result<Vec<_>, StoreError>>()?;

            let result = self
                .client
                .batch_write_item()
                .request_items(&self.table_name, requests)
                .send()
                .await
                .map_err(dynamo_err)?;

            let unprocessed = result
                .unprocessed_items()
                .and_then(|items| items.get(&self.table_name))
                .map(|items| items.len())
                .unwrap_or(0);
            if unprocessed > 0 {
                tracing::error!("{} course writes were not processed", unprocessed);
                return Err(StoreError::Dynamo(format!(
                    "{} course writes were not processed",
                    unprocessed
                )));
            }
        }

        tracing::info!("Inserted {} courses into {}", courses.len(), self.table_name);
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Course, StoreError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(id)))
            .send()
            .await
            .map_err(dynamo_err)?;

        match result.item() {
            Some(item) => dynamo::course_from_item(item),
            None => Err(StoreError::not_found("course", id)),
        }
    }

    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Course>, StoreError> {
        let distinct: Vec<&String> = {
            let mut seen = HashSet::new();
            ids.iter().filter(|id| seen.insert(id.as_str())).collect()
        };

        let mut courses = Vec::new();
        for chunk in distinct.chunks(BATCH_GET_LIMIT) {
            let keys = chunk.iter().map(|id| Self::key(id)).collect();
            let request = KeysAndAttributes::builder()
                .set_keys(Some(keys))
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
                    courses.push(dynamo::course_from_item(item)?);
                }
            }

            if let Some(pending) = result
                .unprocessed_keys()
                .and_then(|keys| keys.get(&self.table_name))
            {
                tracing::warn!(
                    "{} course keys left unprocessed, dropping from join",
                    pending.keys().len()
                );
            }
        }

        Ok(courses)
    }

    async fn upsert(&self, course: &Course) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(dynamo::course_to_item(course)))
            .send()
            .await
            .map_err(dynamo_err)?;
        Ok(())
    }

    async fn list(&self, page: &Pagination) -> Result<(Vec<Course>, Option<String>), StoreError> {
        let start_key = match page.last_evaluated_key.as_deref() {
            Some(cursor) if !cursor.is_empty() => Some(Self::key(&decode_cursor(cursor)?)),
            _ => None,
        };

        let result = self
            .client
            .scan()
            .table_name(&self.table_name)
            .limit(page_size(page) as i32)
            .set_exclusive_start_key(start_key)
            .send()
            .await
            .map_err(dynamo_err)?;

        let courses = result
            .items()
            .iter()
            .map(dynamo::course_from_item)
            .collect::<Result<Vec<_>, _>>()?;

        let next = result
            .last_evaluated_key()
            .map(|key| dynamo::get_s(key, "id"))
            .filter(|id| !id.is_empty())
            .map(|id| encode_cursor(&id));

        Ok((courses, next))
    }
}
