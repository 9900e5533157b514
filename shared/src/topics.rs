use crate::dynamo::{self, BATCH_WRITE_LIMIT};
use crate::error::{dynamo_err, StoreError};
use crate::types::Topic;
use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, PutRequest, WriteRequest};
use aws_sdk_dynamodb::Client as DynamoClient;

/// Inverted index from topic name to the roadmaps that reference it.
#[async_trait]
pub trait TopicStore: Send + Sync {
    /// One topic per requested name, in request order. Names with no record
    /// come back as an empty topic so callers never special-case a miss.
    async fn get_by_names(&self, names: &[String]) -> Result<Vec<Topic>, StoreError>;

    /// Overwrites every topic by name.
    async fn bulk_write(&self, topics: &[Topic]) -> Result<(), StoreError>;

    async fn list_all(&self) -> Result<Vec<Topic>, StoreError>;
}

pub struct DynamoTopicStore {
    client: DynamoClient,
    table_name: String,
}

impl DynamoTopicStore {
    pub fn new(client: DynamoClient, table_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
        }
    }

    async fn get_one(&self, name: &str) -> Result<Topic, StoreError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("name", AttributeValue::S(name.to_string()))
            .send()
            .await
            .map_err(dynamo_err)?;

        Ok(result
            .item()
            .map(dynamo::topic_from_item)
            .unwrap_or_else(|| Topic::empty(name)))
    }
}

#[async_trait]
impl TopicStore for DynamoTopicStore {
    async fn get_by_names(&self, names: &[String]) -> Result<Vec<Topic>, StoreError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        futures::future::try_join_all(names.iter().map(|name| self.get_one(name))).await
    }

    async fn bulk_write(&self, topics: &[Topic]) -> Result<(), StoreError> {
        for chunk in topics.chunks(BATCH_WRITE_LIMIT) {
            let requests = chunk
                .iter()
                .map(|topic| {
                    let put = PutRequest::builder()
                        .set_item(Some(dynamo::topic_to_item(topic)))
                        .build()
                        .map_err(dynamo_err)?;
                    Ok(WriteRequest::builder().put_request(put).build())
                })
                .collect::<Result<Vec<_>, StoreError>>()?;

            tracing::debug!("Writing {} topics to {}", requests.len(), self.table_name);

            let result = self
                .client
                .batch_write_item()
                .request_items(&self.table_name, requests)
                .send()
                .await
                .map_err(dynamo_err)?;

            if let Some(pending) = result
                .unprocessed_items()
                .and_then(|items| items.get(&self.table_name))
                .filter(|items| !items.is_empty())
            {
                return Err(StoreError::Dynamo(format!(
                    "{} topic writes were not processed",
                    pending.len()
                )));
            }
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Topic>, StoreError> {
        let mut topics = Vec::new();
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

            topics.extend(result.items().iter().map(dynamo::topic_from_item));

            match result.last_evaluated_key() {
                Some(key) => start_key = Some(key.clone()),
                None => break,
            }
        }
        Ok(topics)
    }
}
