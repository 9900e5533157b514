use crate::dynamo;
use crate::error::{dynamo_err, StoreError};
use crate::types::User;
use async_trait::async_trait;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client as DynamoClient;

/// User records keyed by username.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_by_name(&self, name: &str) -> Result<User, StoreError>;

    /// Full overwrite.
    async fn upsert(&self, user: &User) -> Result<(), StoreError>;

    /// Atomically lowers `genUsagesRemaining` by one and returns the new
    /// value. No floor is applied.
    async fn decrement_gen_usages(&self, name: &str) -> Result<i64, StoreError>;

    async fn list_all(&self) -> Result<Vec<User>, StoreError>;
}

pub struct DynamoUserStore {
    client: DynamoClient,
    table_name: String,
}

impl DynamoUserStore {
    pub fn new(client: DynamoClient, table_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
        }
    }
}

#[async_trait]
impl UserStore for DynamoUserStore {
    async fn get_by_name(&self, name: &str) -> Result<User, StoreError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("name", AttributeValue::S(name.to_string()))
            .send()
            .await
            .map_err(dynamo_err)?;

        match result.item() {
            Some(item) => dynamo::user_from_item(item),
            None => Err(StoreError::not_found("user", name)),
        }
    }

    async fn upsert(&self, user: &User) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(dynamo::user_to_item(user)))
            .send()
            .await
            .map_err(dynamo_err)?;
        Ok(())
    }

    async fn decrement_gen_usages(&self, name: &str) -> Result<i64, StoreError> {
        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("name", AttributeValue::S(name.to_string()))
            .update_expression("SET genUsagesRemaining = if_not_exists(genUsagesRemaining, :zero) - :one")
            .condition_expression("attribute_exists(#n)")
            .expression_attribute_names("#n", "name")
            .expression_attribute_values(":one", dynamo::n(1))
            .expression_attribute_values(":zero", dynamo::n(0))
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await;

        match result {
            Ok(output) => Ok(output
                .attributes()
                .map(|attrs| dynamo::get_n(attrs, "genUsagesRemaining"))
                .unwrap_or(0)),
            Err(err) => match err.into_service_error() {
                UpdateItemError::ConditionalCheckFailedException(_) => {
                    Err(StoreError::not_found("user", name))
                }
                other => Err(dynamo_err(other)),
            },
        }
    }

    async fn list_all(&self) -> Result<Vec<User>, StoreError> {
        let mut users = Vec::new();
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
                users.push(dynamo::user_from_item(item)?);
            }

            match result.last_evaluated_key() {
                Some(key) => start_key = Some(key.clone()),
                None => break,
            }
        }
        tracing::debug!("Scanned {} users from {}", users.len(), self.table_name);
        Ok(users)
    }
}
