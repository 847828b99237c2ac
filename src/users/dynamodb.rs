//! DynamoDB-backed user store.
//!
//! Table layout: partition key `userId` (S), global secondary index
//! `EmailIndex` with partition key `email` (S). Attribute names are camelCase.

use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_sdk_dynamodb::{
    config::{Builder as DynamoConfigBuilder, Region},
    error::SdkError,
    operation::{
        delete_item::DeleteItemError, get_item::GetItemError, put_item::PutItemError,
        query::QueryError, update_item::UpdateItemError,
    },
    types::{AttributeValue, ReturnValue},
    Client,
};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::repo::{RepositoryError, Result, UserRepository};
use super::repo_types::{NewUser, User, UserUpdate};
use crate::config::DynamoConfig;

pub const EMAIL_INDEX: &str = "EmailIndex";
const ENTITY: &str = "User";

#[derive(Clone)]
pub struct DynamoDbUserRepository {
    client: Client,
    table_name: String,
}

impl DynamoDbUserRepository {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Builds a client from the default AWS credential chain, pinned to the configured region.
    pub async fn connect(cfg: &DynamoConfig) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .load()
            .await;

        let mut builder = DynamoConfigBuilder::from(&shared);
        if let Some(endpoint) = &cfg.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Ok(Self::new(Client::from_conf(builder.build()), &cfg.table_name))
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

#[async_trait]
impl UserRepository for DynamoDbUserRepository {
    async fn create_user(&self, new: NewUser) -> Result<User> {
        let user = User::from_new(new);
        let item = user_to_item(&user)?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(userId)")
            .send()
            .await
            .map_err(|e| map_put_item_error(e, user.user_id))?;

        debug!(user_id = %user.user_id, "user item written");
        Ok(user)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("userId", AttributeValue::S(user_id.to_string()))
            .send()
            .await
            .map_err(map_get_item_error)?;

        result.item.as_ref().map(item_to_user).transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let result = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(EMAIL_INDEX)
            .key_condition_expression("email = :email")
            .expression_attribute_values(":email", AttributeValue::S(email.to_string()))
            .send()
            .await
            .map_err(map_query_error)?;

        result
            .items
            .unwrap_or_default()
            .first()
            .map(item_to_user)
            .transpose()
    }

    async fn update_user(&self, user_id: Uuid, update: &UserUpdate) -> Result<User> {
        let expr = UpdateExpression::build(update, OffsetDateTime::now_utc())?;

        let mut request = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("userId", AttributeValue::S(user_id.to_string()))
            .update_expression(expr.expression)
            .condition_expression("attribute_exists(userId)")
            .return_values(ReturnValue::AllNew);
        for (placeholder, name) in expr.names {
            request = request.expression_attribute_names(placeholder, name);
        }
        for (placeholder, value) in expr.values {
            request = request.expression_attribute_values(placeholder, value);
        }

        let result = request
            .send()
            .await
            .map_err(|e| map_update_item_error(e, user_id))?;

        let attributes = result.attributes.ok_or_else(|| {
            RepositoryError::InvalidData("UpdateItem returned no attributes".to_string())
        })?;
        item_to_user(&attributes)
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<()> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("userId", AttributeValue::S(user_id.to_string()))
            .send()
            .await
            .map_err(map_delete_item_error)?;
        Ok(())
    }
}

// ---- conversions ----

pub(crate) fn user_to_item(user: &User) -> Result<HashMap<String, AttributeValue>> {
    let mut item = HashMap::new();
    item.insert("userId".to_string(), AttributeValue::S(user.user_id.to_string()));
    item.insert("email".to_string(), AttributeValue::S(user.email.clone()));
    item.insert(
        "passwordHash".to_string(),
        AttributeValue::S(user.password_hash.clone()),
    );
    item.insert("name".to_string(), AttributeValue::S(user.name.clone()));
    if let Some(bio) = &user.bio {
        item.insert("bio".to_string(), AttributeValue::S(bio.clone()));
    }
    if let Some(company) = &user.company {
        item.insert("company".to_string(), AttributeValue::S(company.clone()));
    }
    item.insert(
        "createdAt".to_string(),
        AttributeValue::S(format_timestamp(user.created_at)?),
    );
    item.insert(
        "lastModified".to_string(),
        AttributeValue::S(format_timestamp(user.last_modified)?),
    );
    Ok(item)
}

pub(crate) fn item_to_user(item: &HashMap<String, AttributeValue>) -> Result<User> {
    let raw_id = get_string(item, "userId")?;
    let user_id = Uuid::parse_str(&raw_id)
        .map_err(|e| RepositoryError::InvalidData(format!("Invalid UUID userId: {e}")))?;

    Ok(User {
        user_id,
        email: get_string(item, "email")?,
        password_hash: get_string(item, "passwordHash")?,
        name: get_string(item, "name")?,
        bio: get_optional_string(item, "bio"),
        company: get_optional_string(item, "company"),
        created_at: get_timestamp(item, "createdAt")?,
        last_modified: get_timestamp(item, "lastModified")?,
    })
}

fn get_string(item: &HashMap<String, AttributeValue>, key: &str) -> Result<String> {
    item.get(key)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| RepositoryError::InvalidData(format!("Missing or invalid field: {key}")))
}

fn get_optional_string(item: &HashMap<String, AttributeValue>, key: &str) -> Option<String> {
    item.get(key).and_then(|v| v.as_s().ok()).cloned()
}

fn get_timestamp(item: &HashMap<String, AttributeValue>, key: &str) -> Result<OffsetDateTime> {
    let raw = get_string(item, key)?;
    OffsetDateTime::parse(&raw, &Rfc3339)
        .map_err(|e| RepositoryError::InvalidData(format!("Invalid timestamp {key}: {e}")))
}

fn format_timestamp(ts: OffsetDateTime) -> Result<String> {
    ts.format(&Rfc3339)
        .map_err(|e| RepositoryError::Serialization(e.to_string()))
}

/// `SET` expression for a partial update. `lastModified` is always written.
#[derive(Debug)]
pub(crate) struct UpdateExpression {
    pub expression: String,
    pub names: Vec<(String, String)>,
    pub values: Vec<(String, AttributeValue)>,
}

impl UpdateExpression {
    pub(crate) fn build(update: &UserUpdate, now: OffsetDateTime) -> Result<Self> {
        let mut clauses = Vec::new();
        let mut names = Vec::new();
        let mut values = Vec::new();

        let fields = [
            ("lastModified", Some(format_timestamp(now)?)),
            ("name", update.name.clone()),
            ("email", update.email.clone()),
            ("bio", update.bio.clone()),
            ("company", update.company.clone()),
        ];
        for (attr, value) in fields {
            let Some(value) = value else { continue };
            clauses.push(format!("#{attr} = :{attr}"));
            names.push((format!("#{attr}"), attr.to_string()));
            values.push((format!(":{attr}"), AttributeValue::S(value)));
        }

        Ok(Self {
            expression: format!("SET {}", clauses.join(", ")),
            names,
            values,
        })
    }
}

// ---- error mapping ----

fn is_transport<E, R>(err: &SdkError<E, R>) -> bool {
    matches!(
        err,
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) | SdkError::ConstructionFailure(_)
    )
}

fn map_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<GetItemError, R>,
) -> RepositoryError {
    if is_transport(&err) {
        return RepositoryError::ConnectionFailed(format!("{err:?}"));
    }
    match err.into_service_error() {
        GetItemError::ResourceNotFoundException(_) => {
            RepositoryError::QueryFailed("Table not found".to_string())
        }
        GetItemError::ProvisionedThroughputExceededException(_) => {
            RepositoryError::QueryFailed("Throughput exceeded, please retry".to_string())
        }
        err => RepositoryError::QueryFailed(format!("GetItem failed: {err:?}")),
    }
}

fn map_query_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<QueryError, R>,
) -> RepositoryError {
    if is_transport(&err) {
        return RepositoryError::ConnectionFailed(format!("{err:?}"));
    }
    match err.into_service_error() {
        QueryError::ResourceNotFoundException(_) => {
            RepositoryError::QueryFailed("Table or index not found".to_string())
        }
        QueryError::ProvisionedThroughputExceededException(_) => {
            RepositoryError::QueryFailed("Throughput exceeded, please retry".to_string())
        }
        err => RepositoryError::QueryFailed(format!("Query failed: {err:?}")),
    }
}

fn map_put_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<PutItemError, R>,
    user_id: Uuid,
) -> RepositoryError {
    if is_transport(&err) {
        return RepositoryError::ConnectionFailed(format!("{err:?}"));
    }
    match err.into_service_error() {
        PutItemError::ConditionalCheckFailedException(_) => RepositoryError::AlreadyExists {
            entity_type: ENTITY,
            id: user_id.to_string(),
        },
        PutItemError::ResourceNotFoundException(_) => {
            RepositoryError::QueryFailed("Table not found".to_string())
        }
        err => RepositoryError::QueryFailed(format!("PutItem failed: {err:?}")),
    }
}

fn map_update_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<UpdateItemError, R>,
    user_id: Uuid,
) -> RepositoryError {
    if is_transport(&err) {
        return RepositoryError::ConnectionFailed(format!("{err:?}"));
    }
    match err.into_service_error() {
        UpdateItemError::ConditionalCheckFailedException(_) => RepositoryError::NotFound {
            entity_type: ENTITY,
            id: user_id.to_string(),
        },
        UpdateItemError::ResourceNotFoundException(_) => {
            RepositoryError::QueryFailed("Table not found".to_string())
        }
        err => RepositoryError::QueryFailed(format!("UpdateItem failed: {err:?}")),
    }
}

fn map_delete_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DeleteItemError, R>,
) -> RepositoryError {
    if is_transport(&err) {
        return RepositoryError::ConnectionFailed(format!("{err:?}"));
    }
    match err.into_service_error() {
        DeleteItemError::ResourceNotFoundException(_) => {
            RepositoryError::QueryFailed("Table not found".to_string())
        }
        err => RepositoryError::QueryFailed(format!("DeleteItem failed: {err:?}")),
    }
}
