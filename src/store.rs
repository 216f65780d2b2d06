use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client, ErrorKind, RedisError, Script};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::restaurant::{Restaurant, RestaurantPatch};
use crate::search::RestaurantFilter;

/// Persistence for the restaurant collection.
///
/// Ids are generated by the store on `create` and are time-ordered, so
/// `find` returns restaurants in creation order.
#[async_trait]
pub trait RestaurantStore: Send + Sync {
    /// Persists a new restaurant built from `fields` and returns it with its id.
    async fn create(&self, fields: RestaurantPatch) -> AppResult<Restaurant>;

    async fn get(&self, id: Uuid) -> AppResult<Option<Restaurant>>;

    /// Overwrites an existing restaurant. Fails with `RestaurantNotFound`
    /// if it was deleted in the meantime.
    async fn replace(&self, restaurant: &Restaurant) -> AppResult<()>;

    /// Returns `false` when there was nothing to delete.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    async fn find(&self, filter: &RestaurantFilter) -> AppResult<Vec<Restaurant>>;
}

// KEYS[1] = collection hash, ARGV[1] = id, ARGV[2] = document
const REPLACE_IF_EXISTS: &str = r"
if redis.call('HEXISTS', KEYS[1], ARGV[1]) == 1 then
    redis.call('HSET', KEYS[1], ARGV[1], ARGV[2])
    return 1
end
return 0
";

/// Restaurants stored as JSON documents in a single Redis hash keyed by id.
#[derive(Clone)]
pub struct RedisRestaurantStore {
    conn: MultiplexedConnection,
    key: String,
    replace_script: Arc<Script>,
}

impl RedisRestaurantStore {
    /// Opens the shared connection and checks that the server answers.
    ///
    /// # Arguments
    /// * `url` - Redis connection URL
    /// * `key` - Name of the hash holding the collection
    pub async fn connect(url: &str, key: impl Into<String>) -> AppResult<Self> {
        let client = Client::open(url)?;
        let mut conn = client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;

        let key = key.into();
        info!(%key, "Connected to Redis");
        Ok(Self {
            conn,
            key,
            replace_script: Arc::new(Script::new(REPLACE_IF_EXISTS)),
        })
    }

    fn connection(&self) -> MultiplexedConnection {
        self.conn.clone()
    }
}

#[async_trait]
impl RestaurantStore for RedisRestaurantStore {
    async fn create(&self, fields: RestaurantPatch) -> AppResult<Restaurant> {
        let restaurant = fields.into_restaurant(Uuid::now_v7());
        let document = serde_json::to_string(&restaurant)?;

        let created: bool = self
            .connection()
            .hset_nx(&self.key, restaurant.id.to_string(), document)
            .await?;
        if !created {
            return Err(RedisError::from((ErrorKind::ResponseError, "duplicate restaurant id")).into());
        }
        Ok(restaurant)
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Restaurant>> {
        let document: Option<String> = self.connection().hget(&self.key, id.to_string()).await?;
        match document {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn replace(&self, restaurant: &Restaurant) -> AppResult<()> {
        let document = serde_json::to_string(restaurant)?;
        let mut conn = self.connection();
        let replaced: bool = self
            .replace_script
            .key(&self.key)
            .arg(restaurant.id.to_string())
            .arg(document)
            .invoke_async(&mut conn)
            .await?;

        if replaced {
            Ok(())
        } else {
            Err(AppError::RestaurantNotFound(restaurant.id.to_string()))
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let removed: usize = self.connection().hdel(&self.key, id.to_string()).await?;
        Ok(removed > 0)
    }

    async fn find(&self, filter: &RestaurantFilter) -> AppResult<Vec<Restaurant>> {
        let documents: Vec<String> = self.connection().hvals(&self.key).await?;
        debug!(scanned = documents.len(), "scanning restaurants");

        let mut matched = Vec::new();
        for json in documents {
            let restaurant: Restaurant = serde_json::from_str(&json)?;
            if filter.matches(&restaurant) {
                matched.push(restaurant);
            }
        }
        matched.sort_by_key(|restaurant| restaurant.id);
        Ok(matched)
    }
}

/// In-process store for tests and local runs without Redis.
#[derive(Clone, Default)]
pub struct MemoryRestaurantStore {
    restaurants: Arc<RwLock<BTreeMap<Uuid, Restaurant>>>,
}

impl MemoryRestaurantStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with existing documents, keeping their ids.
    pub fn with_restaurants(restaurants: impl IntoIterator<Item = Restaurant>) -> Self {
        let restaurants = restaurants
            .into_iter()
            .map(|restaurant| (restaurant.id, restaurant))
            .collect();
        Self {
            restaurants: Arc::new(RwLock::new(restaurants)),
        }
    }
}

#[async_trait]
impl RestaurantStore for MemoryRestaurantStore {
    async fn create(&self, fields: RestaurantPatch) -> AppResult<Restaurant> {
        let restaurant = fields.into_restaurant(Uuid::now_v7());
        self.restaurants
            .write()
            .await
            .insert(restaurant.id, restaurant.clone());
        Ok(restaurant)
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Restaurant>> {
        Ok(self.restaurants.read().await.get(&id).cloned())
    }

    async fn replace(&self, restaurant: &Restaurant) -> AppResult<()> {
        match self.restaurants.write().await.get_mut(&restaurant.id) {
            Some(stored) => {
                *stored = restaurant.clone();
                Ok(())
            }
            None => Err(AppError::RestaurantNotFound(restaurant.id.to_string())),
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.restaurants.write().await.remove(&id).is_some())
    }

    async fn find(&self, filter: &RestaurantFilter) -> AppResult<Vec<Restaurant>> {
        Ok(self
            .restaurants
            .read()
            .await
            .values()
            .filter(|restaurant| filter.matches(restaurant))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(body: serde_json::Value) -> RestaurantPatch {
        RestaurantPatch::from_json(body).unwrap()
    }

    #[tokio::test]
    async fn create_assigns_distinct_ids() {
        let store = MemoryRestaurantStore::new();
        let first = store.create(fields(json!({ "name": "A" }))).await.unwrap();
        let second = store.create(fields(json!({ "name": "A" }))).await.unwrap();

        assert_ne!(first.id, second.id);
        assert!(!first.id.is_nil());
        assert_eq!(store.get(first.id).await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn replace_overwrites_and_requires_existing() {
        let store = MemoryRestaurantStore::new();
        let mut restaurant = store.create(fields(json!({ "city": "X" }))).await.unwrap();

        restaurant.city = Some("Y".into());
        store.replace(&restaurant).await.unwrap();
        assert_eq!(
            store.get(restaurant.id).await.unwrap().unwrap().city.as_deref(),
            Some("Y")
        );

        store.delete(restaurant.id).await.unwrap();
        assert!(matches!(
            store.replace(&restaurant).await,
            Err(AppError::RestaurantNotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_reports_whether_something_was_removed() {
        let store = MemoryRestaurantStore::new();
        let restaurant = store.create(RestaurantPatch::default()).await.unwrap();

        assert!(store.delete(restaurant.id).await.unwrap());
        assert!(!store.delete(restaurant.id).await.unwrap());
        assert_eq!(store.get(restaurant.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn find_returns_matches_in_creation_order() {
        let store = MemoryRestaurantStore::new();
        let mut expected = Vec::new();
        for name in ["first", "second", "third"] {
            expected.push(
                store
                    .create(fields(json!({ "name": name, "city": "X" })))
                    .await
                    .unwrap(),
            );
            store
                .create(fields(json!({ "name": name, "city": "Y" })))
                .await
                .unwrap();
        }

        let filter = RestaurantFilter {
            city: Some("X".into()),
            coupon_code: None,
        };
        assert_eq!(store.find(&filter).await.unwrap(), expected);
    }
}
