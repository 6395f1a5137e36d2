use std::{sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Collection, Database, IndexModel, bson::doc, options::IndexOptions};
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoMatchDocument, doc_id},
};
use crate::{
    dao::{
        match_store::MatchStore,
        models::{GameEntity, MatchEntity, TeamEntity},
        storage::StorageResult,
    },
    scoring::ScoreSnapshot,
    state::tournament::MatchStatus,
};

const MATCH_COLLECTION: &str = "matches";
const TEAM_COLLECTION: &str = "teams";
const GAME_COLLECTION: &str = "games";

/// MongoDB-backed match store. Teams and games are read from collections
/// owned by the registration service.
#[derive(Clone)]
pub struct MongoMatchStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    database: RwLock<Database>,
    config: MongoConfig,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = self.database.read().await.clone();
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (_client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        *self.database.write().await = database;
        Ok(())
    }
}

impl MongoMatchStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (_client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let store = Self {
            inner: Arc::new(MongoInner {
                database: RwLock::new(database),
                config,
            }),
        };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let collection = self.matches().await;
        let indexes = [
            ("match_number_idx", "match_number", doc! {"match_number": 1}),
            (
                "match_game_round_idx",
                "game_id,round",
                doc! {"game_id": 1, "round": 1},
            ),
        ];

        for (name, index, keys) in indexes {
            let model = IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().name(Some(name.to_owned())).build())
                .build();
            collection
                .create_index(model)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection: MATCH_COLLECTION,
                    index,
                    source,
                })?;
        }
        Ok(())
    }

    async fn database(&self) -> Database {
        self.inner.database.read().await.clone()
    }

    async fn matches(&self) -> Collection<MongoMatchDocument> {
        self.database()
            .await
            .collection::<MongoMatchDocument>(MATCH_COLLECTION)
    }

    async fn list_collection<T>(&self, name: &'static str) -> MongoResult<Vec<T>>
    where
        T: serde::de::DeserializeOwned + Send + Sync,
    {
        self.database()
            .await
            .collection::<T>(name)
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::List {
                collection: name,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::List {
                collection: name,
                source,
            })
    }

    async fn list_matches(&self) -> MongoResult<Vec<MatchEntity>> {
        let documents: Vec<MongoMatchDocument> = self
            .matches()
            .await
            .find(doc! {})
            .sort(doc! {"match_number": 1})
            .await
            .map_err(|source| MongoDaoError::List {
                collection: MATCH_COLLECTION,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::List {
                collection: MATCH_COLLECTION,
                source,
            })?;

        Ok(documents.into_iter().filter_map(decode_match).collect())
    }

    async fn find_match(&self, id: Uuid) -> MongoResult<Option<MatchEntity>> {
        let document = self
            .matches()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadMatch { id, source })?;
        Ok(document.and_then(decode_match))
    }

    async fn save_match(&self, entity: MatchEntity) -> MongoResult<()> {
        let id = entity.id;
        let document: MongoMatchDocument = entity.into();
        self.matches()
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveMatch { id, source })?;
        Ok(())
    }

    async fn modify_match(
        &self,
        id: Uuid,
        update: impl FnOnce(&mut MatchEntity),
    ) -> MongoResult<Option<MatchEntity>> {
        let Some(mut entity) = self.find_match(id).await? else {
            return Ok(None);
        };
        update(&mut entity);
        entity.updated_at = SystemTime::now();
        self.save_match(entity.clone()).await?;
        Ok(Some(entity))
    }

    async fn delete_match(&self, id: Uuid) -> MongoResult<bool> {
        let result = self
            .matches()
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteMatch { id, source })?;
        Ok(result.deleted_count > 0)
    }
}

fn decode_match(document: MongoMatchDocument) -> Option<MatchEntity> {
    MatchEntity::try_from(document)
        .inspect_err(|err| warn!(error = %err, "skipping match document with malformed id"))
        .ok()
}

impl MatchStore for MongoMatchStore {
    fn list_matches(&self) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_matches().await.map_err(Into::into) })
    }

    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_collection::<TeamEntity>(TEAM_COLLECTION)
                .await
                .map_err(Into::into)
        })
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_collection::<GameEntity>(GAME_COLLECTION)
                .await
                .map_err(Into::into)
        })
    }

    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_match(id).await.map_err(Into::into) })
    }

    fn create_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<MatchEntity>> {
        let store = self.clone();
        Box::pin(async move {
            store.save_match(entity.clone()).await?;
            Ok(entity)
        })
    }

    fn update_match(
        &self,
        entity: MatchEntity,
    ) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .modify_match(entity.id, |stored| *stored = entity)
                .await
                .map_err(Into::into)
        })
    }

    fn delete_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_match(id).await.map_err(Into::into) })
    }

    fn patch_status(
        &self,
        id: Uuid,
        status: MatchStatus,
        winner: Option<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .modify_match(id, |stored| {
                    stored.status = status;
                    stored.winner = winner;
                })
                .await
                .map_err(Into::into)
        })
    }

    fn patch_score(
        &self,
        id: Uuid,
        result: ScoreSnapshot,
    ) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .modify_match(id, |stored| stored.result = result)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
