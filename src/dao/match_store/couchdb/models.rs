use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::dao::models::{GameEntity, MatchEntity, TeamEntity};

pub const MATCH_PREFIX: &str = "match::";
pub const TEAM_PREFIX: &str = "team::";
pub const GAME_PREFIX: &str = "game::";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    #[serde(default)]
    pub doc: Option<Value>,
}

/// CouchDB envelope around a persisted entity: `_id`/`_rev` plus the entity fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchDocument<T> {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub body: T,
}

pub type CouchMatchDocument = CouchDocument<MatchEntity>;
pub type CouchTeamDocument = CouchDocument<TeamEntity>;
pub type CouchGameDocument = CouchDocument<GameEntity>;

impl CouchMatchDocument {
    pub fn from_entity(entity: MatchEntity, rev: Option<String>) -> Self {
        Self {
            id: match_doc_id(entity.id),
            rev,
            body: entity,
        }
    }
}

pub fn match_doc_id(id: Uuid) -> String {
    format!("{MATCH_PREFIX}{id}")
}
