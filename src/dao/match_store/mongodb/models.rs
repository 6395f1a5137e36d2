use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    dao::models::MatchEntity,
    scoring::ScoreSnapshot,
    state::tournament::{GameFamily, MatchStatus, MatchType, Round},
};

/// Match as stored in the `matches` collection. The primary key is the
/// hyphenated UUID string so lookups do not depend on binary subtypes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMatchDocument {
    #[serde(rename = "_id")]
    id: String,
    team_a: Uuid,
    team_b: Uuid,
    game_id: Uuid,
    family: GameFamily,
    round: Round,
    match_number: u32,
    status: MatchStatus,
    #[serde(default)]
    match_type: Option<MatchType>,
    result: ScoreSnapshot,
    #[serde(default)]
    winner: Option<Uuid>,
    updated_at: DateTime,
}

impl From<MatchEntity> for MongoMatchDocument {
    fn from(value: MatchEntity) -> Self {
        Self {
            id: value.id.to_string(),
            team_a: value.team_a,
            team_b: value.team_b,
            game_id: value.game_id,
            family: value.family,
            round: value.round,
            match_number: value.match_number,
            status: value.status,
            match_type: value.match_type,
            result: value.result,
            winner: value.winner,
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl TryFrom<MongoMatchDocument> for MatchEntity {
    type Error = uuid::Error;

    fn try_from(value: MongoMatchDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&value.id)?,
            team_a: value.team_a,
            team_b: value.team_b,
            game_id: value.game_id,
            family: value.family,
            round: value.round,
            match_number: value.match_number,
            status: value.status,
            match_type: value.match_type,
            result: value.result,
            winner: value.winner,
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}
