use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reference to a stored media asset: the store's id plus the URL it is
/// served under.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRef {
    pub public_id: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lecture {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub media: MediaRef,
}

impl Lecture {
    pub fn new(title: String, description: String, media: MediaRef) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            media,
        }
    }
}

/// The course's embedded, ordered lecture list, stored as one JSON column.
/// Mutation goes through `push`/`remove` only; `number_of_lectures` on the
/// course row is always written from `len()` in the same UPDATE.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct Lectures(Vec<Lecture>);

impl Lectures {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Lecture] {
        &self.0
    }

    pub fn push(&mut self, lecture: Lecture) {
        self.0.push(lecture);
    }

    /// Remove a lecture by id, preserving the order of the rest.
    pub fn remove(&mut self, id: Uuid) -> Option<Lecture> {
        let index = self.0.iter().position(|l| l.id == id)?;
        Some(self.0.remove(index))
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub description: String,
    pub category: String,
    pub created_by: i32,
    pub thumbnail_public_id: Option<String>,
    pub thumbnail_url: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub lectures: Lectures,
    pub number_of_lectures: i32,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
