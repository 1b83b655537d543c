use chrono::Utc;
use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub base_address: String,
    #[sea_orm(column_name = "type")]
    pub service_type: String,
    pub version: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Endpoint,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Endpoint => Entity::has_many(crate::service_endpoint::Entity).into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn insert<C: ConnectionTrait>(
    db: &C,
    name: &str,
    description: &str,
    base_address: &str,
    service_type: &str,
    version: &str,
) -> Result<Model, ModelError> {
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(description.to_string()),
        base_address: Set(base_address.to_string()),
        service_type: Set(service_type.to_string()),
        version: Set(version.to_string()),
        created_at: Set(Utc::now().into()),
    };
    am.insert(db).await.map_err(ModelError::from)
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Model>, ModelError> {
    Entity::find_by_id(id).one(db).await.map_err(ModelError::from)
}

pub async fn find_by_type_version<C: ConnectionTrait>(
    db: &C,
    service_type: &str,
    version: &str,
) -> Result<Option<Model>, ModelError> {
    Entity::find()
        .filter(Column::ServiceType.eq(service_type))
        .filter(Column::Version.eq(version))
        .one(db)
        .await
        .map_err(ModelError::from)
}

pub async fn find_all_of_type<C: ConnectionTrait>(
    db: &C,
    service_type: &str,
) -> Result<Vec<Model>, ModelError> {
    Entity::find()
        .filter(Column::ServiceType.eq(service_type))
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await
        .map_err(ModelError::from)
}

pub async fn search<C: ConnectionTrait>(
    db: &C,
    name_substring: Option<&str>,
    service_type: Option<&str>,
) -> Result<Vec<Model>, ModelError> {
    let mut query = Entity::find();
    if let Some(name) = name_substring {
        query = query.filter(Column::Name.contains(name));
    }
    if let Some(t) = service_type {
        query = query.filter(Column::ServiceType.eq(t));
    }
    query
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await
        .map_err(ModelError::from)
}

pub async fn hard_delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<(), ModelError> {
    Entity::delete_by_id(id).exec(db).await.map_err(ModelError::from)?;
    Ok(())
}
