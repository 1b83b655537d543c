use chrono::Utc;
use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::service;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service_endpoint")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub service_id: Uuid,
    pub method: String,
    pub endpoint_path: String,
    pub task: String,
    pub text_based: bool,
    /// option-name -> primitive type name, present only for text-based endpoints
    pub options: Option<Json>,
    /// upload-format names, present only for non-text-based endpoints
    pub supported_formats: Option<Json>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Service,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Service => Entity::belongs_to(service::Entity)
                .from(Column::ServiceId)
                .to(service::Column::Id)
                .into(),
        }
    }
}

impl Related<service::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Service.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[allow(clippy::too_many_arguments)]
pub async fn insert<C: ConnectionTrait>(
    db: &C,
    service_id: Uuid,
    method: &str,
    endpoint_path: &str,
    task: &str,
    text_based: bool,
    options: Option<Json>,
    supported_formats: Option<Json>,
) -> Result<Model, ModelError> {
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        service_id: Set(service_id),
        method: Set(method.to_string()),
        endpoint_path: Set(endpoint_path.to_string()),
        task: Set(task.to_string()),
        text_based: Set(text_based),
        options: Set(options),
        supported_formats: Set(supported_formats),
        created_at: Set(Utc::now().into()),
    };
    am.insert(db).await.map_err(ModelError::from)
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Model>, ModelError> {
    Entity::find_by_id(id).one(db).await.map_err(ModelError::from)
}

pub async fn find_by_service_task<C: ConnectionTrait>(
    db: &C,
    service_id: Uuid,
    task: &str,
) -> Result<Option<Model>, ModelError> {
    Entity::find()
        .filter(Column::ServiceId.eq(service_id))
        .filter(Column::Task.eq(task))
        .one(db)
        .await
        .map_err(ModelError::from)
}

pub async fn find_for_service<C: ConnectionTrait>(
    db: &C,
    service_id: Uuid,
    task_substring: Option<&str>,
    method: Option<&str>,
) -> Result<Vec<Model>, ModelError> {
    let mut query = Entity::find().filter(Column::ServiceId.eq(service_id));
    if let Some(task) = task_substring {
        query = query.filter(Column::Task.contains(task));
    }
    if let Some(m) = method {
        query = query.filter(Column::Method.eq(m));
    }
    query.all(db).await.map_err(ModelError::from)
}

pub async fn delete_for_service<C: ConnectionTrait>(
    db: &C,
    service_id: Uuid,
) -> Result<u64, ModelError> {
    let res = Entity::delete_many()
        .filter(Column::ServiceId.eq(service_id))
        .exec(db)
        .await
        .map_err(ModelError::from)?;
    Ok(res.rows_affected)
}

pub async fn hard_delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<(), ModelError> {
    Entity::delete_by_id(id).exec(db).await.map_err(ModelError::from)?;
    Ok(())
}
