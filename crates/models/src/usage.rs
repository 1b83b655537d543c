use chrono::Utc;
use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;

/// One dispatched query. Immutable after creation; the referenced service or
/// identity may be deleted later, the record stays.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "usage")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub date_time: DateTimeWithTimeZone,
    pub service_type: String,
    pub service_version: String,
    pub service_id: Uuid,
    pub endpoint_id: Uuid,
    pub output: String,
    pub execution_time: f64,
    pub options: Option<Json>,
    pub is_admin_query: bool,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        panic!("no relations")
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub struct NewUsage<'a> {
    pub user_id: Uuid,
    pub service_type: &'a str,
    pub service_version: &'a str,
    pub service_id: Uuid,
    pub endpoint_id: Uuid,
    pub output: String,
    pub execution_time: f64,
    pub options: Option<Json>,
    pub is_admin_query: bool,
}

pub async fn insert<C: ConnectionTrait>(db: &C, new: NewUsage<'_>) -> Result<Model, ModelError> {
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(new.user_id),
        date_time: Set(Utc::now().into()),
        service_type: Set(new.service_type.to_string()),
        service_version: Set(new.service_version.to_string()),
        service_id: Set(new.service_id),
        endpoint_id: Set(new.endpoint_id),
        output: Set(new.output),
        execution_time: Set(new.execution_time),
        options: Set(new.options),
        is_admin_query: Set(new.is_admin_query),
    };
    am.insert(db).await.map_err(ModelError::from)
}

pub async fn find_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<Model>, ModelError> {
    Entity::find_by_id(uuid).one(db).await.map_err(ModelError::from)
}

/// Candidate records for the ledger, filtered at the SQL level; reference
/// reconciliation happens in the service layer.
pub async fn find_filtered<C: ConnectionTrait>(
    db: &C,
    user_id: Option<Uuid>,
    max_execution_time: Option<f64>,
    start: Option<DateTimeWithTimeZone>,
    end: Option<DateTimeWithTimeZone>,
) -> Result<Vec<Model>, ModelError> {
    let mut query = Entity::find();
    if let Some(uid) = user_id {
        query = query.filter(Column::UserId.eq(uid));
    }
    if let Some(max) = max_execution_time {
        query = query.filter(Column::ExecutionTime.lte(max));
    }
    if let Some(start) = start {
        query = query.filter(Column::DateTime.gte(start));
    }
    if let Some(end) = end {
        query = query.filter(Column::DateTime.lte(end));
    }
    query
        .order_by_asc(Column::DateTime)
        .all(db)
        .await
        .map_err(ModelError::from)
}

pub async fn hard_delete<C: ConnectionTrait>(db: &C, uuid: Uuid) -> Result<(), ModelError> {
    Entity::delete_by_id(uuid).exec(db).await.map_err(ModelError::from)?;
    Ok(())
}

/// Administrative purge of every record a user owns. The only bulk deletion
/// that is allowed to touch the ledger.
pub async fn purge_for_user<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<u64, ModelError> {
    let res = Entity::delete_many()
        .filter(Column::UserId.eq(user_id))
        .exec(db)
        .await
        .map_err(ModelError::from)?;
    Ok(res.rows_affected)
}
