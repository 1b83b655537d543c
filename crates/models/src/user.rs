use chrono::{Duration, Utc};
use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub department: String,
    pub subscription_expiry_date: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        panic!("no relations")
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// New accounts get a 30-day subscription window.
pub const SUBSCRIPTION_GRACE_DAYS: i64 = 30;

pub async fn create<C: ConnectionTrait>(
    db: &C,
    username: &str,
    name: &str,
    email: &str,
    password_hash: &str,
    department: &str,
) -> Result<Model, ModelError> {
    if !email.contains('@') {
        return Err(ModelError::Validation("invalid email".into()));
    }
    if username.trim().is_empty() {
        return Err(ModelError::Validation("username required".into()));
    }
    let now = Utc::now();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash.to_string()),
        department: Set(department.to_string()),
        subscription_expiry_date: Set((now + Duration::days(SUBSCRIPTION_GRACE_DAYS)).into()),
        created_at: Set(now.into()),
    };
    am.insert(db).await.map_err(ModelError::from)
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Model>, ModelError> {
    Entity::find_by_id(id).one(db).await.map_err(ModelError::from)
}

pub async fn find_by_username<C: ConnectionTrait>(
    db: &C,
    username: &str,
) -> Result<Option<Model>, ModelError> {
    Entity::find()
        .filter(Column::Username.eq(username))
        .one(db)
        .await
        .map_err(ModelError::from)
}

pub async fn extend_subscription<C: ConnectionTrait>(
    db: &C,
    model: Model,
    days: i64,
) -> Result<Model, ModelError> {
    let expiry = model.subscription_expiry_date + Duration::days(days);
    let mut am: ActiveModel = model.into();
    am.subscription_expiry_date = Set(expiry);
    am.update(db).await.map_err(ModelError::from)
}

pub async fn hard_delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<(), ModelError> {
    Entity::delete_by_id(id).exec(db).await.map_err(ModelError::from)?;
    Ok(())
}
