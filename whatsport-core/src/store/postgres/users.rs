use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{DbConnection, DbPool};
use crate::error::{CoreError, CoreResult};
use crate::schema::users;
use crate::store::UserStore;
use crate::types::User;

pub struct PgUserStore {
    pool: Arc<DbPool>,
}

impl PgUserStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> CoreResult<DbConnection> {
        Ok(self.pool.get().await?)
    }
}

#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct UserRow {
    id: Uuid,
    email: String,
    role: String,
    full_name: Option<String>,
    phone: Option<String>,
    sports: serde_json::Value,
    company_name: Option<String>,
    company_document: Option<String>,
    bank_info: Option<serde_json::Value>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = CoreError;

    fn try_from(row: UserRow) -> CoreResult<User> {
        Ok(User {
            id: row.id,
            email: row.email,
            role: row.role.parse()?,
            full_name: row.full_name,
            phone: row.phone,
            sports: serde_json::from_value(row.sports)?,
            company_name: row.company_name,
            company_document: row.company_document,
            bank_info: row.bank_info,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<&User> for UserRow {
    type Error = CoreError;

    fn try_from(user: &User) -> CoreResult<UserRow> {
        Ok(UserRow {
            id: user.id,
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
            full_name: user.full_name.clone(),
            phone: user.phone.clone(),
            sports: serde_json::to_value(&user.sports)?,
            company_name: user.company_name.clone(),
            company_document: user.company_document.clone(),
            bank_info: user.bank_info.clone(),
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        })
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: &User) -> CoreResult<()> {
        let row = UserRow::try_from(user)?;
        let mut conn = self.conn().await?;
        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<User>> {
        let mut conn = self.conn().await?;
        let row: Option<UserRow> = users::table
            .find(id)
            .first(&mut conn)
            .await
            .optional()?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        let mut conn = self.conn().await?;
        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email))
            .first(&mut conn)
            .await
            .optional()?;
        row.map(User::try_from).transpose()
    }

    async fn update(&self, user: &User) -> CoreResult<bool> {
        let row = UserRow::try_from(user)?;
        let mut conn = self.conn().await?;
        let updated = diesel::update(users::table.find(user.id))
            .set(&row)
            .execute(&mut conn)
            .await?;
        Ok(updated > 0)
    }
}
