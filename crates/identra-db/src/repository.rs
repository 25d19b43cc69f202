//! Repository capability traits.
//!
//! Read and write access are separate capabilities composed per entity by
//! explicit delegation to the model methods, so an entity that is only
//! ever read (permissions) simply does not get a writer.

use async_trait::async_trait;
use sqlx::postgres::PgConnection;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{Account, Group};

/// Read capability for a tenant-scoped entity.
#[async_trait]
pub trait Reader: Send + Sync {
    type Entity;

    /// Find an entity by id within a tenant.
    async fn find_by_id(
        &self,
        pool: &PgPool,
        tenant_id: Uuid,
        id: &str,
    ) -> Result<Option<Self::Entity>, DbError>;

    /// True if the entity exists within the tenant.
    async fn exists(&self, pool: &PgPool, tenant_id: Uuid, id: &str) -> Result<bool, DbError> {
        Ok(self.find_by_id(pool, tenant_id, id).await?.is_some())
    }
}

/// Write capability, layered on read.
#[async_trait]
pub trait Writer: Reader {
    /// Remove an entity row inside an open transaction.
    async fn remove(&self, conn: &mut PgConnection, id: &str) -> Result<bool, DbError>;
}

/// Account repository unit.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountRepository;

#[async_trait]
impl Reader for AccountRepository {
    type Entity = Account;

    async fn find_by_id(
        &self,
        pool: &PgPool,
        tenant_id: Uuid,
        id: &str,
    ) -> Result<Option<Account>, DbError> {
        Account::find_by_id(pool, tenant_id, id).await
    }
}

#[async_trait]
impl Writer for AccountRepository {
    async fn remove(&self, conn: &mut PgConnection, id: &str) -> Result<bool, DbError> {
        Account::delete(conn, id).await
    }
}

/// Group repository unit.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupRepository;

#[async_trait]
impl Reader for GroupRepository {
    type Entity = Group;

    async fn find_by_id(
        &self,
        pool: &PgPool,
        tenant_id: Uuid,
        id: &str,
    ) -> Result<Option<Group>, DbError> {
        Group::find_by_id(pool, tenant_id, id).await
    }
}

#[async_trait]
impl Writer for GroupRepository {
    async fn remove(&self, conn: &mut PgConnection, id: &str) -> Result<bool, DbError> {
        Group::delete(conn, id).await
    }
}
