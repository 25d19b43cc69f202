//! Group orchestration service.
//!
//! Same composition as the account service: store write → directory call
//! → commit/rollback decision → event publication, with grants validated
//! against the migration-managed permission table before any transaction
//! opens.

use chrono::Utc;
use identra_core::{GroupId, RetryPipeline};
use identra_db::models::{Group, NewGroup, Permission};
use identra_db::{
    DbError, GrantSpec, GroupMembership, GroupPermissionGrant, GroupRepository, Reader,
    TransactionCoordinator, TxState, Writer,
};
use identra_directory::{DirectorySynchronizer, EntityKind, SyncOutcome};
use identra_events::events::{GroupDeleted, GroupUpserted};
use identra_events::{EventSink, GrantProjection, GroupProjection, IdentityEvent};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::OrchestrationError;
use crate::projection;
use crate::publish::{publish_after_commit, sync_failure};
use crate::requests::{CreateGroupRequest, GrantRequest, UpdateGroupRequest};
use crate::validation::{validate_group_name, validate_operations_mask};

/// Orchestrates the group lifecycle.
pub struct GroupService {
    pool: PgPool,
    directory: Arc<DirectorySynchronizer>,
    events: Arc<dyn EventSink>,
    groups: GroupRepository,
    store_pipeline: Arc<RetryPipeline>,
    publish_pipeline: Arc<RetryPipeline>,
}

impl GroupService {
    /// Create the service with injected collaborators and pipelines.
    #[must_use]
    pub fn new(
        pool: PgPool,
        directory: Arc<DirectorySynchronizer>,
        events: Arc<dyn EventSink>,
        store_pipeline: Arc<RetryPipeline>,
        publish_pipeline: Arc<RetryPipeline>,
    ) -> Self {
        Self {
            pool,
            directory,
            events,
            groups: GroupRepository,
            store_pipeline,
            publish_pipeline,
        }
    }

    // ── Create ──

    /// Create a group, synchronized into the directory keeper.
    pub async fn create(
        &self,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
        request: &CreateGroupRequest,
    ) -> Result<GroupProjection, OrchestrationError> {
        self.store_pipeline
            .execute(|| self.create_once(tenant_id, actor_id, request))
            .await
            .map_err(OrchestrationError::from_retry)
    }

    async fn create_once(
        &self,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
        request: &CreateGroupRequest,
    ) -> Result<GroupProjection, OrchestrationError> {
        validate_group_name(&request.name)?;
        self.validate_grants(&request.grants).await?;
        let member_logins = self.validate_members(tenant_id, &request.member_ids).await?;

        if Group::name_exists(&self.pool, &request.name, None).await? {
            return Err(OrchestrationError::Conflict {
                resource: format!("group name '{}'", request.name),
            });
        }

        let id = match &request.id {
            Some(raw) => GroupId::parse(raw)
                .map_err(|e| OrchestrationError::validation("id", e.to_string()))?,
            None => GroupId::generate(),
        };

        let mut coordinator = TransactionCoordinator::new(self.pool.clone());
        coordinator.begin().await?;

        let group = Group::insert(
            coordinator.executor()?,
            &NewGroup {
                id: id.into(),
                tenant_id,
                name: request.name.clone(),
            },
        )
        .await?;
        GroupPermissionGrant::replace_for_group(
            coordinator.executor()?,
            &group.id,
            &grant_specs(&request.grants),
        )
        .await?;
        for member_id in &request.member_ids {
            GroupMembership::add_member(coordinator.executor()?, tenant_id, &group.id, member_id)
                .await?;
        }

        let grants = grant_projections(&request.grants);
        let group_projection = projection::group_projection(&group, member_logins, grants);

        let outcome = self.upsert_directory_entry(&group, &group_projection).await;
        let state = coordinator.define(outcome.accepted()).await?;
        if state != TxState::Committed {
            return Err(sync_failure(&outcome, &group.name));
        }

        info!(
            group_id = %group.id,
            tenant_id = %tenant_id,
            "Group created"
        );

        let event = IdentityEvent::GroupUpserted(GroupUpserted {
            projection: group_projection.clone(),
        });
        publish_after_commit(
            &self.publish_pipeline,
            self.events.as_ref(),
            event,
            tenant_id,
            actor_id,
        )
        .await;

        Ok(group_projection)
    }

    /// Create a group without directory synchronization (direct path).
    pub async fn create_direct(
        &self,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
        request: &CreateGroupRequest,
    ) -> Result<GroupProjection, OrchestrationError> {
        self.store_pipeline
            .execute(|| self.create_direct_once(tenant_id, actor_id, request))
            .await
            .map_err(OrchestrationError::from_retry)
    }

    async fn create_direct_once(
        &self,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
        request: &CreateGroupRequest,
    ) -> Result<GroupProjection, OrchestrationError> {
        validate_group_name(&request.name)?;
        self.validate_grants(&request.grants).await?;
        let member_logins = self.validate_members(tenant_id, &request.member_ids).await?;

        if Group::name_exists(&self.pool, &request.name, None).await? {
            return Err(OrchestrationError::Conflict {
                resource: format!("group name '{}'", request.name),
            });
        }

        let id = match &request.id {
            Some(raw) => GroupId::parse(raw)
                .map_err(|e| OrchestrationError::validation("id", e.to_string()))?,
            None => GroupId::generate(),
        };

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let group = Group::insert(
            &mut *tx,
            &NewGroup {
                id: id.into(),
                tenant_id,
                name: request.name.clone(),
            },
        )
        .await?;
        GroupPermissionGrant::replace_for_group(&mut *tx, &group.id, &grant_specs(&request.grants))
            .await?;
        for member_id in &request.member_ids {
            GroupMembership::add_member(&mut *tx, tenant_id, &group.id, member_id).await?;
        }
        tx.commit().await.map_err(DbError::from)?;

        info!(
            group_id = %group.id,
            tenant_id = %tenant_id,
            "Group created via direct path"
        );

        let group_projection = projection::group_projection(
            &group,
            member_logins,
            grant_projections(&request.grants),
        );
        let event = IdentityEvent::GroupUpserted(GroupUpserted {
            projection: group_projection.clone(),
        });
        publish_after_commit(
            &self.publish_pipeline,
            self.events.as_ref(),
            event,
            tenant_id,
            actor_id,
        )
        .await;

        Ok(group_projection)
    }

    // ── Update ──

    /// Update a group, synchronized into the directory keeper.
    ///
    /// The request carries the revision the caller read; a stale token
    /// surfaces as `ConcurrencyConflict`.
    pub async fn update(
        &self,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
        group_id: &str,
        request: &UpdateGroupRequest,
    ) -> Result<GroupProjection, OrchestrationError> {
        self.store_pipeline
            .execute(|| self.update_once(tenant_id, actor_id, group_id, request))
            .await
            .map_err(OrchestrationError::from_retry)
    }

    async fn update_once(
        &self,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
        group_id: &str,
        request: &UpdateGroupRequest,
    ) -> Result<GroupProjection, OrchestrationError> {
        let mut group = self
            .groups
            .find_by_id(&self.pool, tenant_id, group_id)
            .await?
            .ok_or_else(|| OrchestrationError::NotFound {
                kind: "group",
                key: "id",
                value: group_id.to_string(),
            })?;

        if let Some(name) = &request.name {
            validate_group_name(name)?;
            if !name.eq_ignore_ascii_case(&group.name)
                && Group::name_exists(&self.pool, name, Some(&group.id)).await?
            {
                return Err(OrchestrationError::Conflict {
                    resource: format!("group name '{name}'"),
                });
            }
            group.name = name.clone();
        }
        if let Some(grants) = &request.grants {
            self.validate_grants(grants).await?;
        }
        group.updated_at = Utc::now();

        let mut coordinator = TransactionCoordinator::new(self.pool.clone());
        coordinator.begin().await?;

        if let Some(grants) = &request.grants {
            GroupPermissionGrant::replace_for_group(
                coordinator.executor()?,
                &group.id,
                &grant_specs(grants),
            )
            .await?;
        }
        Group::persist(coordinator.executor()?, &group, request.revision).await?;

        let members = self.member_logins(&group.id).await?;
        let grants = match &request.grants {
            Some(grants) => grant_projections(grants),
            None => self.stored_grant_projections(&group.id).await?,
        };
        group.revision = request.revision + 1;
        let group_projection = projection::group_projection(&group, members, grants);

        let outcome = self.upsert_directory_entry(&group, &group_projection).await;
        let state = coordinator.define(outcome.accepted()).await?;
        if state != TxState::Committed {
            return Err(sync_failure(&outcome, &group.name));
        }

        info!(
            group_id = %group.id,
            tenant_id = %tenant_id,
            revision = group.revision,
            "Group updated"
        );

        let event = IdentityEvent::GroupUpserted(GroupUpserted {
            projection: group_projection.clone(),
        });
        publish_after_commit(
            &self.publish_pipeline,
            self.events.as_ref(),
            event,
            tenant_id,
            actor_id,
        )
        .await;

        Ok(group_projection)
    }

    // ── Delete ──

    /// Delete a group and its directory entry.
    pub async fn delete(
        &self,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
        group_id: &str,
    ) -> Result<(), OrchestrationError> {
        self.store_pipeline
            .execute(|| self.delete_once(tenant_id, actor_id, group_id))
            .await
            .map_err(OrchestrationError::from_retry)
    }

    async fn delete_once(
        &self,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
        group_id: &str,
    ) -> Result<(), OrchestrationError> {
        // Absent groups fail here, before any directory call.
        let group = self
            .groups
            .find_by_id(&self.pool, tenant_id, group_id)
            .await?
            .ok_or_else(|| OrchestrationError::NotFound {
                kind: "group",
                key: "id",
                value: group_id.to_string(),
            })?;

        let mut coordinator = TransactionCoordinator::new(self.pool.clone());
        coordinator.begin().await?;

        GroupMembership::remove_all_for_group(coordinator.executor()?, &group.id).await?;
        GroupPermissionGrant::remove_all_for_group(coordinator.executor()?, &group.id).await?;
        self.groups.remove(coordinator.executor()?, &group.id).await?;

        let outcome = self.directory.sync_remove(&group.name).await;
        let state = coordinator.define(outcome.accepted()).await?;
        if state != TxState::Committed {
            return Err(sync_failure(&outcome, &group.name));
        }

        info!(
            group_id = %group.id,
            tenant_id = %tenant_id,
            "Group deleted"
        );

        let event = IdentityEvent::GroupDeleted(GroupDeleted {
            group_id: group.id.clone(),
        });
        publish_after_commit(
            &self.publish_pipeline,
            self.events.as_ref(),
            event,
            tenant_id,
            actor_id,
        )
        .await;

        Ok(())
    }

    // ── Internals ──

    /// Every granted permission must exist; grants reference the
    /// migration-managed permission table.
    async fn validate_grants(&self, grants: &[GrantRequest]) -> Result<(), OrchestrationError> {
        for grant in grants {
            validate_operations_mask(grant.operations)?;
            if !Permission::exists(&self.pool, &grant.permission_id).await? {
                return Err(OrchestrationError::NotFound {
                    kind: "permission",
                    key: "id",
                    value: grant.permission_id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Every member account must exist; returns their logins for the
    /// projection.
    async fn validate_members(
        &self,
        tenant_id: Uuid,
        member_ids: &[String],
    ) -> Result<Vec<String>, OrchestrationError> {
        let accounts = identra_db::AccountRepository;
        let mut logins = Vec::with_capacity(member_ids.len());
        for member_id in member_ids {
            match accounts.find_by_id(&self.pool, tenant_id, member_id).await? {
                Some(account) => logins.push(account.login),
                None => {
                    return Err(OrchestrationError::NotFound {
                        kind: "account",
                        key: "id",
                        value: member_id.clone(),
                    })
                }
            }
        }
        Ok(logins)
    }

    async fn member_logins(&self, group_id: &str) -> Result<Vec<String>, OrchestrationError> {
        Ok(GroupMembership::members_of(&self.pool, group_id)
            .await?
            .into_iter()
            .map(|m| m.login)
            .collect())
    }

    async fn stored_grant_projections(
        &self,
        group_id: &str,
    ) -> Result<Vec<GrantProjection>, OrchestrationError> {
        Ok(GroupPermissionGrant::list_for_group(&self.pool, group_id)
            .await?
            .into_iter()
            .map(|g| GrantProjection {
                permission_id: g.permission_id,
                operations: g.operations,
            })
            .collect())
    }

    async fn upsert_directory_entry(
        &self,
        group: &Group,
        group_projection: &GroupProjection,
    ) -> SyncOutcome {
        match projection::group_record(group_projection) {
            Ok(content) => {
                self.directory
                    .sync_upsert(EntityKind::Group, &group.name, &group.name, None, content)
                    .await
            }
            Err(e) => SyncOutcome::failure(e.to_string()),
        }
    }
}

fn grant_specs(grants: &[GrantRequest]) -> Vec<GrantSpec> {
    grants
        .iter()
        .map(|g| GrantSpec {
            permission_id: g.permission_id.clone(),
            operations: g.operations,
        })
        .collect()
}

fn grant_projections(grants: &[GrantRequest]) -> Vec<GrantProjection> {
    grants
        .iter()
        .map(|g| GrantProjection {
            permission_id: g.permission_id.clone(),
            operations: g.operations,
        })
        .collect()
}
