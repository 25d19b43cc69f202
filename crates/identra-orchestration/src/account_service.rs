//! Account orchestration service.
//!
//! Composes the repository layer, transaction coordinator, directory
//! synchronizer, and event publisher into the account use cases. Within
//! one call the ordering is fixed: store write → directory call →
//! commit/rollback decision → event publication. Each call exclusively
//! owns its coordinator; concurrent calls are arbitrated by the revision
//! token, never by locks held across the directory call.

use chrono::Utc;
use identra_core::{AccountId, AuthMode, RetryPipeline};
use identra_db::models::{Account, NewAccount};
use identra_db::{
    AccountRepository, CredentialHistoryEntry, DbError, GroupMembership, GroupRepository, Reader,
    SubstitutionLink, TenantAuthPolicy, TransactionCoordinator, TxState, Writer,
};
use identra_directory::{DirectorySynchronizer, EntityKind, SyncOutcome};
use identra_events::events::{AccountDeleted, AccountUpserted};
use identra_events::{AccountProjection, EventSink, IdentityEvent};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::auth_mode::resolve_auth_mode;
use crate::credentials::CredentialHasher;
use crate::error::OrchestrationError;
use crate::projection;
use crate::publish::{publish_after_commit, sync_failure};
use crate::requests::{CreateAccountRequest, UpdateAccountRequest};
use crate::validation::{
    validate_display_name, validate_login, validate_mode_email, validate_password,
};

/// Orchestrates the account lifecycle.
pub struct AccountService {
    pool: PgPool,
    directory: Arc<DirectorySynchronizer>,
    events: Arc<dyn EventSink>,
    hasher: CredentialHasher,
    accounts: AccountRepository,
    groups: GroupRepository,
    store_pipeline: Arc<RetryPipeline>,
    publish_pipeline: Arc<RetryPipeline>,
}

/// Validated create input, ready for staging.
struct PreparedAccount {
    new_account: NewAccount,
    auth_mode: AuthMode,
    group_names: Vec<String>,
}

impl AccountService {
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
            hasher: CredentialHasher::new(),
            accounts: AccountRepository,
            groups: GroupRepository,
            store_pipeline,
            publish_pipeline,
        }
    }

    // ── Create ──

    /// Create an account, synchronized into the directory keeper.
    ///
    /// # Errors
    ///
    /// - `Validation` / `NotFound` / `Conflict` before any transaction opens
    /// - `DirectorySyncFailed` / `DirectorySyncNoChange` after rollback
    /// - `TransientInfrastructure` once the retry budget is exhausted
    pub async fn create(
        &self,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
        request: &CreateAccountRequest,
    ) -> Result<AccountProjection, OrchestrationError> {
        self.store_pipeline
            .execute(|| self.create_once(tenant_id, actor_id, request))
            .await
            .map_err(OrchestrationError::from_retry)
    }

    /// Create an account without directory synchronization.
    ///
    /// Direct path for machine-to-machine callers: the row is committed
    /// and the event published with no coordinator/directory step.
    pub async fn create_direct(
        &self,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
        request: &CreateAccountRequest,
    ) -> Result<AccountProjection, OrchestrationError> {
        self.store_pipeline
            .execute(|| self.create_direct_once(tenant_id, actor_id, request))
            .await
            .map_err(OrchestrationError::from_retry)
    }

    async fn create_once(
        &self,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
        request: &CreateAccountRequest,
    ) -> Result<AccountProjection, OrchestrationError> {
        let prepared = self.prepare_create(tenant_id, request).await?;

        let mut coordinator = TransactionCoordinator::new(self.pool.clone());
        coordinator.begin().await?;

        let account = Account::insert(coordinator.executor()?, &prepared.new_account).await?;
        CredentialHistoryEntry::append(
            coordinator.executor()?,
            &account.id,
            &account.password_hash,
        )
        .await?;
        for group_id in &request.group_ids {
            GroupMembership::add_member(coordinator.executor()?, tenant_id, group_id, &account.id)
                .await?;
        }
        for substitute_id in &request.substitute_ids {
            SubstitutionLink::add(coordinator.executor()?, &account.id, substitute_id).await?;
        }

        let projection = projection::account_projection(
            &account,
            prepared.auth_mode,
            prepared.group_names,
            request.substitute_ids.clone(),
        );

        let outcome = self.upsert_directory_entry(&account, &projection).await;
        let state = coordinator.define(outcome.accepted()).await?;
        if state != TxState::Committed {
            return Err(sync_failure(&outcome, &account.login));
        }

        info!(
            account_id = %account.id,
            tenant_id = %tenant_id,
            "Account created"
        );

        let event = IdentityEvent::AccountUpserted(AccountUpserted {
            projection: projection.clone(),
            auth_mode: prepared.auth_mode,
            credential_hash: account.password_hash.clone(),
            directory_sync_hash: outcome.generated_code,
        });
        publish_after_commit(
            &self.publish_pipeline,
            self.events.as_ref(),
            event,
            tenant_id,
            actor_id,
        )
        .await;

        Ok(projection)
    }

    async fn create_direct_once(
        &self,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
        request: &CreateAccountRequest,
    ) -> Result<AccountProjection, OrchestrationError> {
        let prepared = self.prepare_create(tenant_id, request).await?;

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let account = Account::insert(&mut *tx, &prepared.new_account).await?;
        CredentialHistoryEntry::append(&mut *tx, &account.id, &account.password_hash).await?;
        for group_id in &request.group_ids {
            GroupMembership::add_member(&mut *tx, tenant_id, group_id, &account.id).await?;
        }
        for substitute_id in &request.substitute_ids {
            SubstitutionLink::add(&mut *tx, &account.id, substitute_id).await?;
        }
        tx.commit().await.map_err(DbError::from)?;

        info!(
            account_id = %account.id,
            tenant_id = %tenant_id,
            "Account created via direct path"
        );

        let projection = projection::account_projection(
            &account,
            prepared.auth_mode,
            prepared.group_names,
            request.substitute_ids.clone(),
        );
        let event = IdentityEvent::AccountUpserted(AccountUpserted {
            projection: projection.clone(),
            auth_mode: prepared.auth_mode,
            credential_hash: account.password_hash.clone(),
            directory_sync_hash: None,
        });
        publish_after_commit(
            &self.publish_pipeline,
            self.events.as_ref(),
            event,
            tenant_id,
            actor_id,
        )
        .await;

        Ok(projection)
    }

    /// Validate the request and its collaborators; nothing is staged yet.
    async fn prepare_create(
        &self,
        tenant_id: Uuid,
        request: &CreateAccountRequest,
    ) -> Result<PreparedAccount, OrchestrationError> {
        validate_login(&request.login)?;
        validate_display_name(&request.display_name)?;
        validate_password(&request.password)?;

        let mut group_names = Vec::with_capacity(request.group_ids.len());
        for group_id in &request.group_ids {
            match self.groups.find_by_id(&self.pool, tenant_id, group_id).await? {
                Some(group) => group_names.push(group.name),
                None => {
                    return Err(OrchestrationError::NotFound {
                        kind: "group",
                        key: "id",
                        value: group_id.clone(),
                    })
                }
            }
        }
        for substitute_id in &request.substitute_ids {
            if !self
                .accounts
                .exists(&self.pool, tenant_id, substitute_id)
                .await?
            {
                return Err(OrchestrationError::NotFound {
                    kind: "account",
                    key: "id",
                    value: substitute_id.clone(),
                });
            }
        }

        if Account::login_exists(&self.pool, &request.login, None).await? {
            return Err(OrchestrationError::Conflict {
                resource: format!("account login '{}'", request.login.to_lowercase()),
            });
        }

        let policy = TenantAuthPolicy::get_or_default(&self.pool, tenant_id).await?;
        let auth_mode = resolve_auth_mode(&policy, request.auth_mode)?;
        validate_mode_email(auth_mode, request.email.as_deref())?;

        let id = match &request.id {
            Some(raw) => AccountId::parse(raw)
                .map_err(|e| OrchestrationError::validation("id", e.to_string()))?,
            None => AccountId::generate(),
        };
        if request.substitute_ids.iter().any(|s| s == id.as_str()) {
            return Err(OrchestrationError::validation(
                "substitute_ids",
                "an account cannot substitute for itself",
            ));
        }
        let password_hash = self.hasher.hash(&request.password)?;

        Ok(PreparedAccount {
            new_account: NewAccount {
                id: id.into(),
                tenant_id,
                login: request.login.clone(),
                display_name: request.display_name.clone(),
                email: request.email.clone(),
                phone: request.phone.clone(),
                password_hash,
                auth_mode: auth_mode.as_str().to_string(),
                expires_at: request.expires_at,
            },
            auth_mode,
            group_names,
        })
    }

    // ── Update ──

    /// Update an account, synchronized into the directory keeper.
    ///
    /// The request carries the revision the caller read; a stale token
    /// surfaces as `ConcurrencyConflict` for the caller to retry with
    /// fresh data.
    pub async fn update(
        &self,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
        account_id: &str,
        request: &UpdateAccountRequest,
    ) -> Result<AccountProjection, OrchestrationError> {
        self.store_pipeline
            .execute(|| self.update_once(tenant_id, actor_id, account_id, request))
            .await
            .map_err(OrchestrationError::from_retry)
    }

    /// Update an account without directory synchronization (direct path).
    pub async fn update_direct(
        &self,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
        account_id: &str,
        request: &UpdateAccountRequest,
    ) -> Result<AccountProjection, OrchestrationError> {
        self.store_pipeline
            .execute(|| self.update_direct_once(tenant_id, actor_id, account_id, request))
            .await
            .map_err(OrchestrationError::from_retry)
    }

    /// Load the current row, merge and re-validate the request into it.
    /// The returned flag reports whether the credential was rotated.
    async fn prepare_update(
        &self,
        tenant_id: Uuid,
        account_id: &str,
        request: &UpdateAccountRequest,
    ) -> Result<(Account, AuthMode, bool), OrchestrationError> {
        let mut account = self
            .accounts
            .find_by_id(&self.pool, tenant_id, account_id)
            .await?
            .ok_or_else(|| OrchestrationError::NotFound {
                kind: "account",
                key: "id",
                value: account_id.to_string(),
            })?;

        let stored_mode = parse_stored_mode(&account)?;
        let policy = TenantAuthPolicy::get_or_default(&self.pool, tenant_id).await?;
        let auth_mode = resolve_auth_mode(&policy, request.auth_mode.or(Some(stored_mode)))?;

        if let Some(name) = &request.display_name {
            validate_display_name(name)?;
        }
        let effective_email = request.email.as_deref().or(account.email.as_deref());
        validate_mode_email(auth_mode, effective_email)?;

        let rotated = match &request.password {
            Some(password) => {
                validate_password(password)?;
                account.password_hash = self.hasher.hash(password)?;
                true
            }
            None => false,
        };

        if let Some(name) = &request.display_name {
            account.display_name = name.clone();
        }
        if let Some(email) = &request.email {
            account.email = Some(email.clone());
        }
        if let Some(phone) = &request.phone {
            account.phone = Some(phone.clone());
        }
        if let Some(active) = request.is_active {
            account.is_active = active;
        }
        if let Some(expires) = request.expires_at {
            account.expires_at = Some(expires);
        }
        account.auth_mode = auth_mode.as_str().to_string();
        account.updated_at = Utc::now();

        Ok((account, auth_mode, rotated))
    }

    async fn update_once(
        &self,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
        account_id: &str,
        request: &UpdateAccountRequest,
    ) -> Result<AccountProjection, OrchestrationError> {
        let (mut account, auth_mode, rotated) =
            self.prepare_update(tenant_id, account_id, request).await?;

        let mut coordinator = TransactionCoordinator::new(self.pool.clone());
        coordinator.begin().await?;

        // The ledger holds every hash the account has carried; appending
        // the new one before the persist keeps the previous hash recorded
        // ahead of the rotation.
        if rotated {
            CredentialHistoryEntry::append(
                coordinator.executor()?,
                &account.id,
                &account.password_hash,
            )
            .await?;
        }
        Account::persist(coordinator.executor()?, &account, request.revision).await?;

        let (groups, substitutes) =
            projection::load_account_collections(&self.pool, &account.id).await?;
        account.revision = request.revision + 1;
        let projection =
            projection::account_projection(&account, auth_mode, groups, substitutes);

        let outcome = self.upsert_directory_entry(&account, &projection).await;
        let state = coordinator.define(outcome.accepted()).await?;
        if state != TxState::Committed {
            return Err(sync_failure(&outcome, &account.login));
        }

        info!(
            account_id = %account.id,
            tenant_id = %tenant_id,
            revision = account.revision,
            "Account updated"
        );

        let event = IdentityEvent::AccountUpserted(AccountUpserted {
            projection: projection.clone(),
            auth_mode,
            credential_hash: account.password_hash.clone(),
            directory_sync_hash: outcome.generated_code,
        });
        publish_after_commit(
            &self.publish_pipeline,
            self.events.as_ref(),
            event,
            tenant_id,
            actor_id,
        )
        .await;

        Ok(projection)
    }

    async fn update_direct_once(
        &self,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
        account_id: &str,
        request: &UpdateAccountRequest,
    ) -> Result<AccountProjection, OrchestrationError> {
        let (mut account, auth_mode, rotated) =
            self.prepare_update(tenant_id, account_id, request).await?;

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        if rotated {
            CredentialHistoryEntry::append(&mut *tx, &account.id, &account.password_hash).await?;
        }
        Account::persist(&mut *tx, &account, request.revision).await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(
            account_id = %account.id,
            tenant_id = %tenant_id,
            "Account updated via direct path"
        );

        let (groups, substitutes) =
            projection::load_account_collections(&self.pool, &account.id).await?;
        account.revision = request.revision + 1;
        let projection =
            projection::account_projection(&account, auth_mode, groups, substitutes);
        let event = IdentityEvent::AccountUpserted(AccountUpserted {
            projection: projection.clone(),
            auth_mode,
            credential_hash: account.password_hash.clone(),
            directory_sync_hash: None,
        });
        publish_after_commit(
            &self.publish_pipeline,
            self.events.as_ref(),
            event,
            tenant_id,
            actor_id,
        )
        .await;

        Ok(projection)
    }

    // ── Delete ──

    /// Delete an account and its directory entry.
    pub async fn delete(
        &self,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
        account_id: &str,
    ) -> Result<(), OrchestrationError> {
        self.store_pipeline
            .execute(|| self.delete_once(tenant_id, actor_id, account_id))
            .await
            .map_err(OrchestrationError::from_retry)
    }

    async fn delete_once(
        &self,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
        account_id: &str,
    ) -> Result<(), OrchestrationError> {
        // Absent accounts fail here, before any directory call.
        let account = self
            .accounts
            .find_by_id(&self.pool, tenant_id, account_id)
            .await?
            .ok_or_else(|| OrchestrationError::NotFound {
                kind: "account",
                key: "id",
                value: account_id.to_string(),
            })?;

        let mut coordinator = TransactionCoordinator::new(self.pool.clone());
        coordinator.begin().await?;

        GroupMembership::remove_all_for_account(coordinator.executor()?, &account.id).await?;
        SubstitutionLink::remove_all_referencing(coordinator.executor()?, &account.id).await?;
        CredentialHistoryEntry::remove_all_for(coordinator.executor()?, &account.id).await?;
        self.accounts.remove(coordinator.executor()?, &account.id).await?;

        let outcome = self.directory.sync_remove(&account.login).await;
        let state = coordinator.define(outcome.accepted()).await?;
        if state != TxState::Committed {
            return Err(sync_failure(&outcome, &account.login));
        }

        info!(
            account_id = %account.id,
            tenant_id = %tenant_id,
            "Account deleted"
        );

        let event = IdentityEvent::AccountDeleted(AccountDeleted {
            account_id: account.id.clone(),
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

    // ── Associate / dissociate ──

    /// Add the account to a group.
    ///
    /// Memberships have no directory counterpart: the relationship is
    /// mutated directly and the updated projection published. Adding an
    /// existing member is a no-op that returns the current state.
    pub async fn add_to_group(
        &self,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
        account_id: &str,
        group_id: &str,
    ) -> Result<AccountProjection, OrchestrationError> {
        self.store_pipeline
            .execute(|| self.add_to_group_once(tenant_id, actor_id, account_id, group_id))
            .await
            .map_err(OrchestrationError::from_retry)
    }

    /// Remove the account from a group.
    pub async fn remove_from_group(
        &self,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
        account_id: &str,
        group_id: &str,
    ) -> Result<AccountProjection, OrchestrationError> {
        self.store_pipeline
            .execute(|| self.remove_from_group_once(tenant_id, actor_id, account_id, group_id))
            .await
            .map_err(OrchestrationError::from_retry)
    }

    async fn add_to_group_once(
        &self,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
        account_id: &str,
        group_id: &str,
    ) -> Result<AccountProjection, OrchestrationError> {
        let (mut account, stored_mode) = self.load_account(tenant_id, account_id).await?;
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

        let added =
            GroupMembership::add_member(coordinator.executor()?, tenant_id, &group.id, &account.id)
                .await?;
        if !added {
            coordinator.define(false).await?;
            return self.assemble_projection(&account, stored_mode).await;
        }

        let now = Utc::now();
        Account::touch(coordinator.executor()?, &account.id, account.revision, now).await?;
        coordinator.define(true).await?;

        account.updated_at = now;
        account.revision += 1;

        info!(
            account_id = %account.id,
            group_id = %group.id,
            tenant_id = %tenant_id,
            "Account associated with group"
        );

        let projection = self.assemble_projection(&account, stored_mode).await?;
        let event = IdentityEvent::AccountUpserted(AccountUpserted {
            projection: projection.clone(),
            auth_mode: stored_mode,
            credential_hash: account.password_hash.clone(),
            directory_sync_hash: None,
        });
        publish_after_commit(
            &self.publish_pipeline,
            self.events.as_ref(),
            event,
            tenant_id,
            actor_id,
        )
        .await;

        Ok(projection)
    }

    async fn remove_from_group_once(
        &self,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
        account_id: &str,
        group_id: &str,
    ) -> Result<AccountProjection, OrchestrationError> {
        let (mut account, stored_mode) = self.load_account(tenant_id, account_id).await?;
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

        let removed =
            GroupMembership::remove_member(coordinator.executor()?, &group.id, &account.id)
                .await?;
        if !removed {
            coordinator.define(false).await?;
            return Err(OrchestrationError::NotFound {
                kind: "group membership",
                key: "group_id",
                value: group_id.to_string(),
            });
        }

        let now = Utc::now();
        Account::touch(coordinator.executor()?, &account.id, account.revision, now).await?;
        coordinator.define(true).await?;

        account.updated_at = now;
        account.revision += 1;

        info!(
            account_id = %account.id,
            group_id = %group.id,
            tenant_id = %tenant_id,
            "Account dissociated from group"
        );

        let projection = self.assemble_projection(&account, stored_mode).await?;
        let event = IdentityEvent::AccountUpserted(AccountUpserted {
            projection: projection.clone(),
            auth_mode: stored_mode,
            credential_hash: account.password_hash.clone(),
            directory_sync_hash: None,
        });
        publish_after_commit(
            &self.publish_pipeline,
            self.events.as_ref(),
            event,
            tenant_id,
            actor_id,
        )
        .await;

        Ok(projection)
    }

    /// Name another account as this account's substitute.
    pub async fn add_substitute(
        &self,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
        account_id: &str,
        substitute_id: &str,
    ) -> Result<AccountProjection, OrchestrationError> {
        self.store_pipeline
            .execute(|| self.add_substitute_once(tenant_id, actor_id, account_id, substitute_id))
            .await
            .map_err(OrchestrationError::from_retry)
    }

    async fn add_substitute_once(
        &self,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
        account_id: &str,
        substitute_id: &str,
    ) -> Result<AccountProjection, OrchestrationError> {
        if account_id == substitute_id {
            return Err(OrchestrationError::validation(
                "substitute_id",
                "an account cannot substitute for itself",
            ));
        }
        let (mut account, stored_mode) = self.load_account(tenant_id, account_id).await?;
        if !self
            .accounts
            .exists(&self.pool, tenant_id, substitute_id)
            .await?
        {
            return Err(OrchestrationError::NotFound {
                kind: "account",
                key: "id",
                value: substitute_id.to_string(),
            });
        }

        let mut coordinator = TransactionCoordinator::new(self.pool.clone());
        coordinator.begin().await?;

        let added =
            SubstitutionLink::add(coordinator.executor()?, &account.id, substitute_id).await?;
        if !added {
            coordinator.define(false).await?;
            return self.assemble_projection(&account, stored_mode).await;
        }

        let now = Utc::now();
        Account::touch(coordinator.executor()?, &account.id, account.revision, now).await?;
        coordinator.define(true).await?;

        account.updated_at = now;
        account.revision += 1;

        info!(
            account_id = %account.id,
            substitute_id = %substitute_id,
            tenant_id = %tenant_id,
            "Substitute added"
        );

        let projection = self.assemble_projection(&account, stored_mode).await?;
        let event = IdentityEvent::AccountUpserted(AccountUpserted {
            projection: projection.clone(),
            auth_mode: stored_mode,
            credential_hash: account.password_hash.clone(),
            directory_sync_hash: None,
        });
        publish_after_commit(
            &self.publish_pipeline,
            self.events.as_ref(),
            event,
            tenant_id,
            actor_id,
        )
        .await;

        Ok(projection)
    }

    /// Remove a substitute relationship.
    pub async fn remove_substitute(
        &self,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
        account_id: &str,
        substitute_id: &str,
    ) -> Result<AccountProjection, OrchestrationError> {
        self.store_pipeline
            .execute(|| {
                self.remove_substitute_once(tenant_id, actor_id, account_id, substitute_id)
            })
            .await
            .map_err(OrchestrationError::from_retry)
    }

    async fn remove_substitute_once(
        &self,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
        account_id: &str,
        substitute_id: &str,
    ) -> Result<AccountProjection, OrchestrationError> {
        let (mut account, stored_mode) = self.load_account(tenant_id, account_id).await?;

        let mut coordinator = TransactionCoordinator::new(self.pool.clone());
        coordinator.begin().await?;

        let removed =
            SubstitutionLink::remove(coordinator.executor()?, &account.id, substitute_id).await?;
        if !removed {
            coordinator.define(false).await?;
            return Err(OrchestrationError::NotFound {
                kind: "substitution link",
                key: "substitute_id",
                value: substitute_id.to_string(),
            });
        }

        let now = Utc::now();
        Account::touch(coordinator.executor()?, &account.id, account.revision, now).await?;
        coordinator.define(true).await?;

        account.updated_at = now;
        account.revision += 1;

        info!(
            account_id = %account.id,
            substitute_id = %substitute_id,
            tenant_id = %tenant_id,
            "Substitute removed"
        );

        let projection = self.assemble_projection(&account, stored_mode).await?;
        let event = IdentityEvent::AccountUpserted(AccountUpserted {
            projection: projection.clone(),
            auth_mode: stored_mode,
            credential_hash: account.password_hash.clone(),
            directory_sync_hash: None,
        });
        publish_after_commit(
            &self.publish_pipeline,
            self.events.as_ref(),
            event,
            tenant_id,
            actor_id,
        )
        .await;

        Ok(projection)
    }

    // ── Reads ──

    /// Fetch an account projection together with its credential hash.
    pub async fn get_with_password(
        &self,
        tenant_id: Uuid,
        account_id: &str,
    ) -> Result<(AccountProjection, String), OrchestrationError> {
        let (account, stored_mode) = self.load_account(tenant_id, account_id).await?;
        let projection = self.assemble_projection(&account, stored_mode).await?;
        Ok((projection, account.password_hash))
    }

    /// Blocking variant of [`get_with_password`](Self::get_with_password).
    ///
    /// Legacy-compatibility shim for one synchronous caller; it blocks the
    /// calling thread on the async path and must not be copied to new call
    /// sites. Requires the multi-threaded runtime.
    pub fn get_with_password_blocking(
        &self,
        tenant_id: Uuid,
        account_id: &str,
    ) -> Result<(AccountProjection, String), OrchestrationError> {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current()
                .block_on(self.get_with_password(tenant_id, account_id))
        })
    }

    // ── Internals ──

    async fn load_account(
        &self,
        tenant_id: Uuid,
        account_id: &str,
    ) -> Result<(Account, AuthMode), OrchestrationError> {
        let account = self
            .accounts
            .find_by_id(&self.pool, tenant_id, account_id)
            .await?
            .ok_or_else(|| OrchestrationError::NotFound {
                kind: "account",
                key: "id",
                value: account_id.to_string(),
            })?;
        let mode = parse_stored_mode(&account)?;
        Ok((account, mode))
    }

    async fn assemble_projection(
        &self,
        account: &Account,
        auth_mode: AuthMode,
    ) -> Result<AccountProjection, OrchestrationError> {
        let (groups, substitutes) =
            projection::load_account_collections(&self.pool, &account.id).await?;
        Ok(projection::account_projection(
            account, auth_mode, groups, substitutes,
        ))
    }

    async fn upsert_directory_entry(
        &self,
        account: &Account,
        projection: &AccountProjection,
    ) -> SyncOutcome {
        match projection::account_record(projection) {
            Ok(content) => {
                self.directory
                    .sync_upsert(
                        EntityKind::Account,
                        &account.login,
                        &account.display_name,
                        account.expires_at,
                        content,
                    )
                    .await
            }
            Err(e) => SyncOutcome::failure(e.to_string()),
        }
    }
}

fn parse_stored_mode(account: &Account) -> Result<AuthMode, OrchestrationError> {
    AuthMode::parse(&account.auth_mode).ok_or_else(|| OrchestrationError::Internal {
        message: format!(
            "account '{}' carries unknown auth mode tag '{}'",
            account.id, account.auth_mode
        ),
    })
}
