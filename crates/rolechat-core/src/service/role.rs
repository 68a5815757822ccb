//! Role management service.
//!
//! Creating a role inserts a local record, creates the upstream agent with
//! the role's memory blocks, then binds the agent id back onto the record.
//! Sync reconciles the local store against the provider's agent list.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{error, info, warn};

use rolechat_types::agent::NewAgent;
use rolechat_types::config::MAX_SYNC_BATCH;
use rolechat_types::error::{RepositoryError, RoleError};
use rolechat_types::role::{CreateRoleRequest, Role, RoleId, SyncReport};

use crate::repository::RoleRepository;
use crate::upstream::AgentClient;

/// Service orchestrating the role lifecycle.
///
/// Generic over the repository and upstream client so rolechat-core never
/// depends on rolechat-infra.
pub struct RoleService<R: RoleRepository, A: AgentClient> {
    roles: Arc<R>,
    agent: Arc<A>,
    batch_size: usize,
}

impl<R: RoleRepository, A: AgentClient> RoleService<R, A> {
    /// `batch_size` bounds the ids per prune statement; clamped to `1..=500`.
    pub fn new(roles: Arc<R>, agent: Arc<A>, batch_size: usize) -> Self {
        Self {
            roles,
            agent,
            batch_size: batch_size.clamp(1, MAX_SYNC_BATCH),
        }
    }

    /// Create a role and its upstream agent.
    ///
    /// If the upstream agent cannot be created the local record is removed
    /// again, so a failed create leaves nothing behind. If a concurrent sync
    /// imported the new agent first, that imported role is returned and the
    /// local record is removed.
    pub async fn create_role(&self, request: CreateRoleRequest) -> Result<Role, RoleError> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(RoleError::InvalidName("name cannot be empty".to_string()));
        }

        let role = Role::new(name, request.persona, request.human);
        let role = self.roles.create(&role).await?;

        let spec = NewAgent {
            name: role.name.clone(),
            persona: role.persona.clone(),
            human: role.human.clone(),
        };
        let agent_id = match self.agent.create_agent(&spec).await {
            Ok(id) => id,
            Err(e) => {
                warn!(role_id = %role.id, error = %e, "upstream agent creation failed");
                self.discard(&role.id).await;
                return Err(RoleError::Upstream(e));
            }
        };

        match self.roles.bind_agent(&role.id, &agent_id).await {
            Ok(bound) => {
                info!(role_id = %bound.id, agent_id = %agent_id, "role created");
                Ok(bound)
            }
            Err(RepositoryError::Conflict(reason)) => {
                let imported = self.roles.get_by_agent_id(&agent_id).await;
                self.discard(&role.id).await;
                match imported {
                    Ok(Some(existing)) if existing.id != role.id => {
                        info!(
                            role_id = %existing.id,
                            agent_id = %agent_id,
                            "agent already imported by sync, using imported role"
                        );
                        Ok(existing)
                    }
                    _ => {
                        error!(
                            role_id = %role.id,
                            agent_id = %agent_id,
                            %reason,
                            "failed to bind agent"
                        );
                        Err(RoleError::AgentAlreadyBound)
                    }
                }
            }
            Err(e) => {
                error!(
                    role_id = %role.id,
                    agent_id = %agent_id,
                    error = %e,
                    "failed to bind agent"
                );
                self.discard(&role.id).await;
                Err(e.into())
            }
        }
    }

    async fn discard(&self, id: &RoleId) {
        if let Err(e) = self.roles.delete(id).await {
            error!(role_id = %id, error = %e, "failed to remove half-created role");
        }
    }

    /// All roles, newest first.
    pub async fn list_roles(&self) -> Result<Vec<Role>, RoleError> {
        Ok(self.roles.list().await?)
    }

    pub async fn get_role(&self, id: &RoleId) -> Result<Role, RoleError> {
        self.roles.get(id).await?.ok_or(RoleError::NotFound)
    }

    /// Reconcile local roles with the provider's current agents.
    ///
    /// 1. Fetch the authoritative agent list. On failure nothing is touched.
    /// 2. Update roles already bound to a listed agent, insert the rest.
    /// 3. With `prune`, delete bound roles whose agent is gone, in batches.
    pub async fn sync_from_upstream(&self, prune: bool) -> Result<SyncReport, RoleError> {
        let remote = self.agent.list_agents().await?;
        let remote_ids: HashSet<&str> = remote.iter().map(|a| a.id.as_str()).collect();

        let mut inserted = 0usize;
        for agent in &remote {
            let (persona, human) = (agent.persona(), agent.human());
            if self.roles.get_by_agent_id(&agent.id).await?.is_some() {
                self.roles
                    .update_profile(&agent.id, &agent.name, &persona, &human)
                    .await?;
            } else {
                let mut role = Role::new(agent.name.clone(), persona, human);
                role.agent_id = Some(agent.id.clone());
                self.roles.create(&role).await?;
                inserted += 1;
            }
        }

        let deleted_count = if prune {
            let stale: Vec<String> = self
                .roles
                .list_agent_ids()
                .await?
                .into_iter()
                .filter(|id| !remote_ids.contains(id.as_str()))
                .collect();

            let mut deleted = 0u64;
            for batch in stale.chunks(self.batch_size) {
                deleted += self.roles.delete_by_agent_ids(batch).await?;
            }
            Some(deleted)
        } else {
            None
        };

        info!(
            count = remote.len(),
            inserted,
            pruned = prune,
            deleted = deleted_count.unwrap_or(0),
            "sync from upstream complete"
        );

        Ok(SyncReport {
            success: true,
            count: remote.len(),
            pruned: Some(prune),
            deleted_count,
        })
    }
}
