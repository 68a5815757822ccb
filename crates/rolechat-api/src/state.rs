//! Application state wiring all services together.
//!
//! AppState holds the service instances shared by the CLI and the REST API.
//! Services are generic over repository and agent-client traits; AppState
//! pins them to the boxed repositories and the Letta client.

use std::path::PathBuf;
use std::sync::Arc;

use rolechat_core::chat::ChatService;
use rolechat_core::repository::{BoxMessageRepository, BoxRoleRepository};
use rolechat_core::service::RoleService;
use rolechat_infra::letta::LettaAgentClient;
use rolechat_infra::memory::InMemoryStore;
use rolechat_infra::sqlite::pool::database_url;
use rolechat_infra::sqlite::{DatabasePool, SqliteMessageRepository, SqliteRoleRepository};
use rolechat_types::config::{AppConfig, StorageBackend};

pub type ConcreteRoleService = RoleService<BoxRoleRepository, LettaAgentClient>;

pub type ConcreteChatService =
    ChatService<BoxRoleRepository, BoxMessageRepository, LettaAgentClient>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub role_service: Arc<ConcreteRoleService>,
    pub chat_service: Arc<ConcreteChatService>,
    pub config: Arc<AppConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Open the configured storage backend and build the upstream client.
    pub async fn init(config: AppConfig, data_dir: PathBuf) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir).await?;

        let (roles, messages) = match config.storage.backend {
            StorageBackend::Sqlite => {
                let url = database_url(&config.database, &data_dir);
                let pool = DatabasePool::new(&url, config.database.max_connections).await?;
                tracing::info!(db = %url, "sqlite storage ready");
                (
                    BoxRoleRepository::new(SqliteRoleRepository::new(pool.clone())),
                    BoxMessageRepository::new(SqliteMessageRepository::new(pool)),
                )
            }
            StorageBackend::Memory => {
                tracing::warn!("using in-memory storage, data is lost on exit");
                let store = InMemoryStore::new();
                (
                    BoxRoleRepository::new(store.clone()),
                    BoxMessageRepository::new(store),
                )
            }
        };

        let agent = LettaAgentClient::new(&config.upstream)?;
        tracing::debug!(base_url = agent.base_url(), "upstream client ready");

        Ok(Self::from_parts(config, data_dir, roles, messages, agent))
    }

    /// Wire services over already-built parts.
    pub fn from_parts(
        config: AppConfig,
        data_dir: PathBuf,
        roles: BoxRoleRepository,
        messages: BoxMessageRepository,
        agent: LettaAgentClient,
    ) -> Self {
        let roles = Arc::new(roles);
        let agent = Arc::new(agent);

        let role_service = RoleService::new(
            Arc::clone(&roles),
            Arc::clone(&agent),
            config.sync.effective_batch_size(),
        );
        let chat_service = ChatService::new(
            roles,
            Arc::new(messages),
            agent,
            config.chat.serialize_turns,
        );

        Self {
            role_service: Arc::new(role_service),
            chat_service: Arc::new(chat_service),
            config: Arc::new(config),
            data_dir,
        }
    }
}
