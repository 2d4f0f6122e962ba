use std::path::Path;

use kameo::actor::{ActorRef, WeakActorRef};
use kameo::error::{ActorStopReason, BoxError};
use kameo::message::{Context, Message};
use kameo::{Actor, mailbox::unbounded::UnboundedMailbox};
use tracing::{debug, error, info};

use super::errors::StoreError;
use crate::common::lmdb_config::get_lmdb_config;
use super::messages::{StoreAsk, StoreReply, StoreTell};
use super::storage::LmdbStore;

/// Owns the record store; every read and write is serialized through its mailbox
pub struct StoreActor {
    store: LmdbStore,
}

impl StoreActor {
    pub fn new(base_path: &Path, map_size: Option<usize>) -> Result<Self, StoreError> {
        if !base_path.exists() {
            info!("📁 Creating record store directory at: {}", base_path.display());
        }

        let store = LmdbStore::open(base_path, map_size)?;
        let (default_map_size, max_dbs, max_readers) = get_lmdb_config();
        info!(
            map_size = map_size.unwrap_or(default_map_size),
            max_dbs,
            max_readers,
            "🎭 StoreActor initialized with base path: {}",
            base_path.display()
        );

        Ok(Self { store })
    }

    fn reply_error(context: &str, e: StoreError) -> StoreReply {
        match e {
            StoreError::Duplicate(msg) => StoreReply::Duplicate(msg),
            other => {
                error!("❌ {}: {}", context, other);
                StoreReply::ErrorResponse(format!("{}: {}", context, other))
            }
        }
    }

    fn handle_ask(&mut self, message: StoreAsk) -> StoreReply {
        let result = match message {
            StoreAsk::GetUser { user_id } => self
                .store
                .get_user(&user_id)
                .map(StoreReply::User)
                .map_err(|e| ("Failed to load user", e)),
            StoreAsk::GetUserByEmail { email } => self
                .store
                .get_user_by_email(&email)
                .map(StoreReply::User)
                .map_err(|e| ("Failed to look up user by email", e)),
            StoreAsk::PutUser { user } => self
                .store
                .put_user(&user)
                .map(|_| StoreReply::Success)
                .map_err(|e| ("Failed to store user", e)),
            StoreAsk::GetGame { game_id } => self
                .store
                .get_game(&game_id)
                .map(StoreReply::Game)
                .map_err(|e| ("Failed to load game", e)),
            StoreAsk::ListGames { limit } => self
                .store
                .list_games(limit)
                .map(StoreReply::Games)
                .map_err(|e| ("Failed to list games", e)),
            StoreAsk::PutGame { game } => self
                .store
                .put_game(&game)
                .map(|_| StoreReply::Success)
                .map_err(|e| ("Failed to store game", e)),
            StoreAsk::GetUserGames { user_id } => self
                .store
                .get_user_games(&user_id)
                .map(StoreReply::UserGames)
                .map_err(|e| ("Failed to load user games", e)),
            StoreAsk::PutUserGame { relation } => self
                .store
                .put_user_game(&relation)
                .map(|_| StoreReply::Success)
                .map_err(|e| ("Failed to store user game", e)),
            StoreAsk::AppendOptimization { user_id, game_id, record } => {
                debug!("📝 Appending optimization {} for {}:{}", record.optimization_id, user_id, game_id);
                self.store
                    .append_optimization(&user_id, &game_id, record)
                    .map(|_| StoreReply::Success)
                    .map_err(|e| ("Failed to append optimization", e))
            }
            StoreAsk::StoreMetric { sample } => self
                .store
                .store_metric(&sample)
                .map(|_| StoreReply::Success)
                .map_err(|e| ("Failed to store metric", e)),
            StoreAsk::QueryMetrics { user_id, query } => self
                .store
                .query_metrics(&user_id, &query)
                .map(StoreReply::Metrics)
                .map_err(|e| ("Failed to query metrics", e)),
            StoreAsk::PutResetToken { token } => self
                .store
                .put_reset_token(&token)
                .map(|_| StoreReply::Success)
                .map_err(|e| ("Failed to store reset token", e)),
            StoreAsk::TakeResetToken { token } => self
                .store
                .take_reset_token(&token)
                .map(StoreReply::ResetToken)
                .map_err(|e| ("Failed to consume reset token", e)),
            StoreAsk::Ping => self
                .store
                .ping()
                .map(|game_count| StoreReply::Pong { game_count })
                .map_err(|e| ("Store ping failed", e)),
        };

        result.unwrap_or_else(|(context, e)| Self::reply_error(context, e))
    }
}

impl Actor for StoreActor {
    type Mailbox = UnboundedMailbox<Self>;

    async fn on_start(&mut self, _actor_ref: ActorRef<Self>) -> Result<(), BoxError> {
        info!("🎭 StoreActor started ({})", self.store.base_path().display());
        Ok(())
    }

    async fn on_stop(&mut self, _actor_ref: WeakActorRef<Self>, _reason: ActorStopReason) -> Result<(), BoxError> {
        info!("🎭 StoreActor stopped");
        Ok(())
    }
}

impl Message<StoreAsk> for StoreActor {
    type Reply = StoreReply;

    async fn handle(
        &mut self,
        message: StoreAsk,
        _ctx: Context<'_, Self, Self::Reply>,
    ) -> Self::Reply {
        self.handle_ask(message)
    }
}

impl Message<StoreTell> for StoreActor {
    type Reply = ();

    async fn handle(
        &mut self,
        message: StoreTell,
        _ctx: Context<'_, Self, Self::Reply>,
    ) -> Self::Reply {
        match message {
            StoreTell::StoreMetricAsync { sample } => {
                if let Err(e) = self.store.store_metric(&sample) {
                    error!("❌ Async metric write failed for {}: {}", sample.user_id, e);
                }
            }
        }
    }
}
