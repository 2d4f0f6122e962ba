//! Typed helpers over `ActorRef<StoreActor>` used by the HTTP handlers.

use kameo::actor::ActorRef;
use kameo::request::MessageSend;
use tracing::warn;

use super::actor::StoreActor;
use super::errors::StoreError;
use super::messages::{StoreAsk, StoreReply, StoreTell};
use super::records::{Game, MetricQuery, MetricSample, OptimizationRecord, ResetToken, User, UserGame};

#[derive(Clone)]
pub struct StoreClient {
    actor: ActorRef<StoreActor>,
}

impl StoreClient {
    pub fn new(actor: ActorRef<StoreActor>) -> Self {
        Self { actor }
    }

    pub fn actor(&self) -> &ActorRef<StoreActor> {
        &self.actor
    }

    async fn ask(&self, message: StoreAsk) -> Result<StoreReply, StoreError> {
        match self.actor.ask(message).send().await {
            Ok(StoreReply::ErrorResponse(msg)) => Err(StoreError::Unavailable(msg)),
            Ok(StoreReply::Duplicate(msg)) => Err(StoreError::Duplicate(msg)),
            Ok(reply) => Ok(reply),
            Err(e) => Err(StoreError::Unavailable(format!("StoreActor communication failed: {}", e))),
        }
    }

    fn unexpected(reply: StoreReply) -> StoreError {
        StoreError::UnexpectedResponse(format!("{:?}", reply))
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        match self.ask(StoreAsk::GetUser { user_id: user_id.to_string() }).await? {
            StoreReply::User(user) => Ok(user),
            other => Err(Self::unexpected(other)),
        }
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        match self.ask(StoreAsk::GetUserByEmail { email: email.to_string() }).await? {
            StoreReply::User(user) => Ok(user),
            other => Err(Self::unexpected(other)),
        }
    }

    pub async fn put_user(&self, user: User) -> Result<(), StoreError> {
        self.expect_success(StoreAsk::PutUser { user }).await
    }

    pub async fn get_game(&self, game_id: &str) -> Result<Option<Game>, StoreError> {
        match self.ask(StoreAsk::GetGame { game_id: game_id.to_string() }).await? {
            StoreReply::Game(game) => Ok(game),
            other => Err(Self::unexpected(other)),
        }
    }

    pub async fn list_games(&self, limit: usize) -> Result<Vec<Game>, StoreError> {
        match self.ask(StoreAsk::ListGames { limit }).await? {
            StoreReply::Games(games) => Ok(games),
            other => Err(Self::unexpected(other)),
        }
    }

    pub async fn put_game(&self, game: Game) -> Result<(), StoreError> {
        self.expect_success(StoreAsk::PutGame { game }).await
    }

    pub async fn get_user_games(&self, user_id: &str) -> Result<Vec<UserGame>, StoreError> {
        match self.ask(StoreAsk::GetUserGames { user_id: user_id.to_string() }).await? {
            StoreReply::UserGames(relations) => Ok(relations),
            other => Err(Self::unexpected(other)),
        }
    }

    pub async fn put_user_game(&self, relation: UserGame) -> Result<(), StoreError> {
        self.expect_success(StoreAsk::PutUserGame { relation }).await
    }

    pub async fn append_optimization(
        &self,
        user_id: &str,
        game_id: &str,
        record: OptimizationRecord,
    ) -> Result<(), StoreError> {
        self.expect_success(StoreAsk::AppendOptimization {
            user_id: user_id.to_string(),
            game_id: game_id.to_string(),
            record,
        })
        .await
    }

    pub async fn store_metric(&self, sample: MetricSample) -> Result<(), StoreError> {
        self.expect_success(StoreAsk::StoreMetric { sample }).await
    }

    /// Queue a metric write; failures are logged by the actor
    pub async fn store_metric_detached(&self, sample: MetricSample) {
        if let Err(e) = self.actor.tell(StoreTell::StoreMetricAsync { sample }).send().await {
            warn!("⚠️ Failed to queue metric write: {}", e);
        }
    }

    /// Newest matching samples first
    pub async fn query_metrics(&self, user_id: &str, query: MetricQuery) -> Result<Vec<MetricSample>, StoreError> {
        let message = StoreAsk::QueryMetrics {
            user_id: user_id.to_string(),
            query,
        };
        match self.ask(message).await? {
            StoreReply::Metrics(samples) => Ok(samples),
            other => Err(Self::unexpected(other)),
        }
    }

    pub async fn put_reset_token(&self, token: ResetToken) -> Result<(), StoreError> {
        self.expect_success(StoreAsk::PutResetToken { token }).await
    }

    pub async fn take_reset_token(&self, token: &str) -> Result<Option<ResetToken>, StoreError> {
        match self.ask(StoreAsk::TakeResetToken { token: token.to_string() }).await? {
            StoreReply::ResetToken(token) => Ok(token),
            other => Err(Self::unexpected(other)),
        }
    }

    pub async fn ping(&self) -> Result<u64, StoreError> {
        match self.ask(StoreAsk::Ping).await? {
            StoreReply::Pong { game_count } => Ok(game_count),
            other => Err(Self::unexpected(other)),
        }
    }

    async fn expect_success(&self, message: StoreAsk) -> Result<(), StoreError> {
        match self.ask(message).await? {
            StoreReply::Success => Ok(()),
            other => Err(Self::unexpected(other)),
        }
    }
}
