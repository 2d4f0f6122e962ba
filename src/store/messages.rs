use kameo::Reply;

use super::records::{
    Game, MetricQuery, MetricSample, OptimizationRecord, ResetToken, User, UserGame,
};

/// Request/response messages for StoreActor (Ask messages)
#[derive(Debug, Clone)]
pub enum StoreAsk {
    GetUser {
        user_id: String,
    },
    GetUserByEmail {
        email: String,
    },
    /// Insert or replace a user; rejects an email owned by another user
    PutUser {
        user: User,
    },
    GetGame {
        game_id: String,
    },
    ListGames {
        limit: usize,
    },
    PutGame {
        game: Game,
    },
    GetUserGames {
        user_id: String,
    },
    PutUserGame {
        relation: UserGame,
    },
    /// Append an optimization record to a user's game history
    AppendOptimization {
        user_id: String,
        game_id: String,
        record: OptimizationRecord,
    },
    StoreMetric {
        sample: MetricSample,
    },
    /// Samples for a user within `[start, end]`, oldest first
    QueryMetrics {
        user_id: String,
        query: MetricQuery,
    },
    PutResetToken {
        token: ResetToken,
    },
    /// Consume a reset token
    TakeResetToken {
        token: String,
    },
    Ping,
}

/// Fire-and-forget messages for StoreActor (Tell messages)
#[derive(Debug, Clone)]
pub enum StoreTell {
    /// Record a metric sample without waiting for the write
    StoreMetricAsync {
        sample: MetricSample,
    },
}

#[derive(Debug, Clone, Reply)]
pub enum StoreReply {
    User(Option<User>),
    Game(Option<Game>),
    Games(Vec<Game>),
    UserGames(Vec<UserGame>),
    Metrics(Vec<MetricSample>),
    ResetToken(Option<ResetToken>),
    Pong {
        game_count: u64,
    },
    /// Operation completed successfully
    Success,
    /// Unique constraint violated
    Duplicate(String),
    /// Error response
    ErrorResponse(String),
}
