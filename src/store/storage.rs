use std::ops::Bound;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use heed::types::{SerdeJson, Str};
use heed::{Database, Env};
use tracing::{debug, info};

use crate::common::constants::*;
use crate::common::lmdb_config::open_lmdb_environment;
use super::errors::StoreError;
use super::records::{Game, MetricQuery, MetricSample, OptimizationRecord, ResetToken, User, UserGame};

/// Key of a user-game relation: `<user_id>:<game_id>`
fn user_game_key(user_id: &str, game_id: &str) -> String {
    format!("{}:{}", user_id, game_id)
}

/// Key of a metric sample: `<user_id>:<timestamp_ms zero-padded>:<sample id>`.
/// Zero padding keeps lexicographic order equal to time order inside a user prefix.
fn metric_key(user_id: &str, timestamp: DateTime<Utc>, id: &str) -> String {
    format!("{}:{:015}:{}", user_id, timestamp.timestamp_millis().max(0), id)
}

fn metric_bound(user_id: &str, timestamp: DateTime<Utc>) -> String {
    format!("{}:{:015}", user_id, timestamp.timestamp_millis().max(0))
}

/// LMDB-backed record tables
pub struct LmdbStore {
    env: Env,
    users: Database<Str, SerdeJson<User>>,
    user_emails: Database<Str, Str>,
    games: Database<Str, SerdeJson<Game>>,
    user_games: Database<Str, SerdeJson<UserGame>>,
    metrics: Database<Str, SerdeJson<MetricSample>>,
    reset_tokens: Database<Str, SerdeJson<ResetToken>>,
    base_path: PathBuf,
}

impl LmdbStore {
    /// Open (or create) the record environment and all tables
    pub fn open(base_path: &Path, map_size: Option<usize>) -> Result<Self, StoreError> {
        let env = open_lmdb_environment(base_path, map_size)?;

        let mut wtxn = env.write_txn()?;
        let users = env.create_database(&mut wtxn, Some(USERS_DB_NAME))?;
        let user_emails = env.create_database(&mut wtxn, Some(USER_EMAILS_DB_NAME))?;
        let games = env.create_database(&mut wtxn, Some(GAMES_DB_NAME))?;
        let user_games = env.create_database(&mut wtxn, Some(USER_GAMES_DB_NAME))?;
        let metrics = env.create_database(&mut wtxn, Some(METRICS_DB_NAME))?;
        let reset_tokens = env.create_database(&mut wtxn, Some(RESET_TOKENS_DB_NAME))?;
        wtxn.commit()?;

        info!("✅ Opened record store at {}", base_path.display());

        Ok(Self {
            env,
            users,
            user_emails,
            games,
            user_games,
            metrics,
            reset_tokens,
            base_path: base_path.to_path_buf(),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    // Users

    pub fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        let rtxn = self.env.read_txn()?;
        Ok(self.users.get(&rtxn, id)?)
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let rtxn = self.env.read_txn()?;
        let normalized = email.to_lowercase();
        match self.user_emails.get(&rtxn, &normalized)? {
            Some(user_id) => Ok(self.users.get(&rtxn, user_id)?),
            None => Ok(None),
        }
    }

    /// Insert or replace a user, keeping the email index in step.
    /// Fails with `Duplicate` when the email belongs to another user.
    pub fn put_user(&self, user: &User) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn()?;
        let normalized = user.email.to_lowercase();

        if let Some(owner) = self.user_emails.get(&wtxn, &normalized)? {
            if owner != user.id {
                return Err(StoreError::Duplicate(format!("email {} already registered", user.email)));
            }
        }

        if let Some(previous) = self.users.get(&wtxn, &user.id)? {
            let previous_email = previous.email.to_lowercase();
            if previous_email != normalized {
                self.user_emails.delete(&mut wtxn, &previous_email)?;
            }
        }

        self.users.put(&mut wtxn, &user.id, user)?;
        self.user_emails.put(&mut wtxn, &normalized, &user.id)?;
        wtxn.commit()?;

        debug!("💾 Stored user {}", user.id);
        Ok(())
    }

    // Games

    pub fn get_game(&self, id: &str) -> Result<Option<Game>, StoreError> {
        let rtxn = self.env.read_txn()?;
        Ok(self.games.get(&rtxn, id)?)
    }

    pub fn list_games(&self, limit: usize) -> Result<Vec<Game>, StoreError> {
        let rtxn = self.env.read_txn()?;
        let mut games = Vec::new();
        for result in self.games.iter(&rtxn)?.take(limit) {
            let (_id, game) = result?;
            games.push(game);
        }
        Ok(games)
    }

    pub fn put_game(&self, game: &Game) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn()?;
        self.games.put(&mut wtxn, &game.id, game)?;
        wtxn.commit()?;
        debug!("💾 Stored game {}", game.id);
        Ok(())
    }

    // User-game relations

    pub fn get_user_games(&self, user_id: &str) -> Result<Vec<UserGame>, StoreError> {
        let rtxn = self.env.read_txn()?;
        let prefix = format!("{}:", user_id);
        let mut relations = Vec::new();
        for result in self.user_games.prefix_iter(&rtxn, &prefix)? {
            let (_key, relation) = result?;
            relations.push(relation);
        }
        Ok(relations)
    }

    pub fn put_user_game(&self, relation: &UserGame) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn()?;
        let key = user_game_key(&relation.user_id, &relation.game_id);
        self.user_games.put(&mut wtxn, &key, relation)?;
        wtxn.commit()?;
        Ok(())
    }

    /// Append an optimization to the user-game relation, creating the relation when absent
    pub fn append_optimization(
        &self,
        user_id: &str,
        game_id: &str,
        record: OptimizationRecord,
    ) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn()?;
        let key = user_game_key(user_id, game_id);
        let mut relation = self
            .user_games
            .get(&wtxn, &key)?
            .unwrap_or_else(|| UserGame::new(user_id, game_id));

        relation.timestamp = record.timestamp;
        relation.optimizations.push(record);
        self.user_games.put(&mut wtxn, &key, &relation)?;
        wtxn.commit()?;
        Ok(())
    }

    // Metrics

    pub fn store_metric(&self, sample: &MetricSample) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn()?;
        let key = metric_key(&sample.user_id, sample.timestamp, &sample.id);
        self.metrics.put(&mut wtxn, &key, sample)?;
        wtxn.commit()?;
        Ok(())
    }

    /// Samples of one user inside `[start, end]`, oldest first, optionally filtered by type
    /// Scan a user's samples backwards from `query.end` so the limit keeps the newest matches
    pub fn query_metrics(&self, user_id: &str, query: &MetricQuery) -> Result<Vec<MetricSample>, StoreError> {
        if query.end < query.start || query.limit == 0 {
            return Ok(Vec::new());
        }

        let rtxn = self.env.read_txn()?;
        let start_key = metric_bound(user_id, query.start);
        // ';' sorts right after ':' so every id suffix of the end millisecond is included
        let end_key = format!("{};", metric_bound(user_id, query.end));

        let mut samples = Vec::new();
        let range = (Bound::Included(start_key.as_str()), Bound::Excluded(end_key.as_str()));
        for result in self.metrics.rev_range(&rtxn, &range)? {
            let (_key, sample) = result?;
            if query.matches(&sample) {
                samples.push(sample);
                if samples.len() >= query.limit {
                    break;
                }
            }
        }
        Ok(samples)
    }

    // Password reset tokens

    pub fn put_reset_token(&self, token: &ResetToken) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn()?;
        self.reset_tokens.put(&mut wtxn, &token.token, token)?;
        wtxn.commit()?;
        Ok(())
    }

    /// Remove and return a reset token; tokens are single use
    pub fn take_reset_token(&self, token: &str) -> Result<Option<ResetToken>, StoreError> {
        let mut wtxn = self.env.write_txn()?;
        let existing = self.reset_tokens.get(&wtxn, token)?;
        if existing.is_some() {
            self.reset_tokens.delete(&mut wtxn, token)?;
        }
        wtxn.commit()?;
        Ok(existing)
    }

    /// Cheap read used by health checks
    pub fn ping(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn()?;
        Ok(self.games.len(&rtxn)?)
    }
}
