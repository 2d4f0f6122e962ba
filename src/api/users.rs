use serde::{Deserialize, Serialize};
use tracing::info;
use warp::filters::BoxedFilter;
use warp::reply::Response;
use warp::{Filter, Rejection};

use super::auth::validate_email;
use super::filters::{json_body, json_reply, with_state, with_user};
use crate::engine::types::ValidationError;
use crate::engine::Validate;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{User, UserSettings};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl UserProfile {
    fn of(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            avatar_url: user.avatar_url.clone(),
            bio: user.bio.clone(),
        }
    }
}

impl Validate for UserProfile {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_email("email", &self.email)?;
        if self.username.trim().is_empty() {
            return Err(ValidationError::new("username", "Field must not be empty"));
        }
        Ok(())
    }
}

impl Validate for UserSettings {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

async fn get_profile(user: User) -> Result<Response, Rejection> {
    Ok(json_reply(&UserProfile::of(&user)))
}

async fn update_profile(user: User, profile: UserProfile, state: AppState) -> Result<Response, Rejection> {
    let mut updated = user;
    updated.username = profile.username.clone();
    updated.email = profile.email.clone();
    updated.avatar_url = profile.avatar_url.clone();
    updated.bio = profile.bio.clone();

    state.store.put_user(updated.clone()).await.map_err(ApiError::user_write)?;
    info!("👤 Updated profile for user {}", updated.id);
    Ok(json_reply(&profile))
}

async fn get_settings(user: User) -> Result<Response, Rejection> {
    Ok(json_reply(&user.settings))
}

async fn update_settings(user: User, settings: UserSettings, state: AppState) -> Result<Response, Rejection> {
    let mut updated = user;
    updated.settings = settings.clone();
    state.store.put_user(updated.clone()).await.map_err(ApiError::from)?;
    info!("⚙️ Updated settings for user {}", updated.id);
    Ok(json_reply(&settings))
}

pub fn routes(state: AppState) -> BoxedFilter<(Response,)> {
    let profile = warp::path!("api" / "user" / "profile");
    let settings = warp::path!("api" / "user" / "settings");

    let get_profile_route = profile
        .clone()
        .and(warp::get())
        .and(with_user(state.clone()))
        .and_then(get_profile);

    let put_profile_route = profile
        .and(warp::put())
        .and(with_user(state.clone()))
        .and(json_body::<UserProfile>())
        .and(with_state(state.clone()))
        .and_then(update_profile);

    let get_settings_route = settings
        .clone()
        .and(warp::get())
        .and(with_user(state.clone()))
        .and_then(get_settings);

    let put_settings_route = settings
        .and(warp::put())
        .and(with_user(state.clone()))
        .and(json_body::<UserSettings>())
        .and(with_state(state))
        .and_then(update_settings);

    get_profile_route
        .or(put_profile_route)
        .unify()
        .or(get_settings_route)
        .unify()
        .or(put_settings_route)
        .unify()
        .boxed()
}
