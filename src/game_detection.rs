//! Known-game catalog used for server-side detection and development seeding.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::store::{Game, StoreClient, StoreError};

/// Game reported by the detection source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedGame {
    pub id: String,
    pub name: String,
    pub path: String,
    pub last_played: DateTime<Utc>,
    pub genre: String,
    pub publisher: String,
    pub release_year: i32,
    pub platforms: Vec<String>,
    pub is_detected: bool,
    pub is_optimized: bool,
    pub source: String,
}

impl DetectedGame {
    pub fn into_game(self, detected_at: DateTime<Utc>) -> Game {
        Game {
            slug: self.id.clone(),
            id: self.id,
            name: self.name,
            genre: Some(self.genre),
            publisher: Some(self.publisher),
            release_year: Some(self.release_year),
            platforms: self.platforms,
            is_detected: self.is_detected,
            is_optimized: self.is_optimized,
            last_optimized: None,
            optimization_type: None,
            performance_metrics: None,
            source: Some(self.source),
            app_id: None,
            install_path: Some(self.path),
            executable_path: None,
            detected_at: Some(detected_at),
            last_detected_at: None,
        }
    }
}

struct CatalogEntry {
    id: &'static str,
    name: &'static str,
    path: &'static str,
    last_played: &'static str,
    genre: &'static str,
    publisher: &'static str,
    release_year: i32,
    platforms: &'static [&'static str],
    source: &'static str,
}

const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        id: "valorant",
        name: "Valorant",
        path: "C:\\Program Files\\Riot Games\\Valorant",
        last_played: "2025-05-06T18:30:00Z",
        genre: "Tactical FPS",
        publisher: "Riot Games",
        release_year: 2020,
        platforms: &["Windows"],
        source: "Riot Games Launcher",
    },
    CatalogEntry {
        id: "cs2",
        name: "Counter-Strike 2",
        path: "C:\\Program Files\\Steam\\steamapps\\common\\Counter-Strike Global Offensive",
        last_played: "2025-05-07T09:45:00Z",
        genre: "FPS",
        publisher: "Valve",
        release_year: 2023,
        platforms: &["Windows", "Linux", "macOS"],
        source: "Steam",
    },
    CatalogEntry {
        id: "fortnite",
        name: "Fortnite",
        path: "C:\\Program Files\\Epic Games\\Fortnite",
        last_played: "2025-05-05T20:15:00Z",
        genre: "Battle Royale",
        publisher: "Epic Games",
        release_year: 2017,
        platforms: &["Windows", "macOS", "PlayStation", "Xbox", "Switch", "Mobile"],
        source: "Epic Games Launcher",
    },
    CatalogEntry {
        id: "apex-legends",
        name: "Apex Legends",
        path: "C:\\Program Files\\Origin Games\\Apex",
        last_played: "2025-05-04T21:30:00Z",
        genre: "Battle Royale",
        publisher: "Electronic Arts",
        release_year: 2019,
        platforms: &["Windows", "PlayStation", "Xbox"],
        source: "EA App",
    },
    CatalogEntry {
        id: "league-of-legends",
        name: "League of Legends",
        path: "C:\\Program Files\\Riot Games\\League of Legends",
        last_played: "2025-05-07T10:00:00Z",
        genre: "MOBA",
        publisher: "Riot Games",
        release_year: 2009,
        platforms: &["Windows", "macOS"],
        source: "Riot Games Launcher",
    },
    CatalogEntry {
        id: "warzone",
        name: "Call of Duty: Warzone",
        path: "C:\\Program Files\\Battle.net\\Call of Duty Modern Warfare",
        last_played: "2025-05-03T19:20:00Z",
        genre: "Battle Royale",
        publisher: "Activision",
        release_year: 2020,
        platforms: &["Windows", "PlayStation", "Xbox"],
        source: "Battle.net",
    },
];

/// Report the games known to be installed on this machine
pub fn detect_all_games() -> Vec<DetectedGame> {
    let games: Vec<DetectedGame> = CATALOG
        .iter()
        .filter_map(|entry| {
            let last_played = match DateTime::parse_from_rfc3339(entry.last_played) {
                Ok(ts) => ts.with_timezone(&Utc),
                Err(e) => {
                    warn!("⚠️ Skipping catalog entry {} with bad timestamp: {}", entry.id, e);
                    return None;
                }
            };
            Some(DetectedGame {
                id: entry.id.to_string(),
                name: entry.name.to_string(),
                path: entry.path.to_string(),
                last_played,
                genre: entry.genre.to_string(),
                publisher: entry.publisher.to_string(),
                release_year: entry.release_year,
                platforms: entry.platforms.iter().map(|p| p.to_string()).collect(),
                is_detected: true,
                is_optimized: false,
                source: entry.source.to_string(),
            })
        })
        .collect();

    info!("🎮 Game detection found {} games", games.len());
    games
}

fn sample_game(id: &str, name: &str, slug: &str, genre: &str, publisher: &str, year: i32, platforms: &[&str]) -> Game {
    Game {
        id: id.to_string(),
        name: name.to_string(),
        slug: slug.to_string(),
        genre: Some(genre.to_string()),
        publisher: Some(publisher.to_string()),
        release_year: Some(year),
        platforms: platforms.iter().map(|p| p.to_string()).collect(),
        is_detected: true,
        is_optimized: false,
        last_optimized: None,
        optimization_type: None,
        performance_metrics: None,
        source: Some("sample".to_string()),
        app_id: None,
        install_path: None,
        executable_path: None,
        detected_at: None,
        last_detected_at: None,
    }
}

/// Fixed sample set used when detection yields nothing
pub fn sample_games(now: DateTime<Utc>) -> Vec<Game> {
    let valorant = sample_game("valorant", "Valorant", "valorant", "FPS", "Riot Games", 2020, &["PC"]);

    let mut counter_strike = sample_game("csgo", "Counter-Strike 2", "cs2", "FPS", "Valve", 2023, &["PC"]);
    counter_strike.mark_optimized("both", now - Duration::days(2));
    counter_strike.performance_metrics = Some(serde_json::json!({
        "latencyImprovement": 15,
        "fpsImprovement": 25,
        "packetLossReduction": 80,
        "jitterReduction": 60
    }));

    let mut fortnite = sample_game(
        "fortnite",
        "Fortnite",
        "fortnite",
        "Battle Royale",
        "Epic Games",
        2017,
        &["PC", "PlayStation", "Xbox", "Switch"],
    );
    fortnite.is_detected = false;

    vec![valorant, counter_strike, fortnite]
}

/// Populate an empty games table from detection, or from the sample set when detection is empty.
/// Returns the number of games written.
pub async fn seed_games(store: &StoreClient, detected: Vec<DetectedGame>) -> Result<usize, StoreError> {
    let existing = store.list_games(1).await?;
    if !existing.is_empty() {
        info!("📚 Games table already populated, skipping seed");
        return Ok(0);
    }

    let now = Utc::now();
    let games: Vec<Game> = if detected.is_empty() {
        info!("🌱 No games detected, seeding sample games");
        sample_games(now)
    } else {
        detected.into_iter().map(|g| g.into_game(now)).collect()
    };

    let count = games.len();
    for game in games {
        store.put_game(game).await?;
    }
    info!("✅ Seeded {} games", count);
    Ok(count)
}
