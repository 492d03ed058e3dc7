//! Command handlers for the CLI.
//!
//! These run against the live database configured through the environment,
//! except the districts commands which only touch the adjacency file.

use std::path::Path;

use uuid::Uuid;

use aqar_core::{AdjacencyGraph, Identity};

/// Load and validate the adjacency file, printing per-city counts.
pub(crate) fn validate_districts(path: Option<&Path>) -> anyhow::Result<()> {
    let graph = load_graph(path)?;

    println!(
        "ok: {} cities, {} districts",
        graph.city_count(),
        graph.district_count()
    );
    for city in graph.cities() {
        println!("  {city}");
    }
    Ok(())
}

/// Print the adjacency list for one district.
pub(crate) fn print_neighbors(path: Option<&Path>, city: &str, district: &str) -> anyhow::Result<()> {
    let graph = load_graph(path)?;

    let neighbors = graph.neighbors(city, district);
    if neighbors.is_empty() {
        println!("{district} ({city}): no recorded neighbors");
    } else {
        println!("{district} ({city}):");
        for neighbor in neighbors {
            println!("  {neighbor}");
        }
    }
    Ok(())
}

/// Score one (listing, preference) pair and print the result. Nothing is
/// persisted; this is the read-only diagnostic path.
pub(crate) async fn score_pair(listing_id: i64, preference_id: i64) -> anyhow::Result<()> {
    let config = aqar_core::load_app_config()?;
    let graph = AdjacencyGraph::load(&config.districts_path)?;
    let pool = connect(&config).await?;

    let listing = aqar_db::get_listing(&pool, listing_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("listing {listing_id} not found"))?
        .snapshot()?;
    let preference = aqar_db::get_preference(&pool, preference_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("preference {preference_id} not found"))?
        .profile()?;
    preference.validate()?;

    let result = aqar_core::score(&listing, &preference, &graph);
    println!("score: {}", result.total);
    println!("{}", serde_json::to_string_pretty(&result.breakdown)?);
    Ok(())
}

/// Force a learning pass for an identity and print the resulting profile.
pub(crate) async fn force_relearn(
    user: Option<Uuid>,
    session: Option<String>,
) -> anyhow::Result<()> {
    let identity = match (user, session) {
        (Some(user_id), None) => Identity::User(user_id),
        (None, Some(session_id)) => Identity::Session(session_id),
        _ => anyhow::bail!("exactly one of --user or --session is required"),
    };

    let config = aqar_core::load_app_config()?;
    let pool = connect(&config).await?;

    match aqar_matching::run_relearn(&pool, &identity).await? {
        Some(profile) => {
            println!(
                "relearned {} from {} interactions (confidence {:.2})",
                identity.storage_key(),
                profile.total_interactions,
                profile.confidence
            );
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        None => {
            println!(
                "no interactions in window for {}; profile untouched",
                identity.storage_key()
            );
        }
    }
    Ok(())
}

fn load_graph(path: Option<&Path>) -> anyhow::Result<AdjacencyGraph> {
    let graph = match path {
        Some(path) => AdjacencyGraph::load(path)?,
        None => {
            let config = aqar_core::load_app_config()?;
            AdjacencyGraph::load(&config.districts_path)?
        }
    };
    Ok(graph)
}

async fn connect(config: &aqar_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = aqar_db::PoolConfig::from_app_config(config);
    let pool = aqar_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}
