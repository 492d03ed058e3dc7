//! End-to-end pipeline tests: record interactions, learn, score, rescore.

use std::time::Duration;

use sqlx::PgPool;
use uuid::Uuid;

use aqar_core::{AdjacencyGraph, Identity, InteractionKind, PropertyType};
use aqar_db::{NewListing, NewPreference};
use aqar_matching::{IdentityLocks, ListingCache, MatchingError, RecordOutcome};

fn riyadh_graph() -> AdjacencyGraph {
    AdjacencyGraph::from_map(
        [(
            "Riyadh".to_string(),
            [
                (
                    "Al Narjis".to_string(),
                    vec!["Al Yasmin".to_string(), "Al Arid".to_string()],
                ),
                ("Al Yasmin".to_string(), vec!["Al Narjis".to_string()]),
                ("Al Malqa".to_string(), vec![]),
            ]
            .into_iter()
            .collect(),
        )]
        .into_iter()
        .collect(),
    )
}

fn listing_in(district: &str, price: i64) -> NewListing {
    NewListing {
        city: "Riyadh".to_string(),
        district: district.to_string(),
        price,
        property_type: PropertyType::Villa,
        rooms: Some(4),
        area_sqm: Some(350),
    }
}

fn preference_for(user_id: Uuid) -> NewPreference {
    NewPreference {
        user_id,
        city: "Riyadh".to_string(),
        districts: vec!["Al Narjis".to_string()],
        property_type: PropertyType::Villa,
        budget_min: None,
        budget_max: Some(1_000_000),
        rooms: Some(4),
        area_sqm: Some(350),
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn compute_match_scores_and_records_once(pool: PgPool) {
    let graph = riyadh_graph();
    let listing_id = aqar_db::insert_listing(&pool, &listing_in("Al Narjis", 900_000))
        .await
        .expect("insert listing");
    let preference_id = aqar_db::insert_preference(&pool, &preference_for(Uuid::new_v4()))
        .await
        .expect("insert preference");

    let first = aqar_matching::compute_match(&pool, &graph, listing_id, preference_id)
        .await
        .expect("compute");
    assert_eq!(first.score.total, 100);
    assert!(first.match_created);

    let second = aqar_matching::compute_match(&pool, &graph, listing_id, preference_id)
        .await
        .expect("recompute");
    assert_eq!(second.score.total, 100);
    assert!(!second.match_created, "pair is recorded at most once");
}

#[sqlx::test(migrations = "../../migrations")]
async fn compute_match_reports_missing_sides(pool: PgPool) {
    let graph = riyadh_graph();
    let listing_id = aqar_db::insert_listing(&pool, &listing_in("Al Narjis", 900_000))
        .await
        .expect("insert listing");

    let err = aqar_matching::compute_match(&pool, &graph, listing_id, 12345)
        .await
        .expect_err("missing preference");
    assert!(matches!(err, MatchingError::PreferenceNotFound(12345)));

    let err = aqar_matching::compute_match(&pool, &graph, 54321, 12345)
        .await
        .expect_err("missing listing");
    assert!(matches!(err, MatchingError::ListingNotFound(54321)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn rescore_covers_active_preferences_in_city_only(pool: PgPool) {
    let graph = riyadh_graph();
    let listing_id = aqar_db::insert_listing(&pool, &listing_in("Al Narjis", 900_000))
        .await
        .expect("insert listing");

    let active_a = aqar_db::insert_preference(&pool, &preference_for(Uuid::new_v4()))
        .await
        .expect("insert");
    let active_b = aqar_db::insert_preference(&pool, &preference_for(Uuid::new_v4()))
        .await
        .expect("insert");

    let disabled = aqar_db::insert_preference(&pool, &preference_for(Uuid::new_v4()))
        .await
        .expect("insert");
    aqar_db::set_preference_active(&pool, disabled, false)
        .await
        .expect("disable");

    let mut other_city = preference_for(Uuid::new_v4());
    other_city.city = "Jeddah".to_string();
    aqar_db::insert_preference(&pool, &other_city)
        .await
        .expect("insert");

    let summary = aqar_matching::rescore_listing(&pool, &graph, listing_id)
        .await
        .expect("rescore");
    assert_eq!(summary.scored, 2);
    assert_eq!(summary.created, 2);

    for preference_id in [active_a, active_b] {
        let matches = aqar_db::list_matches_for_preference(&pool, preference_id, 10)
            .await
            .expect("list");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].score, 100);
    }

    // Second pass scores again but creates nothing new.
    let summary = aqar_matching::rescore_listing(&pool, &graph, listing_id)
        .await
        .expect("rescore again");
    assert_eq!(summary.scored, 2);
    assert_eq!(summary.created, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn recording_unknown_listing_is_skipped_not_an_error(pool: PgPool) {
    let cache = ListingCache::new(Duration::from_secs(60));
    let locks = IdentityLocks::new();
    let identity = Identity::User(Uuid::new_v4());

    let outcome = aqar_matching::record_interaction(
        &pool,
        &cache,
        &locks,
        &identity,
        99_999,
        InteractionKind::View,
        Some(45),
    )
    .await
    .expect("recording must not error");

    assert!(!outcome.is_recorded());
    assert!(aqar_db::get_learned_profile(&pool, &identity)
        .await
        .expect("get")
        .is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn recording_appends_event_and_learns(pool: PgPool) {
    let cache = ListingCache::new(Duration::from_secs(60));
    let locks = IdentityLocks::new();
    let identity = Identity::User(Uuid::new_v4());

    let listing_id = aqar_db::insert_listing(&pool, &listing_in("Al Narjis", 900_000))
        .await
        .expect("insert listing");

    let outcome = aqar_matching::record_interaction(
        &pool,
        &cache,
        &locks,
        &identity,
        listing_id,
        InteractionKind::Save,
        None,
    )
    .await
    .expect("record");
    assert!(matches!(outcome, RecordOutcome::Recorded { .. }));

    let profile = aqar_db::get_learned_profile(&pool, &identity)
        .await
        .expect("get")
        .expect("one event is enough for a learning pass")
        .profile();
    assert_eq!(profile.total_interactions, 1);
    assert!(profile.weights.location > 1.0, "a save pulls weights up");
    assert_eq!(profile.preferred_districts, ["Al Narjis"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn recording_mirrors_save_and_contact_onto_match_records(pool: PgPool) {
    let graph = riyadh_graph();
    let cache = ListingCache::new(Duration::from_secs(60));
    let locks = IdentityLocks::new();
    let user_id = Uuid::new_v4();
    let identity = Identity::User(user_id);

    let listing_id = aqar_db::insert_listing(&pool, &listing_in("Al Narjis", 900_000))
        .await
        .expect("insert listing");
    let preference_id = aqar_db::insert_preference(&pool, &preference_for(user_id))
        .await
        .expect("insert preference");
    aqar_matching::compute_match(&pool, &graph, listing_id, preference_id)
        .await
        .expect("compute");

    let record = |kind| {
        aqar_matching::record_interaction(&pool, &cache, &locks, &identity, listing_id, kind, None)
    };

    record(InteractionKind::Save).await.expect("record save");
    let matches = aqar_db::list_matches_for_preference(&pool, preference_id, 10)
        .await
        .expect("list");
    assert!(matches[0].is_saved);
    assert!(!matches[0].is_contacted);

    record(InteractionKind::Contact)
        .await
        .expect("record contact");
    record(InteractionKind::Unsave).await.expect("record unsave");
    let matches = aqar_db::list_matches_for_preference(&pool, preference_id, 10)
        .await
        .expect("list");
    assert!(!matches[0].is_saved, "unsave clears the flag");
    assert!(matches[0].is_contacted);
}

#[sqlx::test(migrations = "../../migrations")]
async fn session_events_leave_match_records_alone(pool: PgPool) {
    let graph = riyadh_graph();
    let cache = ListingCache::new(Duration::from_secs(60));
    let locks = IdentityLocks::new();
    let identity = Identity::Session("anon-browser".to_string());

    let listing_id = aqar_db::insert_listing(&pool, &listing_in("Al Narjis", 900_000))
        .await
        .expect("insert listing");
    let preference_id = aqar_db::insert_preference(&pool, &preference_for(Uuid::new_v4()))
        .await
        .expect("insert preference");
    aqar_matching::compute_match(&pool, &graph, listing_id, preference_id)
        .await
        .expect("compute");

    let outcome = aqar_matching::record_interaction(
        &pool,
        &cache,
        &locks,
        &identity,
        listing_id,
        InteractionKind::Save,
        None,
    )
    .await
    .expect("record");
    assert!(outcome.is_recorded());

    let matches = aqar_db::list_matches_for_preference(&pool, preference_id, 10)
        .await
        .expect("list");
    assert!(!matches[0].is_saved, "sessions own no preferences");
}

#[sqlx::test(migrations = "../../migrations")]
async fn saves_in_one_district_shape_the_profile(pool: PgPool) {
    let cache = ListingCache::new(Duration::from_secs(60));
    let locks = IdentityLocks::new();
    let identity = Identity::Session("anon-learner".to_string());

    let narjis = aqar_db::insert_listing(&pool, &listing_in("Al Narjis", 900_000))
        .await
        .expect("insert");
    let yasmin = aqar_db::insert_listing(&pool, &listing_in("Al Yasmin", 950_000))
        .await
        .expect("insert");

    for _ in 0..6 {
        aqar_matching::record_interaction(
            &pool,
            &cache,
            &locks,
            &identity,
            narjis,
            InteractionKind::Save,
            None,
        )
        .await
        .expect("record save");
    }
    for _ in 0..2 {
        aqar_matching::record_interaction(
            &pool,
            &cache,
            &locks,
            &identity,
            yasmin,
            InteractionKind::Skip,
            None,
        )
        .await
        .expect("record skip");
    }

    let profile = aqar_db::get_learned_profile(&pool, &identity)
        .await
        .expect("get")
        .expect("profile exists")
        .profile();

    assert_eq!(profile.total_interactions, 8);
    assert!((profile.confidence - 0.4).abs() < 1e-9);
    assert_eq!(profile.preferred_districts, ["Al Narjis"]);
    assert_eq!(profile.preferred_property_types, [PropertyType::Villa]);
    assert!(profile.weights.location >= 0.3 && profile.weights.location <= 2.0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn relearn_without_events_touches_nothing(pool: PgPool) {
    let identity = Identity::User(Uuid::new_v4());

    let result = aqar_matching::run_relearn(&pool, &identity)
        .await
        .expect("relearn");
    assert!(result.is_none());
    assert!(aqar_db::get_learned_profile(&pool, &identity)
        .await
        .expect("get")
        .is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn recorder_caches_the_listing_snapshot(pool: PgPool) {
    let cache = ListingCache::new(Duration::from_secs(60));
    let locks = IdentityLocks::new();
    let identity = Identity::User(Uuid::new_v4());

    let listing_id = aqar_db::insert_listing(&pool, &listing_in("Al Narjis", 900_000))
        .await
        .expect("insert");

    aqar_matching::record_interaction(
        &pool,
        &cache,
        &locks,
        &identity,
        listing_id,
        InteractionKind::View,
        Some(60),
    )
    .await
    .expect("record");

    let key = format!("listing:{listing_id}");
    let cached = cache.get(&key).expect("snapshot cached after first resolve");
    assert_eq!(cached.district, "Al Narjis");
}
