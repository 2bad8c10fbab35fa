//! Integration tests for `/api/v1/user/journey` and `/api/v1/user/achievements`.

mod common;

use axum::http::StatusCode;
use chrono::Utc;
use common::{body_json, build_test_app, get, get_auth, member_token, post_auth, put_json_auth};
use oneshot_core::journey::catalog::Catalog;
use oneshot_core::journey::task_state::{self, TaskStateMap};
use oneshot_db::repositories::TaskStateRepo;
use serde_json::{json, Value};
use sqlx::PgPool;

const SNAPSHOT: &str = "/api/v1/user/journey/snapshot";

fn task_uri(key: &str, action: &str) -> String {
    format!("/api/v1/user/journey/tasks/{key}/{action}")
}

fn keys(list: &Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

fn status_of<'a>(journey: &'a Value, key: &str) -> &'a str {
    journey["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["key"] == key)
        .unwrap_or_else(|| panic!("task {key} not in journey"))["status"]
        .as_str()
        .unwrap()
}

/// Store the incomplete-basics snapshot for `user_id`. Contact details are
/// filled in so only the basics task blocks sharing.
async fn seed_snapshot(pool: &PgPool, token: &str) -> Value {
    let response = put_json_auth(
        build_test_app(pool.clone()),
        SNAPSHOT,
        token,
        json!({
            "completion_pct": 20,
            "missing_fields": ["graduation_year", "position"],
            "fields": {
                "high_school_name": "Lincoln High",
                "email": "athlete@example.com",
                "phone": "555-0100"
            }
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].clone()
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn journey_requires_bearer_token(pool: PgPool) {
    let response = get(build_test_app(pool.clone()), "/api/v1/user/journey").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");

    let response = get_auth(build_test_app(pool), "/api/v1/user/journey", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Snapshot and evaluation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn incomplete_basics_block_sharing(pool: PgPool) {
    let token = member_token(1);
    let journey = seed_snapshot(&pool, &token).await;

    assert_eq!(journey["can_share"], false);
    assert!(keys(&journey["blocking_tasks"]).contains(&"complete_basic_profile".to_string()));
    assert_eq!(status_of(&journey, "complete_basic_profile"), "triggered");
    assert_eq!(status_of(&journey, "add_profile_photo"), "locked");
    assert!(keys(&journey["newly_triggered"]).contains(&"complete_basic_profile".to_string()));

    // Blocking tasks rank first.
    assert_eq!(journey["ranked"][0]["key"], "complete_basic_profile");
    assert_eq!(journey["ranked"][0]["template"], "critical");

    let response = get_auth(
        build_test_app(pool),
        "/api/v1/user/journey/visibility",
        &token,
    )
    .await;
    let visibility = body_json(response).await["data"].clone();
    assert_eq!(visibility["can_share"], false);
    assert_eq!(keys(&visibility["blocking_tasks"]), vec!["complete_basic_profile"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn re_evaluation_does_not_retrigger(pool: PgPool) {
    let token = member_token(1);
    seed_snapshot(&pool, &token).await;

    let response = get_auth(build_test_app(pool), "/api/v1/user/journey", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let journey = body_json(response).await["data"].clone();
    assert!(journey["newly_triggered"].as_array().unwrap().is_empty());
    assert_eq!(status_of(&journey, "complete_basic_profile"), "triggered");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn non_object_snapshot_is_rejected(pool: PgPool) {
    let response = put_json_auth(build_test_app(pool), SNAPSHOT, &member_token(1), json!([1, 2])).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn malformed_snapshot_fields_count_as_missing(pool: PgPool) {
    let response = put_json_auth(
        build_test_app(pool),
        SNAPSHOT,
        &member_token(1),
        json!({
            "completion_pct": "lots",
            "graduation_year": "soon",
            "role": "mascot",
            "fields": {
                "position": "Striker",
                "high_school_name": "Lincoln High",
                "email": "athlete@example.com",
                "phone": "555-0100"
            }
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let journey = body_json(response).await["data"].clone();
    assert_eq!(journey["can_share"], false);
    assert_eq!(keys(&journey["blocking_tasks"]), vec!["complete_basic_profile"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn user_without_snapshot_cannot_share(pool: PgPool) {
    let response = get_auth(
        build_test_app(pool),
        "/api/v1/user/journey/visibility",
        &member_token(1),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let visibility = body_json(response).await["data"].clone();
    assert_eq!(visibility["can_share"], false);
    let blocking = keys(&visibility["blocking_tasks"]);
    assert!(blocking.contains(&"complete_basic_profile".to_string()));
    assert!(blocking.contains(&"add_contact_info".to_string()));
}

// ---------------------------------------------------------------------------
// Completion and achievements
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn completing_before_dependencies_conflicts(pool: PgPool) {
    let token = member_token(1);
    seed_snapshot(&pool, &token).await;

    let response = post_auth(build_test_app(pool), &task_uri("add_profile_photo", "complete"), &token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICT");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn completion_unblocks_and_awards_once(pool: PgPool) {
    let token = member_token(1);
    seed_snapshot(&pool, &token).await;

    let uri = task_uri("complete_basic_profile", "complete");
    let response = post_auth(build_test_app(pool.clone()), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();

    assert_eq!(data["newly_completed"], true);
    let awarded: Vec<&str> = data["achievements"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["achievement_key"].as_str().unwrap())
        .collect();
    assert_eq!(awarded, vec!["first_steps", "profile_foundation"]);
    assert_eq!(data["achievements"][0]["template"], "achievement");

    assert_eq!(data["journey"]["can_share"], true);
    assert_eq!(status_of(&data["journey"], "complete_basic_profile"), "completed");
    assert_ne!(status_of(&data["journey"], "add_profile_photo"), "locked");

    // A second completion changes nothing and awards nothing.
    let response = post_auth(build_test_app(pool.clone()), &uri, &token).await;
    let again = body_json(response).await["data"].clone();
    assert_eq!(again["newly_completed"], false);
    assert!(again["achievements"].as_array().unwrap().is_empty());

    let response = get_auth(build_test_app(pool), "/api/v1/user/achievements", &token).await;
    let held = body_json(response).await["data"].clone();
    assert_eq!(held.as_array().unwrap().len(), 2);
    assert_eq!(held[0]["task_key"], "complete_basic_profile");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn repeat_completion_awards_unrecorded_achievements(pool: PgPool) {
    let token = member_token(1);
    seed_snapshot(&pool, &token).await;

    // Completed state persisted without its achievement rows.
    let catalog = Catalog::builtin().unwrap();
    let mut states: TaskStateMap = TaskStateRepo::load(&pool, 1).await.unwrap();
    task_state::complete(&mut states, &catalog, "complete_basic_profile", Utc::now()).unwrap();
    TaskStateRepo::save(&pool, 1, &states).await.unwrap();

    let uri = task_uri("complete_basic_profile", "complete");
    let response = post_auth(build_test_app(pool.clone()), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["newly_completed"], false);
    let awarded: Vec<&str> = data["achievements"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["achievement_key"].as_str().unwrap())
        .collect();
    assert_eq!(awarded, vec!["first_steps", "profile_foundation"]);

    let response = get_auth(build_test_app(pool), "/api/v1/user/achievements", &token).await;
    let held = body_json(response).await["data"].clone();
    assert_eq!(held.as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_task_returns_404(pool: PgPool) {
    let response = post_auth(
        build_test_app(pool),
        &task_uri("no_such_task", "complete"),
        &member_token(1),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Dismiss / restore / shown
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn blocking_tasks_cannot_be_dismissed(pool: PgPool) {
    let token = member_token(1);
    seed_snapshot(&pool, &token).await;

    let response = post_auth(
        build_test_app(pool),
        &task_uri("complete_basic_profile", "dismiss"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn dismiss_and_restore_round_trip(pool: PgPool) {
    let token = member_token(1);
    seed_snapshot(&pool, &token).await;

    let dismiss = task_uri("explore_recruiting_guide", "dismiss");
    let response = post_auth(build_test_app(pool.clone()), &dismiss, &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let journey = body_json(response).await["data"].clone();
    assert_eq!(status_of(&journey, "explore_recruiting_guide"), "dismissed");

    let restore = task_uri("explore_recruiting_guide", "restore");
    let response = post_auth(build_test_app(pool.clone()), &restore, &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let journey = body_json(response).await["data"].clone();
    // Restored tasks are re-evaluated immediately; this one has no triggers.
    assert_eq!(status_of(&journey, "explore_recruiting_guide"), "triggered");

    let response = post_auth(build_test_app(pool), &restore, &token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn shown_tasks_leave_the_notification_plan(pool: PgPool) {
    let token = member_token(1);
    seed_snapshot(&pool, &token).await;

    let notifications = "/api/v1/user/journey/notifications";
    let response = get_auth(build_test_app(pool.clone()), notifications, &token).await;
    let plan = body_json(response).await["data"].clone();
    let planned: Vec<&str> = plan
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["key"].as_str().unwrap())
        .collect();
    assert_eq!(planned[0], "complete_basic_profile");
    assert!(planned.contains(&"explore_recruiting_guide"));

    let response = post_auth(
        build_test_app(pool.clone()),
        &task_uri("explore_recruiting_guide", "shown"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_auth(build_test_app(pool.clone()), notifications, &token).await;
    let plan = body_json(response).await["data"].clone();
    assert!(plan
        .as_array()
        .unwrap()
        .iter()
        .all(|p| p["key"] != "explore_recruiting_guide"));

    // Only triggered tasks can be marked shown.
    let response = post_auth(
        build_test_app(pool),
        &task_uri("add_profile_photo", "shown"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
