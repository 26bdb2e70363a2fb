/// End-to-end API tests against a real database
///
/// Each test returns early when `DATABASE_URL` is unset.

mod common;

use axum::http::StatusCode;
use common::TestContext;
use serde_json::json;
use taskdeck_shared::notify::EventKind;

macro_rules! context {
    () => {
        match TestContext::new().await.unwrap() {
            Some(ctx) => ctx,
            None => return,
        }
    };
}

#[tokio::test]
async fn test_signup_login_logout() {
    let ctx = context!();
    let email = format!("flow-{}@example.com", uuid::Uuid::new_v4());

    let (status, body) = ctx
        .send(
            "POST",
            "/signup",
            None,
            Some(json!({ "name": "Ada", "email": email, "password": "correct horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert!(body["user"].get("password_hash").is_none());
    let user_id = body["user"]["id"].as_i64().unwrap();

    let (status, body) = ctx
        .send(
            "POST",
            "/signup",
            None,
            Some(json!({ "name": "Ada", "email": email.to_uppercase(), "password": "correct horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "email");

    let (status, _) = ctx
        .send(
            "POST",
            "/login",
            None,
            Some(json!({ "email": email, "password": "wrong password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = ctx
        .send(
            "POST",
            "/login",
            None,
            Some(json!({ "email": email, "password": "correct horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = ctx.send("GET", "/user", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user_id);

    let (status, body) = ctx.send("POST", "/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully");

    let (status, _) = ctx.send("GET", "/user", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    taskdeck_shared::models::user::User::delete(&ctx.db, user_id)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_reorder_tasks_changes_listing() {
    let mut ctx = context!();
    let owner = ctx.create_user(false).await.unwrap();

    let a = ctx.create_task(&owner.token, "A").await;
    let b = ctx.create_task(&owner.token, "B").await;
    let c = ctx.create_task(&owner.token, "C").await;

    let (_, body) = ctx.send("GET", "/tasks", Some(&owner.token), None).await;
    assert_eq!(TestContext::titles(&body), vec!["A", "B", "C"]);
    let orders: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["order"].as_i64().unwrap())
        .collect();
    assert_eq!(orders, vec![0, 1, 2]);

    let (status, body) = ctx
        .send(
            "PUT",
            "/tasks/reorder",
            Some(&owner.token),
            Some(json!({ "tasks": [
                { "id": c, "order": 0 },
                { "id": a, "order": 1 },
                { "id": b, "order": 2 }
            ] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["message"], "Tasks reordered successfully");

    let (_, body) = ctx.send("GET", "/tasks", Some(&owner.token), None).await;
    assert_eq!(TestContext::titles(&body), vec!["C", "A", "B"]);
    assert_eq!(body["total"], 3);
    assert_eq!(body["last_page"], 1);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_reorder_is_all_or_nothing() {
    let mut ctx = context!();
    let owner = ctx.create_user(false).await.unwrap();
    let other = ctx.create_user(false).await.unwrap();

    let a = ctx.create_task(&owner.token, "A").await;
    let b = ctx.create_task(&owner.token, "B").await;
    let foreign = ctx.create_task(&other.token, "Foreign").await;

    let (status, _) = ctx
        .send(
            "PUT",
            "/tasks/reorder",
            Some(&owner.token),
            Some(json!({ "tasks": [
                { "id": b, "order": 0 },
                { "id": a, "order": 1 },
                { "id": foreign, "order": 2 }
            ] })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send(
            "PUT",
            "/tasks/reorder",
            Some(&owner.token),
            Some(json!({ "tasks": [{ "id": b, "order": 0 }, { "id": i64::MAX, "order": 1 }] })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = ctx
        .send("PUT", "/tasks/reorder", Some(&owner.token), Some(json!({ "tasks": [] })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = ctx.send("GET", "/tasks", Some(&owner.token), None).await;
    assert_eq!(TestContext::titles(&body), vec!["A", "B"]);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_free_user_priority_is_coerced() {
    let mut ctx = context!();
    let free = ctx.create_user(false).await.unwrap();
    let premium = ctx.create_user(true).await.unwrap();

    let id = ctx.create_task(&free.token, "Free task").await;
    let (status, body) = ctx
        .send(
            "PUT",
            &format!("/tasks/{}", id),
            Some(&free.token),
            Some(json!({ "priority": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["priority"], false);

    let (status, body) = ctx
        .send(
            "POST",
            "/tasks",
            Some(&premium.token),
            Some(json!({ "title": "Urgent", "priority": true })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let urgent = body["id"].as_i64().unwrap();

    // omitted priority keeps the stored value for premium users
    let (_, body) = ctx
        .send(
            "PUT",
            &format!("/tasks/{}", urgent),
            Some(&premium.token),
            Some(json!({ "title": "Still urgent" })),
        )
        .await;
    assert_eq!(body["priority"], true);

    ctx.create_task(&premium.token, "Routine").await;
    let (_, body) = ctx.send("GET", "/tasks/priority", Some(&premium.token), None).await;
    assert_eq!(TestContext::titles(&body), vec!["Still urgent"]);

    let (_, body) = ctx
        .send("GET", "/tasks?priority=0", Some(&premium.token), None)
        .await;
    assert_eq!(body["total"], 2);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_task_ownership_and_delete() {
    let mut ctx = context!();
    let owner = ctx.create_user(false).await.unwrap();
    let intruder = ctx.create_user(false).await.unwrap();

    let id = ctx.create_task(&owner.token, "Mine").await;

    let (status, _) = ctx
        .send(
            "PUT",
            &format!("/tasks/{}", id),
            Some(&intruder.token),
            Some(json!({ "title": "Hijacked" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send("DELETE", &format!("/tasks/{}", id), Some(&intruder.token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .send("DELETE", &format!("/tasks/{}", id), Some(&owner.token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = ctx
        .send("DELETE", &format!("/tasks/{}", id), Some(&owner.token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_search_matches_wildcards_literally() {
    let mut ctx = context!();
    let owner = ctx.create_user(false).await.unwrap();

    ctx.create_task(&owner.token, "100% done").await;
    ctx.create_task(&owner.token, "1000 things").await;

    let (_, body) = ctx
        .send("GET", "/tasks?search=100%25", Some(&owner.token), None)
        .await;
    assert_eq!(TestContext::titles(&body), vec!["100% done"]);

    let (_, body) = ctx
        .send("GET", "/tasks?search=THINGS", Some(&owner.token), None)
        .await;
    assert_eq!(TestContext::titles(&body), vec!["1000 things"]);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_folder_requires_premium() {
    let mut ctx = context!();
    let free = ctx.create_user(false).await.unwrap();

    let (status, body) = ctx
        .send("POST", "/folders", Some(&free.token), Some(json!({ "name": "Work" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "This feature is only available for premium users.");

    let (status, body) = ctx.send("GET", "/folders", Some(&free.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
    assert_eq!(body["last_page"], 1);
    assert!(body["from"].is_null());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_folder_membership_and_reorder() {
    let mut ctx = context!();
    let owner = ctx.create_user(true).await.unwrap();
    let other = ctx.create_user(true).await.unwrap();

    let a = ctx.create_task(&owner.token, "A").await;
    let b = ctx.create_task(&owner.token, "B").await;
    let loose = ctx.create_task(&owner.token, "Loose").await;
    let foreign = ctx.create_task(&other.token, "Foreign").await;

    let (status, body) = ctx
        .send("POST", "/folders", Some(&owner.token), Some(json!({ "name": "Work" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let folder = body["id"].as_i64().unwrap();

    for id in [a, b] {
        let (status, body) = ctx
            .send(
                "POST",
                &format!("/folders/{}/add-task", folder),
                Some(&owner.token),
                Some(json!({ "task_id": id })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
    }

    let (status, _) = ctx
        .send(
            "POST",
            &format!("/folders/{}/add-task", folder),
            Some(&owner.token),
            Some(json!({ "task_id": a })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = ctx
        .send(
            "POST",
            &format!("/folders/{}/add-task", folder),
            Some(&owner.token),
            Some(json!({ "task_id": foreign })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .send(
            "POST",
            &format!("/folders/{}/add-task", folder),
            Some(&owner.token),
            Some(json!({ "task_id": i64::MAX })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "task_id");

    let uri = format!("/folders/{}/tasks", folder);
    let (_, body) = ctx.send("GET", &uri, Some(&owner.token), None).await;
    assert_eq!(TestContext::titles(&body), vec!["A", "B"]);
    assert_eq!(body["data"][0]["pivot"]["order"], 0);
    assert_eq!(body["data"][1]["pivot"]["order"], 1);
    assert_eq!(body["data"][0]["pivot"]["folder_id"], folder);

    let (status, body) = ctx
        .send(
            "PUT",
            &format!("/folders/{}/reorder-tasks", folder),
            Some(&owner.token),
            Some(json!({ "orders": [{ "id": b, "order": 0 }, { "id": a, "order": 1 }] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["message"], "Tasks reordered successfully.");

    let (_, body) = ctx.send("GET", &uri, Some(&owner.token), None).await;
    assert_eq!(TestContext::titles(&body), vec!["B", "A"]);

    // non-members cannot be ordered inside the folder
    let (status, _) = ctx
        .send(
            "PUT",
            &format!("/folders/{}/reorder-tasks", folder),
            Some(&owner.token),
            Some(json!({ "orders": [{ "id": loose, "order": 0 }] })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = ctx.send("GET", &uri, Some(&other.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_remove_task_is_idempotent() {
    let mut ctx = context!();
    let owner = ctx.create_user(true).await.unwrap();

    let a = ctx.create_task(&owner.token, "A").await;
    let (_, body) = ctx
        .send("POST", "/folders", Some(&owner.token), Some(json!({ "name": "Inbox" })))
        .await;
    let folder = body["id"].as_i64().unwrap();

    ctx.send(
        "POST",
        &format!("/folders/{}/add-task", folder),
        Some(&owner.token),
        Some(json!({ "task_id": a })),
    )
    .await;

    while ctx.notifications.try_recv().is_ok() {}

    let uri = format!("/folders/{}/remove-task/{}", folder, a);
    let (status, body) = ctx.send("DELETE", &uri, Some(&owner.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task removed from folder successfully.");

    let event = ctx.notifications.try_recv().unwrap();
    assert_eq!(event.kind, EventKind::TaskRemovedFromFolder);

    let (status, _) = ctx.send("DELETE", &uri, Some(&owner.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(ctx.notifications.try_recv().is_err());

    let missing = format!("/folders/{}/remove-task/{}", folder, i64::MAX);
    let (status, _) = ctx.send("DELETE", &missing, Some(&owner.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_delete_folder_keeps_tasks() {
    let mut ctx = context!();
    let owner = ctx.create_user(true).await.unwrap();

    let a = ctx.create_task(&owner.token, "A").await;
    let b = ctx.create_task(&owner.token, "B").await;
    let (_, body) = ctx
        .send("POST", "/folders", Some(&owner.token), Some(json!({ "name": "Temp" })))
        .await;
    let folder = body["id"].as_i64().unwrap();

    for id in [a, b] {
        ctx.send(
            "POST",
            &format!("/folders/{}/add-task", folder),
            Some(&owner.token),
            Some(json!({ "task_id": id })),
        )
        .await;
    }

    let (status, body) = ctx
        .send("DELETE", &format!("/folders/{}", folder), Some(&owner.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Folder deleted successfully.");

    let (status, _) = ctx
        .send("GET", &format!("/folders/{}", folder), Some(&owner.token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let memberships: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM folder_task WHERE folder_id = $1")
            .bind(folder)
            .fetch_one(&ctx.db)
            .await
            .unwrap();
    assert_eq!(memberships, 0);

    let (_, body) = ctx.send("GET", "/tasks", Some(&owner.token), None).await;
    assert_eq!(TestContext::titles(&body), vec!["A", "B"]);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_activate_premium_unlocks_folders() {
    let mut ctx = context!();
    let user = ctx.create_user(false).await.unwrap();

    let (status, body) = ctx
        .send("POST", "/activate-premium", Some(&user.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_premium"], true);

    let (status, _) = ctx
        .send("POST", "/folders", Some(&user.token), Some(json!({ "name": "Now allowed" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_malformed_requests_get_json_errors() {
    let mut ctx = context!();
    let owner = ctx.create_user(true).await.unwrap();
    let a = ctx.create_task(&owner.token, "A").await;

    let (status, body) = ctx
        .send(
            "PUT",
            "/tasks/reorder",
            Some(&owner.token),
            Some(json!({ "tasks": [{ "id": a }] })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "body");

    let (status, body) = ctx
        .send(
            "POST",
            "/signup",
            None,
            Some(json!({ "name": 5, "email": "typed@example.com", "password": "correct horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = ctx.send("GET", "/folders/abc", Some(&owner.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, body) = ctx.send("DELETE", "/tasks/abc", Some(&owner.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_nul_in_text_is_rejected() {
    let mut ctx = context!();
    let owner = ctx.create_user(true).await.unwrap();
    let a = ctx.create_task(&owner.token, "A").await;

    let (status, body) = ctx
        .send("GET", "/tasks?search=a%00b", Some(&owner.token), None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);
    assert_eq!(body["details"][0]["field"], "search");

    let (status, body) = ctx
        .send("POST", "/tasks", Some(&owner.token), Some(json!({ "title": "x\u{0}y" })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);
    assert_eq!(body["details"][0]["field"], "title");

    let (status, body) = ctx
        .send(
            "PUT",
            &format!("/tasks/{}", a),
            Some(&owner.token),
            Some(json!({ "description": "before\u{0}after" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);
    assert_eq!(body["details"][0]["field"], "description");

    let (status, body) = ctx
        .send("POST", "/folders", Some(&owner.token), Some(json!({ "name": "\u{0}" })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);
    assert_eq!(body["details"][0]["field"], "name");

    let (_, body) = ctx.send("GET", "/tasks", Some(&owner.token), None).await;
    assert_eq!(TestContext::titles(&body), vec!["A"]);

    ctx.cleanup().await.unwrap();
}
