//! Integration tests for the back-office API: user administration, plan
//! management, oversight listings, analytics, and the audit trail.

use axum::{Router, body::Body, http::Request};
use serde_json::{Value, json};
use tower::ServiceExt;

#[path = "../common/mod.rs"]
mod common;
use common::*;

use fiberdesk::db::AppState;

fn admin_setup() -> (Router, AppState) {
    let state = create_test_app_state();
    (admin_app(state.clone()), state)
}

async fn response_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, token: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

fn post_empty(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

fn put_json(uri: &str, token: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

fn delete(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Admin account plus a ready-to-use bearer token.
fn admin_token(state: &AppState) -> (User, String) {
    let conn = state.db.get().unwrap();
    let admin = create_test_admin(&conn, "admin@example.com");
    let token = session_token(&conn, &admin.id);
    (admin, token)
}

// ============================================================================
// ACCESS CONTROL TESTS
// ============================================================================

mod access_tests {
    use super::*;

    #[tokio::test]
    async fn test_customer_token_is_forbidden() {
        let (app, state) = admin_setup();

        let token: String;
        {
            let conn = state.db.get().unwrap();
            let customer = create_test_customer(&conn, "customer@example.com");
            token = session_token(&conn, &customer.id);
        }

        let response = app.oneshot(get("/admin/overview", &token)).await.unwrap();
        assert_eq!(
            response.status(),
            axum::http::StatusCode::FORBIDDEN,
            "Customer sessions must not reach the back office"
        );
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let (app, _state) = admin_setup();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/admin/overview")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
    }
}

// ============================================================================
// USER ADMINISTRATION TESTS
// ============================================================================

mod user_admin_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_user_with_explicit_approval() {
        let (app, state) = admin_setup();
        let (_, token) = admin_token(&state);

        let body = json!({
            "email": "created@example.com",
            "name": "Created Customer",
            "password": "a-long-password",
            "role": "user",
            "approved": true
        });
        let response = app.oneshot(post_json("/admin/users", &token, &body)).await.unwrap();

        assert_eq!(
            response.status(),
            axum::http::StatusCode::OK,
            "Create user should return 200 OK"
        );
        let json = response_json(response).await;
        assert_eq!(json["email"], "created@example.com");
        assert_eq!(json["approved"], true, "Admin-created accounts can skip approval");

        let audit_conn = state.audit.get().unwrap();
        let count: i64 = audit_conn
            .query_row(
                "SELECT COUNT(*) FROM audit_logs WHERE action = 'create_user'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email_conflicts() {
        let (app, state) = admin_setup();
        let (_, token) = admin_token(&state);

        {
            let conn = state.db.get().unwrap();
            create_test_customer(&conn, "taken@example.com");
        }

        let body = json!({
            "email": "taken@example.com",
            "name": "Duplicate",
            "password": "a-long-password",
            "role": "user"
        });
        let response = app.oneshot(post_json("/admin/users", &token, &body)).await.unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::CONFLICT);
        let json = response_json(response).await;
        assert_eq!(json["details"], "Email is already registered");
    }

    #[tokio::test]
    async fn test_list_users_filters_and_pagination() {
        let (app, state) = admin_setup();
        let (_, token) = admin_token(&state);

        {
            let conn = state.db.get().unwrap();
            create_test_customer(&conn, "a@example.com");
            create_test_customer(&conn, "b@example.com");
            create_test_user(&conn, "pending@example.com", Role::User, false);
        }

        let response = app
            .clone()
            .oneshot(get("/admin/users", &token))
            .await
            .unwrap();
        let json = response_json(response).await;
        assert_eq!(json["total"], 4, "Admin plus three customers");
        assert_eq!(json["items"].as_array().unwrap().len(), 4);

        let response = app
            .clone()
            .oneshot(get("/admin/users?role=user&approved=false", &token))
            .await
            .unwrap();
        let json = response_json(response).await;
        assert_eq!(json["total"], 1);
        assert_eq!(json["items"][0]["email"], "pending@example.com");

        let response = app
            .oneshot(get("/admin/users?limit=2&offset=2", &token))
            .await
            .unwrap();
        let json = response_json(response).await;
        assert_eq!(json["items"].as_array().unwrap().len(), 2);
        assert_eq!(json["total"], 4);
        assert_eq!(json["limit"], 2);
        assert_eq!(json["offset"], 2);
    }

    #[tokio::test]
    async fn test_get_user() {
        let (app, state) = admin_setup();
        let (_, token) = admin_token(&state);

        let user_id: String;
        {
            let conn = state.db.get().unwrap();
            let user = create_test_customer(&conn, "lookup@example.com");
            user_id = user.id.clone();
        }

        let response = app
            .clone()
            .oneshot(get(&format!("/admin/users/{}", user_id), &token))
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["email"], "lookup@example.com");

        let response = app
            .oneshot(get(
                "/admin/users/fd_usr_ffffffffffffffffffffffffffffffff",
                &token,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
        let json = response_json(response).await;
        assert_eq!(json["details"], "User not found");
    }

    #[tokio::test]
    async fn test_update_user_role_and_budget() {
        let (app, state) = admin_setup();
        let (_, token) = admin_token(&state);

        let user_id: String;
        {
            let conn = state.db.get().unwrap();
            let user = create_test_customer(&conn, "promote@example.com");
            user_id = user.id.clone();
        }

        let uri = format!("/admin/users/{}", user_id);
        let response = app
            .clone()
            .oneshot(put_json(&uri, &token, &json!({ "role": "admin" })))
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["role"], "admin");

        let response = app
            .oneshot(put_json(&uri, &token, &json!({ "budget_limit": 850.0 })))
            .await
            .unwrap();
        let json = response_json(response).await;
        assert_eq!(json["budget_limit"], 850.0);
        assert_eq!(json["role"], "admin", "Omitted fields stay put");
    }

    #[tokio::test]
    async fn test_cannot_demote_the_last_admin() {
        let (app, state) = admin_setup();
        let (admin, token) = admin_token(&state);

        let response = app
            .oneshot(put_json(
                &format!("/admin/users/{}", admin.id),
                &token,
                &json!({ "role": "user" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::CONFLICT);
        let json = response_json(response).await;
        assert_eq!(json["details"], "Cannot demote the last admin");
    }

    #[tokio::test]
    async fn test_demote_admin_with_a_peer() {
        let (app, state) = admin_setup();
        let (_, token) = admin_token(&state);

        let other_id: String;
        {
            let conn = state.db.get().unwrap();
            let other = create_test_admin(&conn, "second@example.com");
            other_id = other.id.clone();
        }

        let response = app
            .oneshot(put_json(
                &format!("/admin/users/{}", other_id),
                &token,
                &json!({ "role": "user" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["role"], "user");
    }

    #[tokio::test]
    async fn test_cannot_delete_yourself() {
        let (app, state) = admin_setup();
        let (admin, token) = admin_token(&state);

        let response = app
            .oneshot(delete(&format!("/admin/users/{}", admin.id), &token))
            .await
            .unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["details"], "Cannot delete yourself");
    }

    #[tokio::test]
    async fn test_delete_user() {
        let (app, state) = admin_setup();
        let (_, token) = admin_token(&state);

        let user_id: String;
        {
            let conn = state.db.get().unwrap();
            let user = create_test_customer(&conn, "target@example.com");
            user_id = user.id.clone();
        }

        let uri = format!("/admin/users/{}", user_id);
        let response = app.clone().oneshot(delete(&uri, &token)).await.unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["success"], true);

        let response = app.oneshot(get(&uri, &token)).await.unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_approve_user_is_idempotent() {
        let (app, state) = admin_setup();
        let (_, token) = admin_token(&state);

        let user_id: String;
        {
            let conn = state.db.get().unwrap();
            let user = create_test_user(&conn, "pending@example.com", Role::User, false);
            user_id = user.id.clone();
        }

        let uri = format!("/admin/users/{}/approve", user_id);
        let response = app.clone().oneshot(post_empty(&uri, &token)).await.unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["approved"], true);

        // Approving again changes nothing and is not re-audited.
        let response = app.oneshot(post_empty(&uri, &token)).await.unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);

        let audit_conn = state.audit.get().unwrap();
        let count: i64 = audit_conn
            .query_row(
                "SELECT COUNT(*) FROM audit_logs WHERE action = 'approve_user'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1, "Only the first approval writes an audit row");
    }
}

// ============================================================================
// PLAN MANAGEMENT TESTS
// ============================================================================

mod plan_admin_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_plan_with_defaults() {
        let (app, state) = admin_setup();
        let (_, token) = admin_token(&state);

        let body = json!({
            "name": "Fiber 100",
            "category": "fiber",
            "price": 499.0,
            "speed_mbps": 100.0,
            "data_cap_gb": 500.0
        });
        let response = app
            .clone()
            .oneshot(post_json("/admin/plans", &token, &body))
            .await
            .unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["name"], "Fiber 100");
        assert_eq!(json["validity_days"], 30);
        assert_eq!(json["active"], true);
        assert_eq!(json["popularity_score"], 0);

        // Same name again is refused.
        let response = app.oneshot(post_json("/admin/plans", &token, &body)).await.unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::CONFLICT);
        let json = response_json(response).await;
        assert_eq!(json["details"], "Plan name already exists");
    }

    #[tokio::test]
    async fn test_create_plan_validates_numbers() {
        let (app, state) = admin_setup();
        let (_, token) = admin_token(&state);

        let body = json!({
            "name": "Broken",
            "category": "fiber",
            "price": -1.0,
            "speed_mbps": 100.0,
            "data_cap_gb": 500.0
        });
        let response = app.oneshot(post_json("/admin/plans", &token, &body)).await.unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_plans_can_include_inactive() {
        let (app, state) = admin_setup();
        let (_, token) = admin_token(&state);

        {
            let conn = state.db.get().unwrap();
            create_test_plan(&conn, "Live", "fiber", 499.0, 100.0, 500.0);
            let retired = create_test_plan(&conn, "Retired", "fiber", 399.0, 50.0, 300.0);
            queries::update_plan(
                &conn,
                &retired.id,
                &UpdatePlan {
                    name: None,
                    description: None,
                    category: None,
                    price: None,
                    speed_mbps: None,
                    data_cap_gb: None,
                    validity_days: None,
                    active: Some(false),
                    popularity_score: None,
                },
            )
            .unwrap();
        }

        let response = app
            .clone()
            .oneshot(get("/admin/plans", &token))
            .await
            .unwrap();
        let json = response_json(response).await;
        assert_eq!(json["total"], 1, "Inactive plans are hidden by default");

        let response = app
            .oneshot(get("/admin/plans?include_inactive=true", &token))
            .await
            .unwrap();
        let json = response_json(response).await;
        assert_eq!(json["total"], 2);
    }

    #[tokio::test]
    async fn test_get_plan_shows_inactive_to_admins() {
        let (app, state) = admin_setup();
        let (_, token) = admin_token(&state);

        let plan_id: String;
        {
            let conn = state.db.get().unwrap();
            let retired = create_test_plan(&conn, "Retired", "fiber", 399.0, 50.0, 300.0);
            queries::update_plan(
                &conn,
                &retired.id,
                &UpdatePlan {
                    name: None,
                    description: None,
                    category: None,
                    price: None,
                    speed_mbps: None,
                    data_cap_gb: None,
                    validity_days: None,
                    active: Some(false),
                    popularity_score: None,
                },
            )
            .unwrap();
            plan_id = retired.id.clone();
        }

        let response = app
            .oneshot(get(&format!("/admin/plans/{}", plan_id), &token))
            .await
            .unwrap();

        assert_eq!(
            response.status(),
            axum::http::StatusCode::OK,
            "Admins see retired plans that customers cannot"
        );
        let json = response_json(response).await;
        assert_eq!(json["active"], false);
    }

    #[tokio::test]
    async fn test_update_plan_rename_conflicts() {
        let (app, state) = admin_setup();
        let (_, token) = admin_token(&state);

        let b_id: String;
        {
            let conn = state.db.get().unwrap();
            create_test_plan(&conn, "Plan A", "fiber", 499.0, 100.0, 500.0);
            let b = create_test_plan(&conn, "Plan B", "fiber", 399.0, 50.0, 300.0);
            b_id = b.id.clone();
        }

        let uri = format!("/admin/plans/{}", b_id);
        let response = app
            .clone()
            .oneshot(put_json(&uri, &token, &json!({ "name": "Plan A" })))
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::CONFLICT);

        // Renaming to its own current name is fine.
        let response = app
            .oneshot(put_json(&uri, &token, &json!({ "name": "Plan B", "price": 379.0 })))
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["price"], 379.0);
    }

    #[tokio::test]
    async fn test_delete_plan_refuses_subscribed_plans() {
        let (app, state) = admin_setup();
        let (_, token) = admin_token(&state);

        let used_id: String;
        let unused_id: String;
        {
            let conn = state.db.get().unwrap();
            let user = create_test_customer(&conn, "subscriber@example.com");
            let used = create_test_plan(&conn, "Used", "fiber", 499.0, 100.0, 500.0);
            let unused = create_test_plan(&conn, "Unused", "fiber", 399.0, 50.0, 300.0);
            create_test_subscription(&conn, &user.id, &used.id);
            used_id = used.id.clone();
            unused_id = unused.id.clone();
        }

        let response = app
            .clone()
            .oneshot(delete(&format!("/admin/plans/{}", used_id), &token))
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::CONFLICT);
        let json = response_json(response).await;
        assert_eq!(json["details"], "Plan has subscriptions and cannot be deleted");

        let response = app
            .oneshot(delete(&format!("/admin/plans/{}", unused_id), &token))
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["success"], true);
    }
}

// ============================================================================
// SUBSCRIPTION OVERSIGHT TESTS
// ============================================================================

mod subscription_admin_tests {
    use super::*;

    #[tokio::test]
    async fn test_list_subscriptions_filters() {
        let (app, state) = admin_setup();
        let (_, token) = admin_token(&state);

        let alice_id: String;
        let plan_b_id: String;
        {
            let conn = state.db.get().unwrap();
            let alice = create_test_customer(&conn, "alice@example.com");
            let bob = create_test_customer(&conn, "bob@example.com");
            let plan_a = create_test_plan(&conn, "Plan A", "fiber", 499.0, 100.0, 500.0);
            let plan_b = create_test_plan(&conn, "Plan B", "dsl", 299.0, 40.0, 200.0);

            create_test_subscription(&conn, &alice.id, &plan_a.id);
            create_test_subscription(&conn, &alice.id, &plan_b.id);
            let canceled = create_test_subscription(&conn, &bob.id, &plan_a.id);
            queries::set_subscription_status(&conn, &canceled.id, SubscriptionStatus::Canceled, true)
                .unwrap();

            alice_id = alice.id.clone();
            plan_b_id = plan_b.id.clone();
        }

        let response = app
            .clone()
            .oneshot(get("/admin/subscriptions", &token))
            .await
            .unwrap();
        let json = response_json(response).await;
        assert_eq!(json["total"], 3);
        assert!(
            json["items"][0].get("plan_name").is_some(),
            "Listing carries the joined plan columns"
        );

        let response = app
            .clone()
            .oneshot(get(&format!("/admin/subscriptions?user_id={}", alice_id), &token))
            .await
            .unwrap();
        let json = response_json(response).await;
        assert_eq!(json["total"], 2);

        let response = app
            .clone()
            .oneshot(get("/admin/subscriptions?status=canceled", &token))
            .await
            .unwrap();
        let json = response_json(response).await;
        assert_eq!(json["total"], 1);
        assert_eq!(json["items"][0]["plan_name"], "Plan A");

        let response = app
            .oneshot(get(&format!("/admin/subscriptions?plan_id={}", plan_b_id), &token))
            .await
            .unwrap();
        let json = response_json(response).await;
        assert_eq!(json["total"], 1);
    }
}

// ============================================================================
// USAGE BACKFILL TESTS
// ============================================================================

mod usage_admin_tests {
    use super::*;

    #[tokio::test]
    async fn test_record_usage_for_customer() {
        let (app, state) = admin_setup();
        let (_, token) = admin_token(&state);

        let user_id: String;
        {
            let conn = state.db.get().unwrap();
            let user = create_test_customer(&conn, "customer@example.com");
            user_id = user.id.clone();
        }

        let body = json!({
            "user_id": user_id,
            "gb_used": 12.5,
            "day": days_ago(1).to_string()
        });
        let response = app.oneshot(post_json("/admin/usage", &token, &body)).await.unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["user_id"], user_id);
        assert_eq!(json["day"], days_ago(1).to_string());
        assert_eq!(json["gb_used"], 12.5);

        let audit_conn = state.audit.get().unwrap();
        let count: i64 = audit_conn
            .query_row(
                "SELECT COUNT(*) FROM audit_logs WHERE action = 'record_usage' AND actor_type = 'admin'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1, "The backfill is attributed to the admin");
    }

    #[tokio::test]
    async fn test_record_usage_unknown_user() {
        let (app, state) = admin_setup();
        let (_, token) = admin_token(&state);

        let body = json!({
            "user_id": "fd_usr_ffffffffffffffffffffffffffffffff",
            "gb_used": 5.0
        });
        let response = app.oneshot(post_json("/admin/usage", &token, &body)).await.unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
        let json = response_json(response).await;
        assert_eq!(json["details"], "User not found");
    }
}

// ============================================================================
// ANALYTICS TESTS
// ============================================================================

mod analytics_tests {
    use super::*;

    #[tokio::test]
    async fn test_overview_counts() {
        let (app, state) = admin_setup();
        let (_, token) = admin_token(&state);

        {
            let conn = state.db.get().unwrap();
            let customer = create_test_customer(&conn, "customer@example.com");
            create_test_user(&conn, "pending@example.com", Role::User, false);
            let plan = create_test_plan(&conn, "Fiber 100", "fiber", 499.0, 100.0, 500.0);
            create_test_subscription(&conn, &customer.id, &plan.id);
        }

        let response = app.oneshot(get("/admin/overview", &token)).await.unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["total_users"], 3);
        assert_eq!(json["total_admins"], 1);
        assert_eq!(json["total_customers"], 2);
        assert_eq!(json["pending_approvals"], 1);
        assert_eq!(json["total_plans"], 1);
        assert_eq!(json["active_subscriptions"], 1);
        assert_eq!(json["monthly_revenue"], 499.0);
    }

    #[tokio::test]
    async fn test_revenue_report() {
        let (app, state) = admin_setup();
        let (_, token) = admin_token(&state);

        {
            let conn = state.db.get().unwrap();
            let alice = create_test_customer(&conn, "alice@example.com");
            let bob = create_test_customer(&conn, "bob@example.com");
            let fiber = create_test_plan(&conn, "Fiber Pro", "fiber", 899.0, 300.0, 1000.0);
            create_test_plan(&conn, "DSL Basic", "dsl", 299.0, 40.0, 200.0);
            create_test_subscription(&conn, &alice.id, &fiber.id);
            create_test_subscription(&conn, &bob.id, &fiber.id);
        }

        let response = app
            .oneshot(get("/admin/analytics/revenue", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["monthly_revenue"], 1798.0);
        assert_eq!(json["lifetime_revenue"], 1798.0);

        let plans = json["plans"].as_array().unwrap();
        assert_eq!(plans.len(), 2, "Every plan appears, subscribed or not");
        assert_eq!(plans[0]["plan_name"], "Fiber Pro", "Ordered by monthly revenue");
        assert_eq!(plans[0]["active_subscribers"], 2);
        assert_eq!(plans[0]["monthly_revenue"], 1798.0);
    }
}

// ============================================================================
// AUDIT TRAIL TESTS
// ============================================================================

mod audit_log_tests {
    use super::*;

    #[tokio::test]
    async fn test_audit_log_query_and_text_render() {
        let (app, state) = admin_setup();
        let (_, token) = admin_token(&state);

        // Drive an audited action through the API so a real entry exists.
        let body = json!({
            "name": "Fiber 100",
            "category": "fiber",
            "price": 499.0,
            "speed_mbps": 100.0,
            "data_cap_gb": 500.0
        });
        let response = app
            .clone()
            .oneshot(post_json("/admin/plans", &token, &body))
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);

        let response = app
            .clone()
            .oneshot(get("/admin/audit-logs?action=create_plan", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["total"], 1);
        let entry = &json["items"][0];
        assert_eq!(entry["action"], "create_plan");
        assert_eq!(entry["actor_type"], "admin");
        assert_eq!(entry["resource_name"], "Fiber 100");
        assert!(
            entry["formatted"].as_str().unwrap().contains("created plan"),
            "Entries carry a human-readable rendering: {}",
            entry["formatted"]
        );

        // A filter that matches nothing returns an empty page.
        let response = app
            .clone()
            .oneshot(get("/admin/audit-logs?action=delete_plan", &token))
            .await
            .unwrap();
        let json = response_json(response).await;
        assert_eq!(json["total"], 0);

        // The text endpoint renders one line per entry.
        let response = app
            .oneshot(get("/admin/audit-logs/text", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("[Admin]"), "Text log should show the actor: {}", text);
        assert!(text.contains("created plan"));
    }
}
