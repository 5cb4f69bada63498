//! Aggregate reporting query tests

#[path = "../common/mod.rs"]
mod common;

use common::*;

fn seed_reporting_fixture(conn: &rusqlite::Connection) {
    create_test_admin(conn, "admin@example.com");
    let alice = create_test_customer(conn, "alice@example.com");
    let bob = create_test_customer(conn, "bob@example.com");
    create_test_user(conn, "pending@example.com", Role::User, false);

    let fiber = create_test_plan(conn, "Fiber Pro", "fiber", 899.0, 300.0, 1000.0);
    let dsl = create_test_plan(conn, "DSL Basic", "dsl", 299.0, 40.0, 200.0);
    let legacy = create_test_plan(conn, "Legacy", "dsl", 199.0, 20.0, 100.0);
    queries::update_plan(
        conn,
        &legacy.id,
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
    .expect("Update failed");

    create_test_subscription(conn, &alice.id, &fiber.id);
    create_test_subscription(conn, &bob.id, &fiber.id);
    let stopped = create_test_subscription(conn, &bob.id, &dsl.id);
    queries::set_subscription_status(conn, &stopped.id, SubscriptionStatus::Stopped, false)
        .expect("Update failed");
    let canceled = create_test_subscription(conn, &alice.id, &dsl.id);
    queries::set_subscription_status(conn, &canceled.id, SubscriptionStatus::Canceled, true)
        .expect("Update failed");
}

// ============ Overview Tests ============

#[test]
fn test_admin_overview_counts() {
    let conn = setup_test_db();
    seed_reporting_fixture(&conn);

    let overview = queries::admin_overview(&conn).expect("Query failed");

    assert_eq!(overview.total_users, 4);
    assert_eq!(overview.total_admins, 1);
    assert_eq!(overview.total_customers, 3);
    assert_eq!(overview.pending_approvals, 1);
    assert_eq!(overview.total_plans, 3);
    assert_eq!(overview.active_plans, 2);
    assert_eq!(overview.total_subscriptions, 4);
    assert_eq!(overview.active_subscriptions, 2);
    assert_eq!(overview.stopped_subscriptions, 1);
    assert_eq!(overview.monthly_revenue, 1798.0, "two active Fiber Pro subscribers");
    assert_eq!(
        overview.lifetime_revenue, 2396.0,
        "every subscription ever taken counts toward lifetime revenue"
    );
}

#[test]
fn test_admin_overview_on_empty_database() {
    let conn = setup_test_db();

    let overview = queries::admin_overview(&conn).expect("Query failed");

    assert_eq!(overview.total_users, 0);
    assert_eq!(overview.total_plans, 0);
    assert_eq!(overview.total_subscriptions, 0);
    assert_eq!(overview.monthly_revenue, 0.0);
    assert_eq!(overview.lifetime_revenue, 0.0);
}

// ============ Revenue Report Tests ============

#[test]
fn test_revenue_report_per_plan_breakdown() {
    let conn = setup_test_db();
    seed_reporting_fixture(&conn);

    let report = queries::revenue_report(&conn).expect("Query failed");

    assert_eq!(report.plans.len(), 3, "every plan appears, subscribed or not");
    assert_eq!(
        report.plans[0].plan_name, "Fiber Pro",
        "plans should be ordered by monthly revenue"
    );

    let fiber = &report.plans[0];
    assert_eq!(fiber.active_subscribers, 2);
    assert_eq!(fiber.total_subscribers, 2);
    assert_eq!(fiber.monthly_revenue, 1798.0);

    let dsl = report
        .plans
        .iter()
        .find(|p| p.plan_name == "DSL Basic")
        .expect("DSL Basic missing from report");
    assert_eq!(dsl.active_subscribers, 0);
    assert_eq!(dsl.stopped_subscribers, 1);
    assert_eq!(dsl.canceled_subscribers, 1);
    assert_eq!(dsl.total_subscribers, 2);
    assert_eq!(dsl.monthly_revenue, 0.0, "stopped subscribers do not bill");

    let legacy = report
        .plans
        .iter()
        .find(|p| p.plan_name == "Legacy")
        .expect("Legacy missing from report");
    assert_eq!(legacy.total_subscribers, 0, "unsubscribed plans report zeros");

    assert_eq!(report.monthly_revenue, 1798.0);
    assert_eq!(report.lifetime_revenue, 2396.0);
}

#[test]
fn test_revenue_report_on_empty_database() {
    let conn = setup_test_db();

    let report = queries::revenue_report(&conn).expect("Query failed");

    assert!(report.plans.is_empty());
    assert_eq!(report.monthly_revenue, 0.0);
    assert_eq!(report.lifetime_revenue, 0.0);
}
