//! Audit trail write, query, and retention tests

#[path = "../common/mod.rs"]
mod common;

use common::*;

use fiberdesk::models::{ActorType, AuditAction, AuditLogNames, AuditLogQuery};

fn write_log(
    conn: &rusqlite::Connection,
    actor_type: ActorType,
    user_id: Option<&str>,
    action: AuditAction,
) -> fiberdesk::models::AuditLog {
    let names = AuditLogNames {
        user_name: Some("Test Actor".to_string()),
        user_email: Some("actor@example.com".to_string()),
        resource_name: None,
    };
    queries::create_audit_log(
        conn,
        true,
        actor_type,
        user_id,
        action.as_ref(),
        "user",
        "fd_usr_00000000000000000000000000000000",
        Some(&serde_json::json!({ "note": "fixture" })),
        Some("127.0.0.1"),
        Some("test-agent"),
        &names,
    )
    .expect("Audit write failed")
}

// ============ Write Tests ============

#[test]
fn test_create_audit_log_persists_row() {
    let conn = setup_test_audit_db();

    let log = write_log(&conn, ActorType::Admin, Some("fd_usr_1"), AuditAction::CreateUser);
    assert!(log.id.starts_with("fd_log_"), "audit id should carry the fd_log_ prefix");

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM audit_logs", [], |row| row.get(0))
        .expect("Count failed");
    assert_eq!(count, 1);
}

#[test]
fn test_disabled_audit_log_skips_insert() {
    let conn = setup_test_audit_db();

    let log = queries::create_audit_log(
        &conn,
        false,
        ActorType::System,
        None,
        AuditAction::PurgeAuditLogs.as_ref(),
        "audit_log",
        "all",
        None,
        None,
        None,
        &AuditLogNames::default(),
    )
    .expect("Audit write failed");

    // The entry is still returned so callers can log it elsewhere.
    assert_eq!(log.action, "purge_audit_logs");

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM audit_logs", [], |row| row.get(0))
        .expect("Count failed");
    assert_eq!(count, 0, "disabled audit logging must not write rows");
}

// ============ Query Tests ============

#[test]
fn test_query_audit_logs_filters() {
    let conn = setup_test_audit_db();
    write_log(&conn, ActorType::Admin, Some("fd_usr_a"), AuditAction::CreateUser);
    write_log(&conn, ActorType::Admin, Some("fd_usr_a"), AuditAction::DeletePlan);
    write_log(&conn, ActorType::Customer, Some("fd_usr_b"), AuditAction::CreateSubscription);
    write_log(&conn, ActorType::Public, None, AuditAction::RegisterUser);

    let (all, total) =
        queries::query_audit_logs(&conn, &AuditLogQuery::default()).expect("Query failed");
    assert_eq!(all.len(), 4);
    assert_eq!(total, 4);

    let by_actor = AuditLogQuery {
        actor_type: Some(ActorType::Admin),
        ..Default::default()
    };
    let (admin_logs, total) = queries::query_audit_logs(&conn, &by_actor).expect("Query failed");
    assert_eq!(admin_logs.len(), 2);
    assert_eq!(total, 2);

    let by_action = AuditLogQuery {
        action: Some("create_subscription".to_string()),
        ..Default::default()
    };
    let (action_logs, total) = queries::query_audit_logs(&conn, &by_action).expect("Query failed");
    assert_eq!(action_logs.len(), 1);
    assert_eq!(action_logs[0].user_id.as_deref(), Some("fd_usr_b"));
    assert_eq!(total, 1);

    let by_user = AuditLogQuery {
        user_id: Some("fd_usr_a".to_string()),
        ..Default::default()
    };
    let (user_logs, total) = queries::query_audit_logs(&conn, &by_user).expect("Query failed");
    assert_eq!(user_logs.len(), 2);
    assert_eq!(total, 2);
}

#[test]
fn test_query_audit_logs_time_range_and_pagination() {
    let conn = setup_test_audit_db();
    for _ in 0..5 {
        write_log(&conn, ActorType::Admin, Some("fd_usr_a"), AuditAction::UpdatePlan);
    }
    // Backdate two rows well outside any recent window.
    conn.execute(
        "UPDATE audit_logs SET timestamp = timestamp - 86400
         WHERE id IN (SELECT id FROM audit_logs LIMIT 2)",
        [],
    )
    .expect("Backdate failed");

    let now = chrono::Utc::now().timestamp();
    let recent = AuditLogQuery {
        from_timestamp: Some(now - 3600),
        ..Default::default()
    };
    let (recent_logs, total) = queries::query_audit_logs(&conn, &recent).expect("Query failed");
    assert_eq!(recent_logs.len(), 3, "backdated rows fall outside the window");
    assert_eq!(total, 3);

    let old = AuditLogQuery {
        to_timestamp: Some(now - 3600),
        ..Default::default()
    };
    let (old_logs, total) = queries::query_audit_logs(&conn, &old).expect("Query failed");
    assert_eq!(old_logs.len(), 2);
    assert_eq!(total, 2);

    let page = AuditLogQuery {
        limit: Some(2),
        offset: Some(2),
        ..Default::default()
    };
    let (page_logs, total) = queries::query_audit_logs(&conn, &page).expect("Query failed");
    assert_eq!(page_logs.len(), 2, "limit should cap the page");
    assert_eq!(total, 5, "total should span all matching rows");
}

#[test]
fn test_formatted_line_carries_actor_and_action() {
    let conn = setup_test_audit_db();
    let log = write_log(&conn, ActorType::Admin, Some("fd_usr_a"), AuditAction::CreatePlan);

    let line = log.formatted();
    assert!(line.contains("[Admin]"), "line should show the actor type: {}", line);
    assert!(line.contains("\"Test Actor\""), "line should quote the actor name: {}", line);
    assert!(line.starts_with('['), "line should start with a timestamp: {}", line);
}

// ============ Retention Tests ============

#[test]
fn test_purge_audit_logs_before_cutoff() {
    let conn = setup_test_audit_db();
    for _ in 0..4 {
        write_log(&conn, ActorType::System, None, AuditAction::SeedDemoData);
    }
    conn.execute(
        "UPDATE audit_logs SET timestamp = timestamp - 864000
         WHERE id IN (SELECT id FROM audit_logs LIMIT 3)",
        [],
    )
    .expect("Backdate failed");

    let cutoff = chrono::Utc::now().timestamp() - 86400;
    let purged = queries::purge_audit_logs_before(&conn, cutoff).expect("Purge failed");
    assert_eq!(purged, 3, "only rows older than the cutoff are purged");

    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM audit_logs", [], |row| row.get(0))
        .expect("Count failed");
    assert_eq!(remaining, 1);
}
