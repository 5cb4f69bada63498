use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::sync::Arc;
use std::time::Duration;

use fiberdesk::config::Config;
use fiberdesk::crypto::hash_password;
use fiberdesk::db::{AppState, create_pool, init_audit_db, init_db, queries};
use fiberdesk::handlers;
use fiberdesk::models::{self, ActorType, AuditAction, AuditLogNames, CreateUser, Role};
use fiberdesk::rate_limit::LoginRateLimiter;
use fiberdesk::util::SECONDS_PER_DAY;

#[derive(Parser, Debug)]
#[command(name = "fiberdesk")]
#[command(about = "Self-service portal API for broadband subscriptions")]
struct Cli {
    /// Seed the database with dev data (admin, customer, plan catalog, usage history)
    #[arg(long)]
    seed: bool,

    /// Delete databases on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

/// Creates the first admin account when the users table has none.
/// The password comes from BOOTSTRAP_ADMIN_PASSWORD, or is generated and
/// printed once.
fn bootstrap_admin(state: &AppState, email: &str, password: Option<&str>) {
    let conn = state.db.get().expect("Failed to get db connection for bootstrap");
    let audit_conn = state.audit.get().expect("Failed to get audit db connection");

    let count = queries::count_admins(&conn).expect("Failed to count admins");
    if count > 0 {
        tracing::info!("Admins already exist, skipping bootstrap");
        return;
    }

    let generated;
    let password: &str = match password {
        Some(p) => p,
        None => {
            generated = uuid::Uuid::new_v4().as_simple().to_string();
            &generated
        }
    };

    let input = CreateUser {
        email: email.to_string(),
        name: "Bootstrap Admin".to_string(),
        password: password.to_string(),
        role: Role::Admin,
        approved: Some(true),
        phone: None,
        address: None,
        budget_limit: None,
    };

    let password_hash = hash_password(&input.password).expect("Failed to hash bootstrap password");
    let admin = queries::create_user(&conn, &input, &password_hash)
        .expect("Failed to create bootstrap admin");

    queries::create_audit_log(
        &audit_conn,
        state.audit_log_enabled,
        ActorType::System,
        None,
        AuditAction::BootstrapAdmin.as_ref(),
        "user",
        &admin.id,
        Some(&serde_json::json!({
            "email": email,
            "role": "admin",
        })),
        None,
        None,
        &AuditLogNames::default().resource(admin.name.clone()),
    )
    .expect("Failed to create audit log for bootstrap");

    tracing::info!("============================================");
    tracing::info!("BOOTSTRAP ADMIN CREATED");
    tracing::info!("Email: {}", email);
    tracing::info!("Password: {}", password);
    tracing::info!("============================================");
    tracing::info!("SAVE THIS PASSWORD - IT WILL NOT BE SHOWN AGAIN");
    tracing::info!("============================================");
}

/// Seeds the database with dev data for testing.
/// Creates: admin, approved customer, plan catalog, one subscription, and
/// two weeks of usage history so the forecast and recommendation endpoints
/// have something to chew on. Only runs in dev mode and when the database
/// is empty.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");
    let audit_conn = state.audit.get().expect("Failed to get audit db connection");

    // Check if already seeded (any users exist)
    let count = queries::count_users(&conn).expect("Failed to count users");
    if count > 0 {
        tracing::info!("Database already has data, skipping seed");
        return;
    }

    tracing::info!("============================================");
    tracing::info!("SEEDING DEV DATA");
    tracing::info!("============================================");

    // 1. Admin account
    let admin_email = "admin@fiberdesk.local";
    let admin_password = "admin-dev-password";
    let admin_input = CreateUser {
        email: admin_email.to_string(),
        name: "Dev Admin".to_string(),
        password: admin_password.to_string(),
        role: Role::Admin,
        approved: Some(true),
        phone: None,
        address: None,
        budget_limit: None,
    };
    let admin_hash = hash_password(admin_password).expect("Failed to hash seed password");
    let admin = queries::create_user(&conn, &admin_input, &admin_hash)
        .expect("Failed to create dev admin");
    tracing::info!("Admin: {} ({})", admin.email, admin.name);

    // 2. Approved customer with a budget
    let customer_email = "demo@fiberdesk.local";
    let customer_password = "demo-dev-password";
    let customer_input = CreateUser {
        email: customer_email.to_string(),
        name: "Demo Customer".to_string(),
        password: customer_password.to_string(),
        role: Role::User,
        approved: Some(true),
        phone: Some("555-0100".to_string()),
        address: Some("1 Harbor Lane".to_string()),
        budget_limit: Some(900.0),
    };
    let customer_hash = hash_password(customer_password).expect("Failed to hash seed password");
    let customer = queries::create_user(&conn, &customer_input, &customer_hash)
        .expect("Failed to create dev customer");
    tracing::info!("Customer: {} ({})", customer.email, customer.name);

    // 3. Plan catalog
    let catalog: [(&str, &str, f64, f64, f64); 4] = [
        ("Fiber Starter", "fiber", 499.0, 100.0, 500.0),
        ("Fiber Pro", "fiber", 899.0, 300.0, 1000.0),
        ("DSL Basic", "dsl", 299.0, 40.0, 200.0),
        ("Air 5G", "wireless", 649.0, 150.0, 400.0),
    ];
    let mut first_plan = None;
    for (name, category, price, speed_mbps, data_cap_gb) in catalog {
        let plan = queries::create_plan(
            &conn,
            &models::CreatePlan {
                name: name.to_string(),
                description: None,
                category: category.to_string(),
                price,
                speed_mbps,
                data_cap_gb,
                validity_days: None,
                active: None,
            },
        )
        .expect("Failed to create dev plan");
        tracing::info!("Plan: {} ({} Mbps, {} GB, {})", plan.name, speed_mbps, data_cap_gb, price);
        first_plan.get_or_insert(plan);
    }
    let plan = first_plan.expect("Seed catalog is never empty");

    // 4. Subscribe the customer to the first plan
    let subscription = queries::create_subscription(&conn, &customer.id, &plan.id)
        .expect("Failed to create dev subscription");
    queries::increment_plan_popularity(&conn, &plan.id)
        .expect("Failed to bump plan popularity");
    tracing::info!("Subscription: {} on {}", customer.email, plan.name);

    // 5. Two weeks of usage with a mild upward trend
    let today = queries::today();
    for i in 0..14 {
        let day = today - chrono::Duration::days(13 - i);
        let gb = 8.0 + 0.3 * i as f64;
        queries::record_usage(&conn, &customer.id, Some(&subscription.id), day, gb)
            .expect("Failed to record dev usage");
    }
    tracing::info!("Usage: 14 days recorded for {}", customer.email);

    queries::create_audit_log(
        &audit_conn,
        state.audit_log_enabled,
        ActorType::System,
        None,
        AuditAction::SeedDemoData.as_ref(),
        "database",
        "seed",
        Some(&serde_json::json!({
            "users": 2,
            "plans": 4,
            "subscriptions": 1,
            "usage_days": 14,
        })),
        None,
        None,
        &AuditLogNames::default(),
    )
    .expect("Failed to create audit log for seed");

    tracing::info!("============================================");
    tracing::info!("DEV DATA SEEDED SUCCESSFULLY");
    tracing::info!("============================================");

    // Print copy-paste friendly output (no log formatting)
    println!();
    println!("--- DEV CREDENTIALS ---");
    println!("  admin_email: {}", admin_email);
    println!("  admin_password: {}", admin_password);
    println!("  customer_email: {}", customer_email);
    println!("  customer_password: {}", customer_password);
    println!("--- END ---");
    println!();
}

/// Spawns a background task that periodically deletes expired and revoked
/// sessions and trims the login attempt limiter.
fn spawn_cleanup_task(state: AppState) {
    tokio::spawn(async move {
        let interval = Duration::from_secs(15 * 60); // 15 minutes

        loop {
            tokio::time::sleep(interval).await;

            match state.db.get() {
                Ok(conn) => match queries::delete_dead_sessions(&conn) {
                    Ok(count) => {
                        if count > 0 {
                            tracing::debug!("Cleaned up {} dead sessions", count);
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to clean up sessions: {}", e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to get db connection for cleanup: {}", e);
                }
            }

            state.login_limiter.cleanup();
        }
    });

    tracing::info!("Background cleanup task started (runs every 15 minutes)");
}

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fiberdesk=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    // Create database connection pools
    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    let audit_pool =
        create_pool(&config.audit_database_path).expect("Failed to create audit database pool");

    // Initialize database schemas
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }
    {
        let conn = audit_pool.get().expect("Failed to get audit connection");
        init_audit_db(&conn).expect("Failed to initialize audit database");
    }

    let state = AppState {
        db: db_pool,
        audit: audit_pool,
        audit_log_enabled: config.audit_log_enabled,
        session_ttl_secs: config.session_ttl_days * SECONDS_PER_DAY,
        login_limiter: Arc::new(LoginRateLimiter::default()),
    };

    // Purge old audit logs on startup (0 = never purge)
    if config.audit_log_retention_days > 0 {
        let conn = state.audit.get().expect("Failed to get audit connection for purge");
        let cutoff = chrono::Utc::now().timestamp()
            - config.audit_log_retention_days * SECONDS_PER_DAY;
        match queries::purge_audit_logs_before(&conn, cutoff) {
            Ok(count) if count > 0 => {
                tracing::info!(
                    "Purged {} audit log entries older than {} days",
                    count,
                    config.audit_log_retention_days
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Failed to purge old audit logs: {}", e);
            }
        }
    }

    // Seed dev data if --seed flag is passed (only in dev mode)
    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set FIBERDESK_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    // Bootstrap first admin if configured (fallback for non-seed usage)
    if let Some(ref email) = config.bootstrap_admin_email {
        bootstrap_admin(&state, email, config.bootstrap_admin_password.as_deref());
    }

    // Start background cleanup task for dead sessions
    spawn_cleanup_task(state.clone());

    // Build the application router
    let app = Router::new()
        // Public endpoints (no auth)
        .merge(handlers::public::router(config.rate_limit))
        // Customer portal (session auth)
        .merge(handlers::portal::router(state.clone()))
        // Admin API (session auth + admin role)
        .merge(handlers::admin::router(state.clone()));

    let app = app.layer(TraceLayer::new_for_http()).with_state(state);

    // Start the server
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    // Track if we should clean up on exit
    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    let db_path = config.database_path.clone();
    let audit_path = config.audit_database_path.clone();

    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: databases will be deleted on exit");
    }

    tracing::info!("Fiberdesk server listening on {}", addr);

    // Run server with graceful shutdown
    // Use into_make_service_with_connect_info to enable IP-based rate limiting
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Failed to start server");

    // Cleanup on exit if ephemeral mode
    if cleanup_on_exit {
        tracing::info!("Cleaning up ephemeral databases...");
        if let Err(e) = std::fs::remove_file(&db_path) {
            tracing::warn!("Failed to remove {}: {}", db_path, e);
        } else {
            tracing::info!("Removed {}", db_path);
        }
        if let Err(e) = std::fs::remove_file(&audit_path) {
            tracing::warn!("Failed to remove {}: {}", audit_path, e);
        } else {
            tracing::info!("Removed {}", audit_path);
        }
        // Also remove WAL and SHM files if they exist
        let _ = std::fs::remove_file(format!("{}-wal", db_path));
        let _ = std::fs::remove_file(format!("{}-shm", db_path));
        let _ = std::fs::remove_file(format!("{}-wal", audit_path));
        let _ = std::fs::remove_file(format!("{}-shm", audit_path));
        tracing::info!("Ephemeral cleanup complete");
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
