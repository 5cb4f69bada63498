//! Gamification badges.
//!
//! Badges are evaluated on demand from the customer's own aggregates;
//! nothing is stored, so they can never drift out of sync with the data
//! they describe.

use serde::Serialize;

/// Aggregates a badge evaluation runs over. All lifetime numbers except
/// `days_logged_last_30`, which looks at the trailing 30 days only.
#[derive(Debug, Clone, Copy, Default)]
pub struct BadgeInputs {
    pub total_subscriptions: i64,
    pub active_subscriptions: i64,
    pub distinct_categories: i64,
    pub days_logged_last_30: i64,
    pub lifetime_gb: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Badge {
    pub code: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub earned: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AchievementReport {
    pub badges: Vec<Badge>,
    pub earned_count: usize,
    pub total_count: usize,
}

/// Evaluate every badge against the customer's aggregates.
pub fn evaluate_badges(inputs: &BadgeInputs) -> AchievementReport {
    let badges = vec![
        Badge {
            code: "first_connection",
            title: "First Connection",
            description: "Subscribed to your first plan",
            earned: inputs.total_subscriptions >= 1,
        },
        Badge {
            code: "plan_collector",
            title: "Plan Collector",
            description: "Took three or more subscriptions",
            earned: inputs.total_subscriptions >= 3,
        },
        Badge {
            code: "category_explorer",
            title: "Category Explorer",
            description: "Tried plans from two different categories",
            earned: inputs.distinct_categories >= 2,
        },
        Badge {
            code: "consistent_logger",
            title: "Consistent Logger",
            description: "Logged usage on seven days in the last month",
            earned: inputs.days_logged_last_30 >= 7,
        },
        Badge {
            code: "century_club",
            title: "Century Club",
            description: "Passed 100 GB of lifetime usage",
            earned: inputs.lifetime_gb >= 100.0,
        },
        Badge {
            code: "always_on",
            title: "Always On",
            description: "Currently holding an active subscription",
            earned: inputs.active_subscriptions >= 1,
        },
    ];

    let earned_count = badges.iter().filter(|b| b.earned).count();
    let total_count = badges.len();
    AchievementReport {
        badges,
        earned_count,
        total_count,
    }
}
