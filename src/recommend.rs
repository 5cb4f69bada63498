//! Plan recommendation scoring.
//!
//! Ranks the active catalog for one customer by combining five weighted
//! sub-scores: data adequacy, speed adequacy, price efficiency, budget fit,
//! and a small popularity bonus. The customer side of the input is a single
//! number, the projected monthly usage in GB derived from their trailing
//! 30-day usage sample.

use serde::Serialize;

use crate::models::Plan;

const DATA_WEIGHT: f64 = 0.30;
const SPEED_WEIGHT: f64 = 0.25;
const PRICE_WEIGHT: f64 = 0.20;
const BUDGET_WEIGHT: f64 = 0.20;
const POPULARITY_WEIGHT: f64 = 0.05;

/// Headroom factor: a cap only counts as adequate when it covers the
/// projection with 20% to spare.
const CAP_HEADROOM: f64 = 1.2;

/// Per-plan sub-scores, returned alongside the total so the portal can
/// show why a plan ranked where it did.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreBreakdown {
    pub data_adequacy: f64,
    pub speed_adequacy: f64,
    pub price_efficiency: f64,
    pub budget_fit: f64,
    pub popularity_bonus: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanRecommendation {
    pub plan: Plan,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Project a trailing usage window onto a 30-day month.
///
/// Days without a log row are not averaged in: three logged days totalling
/// 30 GB project to 300 GB/month, however sparse the window. No logged days
/// projects to zero.
pub fn monthly_projection(window_total_gb: f64, days_logged: i64) -> f64 {
    if days_logged <= 0 {
        return 0.0;
    }
    (window_total_gb / days_logged as f64) * 30.0
}

/// Score a single plan against a usage projection and optional budget.
pub fn score_plan(plan: &Plan, monthly_projection: f64, budget: Option<f64>) -> ScoreBreakdown {
    let data_adequacy = if plan.data_cap_gb >= CAP_HEADROOM * monthly_projection {
        1.0
    } else {
        0.5
    };

    // Speed demand floors at 50 Mbps so light users still get ranked
    // against a real baseline.
    let speed_demand = (0.5 * monthly_projection).max(50.0);
    let speed_adequacy = (plan.speed_mbps / speed_demand).min(1.0);

    let price_efficiency = 1.0 / (1.0 + (plan.price - 500.0) / 1000.0);

    // Customers without a configured budget are not penalized.
    let budget_fit = match budget {
        Some(budget) if plan.price > budget => 0.3,
        _ => 1.0,
    };

    let popularity_bonus = (plan.popularity_score as f64 / 100.0).min(0.3);

    ScoreBreakdown {
        data_adequacy,
        speed_adequacy,
        price_efficiency,
        budget_fit,
        popularity_bonus,
    }
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        DATA_WEIGHT * self.data_adequacy
            + SPEED_WEIGHT * self.speed_adequacy
            + PRICE_WEIGHT * self.price_efficiency
            + BUDGET_WEIGHT * self.budget_fit
            + POPULARITY_WEIGHT * self.popularity_bonus
    }
}

/// Rank plans for a customer, best first.
///
/// Plans must arrive in catalog fetch order: the sort is stable, so equal
/// scores keep that order.
pub fn recommend_plans(
    plans: Vec<Plan>,
    monthly_projection: f64,
    budget: Option<f64>,
) -> Vec<PlanRecommendation> {
    let mut recommendations: Vec<PlanRecommendation> = plans
        .into_iter()
        .map(|plan| {
            let breakdown = score_plan(&plan, monthly_projection, budget);
            PlanRecommendation {
                score: breakdown.total(),
                breakdown,
                plan,
            }
        })
        .collect();

    recommendations.sort_by(|a, b| b.score.total_cmp(&a.score));
    recommendations
}
