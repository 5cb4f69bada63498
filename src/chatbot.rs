//! Rule-based support chatbot.
//!
//! A fixed-priority keyword table: the customer's message is lowercased and
//! tokenized, and the first rule with any matching keyword wins. Specific
//! topics sit above generic ones so "how do I cancel my plan" routes to
//! cancellation, not the plan catalog. No rule matching falls through to a
//! help reply listing the topics the bot knows.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

const MAX_MESSAGE_LEN: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    pub message: String,
}

impl ChatMessage {
    pub fn validate(&self) -> Result<()> {
        if self.message.trim().is_empty() {
            return Err(AppError::BadRequest("Message must not be empty".into()));
        }
        if self.message.len() > MAX_MESSAGE_LEN {
            return Err(AppError::BadRequest(format!(
                "Message must be at most {} characters",
                MAX_MESSAGE_LEN
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub topic: &'static str,
    pub reply: &'static str,
}

struct Rule {
    topic: &'static str,
    keywords: &'static [&'static str],
    reply: &'static str,
}

/// Priority-ordered rule table; earlier rules win.
const RULES: &[Rule] = &[
    Rule {
        topic: "cancellation",
        keywords: &["cancel", "cancellation", "canceled", "terminate", "quit"],
        reply: "You can cancel any subscription from the portal: open the subscription and choose Cancel. Canceled plans keep their history and you can re-subscribe later. There is no cancellation fee.",
    },
    Rule {
        topic: "pause_resume",
        keywords: &["pause", "paused", "stop", "stopped", "resume", "restart", "hold"],
        reply: "Pausing stops a subscription without losing it: open the subscription and choose Pause, then Resume whenever you are ready. Paused plans do not count towards your monthly cost.",
    },
    Rule {
        topic: "billing",
        keywords: &["bill", "billing", "invoice", "payment", "pay", "charge", "charged"],
        reply: "Your monthly cost is the sum of your active plan prices. The dashboard shows the monthly figure next to your lifetime spend. Paused and canceled subscriptions are not billed.",
    },
    Rule {
        topic: "usage",
        keywords: &["data", "usage", "cap", "caps", "limit", "gb", "quota", "forecast"],
        reply: "Track data on the usage page: log your daily GB, see a 30-day summary against your plan caps, and get a usage forecast once seven days are logged.",
    },
    Rule {
        topic: "speed",
        keywords: &["speed", "slow", "fast", "mbps", "bandwidth", "lag", "latency"],
        reply: "Every plan lists its speed in Mbps. If your connection feels slow, check whether you are near your data cap on the usage page, or browse higher-speed plans in the catalog.",
    },
    Rule {
        topic: "plans",
        keywords: &["plan", "plans", "price", "prices", "pricing", "cost", "upgrade", "recommend", "recommendation", "subscribe"],
        reply: "Browse the catalog on the plans page and filter by category. The recommendations page ranks plans against your recent usage and your budget limit.",
    },
    Rule {
        topic: "approval",
        keywords: &["approval", "approve", "approved", "pending", "activation"],
        reply: "New accounts wait for administrator approval before they can sign in. You will be able to log in as soon as an administrator approves your account.",
    },
    Rule {
        topic: "greeting",
        keywords: &["hello", "hi", "hey", "greetings", "morning", "evening"],
        reply: "Hello! I can help with plans and pricing, data usage, billing, pausing or canceling subscriptions, and account questions. What do you need?",
    },
    Rule {
        topic: "support",
        keywords: &["help", "support", "agent", "human", "contact", "person"],
        reply: "For anything I cannot answer, write to support@fiberdesk.example and the team will pick it up. Meanwhile I can answer questions about plans, usage, and billing.",
    },
];

const FALLBACK: ChatReply = ChatReply {
    topic: "fallback",
    reply: "I did not catch that. I can help with: plans and pricing, internet speed, data usage and caps, billing, pausing or resuming service, cancellation, and account approval.",
};

/// Single-word keywords match whole tokens so "hi" cannot fire inside
/// "this"; phrases match as substrings.
fn keyword_matches(message: &str, keyword: &str) -> bool {
    if keyword.contains(' ') {
        message.contains(keyword)
    } else {
        message
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == keyword)
    }
}

/// Produce the bot's reply for a customer message.
pub fn reply_to(message: &str) -> ChatReply {
    let message = message.to_lowercase();
    for rule in RULES {
        if rule
            .keywords
            .iter()
            .any(|keyword| keyword_matches(&message, keyword))
        {
            return ChatReply {
                topic: rule.topic,
                reply: rule.reply,
            };
        }
    }
    FALLBACK
}
