//! Promotes active alerts whose condition holds against current prices.
//!
//! Evaluation is a two-phase transaction on the store: triggers are planned
//! under the read lock, then committed under the write lock. The commit
//! re-checks membership, so an alert that left the active list between the
//! two phases is skipped without error.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use chrono::Utc;

use crate::{
    models::{Alert, Notification},
    services::{
        hub::{Delivery, HubEvent, NotificationHub},
        store::{MarketState, SharedMarketStore},
    },
};

#[derive(Debug, Clone, PartialEq)]
pub struct PendingTrigger {
    pub alert_id: String,
    pub notification: Notification,
}

/// Triggers found in phase one, per user, in discovery order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerPlan {
    pub users: Vec<(String, Vec<PendingTrigger>)>,
}

impl TriggerPlan {
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn len(&self) -> usize {
        self.users.iter().map(|(_, t)| t.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Promotion {
    pub user_id: String,
    pub promoted: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationReport {
    pub planned: usize,
    pub promotions: Vec<Promotion>,
    /// Hub deliveries summed over every signalled user.
    pub delivery: Delivery,
}

impl EvaluationReport {
    pub fn promoted(&self) -> usize {
        self.promotions.iter().map(|p| p.promoted).sum()
    }
}

// Smallest amount whose eight-decimal form keeps two significant digits.
const EIGHT_DECIMAL_FLOOR: f64 = 1e-7;

/// Renders an amount for notification text.
///
/// `>= 1` uses two decimals, sub-unit amounts up to eight decimals with
/// trailing zeros trimmed, and amounts too small for that use scientific
/// notation with two decimals.
pub fn format_amount(amount: f64) -> String {
    let abs = amount.abs();

    if amount == 0.0 || abs >= 1.0 {
        return format!("{amount:.2}");
    }

    if abs >= EIGHT_DECIMAL_FLOOR {
        let s = format!("{amount:.8}");
        // rounded up to a whole unit
        if !s.trim_start_matches('-').starts_with('0') {
            return format!("{amount:.2}");
        }
        return s.trim_end_matches('0').trim_end_matches('.').to_string();
    }

    format!("{amount:.2e}")
}

pub fn render_message(alert: &Alert) -> String {
    format!(
        "{} went {} ${}",
        alert.symbol,
        alert.direction,
        format_amount(alert.threshold)
    )
}

/// Phase one. Reads only; users are visited in identity order.
pub fn plan_triggers(state: &MarketState, now: i64) -> TriggerPlan {
    let mut users: Vec<_> = state.users().collect();
    users.sort_by(|a, b| a.id.cmp(&b.id));

    let mut plan = TriggerPlan::default();

    for user in users {
        let mut pending = Vec::new();

        for alert in &user.active_alerts {
            let Some(price) = state.price(alert.asset_class, &alert.symbol) else {
                continue;
            };

            if !alert.is_met_by(price) {
                continue;
            }

            tracing::info!(
                user = %user.id,
                class = %alert.asset_class,
                symbol = %alert.symbol,
                price,
                threshold = alert.threshold,
                direction = %alert.direction,
                "alert condition met"
            );

            pending.push(PendingTrigger {
                alert_id: alert.id.clone(),
                notification: Notification {
                    alert_id: alert.id.clone(),
                    created_at: now,
                    message: render_message(alert),
                },
            });
        }

        if !pending.is_empty() {
            plan.users.push((user.id.clone(), pending));
        }
    }

    plan
}

/// Phase two. Moves planned alerts from active to triggered and appends
/// their notifications. Ids no longer active are ignored, and so are their
/// notifications.
pub fn apply_triggers(state: &mut MarketState, plan: TriggerPlan) -> Vec<Promotion> {
    let mut promotions = Vec::new();

    for (user_id, pending) in plan.users {
        let Some(user) = state.user_mut(&user_id) else {
            continue;
        };

        let wanted: HashSet<&str> = pending.iter().map(|p| p.alert_id.as_str()).collect();

        let (removed, remaining): (Vec<Alert>, Vec<Alert>) = std::mem::take(&mut user.active_alerts)
            .into_iter()
            .partition(|a| wanted.contains(a.id.as_str()));
        user.active_alerts = remaining;

        let mut removed: HashMap<String, Alert> =
            removed.into_iter().map(|a| (a.id.clone(), a)).collect();

        let mut promoted = 0;
        for trigger in pending {
            let Some(alert) = removed.remove(&trigger.alert_id) else {
                tracing::debug!(user = %user_id, alert = %trigger.alert_id, "alert no longer active, skipping");
                continue;
            };
            user.triggered_alerts.push(alert);
            user.notifications.push(trigger.notification);
            promoted += 1;
        }

        if promoted > 0 {
            promotions.push(Promotion { user_id, promoted });
        }
    }

    promotions
}

pub struct TriggerEvaluator {
    store: Arc<SharedMarketStore>,
    hub: NotificationHub,
}

impl TriggerEvaluator {
    pub fn new(store: Arc<SharedMarketStore>, hub: NotificationHub) -> Self {
        Self { store, hub }
    }

    /// Runs both phases, then signals each affected user once. A cycle
    /// that triggers nothing never takes the write lock.
    pub fn evaluate(&self) -> EvaluationReport {
        let now = Utc::now().timestamp();
        let mut planned = 0;

        let promotions = self
            .store
            .transact(
                |state| {
                    let plan = plan_triggers(state, now);
                    planned = plan.len();
                    (!plan.is_empty()).then_some(plan)
                },
                apply_triggers,
            )
            .unwrap_or_default();

        let mut delivery = Delivery::default();
        for p in &promotions {
            let sent = self.hub.publish(&p.user_id, HubEvent::alerts_updated());
            tracing::debug!(
                user = %p.user_id,
                promoted = p.promoted,
                delivered = sent.delivered,
                dropped = sent.dropped,
                "published alerts update"
            );
            delivery.delivered += sent.delivered;
            delivery.dropped += sent.dropped;
        }

        EvaluationReport {
            planned,
            promotions,
            delivery,
        }
    }
}
