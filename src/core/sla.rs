//! SLA/risk classification
//!
//! Classification is derived from the due date and a caller-supplied `now`
//! every time it is asked for. It is never stored on an entity.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::entity::TrackedEntity;
use crate::core::filter::{FacetDef, FieldValue, Filterable};
use crate::core::workflow::{WorkflowKind, WorkflowRegistry, WorkflowState};

named_enum! {
    /// Urgency badge for a tracked entity
    pub enum SlaStatus {
        OnTrack => "on_track",
        AtRisk => "at_risk",
        Overdue => "overdue",
    }
}

/// Default number of days before the due date at which work is at risk
pub const DEFAULT_RISK_WINDOW_DAYS: i64 = 14;

/// Largest accepted risk window, in days
pub const MAX_RISK_WINDOW_DAYS: i64 = 3650;

/// Classify one entity state against its due date
///
/// Returns `None` for terminal states: no badge applies. Without a due date
/// work is on track. Past the due date (strictly) it is overdue; within
/// `risk_window` of it, at risk.
pub fn classify(
    is_terminal: bool,
    due_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    risk_window: Duration,
) -> Option<SlaStatus> {
    if is_terminal {
        return None;
    }
    let Some(due) = due_date else {
        return Some(SlaStatus::OnTrack);
    };
    if now > due {
        Some(SlaStatus::Overdue)
    } else if due - now <= risk_window {
        Some(SlaStatus::AtRisk)
    } else {
        Some(SlaStatus::OnTrack)
    }
}

/// Risk-window settings, global with optional per-kind overrides
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlaPolicy {
    /// Days before the due date at which work becomes at risk
    pub risk_window_days: i64,

    /// Per-kind window, replacing the global one for that kind
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<WorkflowKind, i64>,
}

impl Default for SlaPolicy {
    fn default() -> Self {
        Self {
            risk_window_days: DEFAULT_RISK_WINDOW_DAYS,
            overrides: BTreeMap::new(),
        }
    }
}

impl SlaPolicy {
    /// Policy with a single global window
    pub fn with_window_days(days: i64) -> Self {
        Self {
            risk_window_days: days,
            overrides: BTreeMap::new(),
        }
    }

    /// Window in days for a kind
    pub fn window_days(&self, kind: WorkflowKind) -> i64 {
        self.overrides
            .get(&kind)
            .copied()
            .unwrap_or(self.risk_window_days)
    }

    /// Window for a kind, clamped to `0..=MAX_RISK_WINDOW_DAYS`
    pub fn risk_window(&self, kind: WorkflowKind) -> Duration {
        Duration::days(self.window_days(kind).clamp(0, MAX_RISK_WINDOW_DAYS))
    }

    /// Classify a tracked entity as of `now`
    pub fn classify_entity<E: TrackedEntity>(
        &self,
        registry: &WorkflowRegistry,
        entity: &E,
        now: DateTime<Utc>,
    ) -> Option<SlaStatus> {
        let kind = <E::State as WorkflowState>::KIND;
        classify(
            registry.is_terminal(entity.state()),
            entity.due_date(),
            now,
            self.risk_window(kind),
        )
    }
}

/// A tracked entity seen through its live SLA badge
///
/// Adds the derived `sla` facet and the `due_in_days` range facet on top of
/// the entity's own filter fields.
#[derive(Debug, Clone, Copy)]
pub struct Classified<'a, T> {
    pub entity: &'a T,
    pub sla: Option<SlaStatus>,
    /// Whole days from `now` until the due date (negative once overdue)
    pub due_in_days: Option<i64>,
}

/// Classify every entity in `items` as of `now`, preserving order
pub fn classify_all<'a, T: TrackedEntity>(
    items: &'a [T],
    registry: &WorkflowRegistry,
    policy: &SlaPolicy,
    now: DateTime<Utc>,
) -> Vec<Classified<'a, T>> {
    items
        .iter()
        .map(|entity| Classified {
            entity,
            sla: policy.classify_entity(registry, entity, now),
            due_in_days: entity.due_date().map(|due| days_until(due, now)),
        })
        .collect()
}

/// Whole days from `now` to `due`, rounded down so any overdue time is negative
pub fn days_until(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (due - now).num_milliseconds().div_euclid(MILLIS_PER_DAY)
}

const MILLIS_PER_DAY: i64 = 86_400_000;

const SLA_FACETS: &[FacetDef] = &[
    FacetDef::choice("sla", is_sla_value),
    FacetDef::range("due_in_days"),
];

fn is_sla_value(value: &str) -> bool {
    value == NOT_APPLICABLE || value.parse::<SlaStatus>().is_ok_and(|s| s.as_str() == value)
}

/// Facet value for entities without a badge (terminal states)
pub const NOT_APPLICABLE: &str = "n/a";

impl<T: Filterable> Filterable for Classified<'_, T> {
    const SEARCH_FIELDS: &'static [&'static str] = T::SEARCH_FIELDS;
    const FACETS: &'static [FacetDef] = T::FACETS;

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "sla" => Some(FieldValue::Text(
                self.sla.map_or(NOT_APPLICABLE, |s| s.as_str()),
            )),
            "due_in_days" => self.due_in_days.map(FieldValue::Number),
            _ => self.entity.field(name),
        }
    }

    fn facet_def(name: &str) -> Option<FacetDef> {
        SLA_FACETS
            .iter()
            .find(|f| f.name == name)
            .copied()
            .or_else(|| T::facet_def(name))
    }
}

/// Badge counts over a collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SlaSummary {
    pub on_track: usize,
    pub at_risk: usize,
    pub overdue: usize,
    pub not_applicable: usize,
}

impl SlaSummary {
    /// Count badges
    pub fn from_statuses(statuses: impl IntoIterator<Item = Option<SlaStatus>>) -> Self {
        let mut summary = Self::default();
        for status in statuses {
            match status {
                Some(SlaStatus::OnTrack) => summary.on_track += 1,
                Some(SlaStatus::AtRisk) => summary.at_risk += 1,
                Some(SlaStatus::Overdue) => summary.overdue += 1,
                None => summary.not_applicable += 1,
            }
        }
        summary
    }

    /// Number of entities that carry a badge
    pub fn tracked(&self) -> usize {
        self.on_track + self.at_risk + self.overdue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_terminal_has_no_badge() {
        let due = now() - Duration::days(10);
        assert_eq!(classify(true, Some(due), now(), Duration::days(14)), None);
    }

    #[test]
    fn test_no_due_date_is_on_track() {
        assert_eq!(
            classify(false, None, now(), Duration::days(14)),
            Some(SlaStatus::OnTrack)
        );
    }

    #[test]
    fn test_rule_order() {
        let window = Duration::days(14);
        assert_eq!(
            classify(false, Some(now() - Duration::days(1)), now(), window),
            Some(SlaStatus::Overdue)
        );
        assert_eq!(
            classify(false, Some(now() + Duration::days(14)), now(), window),
            Some(SlaStatus::AtRisk)
        );
        assert_eq!(
            classify(
                false,
                Some(now() + Duration::days(14) + Duration::milliseconds(1)),
                now(),
                window
            ),
            Some(SlaStatus::OnTrack)
        );
    }

    #[test]
    fn test_zero_window_only_due_instant_is_at_risk() {
        let window = Duration::zero();
        assert_eq!(
            classify(false, Some(now()), now(), window),
            Some(SlaStatus::AtRisk)
        );
        assert_eq!(
            classify(false, Some(now() + Duration::seconds(1)), now(), window),
            Some(SlaStatus::OnTrack)
        );
    }

    #[test]
    fn test_days_until_rounds_down() {
        assert_eq!(days_until(now() - Duration::hours(12), now()), -1);
        assert_eq!(days_until(now() - Duration::days(1), now()), -1);
        assert_eq!(days_until(now() - Duration::hours(25), now()), -2);
        assert_eq!(days_until(now(), now()), 0);
        assert_eq!(days_until(now() - Duration::milliseconds(1), now()), -1);
        assert_eq!(days_until(now() + Duration::hours(23), now()), 0);
        assert_eq!(days_until(now() + Duration::days(5), now()), 5);
    }

    #[test]
    fn test_policy_overrides() {
        let mut policy = SlaPolicy::default();
        policy.overrides.insert(WorkflowKind::Inspection, 7);

        assert_eq!(policy.window_days(WorkflowKind::TestRequest), 14);
        assert_eq!(policy.window_days(WorkflowKind::Inspection), 7);
        assert_eq!(policy.risk_window(WorkflowKind::Inspection), Duration::days(7));
    }

    #[test]
    fn test_risk_window_clamped() {
        let policy = SlaPolicy::with_window_days(-3);
        assert_eq!(policy.risk_window(WorkflowKind::Inspection), Duration::zero());
        let policy = SlaPolicy::with_window_days(i64::MAX);
        assert_eq!(
            policy.risk_window(WorkflowKind::Inspection),
            Duration::days(MAX_RISK_WINDOW_DAYS)
        );
    }

    #[test]
    fn test_policy_yaml() {
        let yaml = r#"
risk_window_days: 10
overrides:
  inspection: 3
"#;
        let policy: SlaPolicy = serde_yml::from_str(yaml).unwrap();
        assert_eq!(policy.risk_window_days, 10);
        assert_eq!(policy.window_days(WorkflowKind::Inspection), 3);
        assert_eq!(policy.window_days(WorkflowKind::StyleStatus), 10);
    }

    #[test]
    fn test_summary_counts() {
        let summary = SlaSummary::from_statuses([
            Some(SlaStatus::Overdue),
            Some(SlaStatus::AtRisk),
            Some(SlaStatus::AtRisk),
            None,
        ]);
        assert_eq!(summary.overdue, 1);
        assert_eq!(summary.at_risk, 2);
        assert_eq!(summary.on_track, 0);
        assert_eq!(summary.not_applicable, 1);
        assert_eq!(summary.tracked(), 3);
    }

    #[test]
    fn test_sla_facet_values() {
        assert!(is_sla_value("overdue"));
        assert!(is_sla_value("n/a"));
        assert!(!is_sla_value("Overdue"));
        assert!(!is_sla_value("late"));
    }
}
