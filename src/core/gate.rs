//! Stage gate controller for styles
//!
//! Keeps a style's approval status and manufacturing stage in lockstep:
//! a stage advances one step at a time, only from an approved round, and each
//! advance opens a fresh round at the new stage. The Gold Seal Workbook can be
//! uploaded once, after the final stage has been approved.

use thiserror::Error;

use crate::core::workflow::{WorkflowError, WorkflowRegistry};
use crate::entities::style::{GswStatus, Style, StyleStage, StyleStatus};

/// A stage, approval or workbook operation attempted without its precondition
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StageGateViolation {
    #[error("Cannot advance from stage {stage}: status is {status}, approval required")]
    NotApproved {
        stage: StyleStage,
        status: StyleStatus,
    },

    #[error("Stage {stage} is the final stage")]
    FinalStage { stage: StyleStage },

    #[error("Stage {from} cannot advance to {to}")]
    StageSkipped { from: StyleStage, to: StyleStage },

    #[error("Only a submitted round can be approved (current: {status})")]
    NotSubmitted { status: StyleStatus },

    #[error(
        "Gold Seal Workbook upload requires approved status at product_approved with no workbook on file \
         (status: {status}, stage: {stage}, workbook: {gsw})"
    )]
    GswNotEligible {
        status: StyleStatus,
        stage: StyleStage,
        gsw: GswStatus,
    },

    #[error("Status cannot move from {from} to {to} at stage {stage}")]
    StatusRefused {
        stage: StyleStage,
        from: StyleStatus,
        to: StyleStatus,
    },

    #[error("Gold Seal Workbook is not awaiting review (current: {gsw})")]
    GswNotSubmitted { gsw: GswStatus },

    #[error("Only a rejected Gold Seal Workbook can be withdrawn (current: {gsw})")]
    GswNotRejected { gsw: GswStatus },

    #[error("Status is locked while the Gold Seal Workbook is {gsw}")]
    GswLocked { gsw: GswStatus },

    #[error("Gold Seal Workbook is {gsw} but style is {status} at stage {stage}")]
    GswInconsistent {
        gsw: GswStatus,
        status: StyleStatus,
        stage: StyleStage,
    },
}

/// Check the cross-field invariant between status, stage and workbook
///
/// A workbook other than `none` requires an approved status at the final stage.
pub fn check_style_invariants(style: &Style) -> Result<(), StageGateViolation> {
    if style.gsw_status != GswStatus::None
        && (style.status != StyleStatus::Approved || style.stage != StyleStage::ProductApproved)
    {
        return Err(StageGateViolation::GswInconsistent {
            gsw: style.gsw_status,
            status: style.status,
            stage: style.stage,
        });
    }
    Ok(())
}

/// Stage gate controller bound to a workflow registry
pub struct StageGate<'a> {
    registry: &'a WorkflowRegistry,
}

impl<'a> StageGate<'a> {
    pub fn new(registry: &'a WorkflowRegistry) -> Self {
        Self { registry }
    }

    /// Whether [`advance_stage`](Self::advance_stage) would succeed
    pub fn can_advance_stage(&self, style: &Style) -> bool {
        self.next_stage(style).is_ok()
    }

    /// The stage an advance would move to, or why it cannot
    pub fn next_stage(&self, style: &Style) -> Result<StyleStage, StageGateViolation> {
        check_style_invariants(style)?;

        if style.status != StyleStatus::Approved {
            return Err(StageGateViolation::NotApproved {
                stage: style.stage,
                status: style.status,
            });
        }

        let next = self
            .registry
            .legal_transitions(style.stage)
            .into_iter()
            .next()
            .ok_or(StageGateViolation::FinalStage { stage: style.stage })?;

        // Stages are strictly sequential
        let expected = StyleStage::ALL
            .iter()
            .position(|s| *s == style.stage)
            .and_then(|p| StyleStage::ALL.get(p + 1))
            .copied();
        if expected != Some(next) {
            return Err(StageGateViolation::StageSkipped {
                from: style.stage,
                to: next,
            });
        }

        Ok(next)
    }

    /// Move the style to the next stage and open a new approval round
    ///
    /// Requires an approved status. The status resets to `pending` through the
    /// registry, so the reset is itself a declared transition.
    pub fn advance_stage(&self, style: &mut Style) -> Result<StyleStage, StageGateViolation> {
        let next = self.next_stage(style)?;
        self.registry
            .apply_transition(style, StyleStatus::Pending)
            .map_err(|e| gate_error(e, style, StyleStatus::Pending))?;
        let from = style.stage;
        style.stage = next;
        tracing::debug!(id = %style.id, from = %from, to = %next, "advanced stage");
        Ok(next)
    }

    /// Approve the current round
    pub fn approve(&self, style: &mut Style) -> Result<(), StageGateViolation> {
        if style.status != StyleStatus::Submitted {
            return Err(StageGateViolation::NotSubmitted {
                status: style.status,
            });
        }
        self.registry
            .apply_transition(style, StyleStatus::Approved)
            .map_err(|e| gate_error(e, style, StyleStatus::Approved))?;
        Ok(())
    }

    /// Whether a Gold Seal Workbook may be uploaded now
    pub fn can_upload_gsw(&self, style: &Style) -> bool {
        style.status == StyleStatus::Approved
            && style.stage == StyleStage::ProductApproved
            && style.gsw_status == GswStatus::None
    }

    /// Record a workbook upload (status becomes `submitted`)
    pub fn upload_gsw(&self, style: &mut Style) -> Result<(), StageGateViolation> {
        if !self.can_upload_gsw(style) {
            return Err(StageGateViolation::GswNotEligible {
                status: style.status,
                stage: style.stage,
                gsw: style.gsw_status,
            });
        }
        style.gsw_status = GswStatus::Submitted;
        tracing::debug!(id = %style.id, "gold seal workbook submitted");
        Ok(())
    }

    /// Record the review outcome of a submitted workbook
    pub fn review_gsw(&self, style: &mut Style, approved: bool) -> Result<GswStatus, StageGateViolation> {
        if style.gsw_status != GswStatus::Submitted {
            return Err(StageGateViolation::GswNotSubmitted {
                gsw: style.gsw_status,
            });
        }
        style.gsw_status = if approved {
            GswStatus::Approved
        } else {
            GswStatus::Rejected
        };
        tracing::debug!(id = %style.id, gsw = %style.gsw_status, "gold seal workbook reviewed");
        Ok(style.gsw_status)
    }

    /// Clear a rejected workbook so a corrected one can be uploaded
    pub fn withdraw_gsw(&self, style: &mut Style) -> Result<(), StageGateViolation> {
        if style.gsw_status != GswStatus::Rejected {
            return Err(StageGateViolation::GswNotRejected {
                gsw: style.gsw_status,
            });
        }
        style.gsw_status = GswStatus::None;
        tracing::debug!(id = %style.id, "rejected gold seal workbook withdrawn");
        Ok(())
    }
}

/// Report a refused status move as a gate violation
fn gate_error(err: WorkflowError, style: &Style, target: StyleStatus) -> StageGateViolation {
    match err {
        WorkflowError::Guarded(violation) => violation,
        WorkflowError::InvalidTransition { .. } | WorkflowError::UnknownState { .. } => {
            StageGateViolation::StatusRefused {
                stage: style.stage,
                from: style.status,
                to: target,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style_at(stage: StyleStage, status: StyleStatus) -> Style {
        let mut style = Style::new("STY-1", "ST-88120");
        style.stage = stage;
        style.status = status;
        style
    }

    #[test]
    fn test_advance_resets_status() {
        let registry = WorkflowRegistry::builtin();
        let gate = StageGate::new(&registry);
        let mut style = style_at(StyleStage::Base, StyleStatus::Approved);

        assert!(gate.can_advance_stage(&style));
        let next = gate.advance_stage(&mut style).unwrap();
        assert_eq!(next, StyleStage::BaseApproved);
        assert_eq!(style.stage, StyleStage::BaseApproved);
        assert_eq!(style.status, StyleStatus::Pending);
        assert!(!gate.can_advance_stage(&style));
    }

    #[test]
    fn test_final_stage_cannot_advance() {
        let registry = WorkflowRegistry::builtin();
        let gate = StageGate::new(&registry);
        let mut style = style_at(StyleStage::ProductApproved, StyleStatus::Approved);

        assert_eq!(
            gate.advance_stage(&mut style),
            Err(StageGateViolation::FinalStage {
                stage: StyleStage::ProductApproved
            })
        );
        assert_eq!(style.status, StyleStatus::Approved);
    }

    #[test]
    fn test_approve_requires_submission() {
        let registry = WorkflowRegistry::builtin();
        let gate = StageGate::new(&registry);
        let mut style = style_at(StyleStage::Bulk, StyleStatus::Pending);

        assert_eq!(
            gate.approve(&mut style),
            Err(StageGateViolation::NotSubmitted {
                status: StyleStatus::Pending
            })
        );

        style.status = StyleStatus::Submitted;
        gate.approve(&mut style).unwrap();
        assert_eq!(style.status, StyleStatus::Approved);
    }

    #[test]
    fn test_gsw_review_cycle() {
        let registry = WorkflowRegistry::builtin();
        let gate = StageGate::new(&registry);
        let mut style = style_at(StyleStage::ProductApproved, StyleStatus::Approved);

        assert_eq!(
            gate.review_gsw(&mut style, true),
            Err(StageGateViolation::GswNotSubmitted {
                gsw: GswStatus::None
            })
        );

        gate.upload_gsw(&mut style).unwrap();
        assert_eq!(gate.review_gsw(&mut style, false), Ok(GswStatus::Rejected));
        assert!(!gate.can_upload_gsw(&style));
    }

    #[test]
    fn test_withdraw_only_from_rejected() {
        let registry = WorkflowRegistry::builtin();
        let gate = StageGate::new(&registry);
        let mut style = style_at(StyleStage::ProductApproved, StyleStatus::Approved);

        for gsw in [GswStatus::None, GswStatus::Submitted, GswStatus::Approved] {
            style.gsw_status = gsw;
            assert_eq!(
                gate.withdraw_gsw(&mut style),
                Err(StageGateViolation::GswNotRejected { gsw })
            );
            assert_eq!(style.gsw_status, gsw);
        }

        style.gsw_status = GswStatus::Rejected;
        gate.withdraw_gsw(&mut style).unwrap();
        assert_eq!(style.gsw_status, GswStatus::None);
    }

    #[test]
    fn test_invariant_flags_orphan_workbook() {
        let mut style = style_at(StyleStage::Bulk, StyleStatus::Approved);
        style.gsw_status = GswStatus::Approved;
        assert!(matches!(
            check_style_invariants(&style),
            Err(StageGateViolation::GswInconsistent { .. })
        ));
    }

    #[test]
    fn test_custom_stage_table_cannot_skip() {
        let mut registry = WorkflowRegistry::builtin();
        registry.style_stage = crate::core::workflow::TransitionTable::new([(
            StyleStage::Base,
            StyleStage::Bulk,
        )]);
        let gate = StageGate::new(&registry);
        let style = style_at(StyleStage::Base, StyleStatus::Approved);

        assert_eq!(
            gate.next_stage(&style),
            Err(StageGateViolation::StageSkipped {
                from: StyleStage::Base,
                to: StyleStage::Bulk
            })
        );
    }
}
