// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::Deserialize;
use thiserror::Error;

use crate::ids::DeviceId;
use crate::model::Lendee;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCheckout {
    pub device: DeviceId,
    pub lendee: Lendee,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalReply {
    Resolved { name: String },
    Rejected { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ProposalResponse {
    pub name: Option<String>,
    pub error: Option<String>,
    pub success: Option<bool>,
    pub created_subject: Option<bool>,
}

impl ProposalResponse {
    // An error field wins; a body with neither field is malformed.
    pub fn into_reply(self) -> Option<ProposalReply> {
        if let Some(error) = self.error {
            return Some(ProposalReply::Rejected { error });
        }
        self.name.map(|name| ProposalReply::Resolved { name })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CheckoutPhase {
    #[default]
    Idle,
    ProposalSent(PendingCheckout),
    AwaitingConfirmation {
        pending: PendingCheckout,
        borrower: String,
    },
    Committed(PendingCheckout),
    Cancelled,
    Failed {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutStep {
    Propose(PendingCheckout),
    Replied(ProposalReply),
    Declined,
    CommitAcknowledged,
    TransportFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("checkout cannot take step {step} while {phase}")]
pub struct InvalidTransition {
    pub phase: &'static str,
    pub step: &'static str,
}

impl CheckoutPhase {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ProposalSent(_) => "proposal sent",
            Self::AwaitingConfirmation { .. } => "awaiting confirmation",
            Self::Committed(_) => "committed",
            Self::Cancelled => "cancelled",
            Self::Failed { .. } => "failed",
        }
    }

    pub const fn is_in_flight(&self) -> bool {
        matches!(
            self,
            Self::ProposalSent(_) | Self::AwaitingConfirmation { .. }
        )
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Committed(_) | Self::Cancelled | Self::Failed { .. }
        )
    }

    pub fn pending(&self) -> Option<&PendingCheckout> {
        match self {
            Self::ProposalSent(pending)
            | Self::AwaitingConfirmation { pending, .. }
            | Self::Committed(pending) => Some(pending),
            Self::Idle | Self::Cancelled | Self::Failed { .. } => None,
        }
    }

    pub fn apply(&mut self, step: CheckoutStep) -> Result<(), InvalidTransition> {
        let current = std::mem::take(self);
        let next = match (current, step) {
            (phase, CheckoutStep::Propose(pending)) if !phase.is_in_flight() => {
                Self::ProposalSent(pending)
            }
            (Self::ProposalSent(pending), CheckoutStep::Replied(ProposalReply::Resolved { name })) => {
                Self::AwaitingConfirmation {
                    pending,
                    borrower: name,
                }
            }
            (Self::ProposalSent(_), CheckoutStep::Replied(ProposalReply::Rejected { error })) => {
                Self::Failed { reason: error }
            }
            (Self::AwaitingConfirmation { .. }, CheckoutStep::Declined) => Self::Cancelled,
            (Self::AwaitingConfirmation { pending, .. }, CheckoutStep::CommitAcknowledged) => {
                Self::Committed(pending)
            }
            (
                Self::ProposalSent(_) | Self::AwaitingConfirmation { .. },
                CheckoutStep::TransportFailed(reason),
            ) => Self::Failed { reason },
            (phase, step) => {
                let error = InvalidTransition {
                    phase: phase.label(),
                    step: step.label(),
                };
                *self = phase;
                return Err(error);
            }
        };
        *self = next;
        Ok(())
    }
}

impl CheckoutStep {
    const fn label(&self) -> &'static str {
        match self {
            Self::Propose(_) => "propose",
            Self::Replied(_) => "reply",
            Self::Declined => "decline",
            Self::CommitAcknowledged => "commit",
            Self::TransportFailed(_) => "transport failure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CheckoutPhase, CheckoutStep, InvalidTransition, PendingCheckout, ProposalReply,
        ProposalResponse,
    };
    use crate::{DeviceId, Lendee};

    fn pending() -> PendingCheckout {
        PendingCheckout {
            device: DeviceId::new(3),
            lendee: Lendee::parse("alice@example.com").expect("lendee"),
        }
    }

    #[test]
    fn confirmed_checkout_walks_to_committed() {
        let mut phase = CheckoutPhase::Idle;
        phase
            .apply(CheckoutStep::Propose(pending()))
            .expect("propose from idle");
        assert!(phase.is_in_flight());

        phase
            .apply(CheckoutStep::Replied(ProposalReply::Resolved {
                name: "Alice A.".to_owned(),
            }))
            .expect("resolved reply");
        assert_eq!(
            phase,
            CheckoutPhase::AwaitingConfirmation {
                pending: pending(),
                borrower: "Alice A.".to_owned(),
            }
        );

        phase
            .apply(CheckoutStep::CommitAcknowledged)
            .expect("commit after confirmation");
        assert_eq!(phase, CheckoutPhase::Committed(pending()));
        assert!(phase.is_terminal());
    }

    #[test]
    fn rejected_proposal_fails_and_cannot_commit() {
        let mut phase = CheckoutPhase::ProposalSent(pending());
        phase
            .apply(CheckoutStep::Replied(ProposalReply::Rejected {
                error: "not found".to_owned(),
            }))
            .expect("rejected reply");
        assert_eq!(
            phase,
            CheckoutPhase::Failed {
                reason: "not found".to_owned()
            }
        );

        let error = phase
            .apply(CheckoutStep::CommitAcknowledged)
            .expect_err("failed flow cannot commit");
        assert_eq!(
            error,
            InvalidTransition {
                phase: "failed",
                step: "commit",
            }
        );
        assert!(matches!(phase, CheckoutPhase::Failed { .. }));
    }

    #[test]
    fn decline_discards_pending() {
        let mut phase = CheckoutPhase::AwaitingConfirmation {
            pending: pending(),
            borrower: "Alice A.".to_owned(),
        };
        phase.apply(CheckoutStep::Declined).expect("decline");
        assert_eq!(phase, CheckoutPhase::Cancelled);
        assert_eq!(phase.pending(), None);
    }

    #[test]
    fn propose_is_refused_while_in_flight() {
        let mut phase = CheckoutPhase::ProposalSent(pending());
        assert!(phase.apply(CheckoutStep::Propose(pending())).is_err());
        assert_eq!(phase, CheckoutPhase::ProposalSent(pending()));
    }

    #[test]
    fn terminal_phases_accept_a_new_proposal() {
        for mut phase in [
            CheckoutPhase::Cancelled,
            CheckoutPhase::Committed(pending()),
            CheckoutPhase::Failed {
                reason: "boom".to_owned(),
            },
        ] {
            phase
                .apply(CheckoutStep::Propose(pending()))
                .expect("terminal phase restarts");
            assert_eq!(phase, CheckoutPhase::ProposalSent(pending()));
        }
    }

    #[test]
    fn transport_failure_only_while_in_flight() {
        let mut phase = CheckoutPhase::AwaitingConfirmation {
            pending: pending(),
            borrower: "Alice A.".to_owned(),
        };
        phase
            .apply(CheckoutStep::TransportFailed("timed out".to_owned()))
            .expect("in-flight failure");
        assert_eq!(
            phase,
            CheckoutPhase::Failed {
                reason: "timed out".to_owned()
            }
        );

        let mut idle = CheckoutPhase::Idle;
        assert!(
            idle.apply(CheckoutStep::TransportFailed("x".to_owned()))
                .is_err()
        );
    }

    #[test]
    fn proposal_response_prefers_error_field() {
        let both = ProposalResponse {
            name: Some("Alice A.".to_owned()),
            error: Some("Invalid subject ID. Please try again.".to_owned()),
            ..ProposalResponse::default()
        };
        assert_eq!(
            both.into_reply(),
            Some(ProposalReply::Rejected {
                error: "Invalid subject ID. Please try again.".to_owned()
            })
        );

        let resolved = ProposalResponse {
            name: Some("Subject 123451".to_owned()),
            success: Some(true),
            created_subject: Some(true),
            ..ProposalResponse::default()
        };
        assert_eq!(
            resolved.into_reply(),
            Some(ProposalReply::Resolved {
                name: "Subject 123451".to_owned()
            })
        );

        assert_eq!(ProposalResponse::default().into_reply(), None);
    }
}
