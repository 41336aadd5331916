// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

use crate::checkout::InvalidTransition;
use crate::ids::DeviceId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("Please select a device")]
    NoSelection,

    #[error("Device is already checked in")]
    AlreadyCheckedIn { device: DeviceId },

    #[error("{message}")]
    Rejected { message: String },

    #[error("request failed: {message}")]
    Transport { message: String },

    #[error("a checkout is already in progress")]
    Busy,

    #[error(transparent)]
    Transition(#[from] InvalidTransition),
}

impl ActionError {
    pub(crate) fn transport(error: &anyhow::Error) -> Self {
        Self::Transport {
            message: format!("{error:#}"),
        }
    }

    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::NoSelection | Self::AlreadyCheckedIn { .. } | Self::Rejected { .. } | Self::Busy
        )
    }
}
