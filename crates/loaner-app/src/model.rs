// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::ids::DeviceId;

pub const STATUS_COLUMN: &str = "Status";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceStatus {
    CheckedIn,
    CheckedOut,
    Broken,
    Missing,
}

impl DeviceStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CheckedIn => "Checked in",
            Self::CheckedOut => "Checked out",
            Self::Broken => "Broken",
            Self::Missing => "Missing",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Checked in" => Some(Self::CheckedIn),
            "Checked out" => Some(Self::CheckedOut),
            "Broken" => Some(Self::Broken),
            "Missing" => Some(Self::Missing),
            _ => None,
        }
    }

    // Unknown text means the device is out.
    pub fn from_cell(text: &str) -> Self {
        Self::parse(text.trim()).unwrap_or(Self::CheckedOut)
    }

    pub const fn is_checked_in(self) -> bool {
        matches!(self, Self::CheckedIn)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckinCondition {
    Excellent,
    Scratched,
    Broken,
    Missing,
}

impl CheckinCondition {
    pub const ALL: [Self; 4] = [Self::Excellent, Self::Scratched, Self::Broken, Self::Missing];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Scratched => "scratched",
            Self::Broken => "broken",
            Self::Missing => "missing",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "excellent" => Some(Self::Excellent),
            "scratched" => Some(Self::Scratched),
            "broken" => Some(Self::Broken),
            "missing" => Some(Self::Missing),
            _ => None,
        }
    }

    pub const fn resulting_status(self) -> DeviceStatus {
        match self {
            Self::Excellent | Self::Scratched => DeviceStatus::CheckedIn,
            Self::Broken => DeviceStatus::Broken,
            Self::Missing => DeviceStatus::Missing,
        }
    }

    pub fn cycle(self, delta: isize) -> Self {
        let len = Self::ALL.len() as isize;
        let current = Self::ALL
            .iter()
            .position(|condition| *condition == self)
            .unwrap_or(0) as isize;
        Self::ALL[(current + delta).rem_euclid(len) as usize]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckinForm {
    pub condition: CheckinCondition,
    pub comment: String,
}

impl Default for CheckinForm {
    fn default() -> Self {
        Self {
            condition: CheckinCondition::Excellent,
            comment: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Lendee(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LendeeKind {
    Subject(i64),
    User,
}

impl Lendee {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> LendeeKind {
        match self.0.parse::<i64>() {
            Ok(subject_id) => LendeeKind::Subject(subject_id),
            Err(_) => LendeeKind::User,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    DeviceList,
    CheckIn(DeviceId),
    Edit(DeviceId),
}

impl Location {
    pub fn path(self) -> String {
        match self {
            Self::DeviceList => "/devices/".to_owned(),
            Self::CheckIn(id) => format!("/devices/{id}/checkin"),
            Self::Edit(id) => format!("/devices/{id}/edit/"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRow {
    pub id: DeviceId,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceListing {
    pub columns: Vec<String>,
    pub rows: Vec<DeviceRow>,
}
