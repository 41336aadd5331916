// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;

use crate::checkout::ProposalReply;
use crate::ids::DeviceId;
use crate::model::{CheckinForm, DeviceListing, Lendee, Location};

pub trait DeviceBackend {
    fn list_devices(&mut self) -> Result<DeviceListing>;
    fn propose_checkout(&mut self, device: DeviceId, lendee: &Lendee) -> Result<ProposalReply>;
    fn commit_checkout(&mut self, device: DeviceId, lendee: &Lendee) -> Result<()>;
    fn submit_checkin(&mut self, device: DeviceId, form: &CheckinForm) -> Result<()>;
    fn delete_device(&mut self, device: DeviceId) -> Result<()>;
}

pub trait UserPrompt {
    fn alert(&mut self, message: &str);
    fn prompt(&mut self, message: &str, default: &str) -> Option<String>;
    fn confirm(&mut self, message: &str) -> bool;
}

pub trait Navigator {
    fn navigate(&mut self, location: Location) -> Result<()>;
}
