// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use loaner_app::{
    CheckinForm, DeviceBackend, DeviceController, DeviceId, DeviceListing, DeviceRow, Lendee,
    Location, Navigator, ProposalReply, TableView, UserPrompt,
};
use std::collections::VecDeque;

pub const HEADERS: [&str; 5] = ["Name", "Serial", "Status", "Lendee", "Updated"];

const DEVICES: [(i64, &str, &str, &str, &str); 4] = [
    (3, "iPad Air", "DMPK2-0031", "Checked in", ""),
    (7, "Nexus 7", "NX7-4410", "Checked in", ""),
    (9, "Galaxy Tab", "GT-9982", "Checked out", "Avery Walker"),
    (12, "Kindle Fire", "KF-1207", "<span class=\"label\">Broken</span>", ""),
];

pub fn sample_listing() -> DeviceListing {
    DeviceListing {
        columns: HEADERS.iter().map(|header| (*header).to_owned()).collect(),
        rows: DEVICES
            .iter()
            .map(|(id, name, serial, status, lendee)| DeviceRow {
                id: DeviceId::new(*id),
                cells: vec![
                    (*name).to_owned(),
                    (*serial).to_owned(),
                    (*status).to_owned(),
                    (*lendee).to_owned(),
                    "2026-01-05".to_owned(),
                ],
            })
            .collect(),
    }
}

pub fn sample_table() -> TableView {
    TableView::new(sample_listing())
}

pub fn table_selecting(id: i64) -> TableView {
    let mut table = sample_table();
    if let Some(row) = DEVICES.iter().position(|(device, ..)| *device == id) {
        table.select(row);
    }
    table
}

// Unscripted prompts are cancelled and unscripted confirmations are declined.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    inputs: VecDeque<Option<String>>,
    answers: VecDeque<bool>,
    pub alerts: Vec<String>,
    pub prompts: Vec<String>,
    pub confirms: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(mut self, input: Option<&str>) -> Self {
        self.inputs.push_back(input.map(str::to_owned));
        self
    }

    pub fn with_answer(mut self, answer: bool) -> Self {
        self.answers.push_back(answer);
        self
    }
}

impl UserPrompt for ScriptedPrompt {
    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_owned());
    }

    fn prompt(&mut self, message: &str, _default: &str) -> Option<String> {
        self.prompts.push(message.to_owned());
        self.inputs.pop_front().flatten()
    }

    fn confirm(&mut self, message: &str) -> bool {
        self.confirms.push(message.to_owned());
        self.answers.pop_front().unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    ListDevices,
    ProposeCheckout { device: DeviceId, lendee: String },
    CommitCheckout { device: DeviceId, lendee: String },
    SubmitCheckin { device: DeviceId, form: CheckinForm },
    DeleteDevice { device: DeviceId },
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub calls: Vec<BackendCall>,
    proposal: Option<ProposalReply>,
    listing: Option<DeviceListing>,
    failure: Option<String>,
    commit_failure: Option<String>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_proposal(mut self, reply: ProposalReply) -> Self {
        self.proposal = Some(reply);
        self
    }

    pub fn resolving(self, name: &str) -> Self {
        self.with_proposal(ProposalReply::Resolved {
            name: name.to_owned(),
        })
    }

    pub fn rejecting(self, error: &str) -> Self {
        self.with_proposal(ProposalReply::Rejected {
            error: error.to_owned(),
        })
    }

    pub fn with_listing(mut self, listing: DeviceListing) -> Self {
        self.listing = Some(listing);
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_owned());
        self
    }

    pub fn failing_commit(mut self, message: &str) -> Self {
        self.commit_failure = Some(message.to_owned());
        self
    }

    pub fn commits(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, BackendCall::CommitCheckout { .. }))
            .count()
    }

    fn check_failure(&self) -> Result<()> {
        match &self.failure {
            Some(message) => Err(anyhow!("{message}")),
            None => Ok(()),
        }
    }
}

impl DeviceBackend for RecordingBackend {
    fn list_devices(&mut self) -> Result<DeviceListing> {
        self.calls.push(BackendCall::ListDevices);
        self.check_failure()?;
        Ok(self.listing.clone().unwrap_or_else(sample_listing))
    }

    fn propose_checkout(&mut self, device: DeviceId, lendee: &Lendee) -> Result<ProposalReply> {
        self.calls.push(BackendCall::ProposeCheckout {
            device,
            lendee: lendee.as_str().to_owned(),
        });
        self.check_failure()?;
        self.proposal
            .clone()
            .ok_or_else(|| anyhow!("no proposal reply scripted"))
    }

    fn commit_checkout(&mut self, device: DeviceId, lendee: &Lendee) -> Result<()> {
        self.calls.push(BackendCall::CommitCheckout {
            device,
            lendee: lendee.as_str().to_owned(),
        });
        self.check_failure()?;
        match &self.commit_failure {
            Some(message) => Err(anyhow!("{message}")),
            None => Ok(()),
        }
    }

    fn submit_checkin(&mut self, device: DeviceId, form: &CheckinForm) -> Result<()> {
        self.calls.push(BackendCall::SubmitCheckin {
            device,
            form: form.clone(),
        });
        self.check_failure()
    }

    fn delete_device(&mut self, device: DeviceId) -> Result<()> {
        self.calls.push(BackendCall::DeleteDevice { device });
        self.check_failure()
    }
}

#[derive(Debug, Default)]
pub struct RecordingNavigator {
    pub visited: Vec<Location>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&mut self, location: Location) -> Result<()> {
        self.visited.push(location);
        Ok(())
    }
}

pub type TestController =
    DeviceController<TableView, RecordingBackend, ScriptedPrompt, RecordingNavigator>;

pub fn controller(
    table: TableView,
    backend: RecordingBackend,
    prompt: ScriptedPrompt,
) -> TestController {
    DeviceController::new(table, backend, prompt, RecordingNavigator::default())
}
