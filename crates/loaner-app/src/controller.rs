// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing::{debug, info, warn};

use crate::capabilities::{DeviceBackend, Navigator, UserPrompt};
use crate::cells::{ColumnMap, read_cell, write_cell};
use crate::checkout::{CheckoutPhase, CheckoutStep, PendingCheckout, ProposalReply};
use crate::error::ActionError;
use crate::export::to_csv;
use crate::ids::DeviceId;
use crate::model::{CheckinForm, DeviceStatus, Lendee, Location, STATUS_COLUMN};
use crate::selection::{resolve_selected_id, resolve_selected_ids};
use crate::table::{DeviceTable, TableView};

pub const LENDEE_PROMPT: &str = "Check OUT - Enter a subject ID or user's e-mail address: ";
pub const DELETE_CONFIRMATION: &str =
    "Are you sure you want to delete this device?\nWARNING: This action is irreversible.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Navigated(Location),
    Abandoned,
    Cancelled,
}

pub struct DeviceController<T, B, P, N> {
    table: T,
    backend: B,
    prompt: P,
    navigator: N,
    columns: ColumnMap,
    status_column: String,
    checkout: CheckoutPhase,
}

impl<T, B, P, N> DeviceController<T, B, P, N>
where
    T: DeviceTable,
    B: DeviceBackend,
    P: UserPrompt,
    N: Navigator,
{
    pub fn new(table: T, backend: B, prompt: P, navigator: N) -> Self {
        let columns = ColumnMap::from_table(&table);
        Self {
            table,
            backend,
            prompt,
            navigator,
            columns,
            status_column: STATUS_COLUMN.to_owned(),
            checkout: CheckoutPhase::Idle,
        }
    }

    pub fn with_status_column(mut self, column: impl Into<String>) -> Self {
        self.status_column = column.into();
        self
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn prompt(&self) -> &P {
        &self.prompt
    }

    pub fn prompt_mut(&mut self) -> &mut P {
        &mut self.prompt
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut N {
        &mut self.navigator
    }

    pub fn checkout_phase(&self) -> &CheckoutPhase {
        &self.checkout
    }

    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    pub fn read_cell(&self, column: &str, device: DeviceId) -> String {
        read_cell(&self.table, &self.columns, column, device)
    }

    pub fn write_cell(&mut self, column: &str, device: DeviceId, content: &str) -> bool {
        write_cell(&mut self.table, &self.columns, column, device, content)
    }

    pub fn export_csv(&self) -> String {
        to_csv(&self.table, &resolve_selected_ids(&self.table))
    }

    pub fn reload(&mut self) -> Result<usize, ActionError> {
        let result = self.load_listing();
        self.report(result)
    }

    pub fn checkout(&mut self) -> Result<Outcome, ActionError> {
        let result = self.run_checkout();
        self.report(result)
    }

    pub fn check_in(&mut self) -> Result<Outcome, ActionError> {
        let result = self.run_check_in();
        self.report(result)
    }

    pub fn edit(&mut self) -> Result<Outcome, ActionError> {
        let result =
            resolve_selected_id(&self.table).and_then(|device| self.go(Location::Edit(device)));
        self.report(result)
    }

    pub fn delete(&mut self) -> Result<Outcome, ActionError> {
        let result = self.run_delete();
        self.report(result)
    }

    pub fn submit_checkin(
        &mut self,
        device: DeviceId,
        form: &CheckinForm,
    ) -> Result<Outcome, ActionError> {
        let result = self
            .backend
            .submit_checkin(device, form)
            .map_err(|error| ActionError::transport(&error))
            .and_then(|()| {
                info!(
                    device = device.get(),
                    condition = form.condition.as_str(),
                    "device checked in"
                );
                self.go(Location::DeviceList)
            });
        self.report(result)
    }

    fn load_listing(&mut self) -> Result<usize, ActionError> {
        let listing = self
            .backend
            .list_devices()
            .map_err(|error| ActionError::transport(&error))?;
        self.table.load(listing);
        self.columns = ColumnMap::from_table(&self.table);
        let rows = self.table.row_count();
        debug!(rows, "device table reloaded");
        Ok(rows)
    }

    fn run_checkout(&mut self) -> Result<Outcome, ActionError> {
        if self.checkout.is_in_flight() {
            return Err(ActionError::Busy);
        }
        self.checkout = CheckoutPhase::Idle;

        let device = resolve_selected_id(&self.table)?;
        let Some(lendee) = self
            .prompt
            .prompt(LENDEE_PROMPT, "")
            .and_then(|input| Lendee::parse(&input))
        else {
            debug!(device = device.get(), "checkout abandoned without a lendee");
            return Ok(Outcome::Abandoned);
        };

        let pending = PendingCheckout { device, lendee };
        self.checkout
            .apply(CheckoutStep::Propose(pending.clone()))?;
        debug!(
            device = device.get(),
            lendee_kind = ?pending.lendee.kind(),
            "checkout proposal sent"
        );

        let reply = match self.backend.propose_checkout(device, &pending.lendee) {
            Ok(reply) => reply,
            Err(error) => return Err(self.checkout_transport_failed(&error)),
        };
        self.checkout.apply(CheckoutStep::Replied(reply.clone()))?;
        let borrower = match reply {
            ProposalReply::Resolved { name } => name,
            ProposalReply::Rejected { error } => {
                return Err(ActionError::Rejected { message: error });
            }
        };

        if !self
            .prompt
            .confirm(&format!("Confirm check out to {borrower}?"))
        {
            self.checkout.apply(CheckoutStep::Declined)?;
            debug!(device = device.get(), "checkout declined");
            return Ok(Outcome::Cancelled);
        }

        if let Err(error) = self.backend.commit_checkout(device, &pending.lendee) {
            return Err(self.checkout_transport_failed(&error));
        }
        self.checkout.apply(CheckoutStep::CommitAcknowledged)?;
        info!(device = device.get(), borrower = %borrower, "device checked out");
        self.go(Location::DeviceList)
    }

    fn checkout_transport_failed(&mut self, error: &anyhow::Error) -> ActionError {
        let error = ActionError::transport(error);
        if let ActionError::Transport { message } = &error
            && let Err(transition) = self
                .checkout
                .apply(CheckoutStep::TransportFailed(message.clone()))
        {
            warn!(%transition, "checkout failure outside an active flow");
        }
        error
    }

    fn run_check_in(&mut self) -> Result<Outcome, ActionError> {
        let device = resolve_selected_id(&self.table)?;
        let status = self.read_cell(&self.status_column, device);
        if DeviceStatus::from_cell(&status).is_checked_in() {
            return Err(ActionError::AlreadyCheckedIn { device });
        }
        self.go(Location::CheckIn(device))
    }

    fn run_delete(&mut self) -> Result<Outcome, ActionError> {
        let device = resolve_selected_id(&self.table)?;
        if !self.prompt.confirm(DELETE_CONFIRMATION) {
            debug!(device = device.get(), "delete declined");
            return Ok(Outcome::Cancelled);
        }
        self.backend
            .delete_device(device)
            .map_err(|error| ActionError::transport(&error))?;
        info!(device = device.get(), "device deleted");
        self.go(Location::DeviceList)
    }

    fn go(&mut self, location: Location) -> Result<Outcome, ActionError> {
        self.navigator
            .navigate(location)
            .map_err(|error| ActionError::transport(&error))?;
        Ok(Outcome::Navigated(location))
    }

    fn report<V>(&mut self, result: Result<V, ActionError>) -> Result<V, ActionError> {
        if let Err(error) = &result {
            if error.is_user_error() {
                debug!(%error, "device action refused");
            } else {
                warn!(%error, "device action failed");
            }
            self.prompt.alert(&error.to_string());
        }
        result
    }
}

impl<B, P, N> DeviceController<TableView, B, P, N> {
    pub fn select_row(&mut self, row: usize) -> bool {
        self.table.select(row)
    }

    pub fn toggle_row(&mut self, row: usize) -> bool {
        self.table.toggle(row)
    }

    pub fn clear_selection(&mut self) {
        self.table.clear_selection();
    }
}
