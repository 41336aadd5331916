// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;

use crate::ids::DeviceId;
use crate::model::{DeviceListing, DeviceRow};

pub trait DeviceTable {
    fn headers(&self) -> &[String];
    fn row_count(&self) -> usize;
    fn row_key(&self, row: usize) -> Option<DeviceId>;
    fn row_for(&self, id: DeviceId) -> Option<usize>;
    fn selected_rows(&self) -> Vec<usize>;
    fn cell_markup(&self, row: usize, column: usize) -> Option<&str>;
    fn set_cell_markup(&mut self, row: usize, column: usize, markup: String) -> bool;
    fn load(&mut self, listing: DeviceListing);

    fn cell_text(&self, row: usize, column: usize) -> Option<String> {
        self.cell_markup(row, column).map(strip_markup)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    #[default]
    Single,
    Multi,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableView {
    headers: Vec<String>,
    rows: Vec<DeviceRow>,
    selected: BTreeSet<usize>,
    mode: SelectionMode,
}

impl TableView {
    pub fn new(listing: DeviceListing) -> Self {
        let mut table = Self::default();
        table.load(listing);
        table
    }

    pub fn with_mode(mut self, mode: SelectionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn rows(&self) -> &[DeviceRow] {
        &self.rows
    }

    pub fn is_selected(&self, row: usize) -> bool {
        self.selected.contains(&row)
    }

    pub fn select(&mut self, row: usize) -> bool {
        if row >= self.rows.len() {
            return false;
        }
        if self.mode == SelectionMode::Single {
            self.selected.clear();
        }
        self.selected.insert(row)
    }

    pub fn deselect(&mut self, row: usize) -> bool {
        self.selected.remove(&row)
    }

    pub fn toggle(&mut self, row: usize) -> bool {
        if self.is_selected(row) {
            self.deselect(row);
            false
        } else {
            self.select(row)
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }
}

impl DeviceTable for TableView {
    fn headers(&self) -> &[String] {
        &self.headers
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn row_key(&self, row: usize) -> Option<DeviceId> {
        self.rows.get(row).map(|row| row.id)
    }

    fn row_for(&self, id: DeviceId) -> Option<usize> {
        self.rows.iter().position(|row| row.id == id)
    }

    fn selected_rows(&self) -> Vec<usize> {
        self.selected.iter().copied().collect()
    }

    fn cell_markup(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|row| row.cells.get(column))
            .map(String::as_str)
    }

    fn set_cell_markup(&mut self, row: usize, column: usize, markup: String) -> bool {
        let Some(cell) = self
            .rows
            .get_mut(row)
            .and_then(|row| row.cells.get_mut(column))
        else {
            return false;
        };
        *cell = markup;
        true
    }

    fn load(&mut self, listing: DeviceListing) {
        self.headers = listing.columns;
        self.rows = listing.rows;
        self.selected.clear();
    }
}

// A `<` opens a tag only when followed by a letter, `/` or `!` and closed by a later `>`.
pub fn strip_markup(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;
    while let Some(start) = rest.find('<') {
        let (before, tail) = rest.split_at(start);
        out.push_str(before);
        let opens_tag = tail[1..]
            .chars()
            .next()
            .is_some_and(|next| next.is_ascii_alphabetic() || next == '/' || next == '!');
        match tail.find('>') {
            Some(end) if opens_tag => rest = &tail[end + 1..],
            _ => {
                out.push('<');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
