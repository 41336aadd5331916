// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::ids::DeviceId;
use crate::table::DeviceTable;

// First header containing the name wins.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnMap {
    headers: Vec<String>,
}

impl ColumnMap {
    pub fn from_headers(headers: &[String]) -> Self {
        Self {
            headers: headers.iter().map(|header| header.trim().to_owned()).collect(),
        }
    }

    pub fn from_table<T: DeviceTable + ?Sized>(table: &T) -> Self {
        Self::from_headers(table.headers())
    }

    pub fn resolve(&self, name: &str) -> Option<usize> {
        if name.is_empty() {
            return None;
        }
        self.headers.iter().position(|header| header.contains(name))
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

pub fn read_cell<T: DeviceTable + ?Sized>(
    table: &T,
    columns: &ColumnMap,
    column: &str,
    device: DeviceId,
) -> String {
    let Some((row, index)) = locate(table, columns, column, device) else {
        return String::new();
    };
    table.cell_text(row, index).unwrap_or_default()
}

pub fn write_cell<T: DeviceTable + ?Sized>(
    table: &mut T,
    columns: &ColumnMap,
    column: &str,
    device: DeviceId,
    content: &str,
) -> bool {
    let Some((row, index)) = locate(table, columns, column, device) else {
        return false;
    };
    table.set_cell_markup(row, index, content.to_owned())
}

fn locate<T: DeviceTable + ?Sized>(
    table: &T,
    columns: &ColumnMap,
    column: &str,
    device: DeviceId,
) -> Option<(usize, usize)> {
    let index = columns.resolve(column)?;
    let row = table.row_for(device)?;
    Some((row, index))
}
