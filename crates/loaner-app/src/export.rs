// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::ids::DeviceId;
use crate::table::{DeviceTable, strip_markup};

pub fn to_csv<T: DeviceTable + ?Sized>(table: &T, devices: &[DeviceId]) -> String {
    let headers = table.headers();
    let mut out = String::new();
    push_record(&mut out, headers.iter().map(|header| strip_markup(header)));

    let rows: Vec<usize> = if devices.is_empty() {
        (0..table.row_count()).collect()
    } else {
        devices.iter().filter_map(|id| table.row_for(*id)).collect()
    };

    for row in rows {
        push_record(
            &mut out,
            (0..headers.len()).map(|column| table.cell_text(row, column).unwrap_or_default()),
        );
    }
    out
}

fn push_record(out: &mut String, fields: impl Iterator<Item = String>) {
    for (index, field) in fields.enumerate() {
        if index > 0 {
            out.push(',');
        }
        push_field(out, &field);
    }
    out.push_str("\r\n");
}

fn push_field(out: &mut String, field: &str) {
    if !field.contains([',', '"', '\n', '\r']) {
        out.push_str(field);
        return;
    }
    out.push('"');
    out.push_str(&field.replace('"', "\"\""));
    out.push('"');
}
