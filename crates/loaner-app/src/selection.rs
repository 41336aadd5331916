// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::error::ActionError;
use crate::ids::DeviceId;
use crate::table::DeviceTable;

pub fn resolve_selected_id<T: DeviceTable + ?Sized>(table: &T) -> Result<DeviceId, ActionError> {
    table
        .selected_rows()
        .into_iter()
        .find_map(|row| table.row_key(row))
        .ok_or(ActionError::NoSelection)
}

pub fn resolve_selected_ids<T: DeviceTable + ?Sized>(table: &T) -> Vec<DeviceId> {
    table
        .selected_rows()
        .into_iter()
        .filter_map(|row| table.row_key(row))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{resolve_selected_id, resolve_selected_ids};
    use crate::{ActionError, DeviceId, DeviceListing, DeviceRow, SelectionMode, TableView};

    fn table(ids: &[i64]) -> TableView {
        TableView::new(DeviceListing {
            columns: vec!["Name".to_owned()],
            rows: ids
                .iter()
                .map(|id| DeviceRow {
                    id: DeviceId::new(*id),
                    cells: vec![format!("device {id}")],
                })
                .collect(),
        })
        .with_mode(SelectionMode::Multi)
    }

    #[test]
    fn empty_selection_is_a_user_error() {
        let table = table(&[1, 2]);
        assert_eq!(resolve_selected_id(&table), Err(ActionError::NoSelection));
        assert!(resolve_selected_ids(&table).is_empty());
    }

    #[test]
    fn ids_follow_row_order_not_click_order() {
        let mut table = table(&[30, 10, 20]);
        table.select(2);
        table.select(0);
        assert_eq!(
            resolve_selected_ids(&table),
            vec![DeviceId::new(30), DeviceId::new(20)]
        );
        assert_eq!(resolve_selected_id(&table), Ok(DeviceId::new(30)));
    }
}
