//! Fixed-width console rendering for `list`.

use flagbit_domain::FeatureBitDefinition;

/// Renders definitions as an aligned text table. The short form shows
/// id and name only; `long` adds every stored column.
pub fn render_table(definitions: &[FeatureBitDefinition], long: bool) -> String {
    if definitions.is_empty() {
        return "No feature bits found.".to_string();
    }

    let headers = if long {
        vec![
            "ID",
            "Name",
            "OnOff",
            "Excluded",
            "Included",
            "MinLevel",
            "ExactLevel",
            "AllowedUsers",
            "Dependencies",
            "ModifiedBy",
        ]
    } else {
        vec!["ID", "Name"]
    };

    let rows: Vec<Vec<String>> = definitions.iter().map(|d| row_cells(d, long)).collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut table = String::new();
    push_row(&mut table, &headers.iter().map(|h| h.to_string()).collect::<Vec<_>>(), &widths);
    push_row(
        &mut table,
        &widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>(),
        &widths,
    );
    for row in &rows {
        push_row(&mut table, row, &widths);
    }
    table.truncate(table.trim_end().len());
    table
}

fn row_cells(definition: &FeatureBitDefinition, long: bool) -> Vec<String> {
    let mut cells = vec![definition.id.to_string(), definition.name.clone()];
    if long {
        cells.push(definition.on_off.to_string());
        cells.push(opt(&definition.excluded_environments));
        cells.push(opt(&definition.included_environments));
        cells.push(definition.minimum_allowed_permission_level.to_string());
        cells.push(
            definition
                .exact_allowed_permission_level
                .map(|level| level.to_string())
                .unwrap_or_default(),
        );
        cells.push(opt(&definition.allowed_users));
        cells.push(opt(&definition.dependencies));
        cells.push(definition.last_modified_by_user.clone());
    }
    cells
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}
