use std::fmt::Write as _;

use crate::probe::ContainerDescription;

pub const HEADERS: [&str; 4] = ["table", "path", "declared", "shape"];

/// One row per column and nested object property.
pub fn schema_rows(containers: &[ContainerDescription]) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for container in containers {
        for table in &container.tables {
            let qualified = format!("{}.{}", container.name, table.name);
            for path in table.schema.flatten() {
                rows.push(vec![qualified.clone(), path.path, path.declared, path.shape]);
            }
        }
    }
    rows
}

pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(widths.len()) {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let header_cells = headers.iter().map(|h| h.to_string()).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&header_cells, &widths));
    let separators = widths
        .iter()
        .map(|w| "-".repeat((*w).max(3)))
        .collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separators, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let line = values
        .iter()
        .zip(widths.iter().copied())
        .map(|(value, width)| {
            let sanitized = value.replace(['\n', '\r', '\t'], " ");
            format!("{sanitized:<width$}")
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_pad_to_widest_cell() {
        let rows = vec![
            vec!["a".to_string(), "long value".to_string()],
            vec!["bbb".to_string(), "x".to_string()],
        ];
        let rendered = render_table(&["k", "v"], &rows);
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "k    v");
        assert_eq!(lines[1], "---  ----------");
        assert_eq!(lines[2], "a    long value");
        assert_eq!(lines[3], "bbb  x");
    }
}
