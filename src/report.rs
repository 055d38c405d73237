use prettytable::{format, Cell, Row, Table};

use crate::pipeline::TaskResult;
use crate::utils::format_duration;

/// Print a per-file results table for the `--report` flag.
pub fn print_report(results: &[TaskResult]) {
    if results.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);

    table.add_row(Row::new(vec![
        Cell::new("File"),
        Cell::new("Action"),
        Cell::new("Original"),
        Cell::new("Output"),
        Cell::new("Time"),
        Cell::new("Detail"),
    ]));

    for result in results {
        let name = result
            .source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| result.source_path.display().to_string());

        table.add_row(Row::new(vec![
            Cell::new(&truncate(&name, 40)),
            Cell::new(result.action.label()),
            Cell::new(&dims(result.original_dims)),
            Cell::new(&dims(result.final_dims)),
            Cell::new(&format_duration(result.elapsed)),
            Cell::new(&truncate(result.error_detail.as_deref().unwrap_or(""), 40)),
        ]));
    }

    table.printstd();
    println!();
}

fn dims(value: Option<(u32, u32)>) -> String {
    match value {
        Some((w, h)) => format!("{}x{}", w, h),
        None => "-".to_string(),
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dims_formatting() {
        assert_eq!(dims(Some((1024, 768))), "1024x768");
        assert_eq!(dims(None), "-");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a_very_long_file_name.jpg", 10), "a_very_lo…");
    }
}
