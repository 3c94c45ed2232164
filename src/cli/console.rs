use std::io::Write;

use crate::aws::types::DnsRecord;
use crate::aws::AwsError;

/// Print a step label and leave the line open for [`step_done`] or [`step_failed`].
pub fn step(label: &str) {
    print!("🔄 {label}... ");
    let _ = std::io::stdout().flush();
}

pub fn step_done() {
    println!("✅");
}

pub fn step_failed() {
    println!("❌");
}

pub fn warning(message: &str) {
    println!("⚠️  {message}");
}

/// Report a failed AWS call with its quick fixes.
pub fn report_error(error: &AwsError) {
    println!("❌ {error}");
    let fixes = error.remediation();
    if !fixes.is_empty() {
        println!();
        println!("🔧 QUICK FIXES:");
        for fix in fixes {
            println!("   → {fix}");
        }
    }
}

/// Render rows as a left-aligned plain-text table with a header rule.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|header| header.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let format_row = |cells: Vec<&str>| {
        let last = cells.len().saturating_sub(1);
        cells
            .iter()
            .enumerate()
            .map(|(index, cell)| {
                if index == last {
                    cell.to_string()
                } else {
                    format!("{:<width$}", cell, width = widths[index])
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
    };

    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    let mut lines = vec![
        format_row(headers.to_vec()),
        format_row(rule.iter().map(String::as_str).collect()),
    ];
    lines.extend(
        rows.iter()
            .map(|row| format_row(row.iter().map(String::as_str).collect())),
    );
    lines.join("\n")
}

pub fn records_table(records: &[DnsRecord]) -> String {
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| {
            vec![
                record.name.clone(),
                record.record_type.clone(),
                record.value.clone(),
            ]
        })
        .collect();
    table(&["Record name", "Record type", "Record value"], &rows)
}
