//! Writers for a finished [`ResultSet`].
//!
//! The scraper itself never persists anything; these are the collaborators
//! the binary hands the rows to once a run ends (or aborts).

use crate::core::{OutputConfig, OutputFormat};
use crate::errors::Result;
use crate::types::{ResultSet, ScorecardRow};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use tracing::info;

pub fn write_rows<W: Write>(rows: &ResultSet, format: OutputFormat, mut w: W) -> Result<()> {
    match format {
        OutputFormat::Table => write_table(rows, &mut w)?,
        OutputFormat::Csv => write_csv(rows, &mut w)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut w, rows)?;
            writeln!(w)?;
        }
        OutputFormat::Jsonl => {
            for row in rows {
                serde_json::to_writer(&mut w, row)?;
                writeln!(w)?;
            }
        }
    }
    w.flush()?;
    Ok(())
}

/// Write to the configured file, or stdout when no path is set.
pub fn write_output(rows: &ResultSet, output: &OutputConfig) -> Result<()> {
    match &output.path {
        Some(path) => {
            let file = File::create(path)?;
            write_rows(rows, output.format, BufWriter::new(file))?;
            info!(path = %path.display(), rows = rows.len(), "results written");
        }
        None => {
            let stdout = io::stdout();
            write_rows(rows, output.format, stdout.lock())?;
        }
    }
    Ok(())
}

/* ---------------- CSV ---------------- */

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn write_csv_row<W: Write>(w: &mut W, cells: &[&str]) -> io::Result<()> {
    let mut first = true;
    for cell in cells {
        if !first {
            w.write_all(b",")?;
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            w.write_all(cell.as_bytes())?;
        }
    }
    w.write_all(b"\n")
}

fn write_csv<W: Write>(rows: &ResultSet, w: &mut W) -> io::Result<()> {
    write_csv_row(w, &ScorecardRow::COLUMNS)?;
    for row in rows {
        write_csv_row(w, &row.cells())?;
    }
    Ok(())
}

/* ---------------- Table ---------------- */

fn write_table<W: Write>(rows: &ResultSet, w: &mut W) -> io::Result<()> {
    let mut widths = ScorecardRow::COLUMNS.map(|c| c.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |w: &mut W, cells: &[&str]| -> io::Result<()> {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect();
        writeln!(w, "{}", padded.join("  ").trim_end())
    };

    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    line(w, &ScorecardRow::COLUMNS)?;
    line(w, &rule.iter().map(String::as_str).collect::<Vec<_>>())?;
    for row in rows {
        line(w, &row.cells())?;
    }
    writeln!(w, "({} rows)", rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Subject;

    fn sample() -> ResultSet {
        let mut rows = ResultSet::new();
        rows.push(ScorecardRow::new(Subject::new("alice"), "Half True", "50%", "10"));
        rows.push(ScorecardRow::new(Subject::new("alice"), "Pants, on \"Fire\"", "1%", "2"));
        rows
    }

    fn render(rows: &ResultSet, format: OutputFormat) -> String {
        let mut buf = Vec::new();
        write_rows(rows, format, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_csv_header_and_quoting() {
        let out = render(&sample(), OutputFormat::Csv);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Person,Category,Percent,Total");
        assert_eq!(lines[1], "alice,Half True,50%,10");
        assert_eq!(lines[2], "alice,\"Pants, on \"\"Fire\"\"\",1%,2");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_json_and_jsonl() {
        let json: serde_json::Value = serde_json::from_str(&render(&sample(), OutputFormat::Json)).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[0]["Category"], "Half True");

        let jsonl = render(&sample(), OutputFormat::Jsonl);
        assert_eq!(jsonl.lines().count(), 2);
        let second: serde_json::Value = serde_json::from_str(jsonl.lines().nth(1).unwrap()).unwrap();
        assert_eq!(second["Total"], "2");
    }

    #[test]
    fn test_table_aligns_columns() {
        let out = render(&sample(), OutputFormat::Table);
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("Person  Category"));
        assert!(lines[1].starts_with("------  --------"));
        assert!(lines[2].starts_with("alice   Half True"));
        assert_eq!(lines.last().copied(), Some("(2 rows)"));
    }

    #[test]
    fn test_empty_result_set() {
        assert_eq!(render(&ResultSet::new(), OutputFormat::Csv), "Person,Category,Percent,Total\n");
        assert_eq!(render(&ResultSet::new(), OutputFormat::Json).trim(), "[]");
    }
}
