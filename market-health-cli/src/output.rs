//! Writers for the scores payload and the rating exports.
//!
//! Every file write is a complete replace: the content goes to `<file>.tmp`
//! first and is renamed over the target, so an interrupted watch loop never
//! leaves a half-written file behind.

use anyhow::{Context, Result};
use clap::ValueEnum;
use market_health_core::domain::{CategoryKey, SectorRow};
use market_health_core::payload;
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Machine-friendly output of `rate --export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

#[derive(Debug, Serialize)]
struct ExportRecord<'a> {
    symbol: &'a str,
    score: u32,
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("out"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `bytes` to `path` through a sibling `.tmp` file and an atomic rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let tmp = tmp_path(path);
    fs::write(&tmp, bytes).with_context(|| format!("failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        anyhow::anyhow!("atomic rename to {} failed: {e}", path.display())
    })
}

/// Per-row category totals: `symbol,A,B,C,D,E,F,total`.
pub fn rows_csv(rows: &[SectorRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let mut header = vec!["symbol".to_string()];
    header.extend(CategoryKey::ALL.iter().map(|k| k.as_str().to_string()));
    header.push("total".to_string());
    wtr.write_record(&header)?;

    for row in rows {
        let mut record = vec![row.symbol.clone()];
        record.extend(
            CategoryKey::ALL
                .iter()
                .map(|k| row.category_total(*k).to_string()),
        );
        record.push(row.total().to_string());
        wtr.write_record(&record)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// `symbol,score` records, where score is the row percentage.
pub fn export_rows(rows: &[SectorRow], format: ExportFormat) -> Result<String> {
    let records: Vec<ExportRecord<'_>> = rows
        .iter()
        .map(|r| ExportRecord {
            symbol: &r.symbol,
            score: r.percent(),
        })
        .collect();

    match format {
        ExportFormat::Json => {
            let mut text = serde_json::to_string(&records)?;
            text.push('\n');
            Ok(text)
        }
        ExportFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(vec![]);
            for record in &records {
                wtr.serialize(record)?;
            }
            let data = wtr.into_inner().context("failed to flush CSV writer")?;
            String::from_utf8(data).context("CSV output is not valid UTF-8")
        }
    }
}

/// Write the JSON payload to `path`.
pub fn write_payload(rows: &[SectorRow], path: &Path, pretty: bool) -> Result<()> {
    let mut text = payload::encode(rows, pretty)?;
    text.push('\n');
    write_atomic(path, text.as_bytes())
}

/// Write the category-totals CSV to `path`.
pub fn write_csv(rows: &[SectorRow], path: &Path) -> Result<()> {
    write_atomic(path, rows_csv(rows)?.as_bytes())
}

/// One `scores` pass: always writes `out` (and `out_csv` when set), echoing
/// the payload to `sink` first when `echo` is on. Status lines follow on `sink`.
pub fn emit_scores<W: Write>(
    rows: &[SectorRow],
    out: &Path,
    out_csv: Option<&Path>,
    pretty: bool,
    echo: bool,
    sink: &mut W,
) -> Result<()> {
    if echo {
        writeln!(sink, "{}", payload::encode(rows, pretty)?)?;
    }

    write_payload(rows, out, pretty)?;
    writeln!(sink, "Wrote JSON: {}", out.display())?;

    if let Some(path) = out_csv {
        write_csv(rows, path)?;
        writeln!(sink, "Wrote CSV: {}", path.display())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_health_core::domain::Category;
    use std::collections::BTreeMap;

    fn row(symbol: &str, score: u8) -> SectorRow {
        let categories: BTreeMap<CategoryKey, Category> = CategoryKey::ALL
            .iter()
            .map(|k| (*k, Category::uniform(*k, score)))
            .collect();
        SectorRow::new(symbol, categories)
    }

    #[test]
    fn atomic_write_leaves_no_tmp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("scores.json");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert!(!tmp_path(&path).exists());
        let names: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![OsString::from("scores.json")]);
    }

    #[test]
    fn tmp_sits_next_to_target() {
        let p = Path::new("/data/scores.json");
        assert_eq!(tmp_path(p), PathBuf::from("/data/scores.json.tmp"));
    }

    #[test]
    fn payload_file_decodes_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");
        let rows = vec![row("XLK", 2), row("XLE", 0)];

        write_payload(&rows, &path, true).unwrap();

        let decoded = payload::load(&path).unwrap();
        assert_eq!(decoded.rows, rows);
    }

    #[test]
    fn csv_has_category_totals() {
        let text = rows_csv(&[row("XLK", 1)]).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "symbol,A,B,C,D,E,F,total");
        assert_eq!(lines[1], "XLK,6,6,6,6,6,6,36");
    }

    #[test]
    fn export_uses_percent_scores() {
        let rows = vec![row("XLK", 2), row("XLF", 1)];
        let json = export_rows(&rows, ExportFormat::Json).unwrap();
        assert_eq!(
            json,
            "[{\"symbol\":\"XLK\",\"score\":100},{\"symbol\":\"XLF\",\"score\":50}]\n"
        );
        let csv = export_rows(&rows, ExportFormat::Csv).unwrap();
        assert_eq!(csv, "symbol,score\nXLK,100\nXLF,50\n");
    }

    #[test]
    fn csv_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.csv");
        write_csv(&[row("XLU", 0)], &path).unwrap();
        assert!(fs::read_to_string(&path)
            .unwrap()
            .starts_with("symbol,A,B,C,D,E,F,total\n"));
    }

    #[test]
    fn echo_prints_payload_and_still_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("scores.json");
        let out_csv = dir.path().join("scores.csv");
        let rows = vec![row("XLK", 2), row("XLF", 1)];
        let mut sink = Vec::new();

        emit_scores(&rows, &out, Some(&out_csv), false, true, &mut sink).unwrap();

        let printed = String::from_utf8(sink).unwrap();
        let encoded = payload::encode(&rows, false).unwrap();
        assert!(printed.starts_with(&format!("{encoded}\n")));
        assert!(printed.contains(&format!("Wrote JSON: {}", out.display())));
        assert!(printed.contains(&format!("Wrote CSV: {}", out_csv.display())));

        assert_eq!(payload::load(&out).unwrap().rows, rows);
        assert_eq!(fs::read_to_string(&out).unwrap(), format!("{encoded}\n"));
        assert!(out_csv.exists());
    }

    #[test]
    fn without_echo_only_status_is_printed() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("scores.json");
        let mut sink = Vec::new();

        emit_scores(&[row("XLE", 0)], &out, None, true, false, &mut sink).unwrap();

        let printed = String::from_utf8(sink).unwrap();
        assert_eq!(printed, format!("Wrote JSON: {}\n", out.display()));
        assert!(out.exists());
    }
}
