//! Plain-text rendering of score rows and rating tiles.

use market_health_core::domain::{Category, CategoryKey, Check, SectorRow};
use market_health_core::rating::{RatedSymbol, RatingBounds, RatingScheme};
use std::fmt::Write as _;

const TILE_WIDTH: usize = 14;

/// `n/max (p%)`, with the percentage rounded.
pub fn score_cell(score: u32, max: u32) -> String {
    let pct = if max == 0 {
        0
    } else {
        ((f64::from(score) / f64::from(max)) * 100.0).round() as u32
    };
    format!("{score}/{max} ({pct}%)")
}

fn glyph(check: &Check) -> char {
    if check.is_good() {
        '+'
    } else if check.is_weak() {
        '-'
    } else {
        '~'
    }
}

/// Sector, A through F totals and the row total.
pub fn overview(rows: &[SectorRow]) -> String {
    let sym_width = rows
        .iter()
        .map(|r| r.symbol.len())
        .max()
        .unwrap_or(0)
        .max("Sector".len());

    let mut out = String::new();
    let _ = writeln!(out, "Overview (A-F totals per sector)");
    let _ = write!(out, "{:<sym_width$}", "Sector");
    for key in CategoryKey::ALL {
        let _ = write!(out, "  {:^12}", key.as_str());
    }
    let _ = writeln!(out, "  {:^13}", "Total");

    for row in rows {
        let _ = write!(out, "{:<sym_width$}", row.symbol);
        for key in CategoryKey::ALL {
            let cell = score_cell(row.category_total(key), Category::MAX_TOTAL);
            let _ = write!(out, "  {cell:^12}");
        }
        let total = score_cell(row.total(), SectorRow::MAX_TOTAL);
        let _ = writeln!(out, "  {total:^13}");
    }
    out
}

/// Per-check glyphs for the `top_k` rows with the highest totals (at least one).
pub fn details(rows: &[SectorRow], top_k: usize) -> String {
    let mut out = String::new();
    if rows.is_empty() {
        return out;
    }

    let mut ranked: Vec<&SectorRow> = rows.iter().collect();
    ranked.sort_by(|a, b| b.total().cmp(&a.total()));
    let k = top_k.clamp(1, ranked.len());

    for row in &ranked[..k] {
        let _ = writeln!(out, "\nDetails: {}", row.symbol);
        let _ = writeln!(out, "{:<24} 1 2 3 4 5 6  Cat Total", "Factor");
        for key in CategoryKey::ALL {
            let Some(cat) = row.category(key) else {
                continue;
            };
            let glyphs: Vec<String> = cat.checks.iter().map(|c| glyph(c).to_string()).collect();
            let factor = format!("{key}  {}", key.name());
            let _ = writeln!(
                out,
                "{factor:<24} {}  {}",
                glyphs.join(" "),
                score_cell(cat.total(), Category::MAX_TOTAL)
            );
        }
    }
    out
}

/// Compact tiles of `SYMBOL pct% SHORT`, `cols` per line (at least one).
pub fn grid(rated: &[RatedSymbol], cols: usize) -> String {
    let cols = cols.max(1);
    let mut out = String::new();
    for line in rated.chunks(cols) {
        let tiles: Vec<String> = line
            .iter()
            .map(|r| {
                let tile = format!("{} {:>3}% {}", r.symbol, r.score, r.rating.short());
                format!("{tile:<TILE_WIDTH$}")
            })
            .collect();
        let _ = writeln!(out, "{}", tiles.join(" ").trim_end());
    }
    out
}

/// One line naming the scheme and the cut-points in use.
pub fn bounds_line(scheme: RatingScheme, bounds: &RatingBounds) -> String {
    let cuts: Vec<String> = bounds.cuts().iter().map(u32::to_string).collect();
    format!("Rating: {scheme} (cuts {})", cuts.join("/"))
}
