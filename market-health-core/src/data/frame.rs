//! Price frames and field resolution.
//!
//! Upstream tables arrive in several shapes: flat `Close`/`High` labels,
//! composite `Close:XLK` labels from multi-symbol downloads, inconsistent
//! casing, or only a single unnamed numeric column. `PriceFrame` hides all of
//! that behind one lookup: ask for a field, get a flat `Vec<f64>` back, or an
//! empty vector if nothing resolves. Lookups never fail.
//!
//! Resolution order for a field:
//! 1. exact label match
//! 2. composite `(field, symbol)` match, then any composite with that field
//! 3. case/whitespace-normalized match
//! 4. for Close only: `Adj Close`, then the first numeric column

use super::provider::DataError;
use polars::prelude::*;
use std::collections::HashSet;

/// Separator between field and symbol in a composite column label.
pub const COMPOSITE_SEPARATOR: char = ':';

/// Label of the timestamp column.
pub const DATE_COLUMN: &str = "Date";

/// Labels that count as price fields when detecting composite columns.
const KNOWN_FIELDS: [&str; 8] = [
    "Open",
    "High",
    "Low",
    "Close",
    "Adj Close",
    "Volume",
    "Dividends",
    "Stock Splits",
];

/// A canonical price field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
    AdjClose,
    Volume,
}

impl PriceField {
    pub const ALL: [PriceField; 6] = [
        PriceField::Open,
        PriceField::High,
        PriceField::Low,
        PriceField::Close,
        PriceField::AdjClose,
        PriceField::Volume,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PriceField::Open => "Open",
            PriceField::High => "High",
            PriceField::Low => "Low",
            PriceField::Close => "Close",
            PriceField::AdjClose => "Adj Close",
            PriceField::Volume => "Volume",
        }
    }
}

/// Python-style title casing: first letter of every alphabetic run upper, rest lower.
pub(crate) fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

fn is_known_field(label: &str) -> bool {
    let normalized = title_case(label.trim());
    KNOWN_FIELDS.iter().any(|f| *f == normalized)
}

fn is_date_label(label: &str) -> bool {
    matches!(
        title_case(label.trim()).as_str(),
        "Date" | "Datetime" | "Timestamp"
    )
}

/// Split a composite label into `(field, symbol)`.
///
/// Either order is accepted (`Close:XLK` or `XLK:Close`) as long as one side
/// is a known price field.
fn split_composite(label: &str) -> Option<(&str, &str)> {
    let (a, b) = label.split_once(COMPOSITE_SEPARATOR)?;
    let (a, b) = (a.trim(), b.trim());
    if is_known_field(a) {
        Some((a, b))
    } else if is_known_field(b) {
        Some((b, a))
    } else {
        None
    }
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float64
            | DataType::Float32
            | DataType::Int64
            | DataType::Int32
            | DataType::Int16
            | DataType::Int8
            | DataType::UInt64
            | DataType::UInt32
            | DataType::UInt16
            | DataType::UInt8
    )
}

/// Coerce a column to `f64`. Nulls and unparseable values become NaN.
fn column_to_f64(col: &Column) -> Vec<f64> {
    let Ok(cast) = col.cast(&DataType::Float64) else {
        return Vec::new();
    };
    match cast.f64() {
        Ok(ca) => ca.iter().map(|v| v.unwrap_or(f64::NAN)).collect(),
        Err(_) => Vec::new(),
    }
}

/// A raw price table for one symbol, as returned by a fetch attempt.
///
/// Replaced wholesale on refresh; never mutated in place.
#[derive(Debug, Clone)]
pub struct PriceFrame {
    df: DataFrame,
}

impl Default for PriceFrame {
    fn default() -> Self {
        Self::empty()
    }
}

impl PriceFrame {
    /// Wrap an existing frame as-is.
    pub fn new(df: DataFrame) -> Self {
        Self { df }
    }

    /// A frame with no rows and no columns.
    pub fn empty() -> Self {
        Self {
            df: DataFrame::empty(),
        }
    }

    /// Build a frame from columns; lengths must match.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, DataError> {
        Ok(Self::new(DataFrame::new(columns)?))
    }

    /// Number of bars.
    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0 || self.df.width() == 0
    }

    /// Column labels in frame order.
    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Whether a Close (or Adj Close) column is present under a flat or composite label.
    pub fn has_close(&self) -> bool {
        self.resolve_labelled(PriceField::Close, None).is_some()
            || self.resolve_labelled(PriceField::AdjClose, None).is_some()
    }

    /// Flat numeric series for `field`, or an empty vector if it cannot be resolved.
    pub fn series(&self, field: PriceField, symbol: Option<&str>) -> Vec<f64> {
        if self.is_empty() {
            return Vec::new();
        }
        self.resolve(field, symbol)
            .map(column_to_f64)
            .unwrap_or_default()
    }

    /// Bar timestamps. Falls back to positional indices when no usable date column exists.
    pub fn timestamps(&self) -> Vec<i64> {
        let n = self.len();
        let parsed: Option<Vec<Option<i64>>> = self
            .df
            .get_columns()
            .iter()
            .find(|c| is_date_label(c.name().as_str()))
            .and_then(|c| c.cast(&DataType::Int64).ok())
            .and_then(|c| c.i64().ok().map(|ca| ca.iter().collect()));

        match parsed {
            Some(values) if values.len() == n && values.iter().all(Option::is_some) => {
                values.into_iter().flatten().collect()
            }
            _ => (0..n as i64).collect(),
        }
    }

    fn resolve(&self, field: PriceField, symbol: Option<&str>) -> Option<&Column> {
        self.resolve_labelled(field, symbol).or_else(|| match field {
            PriceField::Close => self
                .resolve_labelled(PriceField::AdjClose, symbol)
                .or_else(|| self.first_numeric()),
            _ => None,
        })
    }

    fn resolve_labelled(&self, field: PriceField, symbol: Option<&str>) -> Option<&Column> {
        let columns = self.df.get_columns();
        let want = field.as_str();

        if let Some(col) = columns.iter().find(|c| c.name().as_str() == want) {
            return Some(col);
        }

        if let Some(sym) = symbol {
            let hit = columns.iter().find(|c| {
                matches!(split_composite(c.name().as_str()),
                    Some((f, s)) if title_case(f) == want && s.eq_ignore_ascii_case(sym))
            });
            if hit.is_some() {
                return hit;
            }
        }

        let hit = columns.iter().find(|c| {
            matches!(split_composite(c.name().as_str()), Some((f, _)) if title_case(f) == want)
        });
        if hit.is_some() {
            return hit;
        }

        columns
            .iter()
            .find(|c| title_case(c.name().as_str().trim()) == want)
    }

    fn first_numeric(&self) -> Option<&Column> {
        self.df
            .get_columns()
            .iter()
            .find(|c| !is_date_label(c.name().as_str()) && is_numeric(c.dtype()))
    }

    /// Canonicalize labels for `symbol` and drop unusable rows.
    ///
    /// - composite labels for `symbol` collapse to their field; composites for
    ///   other symbols are dropped (unless the frame only has one symbol)
    /// - every label is trimmed and title-cased; later duplicates are dropped
    /// - rows with no numeric value, or whose timestamp does not advance, are dropped
    pub fn normalize(&self, symbol: &str) -> Result<PriceFrame, DataError> {
        if self.is_empty() {
            return Ok(Self::empty());
        }

        let columns = self.df.get_columns();
        let composite_symbols: HashSet<String> = columns
            .iter()
            .filter_map(|c| split_composite(c.name().as_str()).map(|(_, s)| s.to_uppercase()))
            .collect();
        let has_own = composite_symbols.contains(&symbol.to_uppercase());
        let single_symbol = composite_symbols.len() == 1;

        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(columns.len());
        for col in columns {
            let raw = col.name().as_str();
            let label = match split_composite(raw) {
                Some((field, sym)) => {
                    let accept = if has_own {
                        sym.eq_ignore_ascii_case(symbol)
                    } else {
                        single_symbol
                    };
                    if !accept {
                        continue;
                    }
                    title_case(field)
                }
                None => title_case(raw.trim()),
            };
            if !seen.insert(label.clone()) {
                continue;
            }
            let mut renamed = col.clone();
            renamed.rename(label.into());
            kept.push(renamed);
        }

        Self::from_columns(kept)?.drop_unusable_rows()
    }

    fn drop_unusable_rows(self) -> Result<Self, DataError> {
        let n = self.len();
        let values: Vec<Vec<f64>> = self
            .df
            .get_columns()
            .iter()
            .filter(|c| !is_date_label(c.name().as_str()))
            .map(column_to_f64)
            .collect();
        let timestamps = self.timestamps();

        let mut keep = Vec::with_capacity(n);
        let mut last_ts: Option<i64> = None;
        for (i, ts) in timestamps.iter().enumerate() {
            let has_value = values
                .iter()
                .any(|col| col.get(i).is_some_and(|v| !v.is_nan()));
            let advances = last_ts.map_or(true, |prev| *ts > prev);
            let k = has_value && advances;
            if k {
                last_ts = Some(*ts);
            }
            keep.push(k);
        }

        if keep.iter().all(|k| *k) {
            return Ok(self);
        }
        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        Ok(Self::new(self.df.filter(&mask)?))
    }
}

/// Canonical column series for one symbol, aligned by bar.
///
/// Every non-empty series has the same length as `timestamps`. A field that
/// could not be resolved is an empty vector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceHistory {
    pub timestamps: Vec<i64>,
    pub close: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub volume: Vec<f64>,
}

impl PriceHistory {
    /// Pull `symbol`'s bars out of `frame`; empty when it has no close column.
    pub fn from_frame(frame: &PriceFrame, symbol: &str) -> Self {
        let close = frame.series(PriceField::Close, Some(symbol));
        if close.is_empty() {
            return Self::default();
        }
        Self {
            timestamps: frame.timestamps(),
            high: frame.series(PriceField::High, Some(symbol)),
            low: frame.series(PriceField::Low, Some(symbol)),
            volume: frame.series(PriceField::Volume, Some(symbol)),
            close,
        }
    }

    /// Close-only history with positional timestamps.
    pub fn from_closes(close: Vec<f64>) -> Self {
        Self {
            timestamps: (0..close.len() as i64).collect(),
            close,
            ..Self::default()
        }
    }

    /// Number of bars.
    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }
}
