use std::collections::BTreeSet;

use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseRecord {
    pub area: String,
    pub year: i32,
    pub cases: u32,
}

/// Historical case counts, in file order.
///
/// Loading is best effort: rows that cannot be read are skipped and the rest of the file
/// still loads.
#[derive(Debug, Clone, Default)]
pub struct CaseDataset {
    records: Vec<CaseRecord>,
}

struct Columns {
    area: usize,
    year: usize,
    cases: usize,
}

impl Columns {
    fn find(headers: &StringRecord) -> Option<Self> {
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        Some(Self {
            area: position("area")?,
            year: position("year")?,
            cases: position("cases")?,
        })
    }
}

impl CaseDataset {
    pub fn load(csv_text: &str) -> Self {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(csv_text.as_bytes());

        let columns = match reader.headers() {
            Ok(h) => Columns::find(h),
            Err(e) => {
                tracing::warn!("case CSV header unreadable: {e}");
                return Self::default();
            }
        };
        let Some(columns) = columns else {
            tracing::warn!("case CSV header lacks one of area, year, cases");
            return Self::default();
        };

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for (i, row) in reader.records().enumerate() {
            let parsed = row.ok().and_then(|r| parse_row(&r, &columns));
            match parsed {
                Some(rec) => records.push(rec),
                None => {
                    skipped += 1;
                    tracing::debug!("skipping case CSV row {}", i + 2);
                }
            }
        }
        if skipped > 0 {
            tracing::info!("loaded {} case rows, skipped {skipped}", records.len());
        }

        Self { records }
    }

    pub fn records(&self) -> &[CaseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows for `year`, in file order.
    pub fn for_year(&self, year: i32) -> Vec<&CaseRecord> {
        self.records.iter().filter(|r| r.year == year).collect()
    }

    /// Distinct years present, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.records
            .iter()
            .map(|r| r.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn parse_row(row: &StringRecord, columns: &Columns) -> Option<CaseRecord> {
    if row.iter().all(|f| f.trim().is_empty()) {
        return None;
    }
    let area = row.get(columns.area)?.trim();
    let year = row.get(columns.year)?.trim().parse::<i32>().ok()?;
    let cases = row
        .get(columns.cases)?
        .trim()
        .parse::<u32>()
        .unwrap_or(0);

    Some(CaseRecord {
        area: area.to_string(),
        year,
        cases,
    })
}
