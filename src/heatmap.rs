use serde::Serialize;

use crate::cases::{CaseDataset, CaseRecord};
use crate::gazetteer::Gazetteer;
use crate::geo::Coordinate;

pub const DEFAULT_YEAR: i32 = 2021;
pub const MAP_CENTER: Coordinate = Coordinate::new(12.9216, 77.6246);
pub const MAP_ZOOM: u8 = 11;

/// How case counts turn into circle size and shade.
///
/// Changing any of these changes how years compare visually; keep `legend` in step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatmapPolicy {
    pub intensity_divisor: f64,
    pub metres_per_intensity: f64,
    pub base_opacity: f64,
    pub moderate_from: u32,
    pub high_from: u32,
}

impl Default for HeatmapPolicy {
    fn default() -> Self {
        Self {
            intensity_divisor: 100.0,
            metres_per_intensity: 120.0,
            base_opacity: 0.5,
            moderate_from: 50,
            high_from: 150,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub severity: Severity,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatMarker {
    pub area: String,
    pub center: Coordinate,
    pub cases: u32,
    pub intensity: f64,
    pub radius_m: f64,
    pub fill_opacity: f64,
    pub severity: Severity,
    pub tooltip: String,
}

impl HeatmapPolicy {
    pub fn intensity(&self, cases: u32) -> f64 {
        f64::from(cases) / self.intensity_divisor
    }

    pub fn severity(&self, cases: u32) -> Severity {
        if cases < self.moderate_from {
            Severity::Low
        } else if cases < self.high_from {
            Severity::Moderate
        } else {
            Severity::High
        }
    }

    pub fn legend(&self) -> Vec<LegendEntry> {
        vec![
            LegendEntry {
                severity: Severity::Low,
                label: format!("< {} cases", self.moderate_from),
            },
            LegendEntry {
                severity: Severity::Moderate,
                label: format!(
                    "{}-{} cases",
                    self.moderate_from,
                    self.high_from.saturating_sub(1)
                ),
            },
            LegendEntry {
                severity: Severity::High,
                label: format!("{}+ cases", self.high_from),
            },
        ]
    }

    /// `None` when the record's area is not in the gazetteer.
    pub fn marker(&self, rec: &CaseRecord, gazetteer: &Gazetteer) -> Option<HeatMarker> {
        let center = gazetteer.lookup(&rec.area)?;
        let intensity = self.intensity(rec.cases);
        Some(HeatMarker {
            area: rec.area.clone(),
            center,
            cases: rec.cases,
            intensity,
            radius_m: intensity * self.metres_per_intensity,
            fill_opacity: (self.base_opacity + intensity / 100.0).min(1.0),
            severity: self.severity(rec.cases),
            tooltip: format!("{}: {} cases", rec.area, rec.cases),
        })
    }

    /// Markers for `year` in file order; areas without a gazetteer entry are left out.
    pub fn markers(
        &self,
        dataset: &CaseDataset,
        gazetteer: &Gazetteer,
        year: i32,
    ) -> Vec<HeatMarker> {
        dataset
            .for_year(year)
            .into_iter()
            .filter_map(|rec| self.marker(rec, gazetteer))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HeatmapView {
    pub year: i32,
    pub center: Coordinate,
    pub zoom: u8,
    pub legend: Vec<LegendEntry>,
    pub markers: Vec<HeatMarker>,
}

impl HeatmapView {
    pub fn build(
        policy: &HeatmapPolicy,
        dataset: &CaseDataset,
        gazetteer: &Gazetteer,
        year: i32,
    ) -> Self {
        Self {
            year,
            center: MAP_CENTER,
            zoom: MAP_ZOOM,
            legend: policy.legend(),
            markers: policy.markers(dataset, gazetteer, year),
        }
    }
}
