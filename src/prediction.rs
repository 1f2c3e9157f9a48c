use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

pub const PREDICTION_FAILED: &str = "Failed to generate prediction. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    pub fn number(self) -> u8 {
        self as u8 + 1
    }

    pub fn name(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Month {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Month::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow!("Invalid month: {s}"))
    }
}

/// The selectable years: `current` and the four after it.
pub fn year_options(current: i32) -> Vec<i32> {
    (current..current + 5).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub location: String,
    pub month: Month,
    pub year: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionKind {
    Actual,
    Forecast,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub prediction: f64,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<PredictionKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn for_cases(predicted: f64) -> Self {
        if predicted < 35.0 {
            RiskLevel::Low
        } else if predicted < 55.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low Risk",
            RiskLevel::Medium => "Medium Risk",
            RiskLevel::High => "High Risk",
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            RiskLevel::Low => {
                "Take basic precautions like using mosquito repellents and eliminating standing water around your home."
            }
            RiskLevel::Medium => {
                "Be vigilant about mosquito control measures. Consider wearing long sleeves and using bed nets."
            }
            RiskLevel::High => {
                "High alert! Take extensive precautions and follow all guidelines from health authorities."
            }
        }
    }
}

/// A prediction with the advice shown alongside it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub location: String,
    pub month: Month,
    pub year: i32,
    pub prediction: f64,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<PredictionKind>,
    pub risk: RiskLevel,
    pub label: &'static str,
    pub recommendation: &'static str,
}

impl Assessment {
    pub fn new(req: &PredictRequest, p: &Prediction) -> Self {
        let risk = RiskLevel::for_cases(p.prediction);
        Self {
            location: req.location.clone(),
            month: req.month,
            year: req.year,
            prediction: p.prediction,
            kind: p.kind,
            risk,
            label: risk.label(),
            recommendation: risk.recommendation(),
        }
    }
}
