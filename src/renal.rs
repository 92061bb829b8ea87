//! Cockcroft-Gault creatinine clearance estimation.
//!
//! Pure arithmetic over patient parameters; feeds the renal context of
//! drug-dosing queries and the severity coloring in the console. Recomputed
//! on every input change; the estimate has no lifecycle of its own.

use std::fmt;

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════

/// Cockcroft-Gault correction factor for female patients.
const FEMALE_FACTOR: f64 = 0.85;

/// CrCl below this is severe renal impairment (ml/min).
const SEVERE_BELOW: f64 = 30.0;

/// CrCl below this (and at or above `SEVERE_BELOW`) is moderate impairment.
const MODERATE_BELOW: f64 = 60.0;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Patient sex, as used by the Cockcroft-Gault formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inputs to the estimate. All values come straight from console input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PatientParams {
    pub age_years: u32,
    pub sex: Sex,
    pub weight_kg: f64,
    /// Serum creatinine in mg/dL.
    pub serum_creatinine: f64,
}

/// Severity band for the estimated clearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenalBand {
    Severe,
    Moderate,
    Normal,
}

impl RenalBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Severe => "severe",
            Self::Moderate => "moderate",
            Self::Normal => "normal",
        }
    }
}

impl fmt::Display for RenalBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Estimated clearance, rounded to one decimal, with its severity band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrClEstimate {
    pub ml_per_min: f64,
    pub band: RenalBand,
}

impl fmt::Display for CrClEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ml/min ({})", self.ml_per_min, self.band)
    }
}

// ═══════════════════════════════════════════════════════════
// Estimation
// ═══════════════════════════════════════════════════════════

/// Estimate creatinine clearance with Cockcroft-Gault:
/// `((140 − age) × weight) / (72 × creatinine)`, × 0.85 for female patients,
/// rounded to one decimal place.
///
/// Returns `None` when the inputs are out of range (age < 1, weight ≤ 0,
/// creatinine ≤ 0): "not computed" instead of a division by zero.
pub fn estimate_crcl(params: &PatientParams) -> Option<CrClEstimate> {
    if params.age_years < 1 || params.weight_kg <= 0.0 || params.serum_creatinine <= 0.0 {
        return None;
    }

    let mut crcl = ((140.0 - f64::from(params.age_years)) * params.weight_kg)
        / (72.0 * params.serum_creatinine);
    if params.sex == Sex::Female {
        crcl *= FEMALE_FACTOR;
    }

    let ml_per_min = (crcl * 10.0).round() / 10.0;
    Some(CrClEstimate {
        ml_per_min,
        band: band_for(ml_per_min),
    })
}

/// Band for an already-rounded clearance value.
fn band_for(ml_per_min: f64) -> RenalBand {
    if ml_per_min < SEVERE_BELOW {
        RenalBand::Severe
    } else if ml_per_min < MODERATE_BELOW {
        RenalBand::Moderate
    } else {
        RenalBand::Normal
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
