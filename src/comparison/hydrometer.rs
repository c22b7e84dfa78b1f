//! Hydrometer comparisons on API gravity corrected to 60 °F
//!
//! The correction itself is an external service. Comparison is split in two:
//! build the correction requests, then compare once both corrected values are
//! resolved. [`compare_with`] strings the two together.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{limits, within};
use crate::collaborators::Api60fCorrector;
use crate::error::ComparisonError;
use crate::units::{Measured, TemperatureUnit};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HydrometerSideInput {
    pub api: Option<f64>,
    pub temperature: Option<f64>,
    /// Blank means °F
    pub temperature_unit: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HydrometerInput {
    pub work: HydrometerSideInput,
    pub reference: HydrometerSideInput,
}

/// Observed temperature (°F) and API reading handed to the correction service
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrectionRequest {
    pub temp_f: f64,
    pub api: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydrometerSide {
    pub api: f64,
    pub temperature: Measured<TemperatureUnit>,
    pub api60f: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydrometerComparison {
    pub work: HydrometerSide,
    pub reference: HydrometerSide,
    /// Working minus reference, °API at 60 °F
    pub diff_api: f64,
}

impl HydrometerComparison {
    pub fn passes(&self) -> bool {
        within(self.diff_api, limits::API_60F)
    }

    /// The raw readings this comparison was made from
    pub fn input(&self) -> HydrometerInput {
        HydrometerInput {
            work: self.work.input(),
            reference: self.reference.input(),
        }
    }
}

impl HydrometerSide {
    fn input(&self) -> HydrometerSideInput {
        HydrometerSideInput {
            api: Some(self.api),
            temperature: Some(self.temperature.value),
            temperature_unit: self.temperature.unit.symbol().to_string(),
        }
    }
}

impl HydrometerSideInput {
    fn resolve(&self, side: &'static str) -> Result<(f64, Measured<TemperatureUnit>), ComparisonError> {
        let unit = if self.temperature_unit.trim().is_empty() {
            TemperatureUnit::Fahrenheit
        } else {
            TemperatureUnit::parse(&self.temperature_unit)
                .ok_or_else(|| ComparisonError::UnsupportedUnit(self.temperature_unit.clone()))?
        };
        let api = self
            .api
            .filter(|v| v.is_finite())
            .ok_or(ComparisonError::MissingReading(side))?;
        let temperature = self
            .temperature
            .filter(|v| v.is_finite())
            .ok_or(ComparisonError::MissingReading(side))?;
        Ok((api, Measured::new(temperature, unit)))
    }

    pub fn correction_request(&self, side: &'static str) -> Result<CorrectionRequest, ComparisonError> {
        let (api, temperature) = self.resolve(side)?;
        Ok(CorrectionRequest {
            temp_f: temperature.unit.to_fahrenheit(temperature.value),
            api,
        })
    }
}

impl HydrometerInput {
    /// Requests for the working and the reference instrument, in that order
    pub fn correction_requests(&self) -> Result<[CorrectionRequest; 2], ComparisonError> {
        Ok([
            self.work.correction_request("working hydrometer")?,
            self.reference.correction_request("reference hydrometer")?,
        ])
    }
}

/// Compare once the corrected values are known; `None` means the service failed
pub fn compare_hydrometer(
    input: &HydrometerInput,
    work_api60f: Option<f64>,
    reference_api60f: Option<f64>,
) -> Result<HydrometerComparison, ComparisonError> {
    let (work_api, work_temp) = input.work.resolve("working hydrometer")?;
    let (ref_api, ref_temp) = input.reference.resolve("reference hydrometer")?;

    let work_api60f = work_api60f
        .filter(|v| v.is_finite())
        .ok_or_else(|| ComparisonError::CorrectionUnavailable("working hydrometer".into()))?;
    let reference_api60f = reference_api60f
        .filter(|v| v.is_finite())
        .ok_or_else(|| ComparisonError::CorrectionUnavailable("reference hydrometer".into()))?;

    Ok(HydrometerComparison {
        work: HydrometerSide { api: work_api, temperature: work_temp, api60f: work_api60f },
        reference: HydrometerSide { api: ref_api, temperature: ref_temp, api60f: reference_api60f },
        diff_api: work_api60f - reference_api60f,
    })
}

/// Request both corrections from `corrector` and compare
pub async fn compare_with<C>(corrector: &C, input: &HydrometerInput) -> Result<HydrometerComparison, ComparisonError>
where
    C: Api60fCorrector + ?Sized,
{
    let [work, reference] = input.correction_requests()?;

    let mut corrected = [None, None];
    for (slot, request) in corrected.iter_mut().zip([work, reference]) {
        match corrector.correct(request.temp_f, request.api).await {
            Ok(value) => *slot = Some(value),
            Err(e) => warn!("API-60F correction failed for {:?}: {}", request, e),
        }
    }

    compare_hydrometer(input, corrected[0], corrected[1])
}

/// Correct a stored comparison's readings again and compare afresh
pub async fn recheck<C>(corrector: &C, stored: &HydrometerComparison) -> Result<HydrometerComparison, ComparisonError>
where
    C: Api60fCorrector + ?Sized,
{
    compare_with(corrector, &stored.input()).await
}
