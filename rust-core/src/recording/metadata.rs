//! Calibration constants from the per-recording settings file
//!
//! Every raw recording `<name>.log` has a companion level-5 MAT file
//! `<name>.mat` written by the acquisition software. Only the scalar
//! fields needed to turn ADC codes into current are read.

use crate::error::{Result, TraceError};
use log::debug;
use matfile::{MatFile, NumericData};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Extension of the companion settings file
pub const METADATA_EXTENSION: &str = "mat";

/// Field names in the settings file
pub mod fields {
    pub const SAMPLE_RATE: &str = "ADCSAMPLERATE";
    pub const TIA_GAIN: &str = "SETUP_TIAgain";
    pub const PRE_ADC_GAIN: &str = "SETUP_preADCgain";
    pub const CURRENT_OFFSET: &str = "SETUP_pAoffset";
    pub const VOLTAGE_OFFSET: &str = "SETUP_mVoffset";
    pub const ADC_VREF: &str = "SETUP_ADCVREF";
    pub const ADC_BITS: &str = "SETUP_ADCBITS";
}

/// Calibration of one recording
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationParams {
    /// Acquisition rate in Hz
    pub sample_rate: f64,

    /// Transimpedance amplifier gain (V/A)
    pub tia_gain: f64,

    /// Voltage gain between the TIA and the ADC
    pub pre_adc_gain: f64,

    /// Current offset added after conversion, in amperes
    pub current_offset: f64,

    /// Applied bias offset (mV). Not used for scaling.
    pub voltage_offset: f64,

    /// ADC reference voltage; codes span [+vref, -vref]
    pub adc_vref: f64,

    /// True ADC resolution. Raw words are 16 bits wide, the low
    /// `16 - adc_bits` bits are padding.
    pub adc_bits: u32,
}

impl CalibrationParams {
    /// Build from named scalar fields, failing on any missing or
    /// non-scalar entry instead of defaulting.
    ///
    /// # Arguments
    /// * `source` - Path reported in errors
    /// * `values` - Field name to flattened numeric contents
    pub fn from_fields(source: &Path, values: &HashMap<String, Vec<f64>>) -> Result<Self> {
        let scalar = |name: &str| -> Result<f64> {
            let data = values.get(name).ok_or_else(|| TraceError::MetadataMalformed {
                path: source.to_path_buf(),
                reason: format!("missing field {name}"),
            })?;
            match data.as_slice() {
                [value] if value.is_finite() => Ok(*value),
                [value] => Err(TraceError::MetadataMalformed {
                    path: source.to_path_buf(),
                    reason: format!("field {name} is not finite ({value})"),
                }),
                _ => Err(TraceError::MetadataMalformed {
                    path: source.to_path_buf(),
                    reason: format!("field {name} is not a scalar ({} elements)", data.len()),
                }),
            }
        };

        let malformed = |reason: String| TraceError::MetadataMalformed {
            path: source.to_path_buf(),
            reason,
        };

        let sample_rate = scalar(fields::SAMPLE_RATE)?;
        if sample_rate <= 0.0 {
            return Err(malformed(format!("sample rate must be positive, got {sample_rate}")));
        }

        let tia_gain = scalar(fields::TIA_GAIN)?;
        let pre_adc_gain = scalar(fields::PRE_ADC_GAIN)?;
        if tia_gain * pre_adc_gain == 0.0 {
            return Err(malformed("closed-loop gain is zero".to_string()));
        }

        let bits = scalar(fields::ADC_BITS)?;
        if bits.fract() != 0.0 || !(1.0..=16.0).contains(&bits) {
            return Err(malformed(format!(
                "ADC bit depth must be an integer in 1..=16, got {bits}"
            )));
        }

        Ok(Self {
            sample_rate,
            tia_gain,
            pre_adc_gain,
            current_offset: scalar(fields::CURRENT_OFFSET)?,
            voltage_offset: scalar(fields::VOLTAGE_OFFSET)?,
            adc_vref: scalar(fields::ADC_VREF)?,
            adc_bits: bits as u32,
        })
    }

    /// TIA gain times pre-ADC gain
    pub fn closed_loop_gain(&self) -> f64 {
        self.tia_gain * self.pre_adc_gain
    }

    /// Mask that zeroes the padding bits below the ADC resolution
    pub fn code_mask(&self) -> u16 {
        let padding = 16 - self.adc_bits.min(16);
        u16::MAX.checked_shl(padding).unwrap_or(0)
    }

    /// Convert one raw 16-bit word to picoamps
    ///
    /// 1. Zero the padding bits (not rounded)
    /// 2. Map [0, 2^16) linearly onto [+vref, -vref]
    /// 3. Divide by the closed-loop gain, negate, add the current offset
    /// 4. Amperes to picoamps
    #[inline]
    pub fn scale_code(&self, code: u16) -> f64 {
        let masked = f64::from(code & self.code_mask());
        let volts = self.adc_vref - 2.0 * self.adc_vref * masked / 65536.0;
        (-volts / self.closed_loop_gain() + self.current_offset) * 1e12
    }
}

/// Source of calibration for a recording
pub trait MetadataLoader {
    /// Load the calibration belonging to `recording`
    fn load(&self, recording: &Path) -> Result<CalibrationParams>;
}

/// Reads the companion `.mat` settings file next to each recording
#[derive(Debug, Clone, Copy, Default)]
pub struct MatMetadataLoader;

impl MatMetadataLoader {
    /// Path of the settings file for a recording: same stem, `.mat` extension
    pub fn companion_path(recording: &Path) -> PathBuf {
        recording.with_extension(METADATA_EXTENSION)
    }
}

impl MetadataLoader for MatMetadataLoader {
    fn load(&self, recording: &Path) -> Result<CalibrationParams> {
        let path = Self::companion_path(recording);
        if !path.is_file() {
            return Err(TraceError::MetadataMissing { path });
        }

        let file = File::open(&path).map_err(|e| TraceError::io(&path, e))?;
        let mat = MatFile::parse(BufReader::new(file)).map_err(|e| TraceError::MetadataMalformed {
            path: path.clone(),
            reason: format!("{e:?}"),
        })?;

        let values: HashMap<String, Vec<f64>> = mat
            .arrays()
            .iter()
            .filter_map(|array| numeric_values(array.data()).map(|v| (array.name().to_string(), v)))
            .collect();

        debug!("Loaded {} numeric fields from {}", values.len(), path.display());

        CalibrationParams::from_fields(&path, &values)
    }
}

/// Flatten a real numeric array to f64. Complex arrays are rejected.
fn numeric_values(data: &NumericData) -> Option<Vec<f64>> {
    fn widen<T: Copy + Into<f64>>(real: &[T], imag: &Option<Vec<T>>) -> Option<Vec<f64>> {
        if imag.is_some() {
            return None;
        }
        Some(real.iter().map(|&v| v.into()).collect())
    }

    match data {
        NumericData::Int8 { real, imag } => widen(real, imag),
        NumericData::UInt8 { real, imag } => widen(real, imag),
        NumericData::Int16 { real, imag } => widen(real, imag),
        NumericData::UInt16 { real, imag } => widen(real, imag),
        NumericData::Int32 { real, imag } => widen(real, imag),
        NumericData::UInt32 { real, imag } => widen(real, imag),
        NumericData::Int64 { real, imag } => {
            imag.is_none().then(|| real.iter().map(|&v| v as f64).collect())
        }
        NumericData::UInt64 { real, imag } => {
            imag.is_none().then(|| real.iter().map(|&v| v as f64).collect())
        }
        NumericData::Single { real, imag } => widen(real, imag),
        NumericData::Double { real, imag } => widen(real, imag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(overrides: &[(&str, Vec<f64>)]) -> HashMap<String, Vec<f64>> {
        let mut values: HashMap<String, Vec<f64>> = [
            (fields::SAMPLE_RATE, 250_000.0),
            (fields::TIA_GAIN, 100e6),
            (fields::PRE_ADC_GAIN, 9.52),
            (fields::CURRENT_OFFSET, 0.0),
            (fields::VOLTAGE_OFFSET, 0.0),
            (fields::ADC_VREF, 2.5),
            (fields::ADC_BITS, 14.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), vec![v]))
        .collect();
        for (name, value) in overrides {
            values.insert(name.to_string(), value.clone());
        }
        values
    }

    #[test]
    fn test_from_fields() {
        let params = CalibrationParams::from_fields(Path::new("a.mat"), &settings(&[])).unwrap();
        assert_eq!(params.sample_rate, 250_000.0);
        assert_eq!(params.adc_bits, 14);
        assert!((params.closed_loop_gain() - 952e6).abs() < 1e-3);
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let mut values = settings(&[]);
        values.remove(fields::ADC_VREF);
        let err = CalibrationParams::from_fields(Path::new("a.mat"), &values).unwrap_err();
        match err {
            TraceError::MetadataMalformed { reason, .. } => {
                assert!(reason.contains("SETUP_ADCVREF"))
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_non_scalar_field_is_malformed() {
        let values = settings(&[(fields::TIA_GAIN, vec![1.0, 2.0])]);
        assert!(matches!(
            CalibrationParams::from_fields(Path::new("a.mat"), &values),
            Err(TraceError::MetadataMalformed { .. })
        ));
    }

    #[test]
    fn test_bad_bit_depth() {
        let values = settings(&[(fields::ADC_BITS, vec![17.0])]);
        assert!(CalibrationParams::from_fields(Path::new("a.mat"), &values).is_err());
    }

    #[test]
    fn test_code_mask() {
        let mut params =
            CalibrationParams::from_fields(Path::new("a.mat"), &settings(&[])).unwrap();
        assert_eq!(params.code_mask(), 0xFFFC);
        params.adc_bits = 16;
        assert_eq!(params.code_mask(), 0xFFFF);
        params.adc_bits = 12;
        assert_eq!(params.code_mask(), 0xFFF0);
    }

    #[test]
    fn test_scale_code() {
        let params = CalibrationParams::from_fields(
            Path::new("a.mat"),
            &settings(&[(fields::CURRENT_OFFSET, vec![1e-9])]),
        )
        .unwrap();

        // Code 0 sits at +vref
        let expected_zero = (-2.5 / 952e6 + 1e-9) * 1e12;
        assert!((params.scale_code(0) - expected_zero).abs() < 1e-9);

        // Mid-scale is 0 V, only the offset remains
        assert!((params.scale_code(32768) - 1000.0).abs() < 1e-9);

        // Padding bits are masked, not rounded
        assert_eq!(params.scale_code(32771), params.scale_code(32768));
    }

    #[test]
    fn test_missing_companion_file() {
        let dir = tempfile::tempdir().unwrap();
        let recording = dir.path().join("run_20240101_120000.log");
        let err = MatMetadataLoader.load(&recording).unwrap_err();
        assert!(matches!(err, TraceError::MetadataMissing { .. }));
    }
}
