//! Query-driven trace and PSD processing
//!
//! Order is fixed: assemble, then low-pass, then downsample. The PSD path
//! stops after the low-pass and estimates at the recording rate.

use crate::error::{Result, TraceWarning};
use crate::filters::{downsample, low_pass};
use crate::recording::MetadataLoader;
use crate::session::{AssembledSignal, Session};
use crate::spectrum::{welch_psd, PsdResult};
use log::info;

/// Plot range used when no low-pass is applied (Hz)
pub const UNFILTERED_BANDWIDTH: f64 = 2e6;

/// Analysis request
#[derive(Debug, Clone, PartialEq)]
pub struct TraceQuery {
    /// Seconds from the start of the session
    pub start_time: f64,
    pub end_time: f64,

    /// Low-pass cutoff (Hz); `None` leaves the trace unfiltered
    pub cutoff_hz: Option<f64>,
    pub filter_order: usize,

    /// Output rate for the trace view (Hz)
    pub downsample_rate: Option<f64>,

    /// Welch segment length (s)
    pub psd_segment_seconds: Option<f64>,
}

impl Default for TraceQuery {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            end_time: 10.0,
            cutoff_hz: Some(900_000.0),
            filter_order: 8,
            downsample_rate: None,
            psd_segment_seconds: None,
        }
    }
}

/// Processed trace with its position in the session
#[derive(Debug, Clone, PartialEq)]
pub struct TraceView {
    pub signal: AssembledSignal,
    pub start_time: f64,
}

impl TraceView {
    /// Time of every sample: start + (i + 1) / rate
    pub fn time_axis(&self) -> Vec<f64> {
        let rate = self.signal.sample_rate;
        (1..=self.signal.len())
            .map(|i| self.start_time + i as f64 / rate)
            .collect()
    }

    pub fn warnings(&self) -> &[TraceWarning] {
        &self.signal.warnings
    }
}

/// PSD of a query together with the band it should be read over
#[derive(Debug, Clone, PartialEq)]
pub struct PsdReport {
    pub psd: PsdResult,
    pub warnings: Vec<TraceWarning>,

    /// Upper frequency of the display range (Hz)
    pub bandwidth_hz: f64,
}

impl PsdReport {
    /// RMS noise up to half the display range, i.e. up to the cutoff
    pub fn band_rms(&self) -> f64 {
        self.psd.band_limited_rms(self.bandwidth_hz / 2.0)
    }
}

/// Display range for a query: twice the cutoff, or 2 MHz unfiltered
pub fn display_bandwidth(cutoff_hz: Option<f64>) -> f64 {
    cutoff_hz.map_or(UNFILTERED_BANDWIDTH, |cutoff| 2.0 * cutoff)
}

/// Assemble and low-pass, as shared by both views
fn filtered<L: MetadataLoader>(
    session: &mut Session<L>,
    query: &TraceQuery,
) -> Result<AssembledSignal> {
    let signal = session.assemble(query.start_time, query.end_time)?;
    match query.cutoff_hz {
        Some(cutoff) => low_pass(&signal, cutoff, query.filter_order),
        None => Ok(signal),
    }
}

/// Current trace for `query`: assemble, filter, then downsample
pub fn process_trace<L: MetadataLoader>(
    session: &mut Session<L>,
    query: &TraceQuery,
) -> Result<TraceView> {
    let signal = filtered(session, query)?;
    let signal = match query.downsample_rate {
        Some(rate) => downsample(&signal, rate)?,
        None => signal,
    };

    info!(
        "Trace {:.6}-{:.6} s: {} samples at {} Hz",
        query.start_time,
        query.end_time,
        signal.len(),
        signal.sample_rate
    );

    Ok(TraceView {
        signal,
        start_time: query.start_time,
    })
}

/// Noise spectrum for `query`
///
/// Uses the filtered trace at the recording rate; `downsample_rate` does
/// not apply here.
pub fn process_psd<L: MetadataLoader>(
    session: &mut Session<L>,
    query: &TraceQuery,
) -> Result<PsdReport> {
    let signal = filtered(session, query)?;
    let psd = welch_psd(&signal.samples, signal.sample_rate, query.psd_segment_seconds)?;

    let report = PsdReport {
        psd,
        warnings: signal.warnings,
        bandwidth_hz: display_bandwidth(query.cutoff_hz),
    };
    info!(
        "PSD {:.6}-{:.6} s: {} bins, {:.3} pA RMS to {} Hz",
        query.start_time,
        query.end_time,
        report.psd.frequencies.len(),
        report.band_rms(),
        report.bandwidth_hz / 2.0
    );

    Ok(report)
}
