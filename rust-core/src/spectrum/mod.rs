//! Spectral analysis: Welch PSD and integrated noise

pub mod fft;
pub mod noise;
pub mod welch;
pub mod windows;

pub use fft::FftEngine;
pub use noise::integrate_rms;
pub use welch::{
    resolve_segment_length, welch_psd, welch_psd_with, PsdResult, WelchConfig, DEFAULT_MAX_SEGMENT,
};
pub use windows::WindowType;
