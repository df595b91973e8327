#![cfg_attr(not(test), no_std)]

use core::fmt::Display;

pub mod calibration;
pub mod estimator;
pub mod sampler;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ThermistorError {
    // averaged tap voltage, in volts, outside (0, vcc)
    VoltageOutOfRange(f64),
    // Rt / Rx is not a valid argument for the Beta equation
    DegenerateRatio,
    NoSamples,
}

impl Display for ThermistorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self {
            ThermistorError::VoltageOutOfRange(volts) => {
                core::write!(f, "Divider voltage out of range: {:.3} V", volts)
            }
            ThermistorError::DegenerateRatio => {
                core::write!(f, "Thermistor resistance gives no valid temperature")
            }
            ThermistorError::NoSamples => {
                core::write!(f, "No samples to average")
            }
        }
    }
}

#[cfg(feature = "defmt-log")]
impl defmt::Format for ThermistorError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            ThermistorError::VoltageOutOfRange(volts) => {
                defmt::write!(fmt, "Divider voltage out of range: {} V", volts)
            }
            ThermistorError::DegenerateRatio => {
                defmt::write!(fmt, "Thermistor resistance gives no valid temperature")
            }
            ThermistorError::NoSamples => defmt::write!(fmt, "No samples to average"),
        }
    }
}
