#![cfg_attr(not(test), no_std)]

use core::{future::Future, time::Duration};

use math::measurements::{Resistance, Temperature, Voltage};
use math::Resolution;

/// Physical constants of the thermistor and its divider.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ThermistorConstants {
    /// Beta coefficient, in kelvin.
    pub b: Temperature,
    /// Nominal resistance at `t0`.
    pub r0: Resistance,
    pub t0: Temperature,
    /// Series resistor between the divider tap and ground.
    pub r_series: Resistance,
    pub vcc: Voltage,
}

impl Default for ThermistorConstants {
    fn default() -> Self {
        Self {
            b: Temperature::from_kelvin(3950.0),
            r0: Resistance::from_ohms(100_000.0),
            t0: Temperature::from_kelvin(298.15),
            r_series: Resistance::from_ohms(10_000.0),
            vcc: Voltage::from_volts(3.3),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct SamplingConfig {
    // raw conversions averaged into one sample
    pub samples_per_read: u32,
    // samples averaged into one temperature
    pub reads_per_cycle: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            samples_per_read: 64,
            reads_per_cycle: 5,
        }
    }
}

/// Cooperative waits of the measurement loop.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct SchedulePolicy {
    pub inter_sample: Duration,
    pub inter_cycle: Duration,
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        Self {
            inter_sample: Duration::from_millis(10),
            inter_cycle: Duration::from_millis(1000),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Attenuation {
    Db0,
    Db2_5,
    Db6,
    Db11,
}

impl Attenuation {
    /*
    full scale of the input relative to the reference voltage, Q16 fixed point,
    and the intercept in millivolts measured at code 0
    */
    pub fn vref_scale(&self) -> u32 {
        match self {
            Attenuation::Db0 => 57431,
            Attenuation::Db2_5 => 76236,
            Attenuation::Db6 => 105481,
            Attenuation::Db11 => 196602,
        }
    }

    pub fn vref_offset_mv(&self) -> u32 {
        match self {
            Attenuation::Db0 => 75,
            Attenuation::Db2_5 => 78,
            Attenuation::Db6 => 88,
            Attenuation::Db11 => 142,
        }
    }
}

impl TryFrom<&str> for Attenuation {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "0dB" => Ok(Attenuation::Db0),
            "2.5dB" => Ok(Attenuation::Db2_5),
            "6dB" => Ok(Attenuation::Db6),
            "11dB" => Ok(Attenuation::Db11),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct AdcConfig {
    pub resolution: Resolution,
    pub attenuation: Attenuation,
    // used when the chip carries no calibration of its own
    pub default_vref: Voltage,
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::BITS13,
            attenuation: Attenuation::Db11,
            default_vref: Voltage::from_millivolts(1100.0),
        }
    }
}

/// One-shot access to the configured ADC channel.
pub trait MyAdc {
    fn read(&mut self) -> u16;
}

pub trait TimerTrait {
    fn after(duration: Duration) -> impl Future<Output = ()>;
}

#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
pub struct CalibrationPoint {
    pub raw: u32,
    pub millivolts: u32,
}

/// Two factory measurements of a known input, taken at the configured attenuation.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
pub struct TwoPointFuse {
    pub low: CalibrationPoint,
    pub high: CalibrationPoint,
}

/// Factory calibration burned into the chip, if any.
pub trait CalibrationFuses {
    fn two_point(&self) -> Option<TwoPointFuse>;
    fn vref(&self) -> Option<Voltage>;
}
