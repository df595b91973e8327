#![no_std]

use core::fmt::Write;
use core::ops::ControlFlow;
use core::time::Duration;

use common::{Attenuation, CalibrationFuses, MyAdc, TimerTrait, TwoPointFuse};
use defmt::{info, warn};
use esp_hal::analog::adc::{self, Adc, AdcChannel, AdcPin};
use esp_hal::efuse::{self, Efuse, EfuseField};
use esp_hal::peripherals::ADC1;
use esp_hal::Blocking;
use heapless::String;
use math::measurements::Voltage;
use thermistor::calibration::{decode_two_point, TWO_POINT_VERSION};
use thermistor::estimator::CycleReport;
use thermistor::ThermistorError;

pub mod config;

pub mod board {
    include!(concat!(env!("OUT_DIR"), "/_config.rs"));
}

pub fn esp_attenuation(attenuation: Attenuation) -> adc::Attenuation {
    match attenuation {
        Attenuation::Db0 => adc::Attenuation::_0dB,
        Attenuation::Db2_5 => adc::Attenuation::_2p5dB,
        Attenuation::Db6 => adc::Attenuation::_6dB,
        Attenuation::Db11 => adc::Attenuation::_11dB,
    }
}

pub struct EspAdc<'d, P> {
    adc: Adc<'d, ADC1<'d>, Blocking>,
    pin: AdcPin<P, ADC1<'d>>,
}

impl<'d, P: AdcChannel> EspAdc<'d, P> {
    pub fn new(adc: Adc<'d, ADC1<'d>, Blocking>, pin: AdcPin<P, ADC1<'d>>) -> Self {
        Self { adc, pin }
    }
}

impl<'d, P: AdcChannel> MyAdc for EspAdc<'d, P> {
    fn read(&mut self) -> u16 {
        // the conversion reports WouldBlock until it is done
        loop {
            if let Ok(code) = self.adc.read_oneshot(&mut self.pin) {
                return code;
            }
        }
    }
}

/*
ADC1 two-point calibration of the S2. The per-mode fields hold offsets from the
calibration table, only meaningful when the block carries the matching
version. The S2 burns no separate reference voltage.
*/
pub struct EfuseCalibration {
    attenuation: Attenuation,
    low_field: EfuseField,
    high_field: EfuseField,
}

impl EfuseCalibration {
    pub fn new(attenuation: Attenuation) -> Self {
        let (low_field, high_field) = match attenuation {
            Attenuation::Db0 => (efuse::ADC1_MODE0_D1, efuse::ADC1_MODE0_D2),
            Attenuation::Db2_5 => (efuse::ADC1_MODE1_D1, efuse::ADC1_MODE1_D2),
            Attenuation::Db6 => (efuse::ADC1_MODE2_D1, efuse::ADC1_MODE2_D2),
            Attenuation::Db11 => (efuse::ADC1_MODE3_D1, efuse::ADC1_MODE3_D2),
        };
        Self {
            attenuation,
            low_field,
            high_field,
        }
    }
}

impl CalibrationFuses for EfuseCalibration {
    fn two_point(&self) -> Option<TwoPointFuse> {
        let version: u32 = Efuse::read_field_le(efuse::BLK_VERSION_MINOR);
        if version != TWO_POINT_VERSION {
            return None;
        }
        let low: u32 = Efuse::read_field_le(self.low_field);
        let high: u32 = Efuse::read_field_le(self.high_field);
        decode_two_point(self.attenuation, low, high)
    }

    fn vref(&self) -> Option<Voltage> {
        None
    }
}

pub struct EmbassyTimer {}

impl TimerTrait for EmbassyTimer {
    async fn after(duration: Duration) {
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        embassy_time::Timer::after(embassy_time::Duration::from_micros(micros)).await
    }
}

pub fn log_calibration(efuse_supported: bool) {
    if efuse_supported {
        info!("eFuse Two Point: Supported");
    } else {
        info!("Cannot retrieve eFuse Two Point calibration values. Default calibration values will be used.");
    }
}

/// Console output of one measurement cycle. The loop never stops on a bad cycle.
pub fn log_report(report: Result<CycleReport, ThermistorError>) -> ControlFlow<()> {
    match report {
        Ok(report) => {
            info!("voltage: {}", report.average_voltage.as_volts());
            info!("resistance: {}", report.resistance.as_ohms());
            // defmt has no float precision, the two-decimal line comes from Display
            let mut line: String<96> = String::new();
            match write!(line, "{}", report.temperature) {
                Ok(()) => info!("{=str}", line.as_str()),
                Err(_) => warn!("temperature line does not fit {} bytes", line.capacity()),
            }
        }
        Err(e) => warn!("{}", e),
    }
    ControlFlow::Continue(())
}
