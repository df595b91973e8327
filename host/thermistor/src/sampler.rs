use common::MyAdc;
use math::common::average;

use crate::calibration::CalibrationProfile;

#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
pub struct SampleResult {
    pub raw_reading: u32,
    pub voltage_mv: u32,
}

/// Oversampling reader of a single ADC channel.
///
/// The profile is moved in at construction, so every sample of a sampler
/// goes through the same calibration.
pub struct Sampler<A: MyAdc> {
    adc: A,
    profile: CalibrationProfile,
    samples_per_read: u32,
}

impl<A: MyAdc> Sampler<A> {
    pub fn new(adc: A, profile: CalibrationProfile, samples_per_read: u32) -> Self {
        Self {
            adc,
            profile,
            samples_per_read: samples_per_read.max(1),
        }
    }

    pub fn profile(&self) -> &CalibrationProfile {
        &self.profile
    }

    #[cfg(test)]
    pub fn get_adc(&self) -> &A {
        &self.adc
    }

    pub fn read_sample(&mut self) -> SampleResult {
        let mut sum = 0u64;
        for _ in 0..self.samples_per_read {
            sum += u64::from(self.adc.read());
        }
        // samples_per_read is never 0
        let raw_reading = average(sum, self.samples_per_read).unwrap_or_default();
        SampleResult {
            raw_reading,
            voltage_mv: self.profile.raw_to_voltage(raw_reading),
        }
    }
}
