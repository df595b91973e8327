use core::ops::ControlFlow;

use common::{MyAdc, SamplingConfig, SchedulePolicy, ThermistorConstants, TimerTrait};
use math::common::{average, mean};
use math::measurements::{Resistance, Voltage};
use math::resistance::{compute_divider_resistance, compute_reference_resistance};
use math::temperature::{compute_beta_temperature, TemperatureReading};

use crate::sampler::Sampler;
use crate::ThermistorError;

/// Everything one measurement cycle prints.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct CycleReport {
    pub average_raw: u32,
    pub average_voltage: Voltage,
    pub resistance: Resistance,
    pub temperature: TemperatureReading,
}

// mean of the millivolt sum, in volts
pub fn average_voltage(sum_mv: u64, count: u32) -> Option<Voltage> {
    let mv = mean(sum_mv as f64, count)?;
    Some(Voltage::from_volts(mv / 1000.0))
}

pub struct TemperatureEstimator<A: MyAdc> {
    sampler: Sampler<A>,
    constants: ThermistorConstants,
    // reference resistance of the Beta model, fixed by the constants
    r_inf: Resistance,
    reads_per_cycle: u32,
    policy: SchedulePolicy,
}

impl<A: MyAdc> TemperatureEstimator<A> {
    pub fn new(
        sampler: Sampler<A>,
        constants: ThermistorConstants,
        sampling: SamplingConfig,
        policy: SchedulePolicy,
    ) -> Self {
        Self {
            sampler,
            r_inf: compute_reference_resistance(constants.r0, constants.b, constants.t0),
            constants,
            reads_per_cycle: sampling.reads_per_cycle,
            policy,
        }
    }

    pub fn reference_resistance(&self) -> Resistance {
        self.r_inf
    }

    /// Divider resistance and temperature for an averaged tap voltage.
    pub fn estimate(
        &self,
        voltage: Voltage,
    ) -> Result<(Resistance, TemperatureReading), ThermistorError> {
        let resistance =
            compute_divider_resistance(voltage, self.constants.vcc, self.constants.r_series)
                .ok_or(ThermistorError::VoltageOutOfRange(voltage.as_volts()))?;
        let temperature = compute_beta_temperature(resistance, self.r_inf, self.constants.b)
            .ok_or(ThermistorError::DegenerateRatio)?;
        Ok((resistance, temperature.into()))
    }

    // one sample per read, yielding after each of them
    async fn accumulate<T: TimerTrait>(&mut self) -> (u64, u64) {
        let mut raw_sum = 0u64;
        let mut mv_sum = 0u64;
        for _ in 0..self.reads_per_cycle {
            let sample = self.sampler.read_sample();
            raw_sum += u64::from(sample.raw_reading);
            mv_sum += u64::from(sample.voltage_mv);
            T::after(self.policy.inter_sample).await;
        }
        (raw_sum, mv_sum)
    }

    pub async fn run_cycle<T: TimerTrait>(&mut self) -> Result<CycleReport, ThermistorError> {
        let (raw_sum, mv_sum) = self.accumulate::<T>().await;
        let average_raw = average(raw_sum, self.reads_per_cycle).ok_or(ThermistorError::NoSamples)?;
        let average_voltage =
            average_voltage(mv_sum, self.reads_per_cycle).ok_or(ThermistorError::NoSamples)?;
        let (resistance, temperature) = self.estimate(average_voltage)?;
        Ok(CycleReport {
            average_raw,
            average_voltage,
            resistance,
            temperature,
        })
    }

    /// Measure forever, handing every cycle to `emit`, until it breaks.
    pub async fn run<T, F>(&mut self, mut emit: F)
    where
        T: TimerTrait,
        F: FnMut(Result<CycleReport, ThermistorError>) -> ControlFlow<()>,
    {
        loop {
            let report = self.run_cycle::<T>().await;
            if emit(report).is_break() {
                return;
            }
            T::after(self.policy.inter_cycle).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;
    use std::cell::RefCell;

    use approx::assert_relative_eq;
    use common::{AdcConfig, CalibrationFuses, TwoPointFuse};
    use math::measurements::Temperature;

    use super::*;
    use crate::calibration::{characterize, CalibrationProfile};

    struct NoFuses;

    impl CalibrationFuses for NoFuses {
        fn two_point(&self) -> Option<TwoPointFuse> {
            None
        }

        fn vref(&self) -> Option<Voltage> {
            None
        }
    }

    struct AdcMock {
        code: u16,
    }

    impl MyAdc for AdcMock {
        fn read(&mut self) -> u16 {
            self.code
        }
    }

    // bumps the code after every oversampled read so each sample differs
    struct RampAdc {
        code: u16,
        reads: u32,
    }

    impl MyAdc for RampAdc {
        fn read(&mut self) -> u16 {
            self.reads += 1;
            let code = self.code;
            if self.reads % 64 == 0 {
                self.code += 10;
            }
            code
        }
    }

    struct NoDelay {}

    impl TimerTrait for NoDelay {
        async fn after(_duration: Duration) {}
    }

    // tokio tests run on a current-thread runtime, so each test sees its own log
    thread_local! {
        static WAITS: RefCell<Vec<Duration>> = const { RefCell::new(Vec::new()) };
    }

    struct RecordingTimer {}

    impl TimerTrait for RecordingTimer {
        async fn after(duration: Duration) {
            WAITS.with(|waits| waits.borrow_mut().push(duration));
        }
    }

    struct SleepTimer {}

    impl TimerTrait for SleepTimer {
        async fn after(duration: Duration) {
            tokio::time::sleep(duration).await
        }
    }

    fn profile() -> CalibrationProfile {
        characterize(&NoFuses, &AdcConfig::default())
    }

    fn estimator<A: MyAdc>(adc: A) -> TemperatureEstimator<A> {
        TemperatureEstimator::new(
            Sampler::new(adc, profile(), 64),
            ThermistorConstants::default(),
            SamplingConfig::default(),
            SchedulePolicy {
                inter_sample: Duration::from_millis(1),
                inter_cycle: Duration::from_millis(2),
            },
        )
    }

    #[test]
    fn test_average_voltage() {
        let sum: u64 = 1000 + 1010 + 1020 + 1030 + 1040;
        assert_eq!(mean(sum as f64, 5), Some(1020.0));
        assert_relative_eq!(average_voltage(sum, 5).unwrap().as_volts(), 1.02, epsilon = 1e-12);
        assert!(average_voltage(sum, 0).is_none());
    }

    #[test]
    fn test_estimate_midpoint() {
        let estimator = estimator(AdcMock { code: 0 });
        let (resistance, _) = estimator.estimate(Voltage::from_volts(1.65)).unwrap();
        assert_eq!(resistance.as_ohms(), 10_000.0);
    }

    #[test]
    fn test_estimate_end_to_end() {
        let estimator = estimator(AdcMock { code: 0 });
        let (resistance, temperature) = estimator.estimate(Voltage::from_volts(1.5)).unwrap();
        assert_relative_eq!(resistance.as_ohms(), 12_000.0, epsilon = 1e-9);
        assert_relative_eq!(
            estimator.reference_resistance().as_ohms(),
            0.176_322_697_9,
            max_relative = 1e-8
        );
        assert_relative_eq!(temperature.kelvin, 354.957_226_29, epsilon = 1e-6);
        assert_relative_eq!(temperature.celsius, 81.957_226_29, epsilon = 1e-6);
        assert_relative_eq!(temperature.fahrenheit, 179.523_007_3, epsilon = 1e-6);
    }

    #[test]
    fn test_estimate_nominal_point() {
        let estimator = estimator(AdcMock { code: 0 });
        // R0 in the divider: v = 3.3 * 10k / 110k = 0.3 V
        let (resistance, temperature) = estimator.estimate(Voltage::from_volts(0.3)).unwrap();
        assert_relative_eq!(resistance.as_ohms(), 100_000.0, max_relative = 1e-12);
        assert_relative_eq!(temperature.kelvin, 298.15, epsilon = 1e-6);
    }

    #[test]
    fn test_estimate_zero_voltage_is_flagged() {
        let estimator = estimator(AdcMock { code: 0 });
        assert_eq!(
            estimator.estimate(Voltage::from_volts(0.0)),
            Err(ThermistorError::VoltageOutOfRange(0.0))
        );
    }

    #[test]
    fn test_estimate_resistance_equal_to_reference_is_flagged() {
        // b = 0 makes r_inf = r0 exactly, and 1.65 V puts Rt on r_series = r0
        let constants = ThermistorConstants {
            b: Temperature::from_kelvin(0.0),
            r0: Resistance::from_ohms(10_000.0),
            ..ThermistorConstants::default()
        };
        let estimator = TemperatureEstimator::new(
            Sampler::new(AdcMock { code: 0 }, profile(), 64),
            constants,
            SamplingConfig::default(),
            SchedulePolicy::default(),
        );
        assert_eq!(estimator.reference_resistance().as_ohms(), 10_000.0);
        assert_eq!(
            estimator.estimate(Voltage::from_volts(1.65)),
            Err(ThermistorError::DegenerateRatio)
        );
    }

    #[tokio::test]
    async fn test_run_cycle_averages_five_samples() {
        // samples at 1000, 1010, .. 1040: averaged raw is the middle one
        let mut estimator = estimator(RampAdc {
            code: 1000,
            reads: 0,
        });
        let report = estimator.run_cycle::<NoDelay>().await.unwrap();
        assert_eq!(estimator.sampler.get_adc().reads, 5 * 64);
        assert_eq!(report.average_raw, 1020);
        let expected_mv = (0..5)
            .map(|i| profile().raw_to_voltage(1000 + 10 * i))
            .sum::<u32>() as f64
            / 5.0;
        assert_relative_eq!(
            report.average_voltage.as_volts(),
            expected_mv / 1000.0,
            epsilon = 1e-12
        );
    }

    #[tokio::test]
    async fn test_run_cycle_reports_temperature() {
        let mut estimator = estimator(AdcMock { code: 4096 });
        let report = estimator.run_cycle::<NoDelay>().await.unwrap();
        // 1792 mV on the tap
        assert_relative_eq!(report.average_voltage.as_volts(), 1.792, epsilon = 1e-12);
        let (resistance, temperature) = estimator.estimate(report.average_voltage).unwrap();
        assert_eq!(report.resistance, resistance);
        assert_eq!(report.temperature, temperature);
        assert!(report.temperature.celsius > 25.0);
    }

    #[tokio::test]
    async fn test_run_cycle_saturated_adc_is_flagged() {
        // a 13 bit full scale reads 3441 mV, above vcc: sensor open
        let mut estimator = estimator(AdcMock { code: 8191 });
        assert!(matches!(
            estimator.run_cycle::<NoDelay>().await,
            Err(ThermistorError::VoltageOutOfRange(_))
        ));
    }

    #[tokio::test]
    async fn test_run_cycle_sums_past_u32() {
        // 2.5M reads of 1792 mV add up to more than u32::MAX
        let mut estimator = TemperatureEstimator::new(
            Sampler::new(AdcMock { code: 4096 }, profile(), 1),
            ThermistorConstants::default(),
            SamplingConfig {
                samples_per_read: 1,
                reads_per_cycle: 2_500_000,
            },
            SchedulePolicy::default(),
        );
        let report = estimator.run_cycle::<NoDelay>().await.unwrap();
        assert_eq!(report.average_raw, 4096);
        assert_relative_eq!(report.average_voltage.as_volts(), 1.792, epsilon = 1e-12);
    }

    #[tokio::test]
    async fn test_run_cycle_without_reads() {
        let mut estimator = TemperatureEstimator::new(
            Sampler::new(AdcMock { code: 4096 }, profile(), 64),
            ThermistorConstants::default(),
            SamplingConfig {
                samples_per_read: 64,
                reads_per_cycle: 0,
            },
            SchedulePolicy::default(),
        );
        assert_eq!(
            estimator.run_cycle::<NoDelay>().await,
            Err(ThermistorError::NoSamples)
        );
    }

    #[tokio::test]
    async fn test_run_yields_between_samples_and_cycles() {
        let mut estimator = estimator(AdcMock { code: 4096 });
        let mut cycles = 0;
        estimator
            .run::<RecordingTimer, _>(|report| {
                assert!(report.is_ok());
                cycles += 1;
                if cycles == 2 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .await;
        assert_eq!(cycles, 2);
        let waits = WAITS.with(|waits| waits.borrow().clone());
        let sample = Duration::from_millis(1);
        let cycle = Duration::from_millis(2);
        let mut expected = vec![sample; 5];
        expected.push(cycle);
        expected.extend([sample; 5]);
        assert_eq!(waits, expected);
    }

    #[tokio::test]
    async fn test_run_keeps_going_after_errors() {
        let mut estimator = estimator(AdcMock { code: 8191 });
        let mut errors = 0;
        estimator
            .run::<SleepTimer, _>(|report| {
                assert!(report.is_err());
                errors += 1;
                if errors == 3 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .await;
        assert_eq!(errors, 3);
    }
}
