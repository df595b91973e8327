use common::{AdcConfig, SamplingConfig, SchedulePolicy, ThermistorConstants};

pub struct AdcPeripheralsConfig<P, I> {
    pub peripheral: P,
    pub input: I,
}

/// Board wiring and measurement settings, generated from `config/config.toml`.
pub struct ThermometerConfig<P, I, T> {
    pub adc: AdcPeripheralsConfig<P, I>,
    pub timer: T,
    pub adc_config: AdcConfig,
    pub constants: ThermistorConstants,
    pub sampling: SamplingConfig,
    pub schedule: SchedulePolicy,
}
