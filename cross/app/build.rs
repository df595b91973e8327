use std::{
    env,
    fs,
    path::{Path, PathBuf},
};

use common::Attenuation;

mod external {
    use std::ops::Not;

    use serde_derive::{Deserialize, Serialize};

    fn get_string_value(s: String) -> Option<String> {
        s.is_empty().not().then_some(s)
    }

    // [adc]
    // peripheral = "ADC1"
    // input = "GPIO1"
    // attenuation = "11dB"
    // default_vref_mv = 1100
    #[derive(Default, Debug, Serialize, Deserialize, Clone)]
    pub struct AdcConfig {
        peripheral: String,
        input: String,
        attenuation: String,
        default_vref_mv: u64,
    }

    impl AdcConfig {
        pub fn get_peripheral(&self) -> Option<String> {
            get_string_value(self.peripheral.clone())
        }
        pub fn get_input(&self) -> Option<String> {
            get_string_value(self.input.clone())
        }
        pub fn get_attenuation(&self) -> Option<String> {
            get_string_value(self.attenuation.clone())
        }
        pub fn get_default_vref_mv(&self) -> u64 {
            self.default_vref_mv
        }
    }

    #[derive(Default, Debug, Serialize, Deserialize, Clone)]
    pub struct PeripheralConfig {
        peripheral: String,
    }

    impl PeripheralConfig {
        pub fn get_peripheral(&self) -> Option<String> {
            get_string_value(self.peripheral.clone())
        }
    }

    // [thermistor]
    // b = 3950.0
    // r0 = 100000.0
    // t0 = 298.15
    // r_series = 10000.0
    // vcc = 3.3
    #[derive(Default, Debug, Serialize, Deserialize, Clone, Copy)]
    pub struct ThermistorConfig {
        b: f64,
        r0: f64,
        t0: f64,
        r_series: f64,
        vcc: f64,
    }

    impl ThermistorConfig {
        pub fn get_b(&self) -> f64 {
            self.b
        }
        pub fn get_r0(&self) -> f64 {
            self.r0
        }
        pub fn get_t0(&self) -> f64 {
            self.t0
        }
        pub fn get_r_series(&self) -> f64 {
            self.r_series
        }
        pub fn get_vcc(&self) -> f64 {
            self.vcc
        }
    }

    #[derive(Default, Debug, Serialize, Deserialize, Clone, Copy)]
    pub struct SamplingConfig {
        samples_per_read: u64,
        reads_per_cycle: u64,
        inter_sample_ms: u64,
        inter_cycle_ms: u64,
    }

    impl SamplingConfig {
        pub fn get_samples_per_read(&self) -> u64 {
            self.samples_per_read
        }
        pub fn get_reads_per_cycle(&self) -> u64 {
            self.reads_per_cycle
        }
        pub fn get_inter_sample_ms(&self) -> u64 {
            self.inter_sample_ms
        }
        pub fn get_inter_cycle_ms(&self) -> u64 {
            self.inter_cycle_ms
        }
    }

    #[derive(Default, Debug, Serialize, Deserialize, Clone)]
    pub struct MyConfig {
        pub adc: AdcConfig,
        pub timer: PeripheralConfig,
        pub thermistor: ThermistorConfig,
        pub sampling: SamplingConfig,
    }
}

fn main() {
    println!("cargo::rerun-if-changed=config/config.toml");
    let path = Path::new("config/config.toml");
    let conf = confy::load_path::<external::MyConfig>(path).expect("Error reading config file");

    let adc_peripheral = conf
        .adc
        .get_peripheral()
        .expect("ADC peripheral is missing");
    let adc_input_pin = conf.adc.get_input().expect("ADC input pin is missing");
    let adc_attenuation = conf
        .adc
        .get_attenuation()
        .expect("ADC attenuation is missing");
    let adc_attenuation = Attenuation::try_from(adc_attenuation.as_str())
        .expect("ADC attenuation must be one of 0dB, 2.5dB, 6dB, 11dB");
    let adc_default_vref_mv = conf.adc.get_default_vref_mv();
    let timer_peripheral = conf
        .timer
        .get_peripheral()
        .expect("Timer peripheral is missing");

    let thermistor_b = conf.thermistor.get_b();
    let thermistor_r0 = conf.thermistor.get_r0();
    let thermistor_t0 = conf.thermistor.get_t0();
    let thermistor_r_series = conf.thermistor.get_r_series();
    let thermistor_vcc = conf.thermistor.get_vcc();

    let sampling_samples_per_read = conf.sampling.get_samples_per_read();
    let sampling_reads_per_cycle = conf.sampling.get_reads_per_cycle();
    let sampling_inter_sample_ms = conf.sampling.get_inter_sample_ms();
    let sampling_inter_cycle_ms = conf.sampling.get_inter_cycle_ms();

    if !(1000..=1200).contains(&adc_default_vref_mv) {
        panic!("ADC default vref must be between 1000 and 1200 mV");
    }

    for (name, value) in [
        ("b", thermistor_b),
        ("r0", thermistor_r0),
        ("t0", thermistor_t0),
        ("r_series", thermistor_r_series),
        ("vcc", thermistor_vcc),
    ] {
        if !(value.is_finite() && value > 0.0) {
            panic!("Thermistor {} must be a positive number", name);
        }
    }

    // a full scale 13 bit code summed over a read or a cycle still fits in u32
    let max_count = (u32::MAX / 8191) as u64;
    if sampling_samples_per_read == 0 || sampling_samples_per_read > max_count {
        panic!("Sampling samples_per_read must be between 1 and {}", max_count);
    }
    if sampling_reads_per_cycle == 0 || sampling_reads_per_cycle > max_count {
        panic!("Sampling reads_per_cycle must be between 1 and {}", max_count);
    }

    let string = format!(
        "
use core::time::Duration;

use common::{{AdcConfig, Attenuation, SamplingConfig, SchedulePolicy, ThermistorConstants}};
use esp_hal::peripherals::*;
use math::measurements::{{Resistance, Temperature, Voltage}};
use math::Resolution;

use crate::config::*;

pub type AdcPeripheral = {}<'static>;
pub type AdcInputPin = {}<'static>;
pub type TimerGroupPeripheral = {}<'static>;

pub fn peripherals_init(p: Peripherals) -> ThermometerConfig<
    AdcPeripheral,
    AdcInputPin,
    TimerGroupPeripheral,
> {{
    ThermometerConfig {{
        adc: AdcPeripheralsConfig {{
            peripheral: p.{},
            input: p.{},
        }},
        timer: p.{},
        adc_config: AdcConfig {{
            resolution: Resolution::BITS13,
            attenuation: Attenuation::{:?},
            default_vref: Voltage::from_millivolts({}.0),
        }},
        constants: ThermistorConstants {{
            b: Temperature::from_kelvin({:?}),
            r0: Resistance::from_ohms({:?}),
            t0: Temperature::from_kelvin({:?}),
            r_series: Resistance::from_ohms({:?}),
            vcc: Voltage::from_volts({:?}),
        }},
        sampling: SamplingConfig {{
            samples_per_read: {},
            reads_per_cycle: {},
        }},
        schedule: SchedulePolicy {{
            inter_sample: Duration::from_millis({}),
            inter_cycle: Duration::from_millis({}),
        }},
    }}
}}
",
        adc_peripheral,
        adc_input_pin,
        timer_peripheral,
        adc_peripheral,
        adc_input_pin,
        timer_peripheral,
        adc_attenuation,
        adc_default_vref_mv,
        thermistor_b,
        thermistor_r0,
        thermistor_t0,
        thermistor_r_series,
        thermistor_vcc,
        sampling_samples_per_read,
        sampling_reads_per_cycle,
        sampling_inter_sample_ms,
        sampling_inter_cycle_ms,
    );
    let out_dir = &PathBuf::from(env::var_os("OUT_DIR").expect("OUT_DIR is not set"));
    let out_file = out_dir.join("_config.rs").to_string_lossy().to_string();
    fs::write(&out_file, string.as_str()).expect("Error writing generated config");
}
