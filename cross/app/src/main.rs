#![no_std]
#![no_main]

use embassy_executor::Spawner;
use esp_hal::analog::adc::{Adc, AdcConfig};
use esp_hal::clock::CpuClock;
use esp_hal::timer::timg::TimerGroup;
use thermistor::calibration::{characterize, check_efuse};
use thermistor::estimator::TemperatureEstimator;
use thermistor::sampler::Sampler;
use thermometer::board::peripherals_init;
use thermometer::{esp_attenuation, log_calibration, log_report, EfuseCalibration, EmbassyTimer, EspAdc};
use {defmt_rtt as _, esp_backtrace as _};

esp_bootloader_esp_idf::esp_app_desc!();

#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    let p = esp_hal::init(esp_hal::Config::default().with_cpu_clock(CpuClock::max()));
    let config = peripherals_init(p);

    let timg0 = TimerGroup::new(config.timer);
    esp_rtos::start(timg0.timer0);

    let fuses = EfuseCalibration::new(config.adc_config.attenuation);
    log_calibration(check_efuse(&fuses));

    let mut adc_config = AdcConfig::new();
    let pin = adc_config.enable_pin(
        config.adc.input,
        esp_attenuation(config.adc_config.attenuation),
    );
    let adc = Adc::new(config.adc.peripheral, adc_config);

    let profile = characterize(&fuses, &config.adc_config);
    defmt::info!("{}", profile.source());

    let sampler = Sampler::new(
        EspAdc::new(adc, pin),
        profile,
        config.sampling.samples_per_read,
    );
    let mut estimator =
        TemperatureEstimator::new(sampler, config.constants, config.sampling, config.schedule);

    loop {
        estimator.run::<EmbassyTimer, _>(log_report).await;
    }
}
