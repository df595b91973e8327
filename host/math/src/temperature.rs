use core::fmt::Display;

use measurements::{Resistance, Temperature};

use crate::common::ln;

// the sensor reports Celsius against 273.0, not 273.15
pub const KELVIN_OFFSET: f64 = 273.0;

/*
Beta model solved for temperature:

r_t = r_inf * e^(b / t)  =>  t = b / ln(r_t / r_inf)

r_inf is the reference resistance computed once from r0, b and t0.
*/
pub fn compute_beta_temperature(
    r_t: Resistance,
    r_inf: Resistance,
    b: Temperature,
) -> Option<Temperature> {
    let ratio = r_t.as_ohms() / r_inf.as_ohms();
    if !ratio.is_finite() || ratio <= 0.0 {
        return None;
    }
    let denominator = ln(ratio);
    if denominator == 0.0 {
        return None;
    }
    let kelvin = b.as_kelvin() / denominator;
    if !kelvin.is_finite() || kelvin <= 0.0 {
        return None;
    }
    Some(Temperature::from_kelvin(kelvin))
}

/// A temperature expressed in the three scales printed on the console.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct TemperatureReading {
    pub kelvin: f64,
    pub celsius: f64,
    pub fahrenheit: f64,
}

impl TemperatureReading {
    pub fn from_kelvin(kelvin: f64) -> Self {
        let celsius = kelvin - KELVIN_OFFSET;
        Self {
            kelvin,
            celsius,
            fahrenheit: celsius * 1.8 + 32.0,
        }
    }
}

impl From<Temperature> for TemperatureReading {
    fn from(value: Temperature) -> Self {
        Self::from_kelvin(value.as_kelvin())
    }
}

impl Display for TemperatureReading {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::write!(
            f,
            "Temperatura: {:.2} ºC, {:.2} ºF, {:.2} ºK",
            self.celsius,
            self.fahrenheit,
            self.kelvin
        )
    }
}
