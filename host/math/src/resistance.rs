use measurements::{Resistance, Temperature, Voltage};

use crate::common::exp;

/*
Thermistor between vcc and the tap, r_series from the tap to ground:

v_out = vcc * r_series / (r_t + r_series)  =>  r_t = (vcc * r_series) / v_out - r_series
*/
pub fn compute_divider_resistance(
    v_out: Voltage,
    vcc: Voltage,
    r_series: Resistance,
) -> Option<Resistance> {
    let v = v_out.as_volts();
    // a tap at 0 V or at vcc means an open or shorted sensor
    if !(v > 0.0 && v < vcc.as_volts()) {
        return None;
    }
    let r_t = (vcc.as_volts() * r_series.as_ohms()) / v - r_series.as_ohms();
    if !r_t.is_finite() || r_t <= 0.0 {
        return None;
    }
    Some(Resistance::from_ohms(r_t))
}

// r_inf of the Beta model: r0 * e^(-b / t0)
pub fn compute_reference_resistance(r0: Resistance, b: Temperature, t0: Temperature) -> Resistance {
    Resistance::from_ohms(r0.as_ohms() * exp(-b.as_kelvin() / t0.as_kelvin()))
}
