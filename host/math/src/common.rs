/*
f64 wrappers around libm so the rest of the workspace stays independent
from the float backend. core has no exp/ln on no_std targets.
*/
pub fn exp(value: f64) -> f64 {
    libm::exp(value)
}

pub fn ln(value: f64) -> f64 {
    libm::log(value)
}

// integer mean, truncated like the ADC driver does it
pub fn average(sum: u64, count: u32) -> Option<u32> {
    if count == 0 {
        return None;
    }
    u32::try_from(sum / u64::from(count)).ok()
}

pub fn mean(sum: f64, count: u32) -> Option<f64> {
    if count == 0 {
        return None;
    }
    Some(sum / f64::from(count))
}
