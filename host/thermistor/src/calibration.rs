use core::fmt::Display;

use common::{AdcConfig, Attenuation, CalibrationFuses, CalibrationPoint, TwoPointFuse};
use math::measurements::Voltage;
use math::Resolution;

// coeff_a is kept in Q16 millivolts per code
const COEFF_A_SCALE: i64 = 1 << 16;
const COEFF_A_ROUND: i64 = COEFF_A_SCALE / 2;

// fused reference voltages outside this window are treated as garbage
const VREF_MIN_MV: u32 = 1000;
const VREF_MAX_MV: u32 = 1200;

/// Calibration block version whose ADC1 two-point fields `decode_two_point` understands.
pub const TWO_POINT_VERSION: u32 = 1;

// the low point is measured at 250 mV for every attenuation
const TWO_POINT_LOW_MV: u32 = 250;
const TWO_POINT_LOW_BITS: u32 = 6;
const TWO_POINT_HIGH_BITS: u32 = 8;
const TWO_POINT_MULTIPLIER: i32 = 4;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum CalibrationSource {
    TwoPoint,
    EfuseVref,
    DefaultVref,
}

impl Display for CalibrationSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self {
            CalibrationSource::TwoPoint => core::write!(f, "Characterized using Two Point Value"),
            CalibrationSource::EfuseVref => core::write!(f, "Characterized using eFuse Vref"),
            CalibrationSource::DefaultVref => core::write!(f, "Characterized using Default Vref"),
        }
    }
}

#[cfg(feature = "defmt-log")]
impl defmt::Format for CalibrationSource {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            CalibrationSource::TwoPoint => defmt::write!(fmt, "Characterized using Two Point Value"),
            CalibrationSource::EfuseVref => defmt::write!(fmt, "Characterized using eFuse Vref"),
            CalibrationSource::DefaultVref => defmt::write!(fmt, "Characterized using Default Vref"),
        }
    }
}

/*
linear map from raw code to millivolts:
mv = (raw * coeff_a + 0.5) / 2^16 + coeff_b, clamped at 0
*/
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct AdcCharacteristics {
    coeff_a: u32,
    coeff_b: i32,
    max_code: u32,
}

impl AdcCharacteristics {
    pub fn from_vref(vref_mv: u32, attenuation: Attenuation, resolution: Resolution) -> Self {
        let steps = u64::from(u32::from(resolution));
        let coeff_a = u64::from(vref_mv) * u64::from(attenuation.vref_scale()) / steps;
        Self {
            coeff_a: coeff_a as u32,
            coeff_b: attenuation.vref_offset_mv() as i32,
            max_code: resolution.max_code(),
        }
    }

    // line through both fused points; None when the points can't describe a rising curve
    pub fn from_two_point(fuse: TwoPointFuse, resolution: Resolution) -> Option<Self> {
        let (low, high) = (fuse.low, fuse.high);
        if high.raw <= low.raw || high.millivolts < low.millivolts {
            return None;
        }
        let d_raw = i64::from(high.raw - low.raw);
        let d_mv = i64::from(high.millivolts - low.millivolts);
        let coeff_a = (d_mv * COEFF_A_SCALE + d_raw / 2) / d_raw;
        let coeff_b =
            i64::from(low.millivolts) - (i64::from(low.raw) * coeff_a + COEFF_A_ROUND) / COEFF_A_SCALE;
        Some(Self {
            coeff_a: u32::try_from(coeff_a).ok()?,
            coeff_b: i32::try_from(coeff_b).ok()?,
            max_code: resolution.max_code(),
        })
    }

    pub fn raw_to_millivolts(&self, raw: u32) -> u32 {
        let raw = i64::from(raw.min(self.max_code));
        let mv = (raw * i64::from(self.coeff_a) + COEFF_A_ROUND) / COEFF_A_SCALE
            + i64::from(self.coeff_b);
        u32::try_from(mv.max(0)).unwrap_or(u32::MAX)
    }
}

/// Raw code to voltage mapping fixed for the lifetime of the process.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct CalibrationProfile {
    source: CalibrationSource,
    characteristics: AdcCharacteristics,
}

impl CalibrationProfile {
    pub fn new(source: CalibrationSource, characteristics: AdcCharacteristics) -> Self {
        Self {
            source,
            characteristics,
        }
    }

    pub fn source(&self) -> CalibrationSource {
        self.source
    }

    pub fn raw_to_voltage(&self, raw: u32) -> u32 {
        self.characteristics.raw_to_millivolts(raw)
    }
}

fn to_millivolts(voltage: Voltage) -> Option<u32> {
    let mv = voltage.as_millivolts();
    if !mv.is_finite() || mv < 0.0 {
        return None;
    }
    Some((mv + 0.5) as u32)
}

// top bit of the field is the sign, the rest the magnitude
fn decode_sign_magnitude(bits: u32, length: u32) -> i32 {
    let sign = 1 << (length - 1);
    let magnitude = (bits & (sign - 1)) as i32;
    if bits & sign != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/*
ADC1 two-point fuses store small offsets from a per-attenuation base code:
code = base + offset * 4, with the low point read at 250 mV and the high point
at the input given by the attenuation.

attenuation | low base | high base | high input
0 dB        | 2231     | 5775      | 600 mV
2.5 dB      | 1643     | 5691      | 800 mV
6 dB        | 1290     | 5885      | 1000 mV
11 dB       | 701      | 6109      | 2000 mV
*/
pub fn decode_two_point(
    attenuation: Attenuation,
    low_bits: u32,
    high_bits: u32,
) -> Option<TwoPointFuse> {
    let (low_base, high_base, high_mv) = match attenuation {
        Attenuation::Db0 => (2231, 5775, 600),
        Attenuation::Db2_5 => (1643, 5691, 800),
        Attenuation::Db6 => (1290, 5885, 1000),
        Attenuation::Db11 => (701, 6109, 2000),
    };
    let low = low_base + decode_sign_magnitude(low_bits, TWO_POINT_LOW_BITS) * TWO_POINT_MULTIPLIER;
    let high =
        high_base + decode_sign_magnitude(high_bits, TWO_POINT_HIGH_BITS) * TWO_POINT_MULTIPLIER;
    Some(TwoPointFuse {
        low: CalibrationPoint {
            raw: u32::try_from(low).ok()?,
            millivolts: TWO_POINT_LOW_MV,
        },
        high: CalibrationPoint {
            raw: u32::try_from(high).ok()?,
            millivolts: high_mv,
        },
    })
}

// whether two-point values are burned at all, regardless of the source picked later
pub fn check_efuse<F: CalibrationFuses>(fuses: &F) -> bool {
    fuses.two_point().is_some()
}

/// Build the profile from the best calibration the chip offers.
///
/// Order: two-point values, then a fused reference voltage, then
/// `config.default_vref`. Never fails.
pub fn characterize<F: CalibrationFuses>(fuses: &F, config: &AdcConfig) -> CalibrationProfile {
    if let Some(characteristics) = fuses
        .two_point()
        .and_then(|fuse| AdcCharacteristics::from_two_point(fuse, config.resolution))
    {
        return CalibrationProfile::new(CalibrationSource::TwoPoint, characteristics);
    }

    if let Some(vref_mv) = fuses
        .vref()
        .and_then(to_millivolts)
        .filter(|mv| (VREF_MIN_MV..=VREF_MAX_MV).contains(mv))
    {
        return CalibrationProfile::new(
            CalibrationSource::EfuseVref,
            AdcCharacteristics::from_vref(vref_mv, config.attenuation, config.resolution),
        );
    }

    let default_mv = to_millivolts(config.default_vref).unwrap_or(VREF_MIN_MV);
    CalibrationProfile::new(
        CalibrationSource::DefaultVref,
        AdcCharacteristics::from_vref(default_mv, config.attenuation, config.resolution),
    )
}
