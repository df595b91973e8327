#![cfg_attr(not(test), no_std)]

pub use measurements;

pub mod common;
pub mod resistance;
pub mod temperature;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Resolution {
    BITS13,
    BITS12,
    BITS11,
    BITS10,
    BITS9,
}

impl Resolution {
    pub fn bits(&self) -> u32 {
        match self {
            Resolution::BITS13 => 13,
            Resolution::BITS12 => 12,
            Resolution::BITS11 => 11,
            Resolution::BITS10 => 10,
            Resolution::BITS9 => 9,
        }
    }

    // highest code the converter can return, e.g. 8191 for 13 bits
    pub fn max_code(&self) -> u32 {
        u32::from(*self) - 1
    }
}

impl From<Resolution> for u32 {
    fn from(value: Resolution) -> Self {
        1 << value.bits()
    }
}

#[cfg(feature = "defmt-log")]
impl defmt::Format for Resolution {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{} bits", self.bits())
    }
}
