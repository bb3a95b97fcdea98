//! Locale identifiers stored in hash entries

use binrw::{BinRead, BinWrite};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Windows LANGID of a locale variant
///
/// `0` is the neutral locale, used when no language-specific copy exists.
#[derive(
    BinRead, BinWrite, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[brw(little)]
pub struct Locale(pub u16);

impl Locale {
    /// Neutral locale
    pub const NEUTRAL: Self = Self(0);

    /// Chinese (Taiwan)
    pub const ZH_TW: Self = Self(0x0404);

    /// Czech
    pub const CS_CZ: Self = Self(0x0405);

    /// German (Germany)
    pub const DE_DE: Self = Self(0x0407);

    /// English (United States)
    pub const EN_US: Self = Self(0x0409);

    /// Spanish (Spain)
    pub const ES_ES: Self = Self(0x040A);

    /// French (France)
    pub const FR_FR: Self = Self(0x040C);

    /// Italian (Italy)
    pub const IT_IT: Self = Self(0x0410);

    /// Japanese
    pub const JA_JP: Self = Self(0x0411);

    /// Korean
    pub const KO_KR: Self = Self(0x0412);

    /// Polish
    pub const PL_PL: Self = Self(0x0415);

    /// Portuguese (Portugal)
    pub const PT_PT: Self = Self(0x0416);

    /// Russian
    pub const RU_RU: Self = Self(0x0419);

    /// English (Great Britain)
    pub const EN_GB: Self = Self(0x0809);

    /// Create a locale from a raw LANGID
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Raw LANGID
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Check if this is the neutral locale
    pub const fn is_neutral(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}

impl From<u16> for Locale {
    fn from(value: u16) -> Self {
        Self::new(value)
    }
}

impl From<Locale> for u16 {
    fn from(locale: Locale) -> Self {
        locale.0
    }
}
