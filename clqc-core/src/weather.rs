use crate::missing::{SameValue, MISSING};
use serde::{Deserialize, Serialize};

/// Number of weather phenomena tracked per day.
pub const NUM_WEATHER_TYPES: usize = 18;

/// Weather phenomena in their stored flag order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherPhenomenon {
    Thunderstorm,
    MixedPrecip,
    HeavyRain,
    Rain,
    LightRain,
    FreezingRain,
    LightFreezingRain,
    Hail,
    HeavySnow,
    Snow,
    LightSnow,
    IcePellets,
    Fog,
    FogQuarterMile,
    Haze,
    BlowingSnow,
    SandStorm,
    FunnelCloud,
}

impl WeatherPhenomenon {
    pub const ALL: [WeatherPhenomenon; NUM_WEATHER_TYPES] = [
        WeatherPhenomenon::Thunderstorm,
        WeatherPhenomenon::MixedPrecip,
        WeatherPhenomenon::HeavyRain,
        WeatherPhenomenon::Rain,
        WeatherPhenomenon::LightRain,
        WeatherPhenomenon::FreezingRain,
        WeatherPhenomenon::LightFreezingRain,
        WeatherPhenomenon::Hail,
        WeatherPhenomenon::HeavySnow,
        WeatherPhenomenon::Snow,
        WeatherPhenomenon::LightSnow,
        WeatherPhenomenon::IcePellets,
        WeatherPhenomenon::Fog,
        WeatherPhenomenon::FogQuarterMile,
        WeatherPhenomenon::Haze,
        WeatherPhenomenon::BlowingSnow,
        WeatherPhenomenon::SandStorm,
        WeatherPhenomenon::FunnelCloud,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Short code used in fixture files and on the command line.
    pub fn code(&self) -> &'static str {
        match self {
            WeatherPhenomenon::Thunderstorm => "TS",
            WeatherPhenomenon::MixedPrecip => "MIX",
            WeatherPhenomenon::HeavyRain => "+RA",
            WeatherPhenomenon::Rain => "RA",
            WeatherPhenomenon::LightRain => "-RA",
            WeatherPhenomenon::FreezingRain => "FZRA",
            WeatherPhenomenon::LightFreezingRain => "-FZRA",
            WeatherPhenomenon::Hail => "GR",
            WeatherPhenomenon::HeavySnow => "+SN",
            WeatherPhenomenon::Snow => "SN",
            WeatherPhenomenon::LightSnow => "-SN",
            WeatherPhenomenon::IcePellets => "PL",
            WeatherPhenomenon::Fog => "FG",
            WeatherPhenomenon::FogQuarterMile => "FG1/4",
            WeatherPhenomenon::Haze => "HZ",
            WeatherPhenomenon::BlowingSnow => "BLSN",
            WeatherPhenomenon::SandStorm => "SS",
            WeatherPhenomenon::FunnelCloud => "FC",
        }
    }

    pub fn from_code(code: &str) -> Option<WeatherPhenomenon> {
        let code = code.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.code().eq_ignore_ascii_case(code))
    }
}

/// Per-day phenomenon flags, indexed by [`WeatherPhenomenon::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WeatherFlags(pub [bool; NUM_WEATHER_TYPES]);

impl WeatherFlags {
    pub fn get(&self, phenomenon: WeatherPhenomenon) -> bool {
        self.0[phenomenon.index()]
    }

    pub fn set(&mut self, phenomenon: WeatherPhenomenon, value: bool) {
        self.0[phenomenon.index()] = value;
    }

    /// Number of phenomena observed; stored as the derived `num_wx`.
    pub fn count(&self) -> i32 {
        self.0.iter().filter(|f| **f).count() as i32
    }

    /// Parse a `;`-separated code list such as `RA;FG`.
    pub fn parse_codes(s: &str) -> anyhow::Result<WeatherFlags> {
        let mut flags = WeatherFlags::default();
        for code in s.split(';').map(str::trim).filter(|c| !c.is_empty()) {
            let phenomenon = WeatherPhenomenon::from_code(code)
                .ok_or_else(|| anyhow::anyhow!("unknown weather code '{}'", code))?;
            flags.set(phenomenon, true);
        }
        Ok(flags)
    }

    pub fn to_codes(&self) -> String {
        WeatherPhenomenon::ALL
            .iter()
            .filter(|p| self.get(**p))
            .map(|p| p.code())
            .collect::<Vec<_>>()
            .join(";")
    }
}

impl SameValue for WeatherFlags {
    fn same_value(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

/// Per-period count of days on which each phenomenon was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherCounts(pub [i32; NUM_WEATHER_TYPES]);

impl WeatherCounts {
    pub fn missing() -> Self {
        WeatherCounts([MISSING; NUM_WEATHER_TYPES])
    }

    pub fn get(&self, phenomenon: WeatherPhenomenon) -> i32 {
        self.0[phenomenon.index()]
    }
}

impl Default for WeatherCounts {
    fn default() -> Self {
        WeatherCounts::missing()
    }
}

impl SameValue for WeatherCounts {
    fn same_value(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_follow_flag_order() {
        for (i, p) in WeatherPhenomenon::ALL.iter().enumerate() {
            assert_eq!(p.index(), i);
        }
        assert_eq!(WeatherPhenomenon::Hail.index(), 7);
        assert_eq!(WeatherPhenomenon::FunnelCloud.index(), 17);
    }

    #[test]
    fn test_parse_codes_and_count() {
        let flags = WeatherFlags::parse_codes("RA; fg;TS").unwrap();
        assert_eq!(flags.count(), 3);
        assert!(flags.get(WeatherPhenomenon::Fog));
        assert_eq!(flags.to_codes(), "TS;RA;FG");
        assert!(WeatherFlags::parse_codes("XX").is_err());
        assert_eq!(WeatherFlags::parse_codes("").unwrap().count(), 0);
    }
}
