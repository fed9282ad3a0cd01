use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Semantic group of observation fields that feed the same aggregate fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChangeCategory {
    MaxTemp,
    MinTemp,
    RelHumidity,
    Wind,
    Gust,
    Precip,
    Snow,
    Depth,
    Sun,
    Sky,
    Weather,
}

/// Categories touched by one edit. Ordered so reports are stable.
pub type ChangeSet = BTreeSet<ChangeCategory>;

impl ChangeCategory {
    pub const ALL: [ChangeCategory; 11] = [
        ChangeCategory::MaxTemp,
        ChangeCategory::MinTemp,
        ChangeCategory::RelHumidity,
        ChangeCategory::Wind,
        ChangeCategory::Gust,
        ChangeCategory::Precip,
        ChangeCategory::Snow,
        ChangeCategory::Depth,
        ChangeCategory::Sun,
        ChangeCategory::Sky,
        ChangeCategory::Weather,
    ];
}

impl fmt::Display for ChangeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeCategory::MaxTemp => "max temperature",
            ChangeCategory::MinTemp => "min temperature",
            ChangeCategory::RelHumidity => "relative humidity",
            ChangeCategory::Wind => "wind",
            ChangeCategory::Gust => "gust",
            ChangeCategory::Precip => "precipitation",
            ChangeCategory::Snow => "snowfall",
            ChangeCategory::Depth => "snow depth",
            ChangeCategory::Sun => "sunshine",
            ChangeCategory::Sky => "sky cover",
            ChangeCategory::Weather => "weather",
        };
        write!(f, "{}", name)
    }
}
