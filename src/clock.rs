use chrono::{Datelike, Duration, NaiveDate};
use mockable::Clock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

pub type SharedClock = Arc<dyn Clock + Send + Sync>;

const DAY_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn today(clock: &dyn Clock) -> Self {
        Self(clock.utc().date_naive())
    }

    pub fn parse(value: &str) -> Option<Self> {
        NaiveDate::parse_from_str(value, DAY_FORMAT).ok().map(Self)
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }

    /// 0 = Sunday through 6 = Saturday.
    pub fn weekday(self) -> u8 {
        self.0.weekday().num_days_from_sunday() as u8
    }

    pub fn days_before(self, days: i64) -> Self {
        Self(self.0 - Duration::days(days))
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DAY_FORMAT))
    }
}

impl Serialize for DayKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DayKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid day key: {raw}")))
    }
}
