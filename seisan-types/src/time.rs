//! Метки времени высокой точности (микросекунды от эпохи Unix).
//!
//! Внутреннее представление совпадает с `hptime_t` из libmseed: целое число
//! микросекунд, что позволяет складывать смещения выборок без накопления
//! ошибки округления.

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};

use crate::{SeisanError, SeisanResult};

/// Число единиц `HpTime` в одной секунде
pub const HPTMODULUS: i64 = 1_000_000;

/// Момент времени в микросекундах от 1970-01-01T00:00:00Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HpTime(pub i64);

/// Время в разбивке SEED BTIME (год, день года, доли 0.0001 с).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BTimeParts {
    pub year: u16,
    pub day: u16,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub fract: u16,
}

impl HpTime {
    /// Собирает момент из года, дня года и времени суток.
    ///
    /// Секунда 60 допускается (високосная секунда переносится в следующую
    /// минуту). Возвращает `None` для несуществующей даты.
    pub fn from_ordinal(
        year: i32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        micros: u32,
    ) -> Option<Self> {
        if hour > 23 || minute > 59 || second > 60 || micros >= HPTMODULUS as u32 {
            return None;
        }

        let date = NaiveDate::from_yo_opt(year, day)?;
        let midnight = date.and_hms_opt(0, 0, 0)?.and_utc().timestamp();
        let secs = midnight + hour as i64 * 3600 + minute as i64 * 60 + second as i64;

        Some(HpTime(secs * HPTMODULUS + micros as i64))
    }

    /// Разбирает строку вида `YYYY,DDD,HH:MM:SS.FFFFFF`.
    ///
    /// Разделителями могут быть `,`, `:` или `.`; всё, что после дня года,
    /// необязательно. Дробная часть масштабируется по числу цифр.
    pub fn from_seed_str(s: &str) -> SeisanResult<Self> {
        let invalid = || SeisanError::invalid_field("start time", s);
        let mut parts = s.split([',', ':', '.']);

        let mut next_num = |required: bool| -> SeisanResult<u32> {
            match parts.next() {
                Some(p) if !p.is_empty() => p.parse::<u32>().map_err(|_| invalid()),
                Some(_) | None if required => Err(invalid()),
                _ => Ok(0),
            }
        };

        let year = next_num(true)?;
        let day = next_num(true)?;
        let hour = next_num(false)?;
        let minute = next_num(false)?;
        let second = next_num(false)?;

        let micros = match parts.next() {
            Some(f) if !f.is_empty() => parse_fraction_micros(f).ok_or_else(invalid)?,
            _ => 0,
        };

        if parts.next().is_some() {
            return Err(invalid());
        }

        HpTime::from_ordinal(year as i32, day, hour, minute, second, micros).ok_or_else(invalid)
    }

    /// Время выборки с индексом `index` при частоте `sample_rate`.
    pub fn offset_by_samples(
        &self,
        index: usize,
        sample_rate: f64,
    ) -> HpTime {
        if sample_rate <= 0.0 {
            return *self;
        }

        // `as` насыщает к i64::MAX при переполнении
        let delta = (index as f64 / sample_rate * HPTMODULUS as f64).round() as i64;
        HpTime(self.0.saturating_add(delta))
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let secs = self.0.div_euclid(HPTMODULUS);
        let micros = self.0.rem_euclid(HPTMODULUS) as u32;

        DateTime::<Utc>::from_timestamp(secs, micros * 1_000)
    }

    /// Разбивка для поля BTIME заголовка Mini-SEED.
    pub fn to_btime(&self) -> Option<BTimeParts> {
        let dt = self.to_datetime()?;
        let year = u16::try_from(dt.year()).ok()?;

        Some(BTimeParts {
            year,
            day: dt.ordinal() as u16,
            hour: dt.hour() as u8,
            minute: dt.minute() as u8,
            second: dt.second() as u8,
            fract: (self.0.rem_euclid(HPTMODULUS) / 100) as u16,
        })
    }
}

impl std::fmt::Display for HpTime {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y,%j,%H:%M:%S%.6f")),
            None => write!(f, "<invalid time {}>", self.0),
        }
    }
}

// Дробная часть секунды → микросекунды ("5" → 500000, "1234567" → 123456)
fn parse_fraction_micros(f: &str) -> Option<u32> {
    if !f.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut digits: String = f.chars().take(6).collect();
    while digits.len() < 6 {
        digits.push('0');
    }

    digits.parse().ok()
}
