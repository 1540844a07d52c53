//! Декодирование логического заголовка канала SeisAn (1040 байт).
//!
//! Поля заголовка — текст фиксированной ширины по фиксированным смещениям:
//!
//! ```text
//! [0..5]     STATION
//! [5..9]     COMPONENT
//! [9..12]    YEAR - 1900
//! [13..16]   DAY OF YEAR
//! [23..25]   HOUR
//! [26..28]   MINUTE
//! [28]       'E' — неточное время
//! [29..35]   SECOND.FRACTION
//! [36..43]   SAMPLE RATE
//! [43..50]   SAMPLE COUNT
//! [75]       'G' — задан коэффициент усиления
//! [76]       '4' — 4-байтовые выборки, иначе 2-байтовые
//! [147..159] GAIN
//! ```

use log::{debug, warn};
use seisan_types::{ChannelHeader, HpTime, SeisanError, SeisanResult, CHANNEL_HEADER_SIZE};

use crate::channel::ChannelMap;

/// Годы после этого значения считаются ошибочными и ограничиваются
pub const MAX_YEAR: i32 = 2050;

/// Наименьшая частота, представимая в заголовке Mini-SEED (период 32767 с)
pub const MIN_SAMPLE_RATE: f64 = 1.0 / i16::MAX as f64;
/// Наибольшая частота, представимая в заголовке Mini-SEED
pub const MAX_SAMPLE_RATE: f64 = i16::MAX as f64;

/// Параметры декодирования, задаваемые пользователем.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Код сети (в SeisAn отсутствует), по умолчанию пустой
    pub network: String,
    /// Принудительный код локации вместо выведенного из компонента
    pub location: Option<String>,
    /// Пользовательская таблица компонент → канал
    pub channel_map: ChannelMap,
    /// Не ограничивать годы после 2050
    pub retain_future_year: bool,
}

/// Декодирует поля заголовка канала.
pub fn decode_channel_header(
    buf: &[u8; CHANNEL_HEADER_SIZE],
    opts: &DecodeOptions,
) -> SeisanResult<ChannelHeader> {
    let station = clean_code(&field(buf, 0, 5), 5);
    let component = field(buf, 5, 4);

    let year_text = field(buf, 9, 3);
    let year_fragment =
        parse_c_ulong(&year_text).ok_or_else(|| SeisanError::invalid_field("year", &year_text))?;
    let mut year = year_fragment as i64 + 1900;

    if year > MAX_YEAR as i64 && !opts.retain_future_year {
        warn!("Station {station}: year {year} clamped to {MAX_YEAR}");
        year = MAX_YEAR as i64;
    }

    let mut timestr = format!("{year:4},");
    timestr.push_str(&field(buf, 13, 3));
    timestr.push(',');
    timestr.push_str(&field(buf, 23, 2));
    timestr.push(':');
    timestr.push_str(&field(buf, 26, 2));
    timestr.push(':');
    timestr.push_str(&field(buf, 29, 6));
    timestr.retain(|c| c != ' ');

    let start_time = HpTime::from_seed_str(&timestr)?;
    let time_uncertain = buf[28] == b'E';

    let rate_text = field(buf, 36, 7);
    let sample_rate = parse_c_double(&rate_text)
        .filter(|r| (MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(r))
        .ok_or_else(|| SeisanError::invalid_field("sample rate", &rate_text))?;

    let count_text = field(buf, 43, 7);
    let sample_count = parse_c_ulong(&count_text)
        .and_then(|c| u32::try_from(c).ok())
        .ok_or_else(|| SeisanError::invalid_field("sample count", &count_text))?;

    let gain = if buf[75] == b'G' {
        let gain_text = field(buf, 147, 12);
        match parse_c_double(&gain_text) {
            Some(g) => {
                warn!("Gain of {g} detected for {station} '{component}', NOT applied (unsupported)");
                Some(g)
            }
            None => {
                warn!("Gain flag set for {station} '{component}' but gain '{gain_text}' is unreadable");
                None
            }
        }
    } else {
        None
    };

    let sample_width = if buf[76] == b'4' { 4 } else { 2 };

    let (channel, mut location) = opts.channel_map.translate(&component);
    let channel = clean_code(&channel, 3);
    if let Some(forced) = &opts.location {
        location = clean_code(forced, 2);
    }
    let network = clean_code(&opts.network, 2);

    debug!(
        "'{station}_{component}' ({channel}): {timestr}{}, {sample_count} samps @ {sample_rate:.4} Hz, {sample_width}-byte samples",
        if time_uncertain { " [UNCERTAIN]" } else { "" },
    );

    Ok(ChannelHeader {
        network,
        station,
        location,
        channel,
        component,
        start_time,
        time_uncertain,
        sample_rate,
        sample_count,
        sample_width,
        gain,
    })
}

/// Текстовое поле заголовка (байты вне ASCII заменяются).
fn field(
    buf: &[u8],
    off: usize,
    len: usize,
) -> String {
    String::from_utf8_lossy(&buf[off..off + len]).into_owned()
}

/// Удаляет пробелы и NUL, обрезает до `max` символов.
pub fn clean_code(
    raw: &str,
    max: usize,
) -> String {
    raw.chars()
        .filter(|c| *c != ' ' && *c != '\0')
        .take(max)
        .collect()
}

/// Разбор целого в стиле `strtoul`: пропуск ведущих пробелов, затем
/// самый длинный префикс из цифр. `None`, если цифр нет.
pub fn parse_c_ulong(s: &str) -> Option<u64> {
    let s = s.trim_start();
    let s = s.strip_prefix('+').unwrap_or(s);
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();

    if digits.is_empty() {
        return None;
    }

    digits.parse().ok()
}

/// Разбор числа с плавающей точкой в стиле `strtod`: самый длинный
/// префикс, который разбирается как число.
pub fn parse_c_double(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let candidate: String = s
        .chars()
        .take_while(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        .collect();

    (1..=candidate.len())
        .rev()
        .find_map(|end| candidate[..end].parse::<f64>().ok())
}
