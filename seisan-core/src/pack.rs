//! Упаковка трасс в записи Mini-SEED v2 без сжатия.
//!
//! Раскладка записи:
//!
//! ```text
//! [0..48]    фиксированный заголовок (FSDH)
//! [48..60]   бланкетта 100, если задана частота трассы
//! [..+8]     бланкетта 1000
//! [56|72..]  выборки INT16 / INT32, хвост последней записи заполнен нулями
//! ```
//!
//! Все многобайтовые поля заголовка и данные пишутся в одном порядке байт.

use std::{io::Write, str::FromStr};

use byteorder::{BigEndian, ByteOrder as Endian, LittleEndian};
use log::{debug, trace};
use seisan_types::{SeisanError, SeisanResult};

use crate::trace::Trace;

/// Минимальная длина записи Mini-SEED
pub const MIN_RECORD_LENGTH: usize = 256;
/// Максимальная длина записи Mini-SEED
pub const MAX_RECORD_LENGTH: usize = 65536;
/// Длина записи по умолчанию
pub const DEFAULT_RECORD_LENGTH: usize = 4096;

const FSDH_SIZE: usize = 48;
const BLKT_100_SIZE: usize = 12;
const BLKT_1000_SIZE: usize = 8;
const MAX_SEQUENCE: u32 = 999_999;
const TIME_TAG_QUESTIONABLE: u8 = 0x80;

/// Итог упаковки одной трассы.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackedCounts {
    pub records: u64,
    pub samples: u64,
}

/// Упаковщик трасс в записи.
///
/// При `flush == false` упаковываются только полные записи, остаток
/// выборок остаётся в трассе. При `flush == true` трасса опустошается.
pub trait Packer {
    fn pack(
        &mut self,
        trace: &mut Trace,
        flush: bool,
    ) -> SeisanResult<PackedCounts>;
}

/// Кодирование выборок (коды SEED)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackEncoding {
    Int16,
    Int32,
}

/// Порядок байт выходных записей
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackByteOrder {
    Big,
    Little,
}

/// Параметры упаковки.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackParams {
    pub record_length: usize,
    pub encoding: PackEncoding,
    pub byte_order: PackByteOrder,
    /// Добавлять бланкетту 100 с точной частотой дискретизации
    pub srate_blockette: bool,
}

/// Запись Mini-SEED в произвольный `Write`.
pub struct MseedPacker<W: Write> {
    writer: W,
    params: PackParams,
    sequence: u32,
    record: Vec<u8>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl PackEncoding {
    /// Код SEED: 1 = INT16, 3 = INT32. Steim (10, 11) не поддерживается.
    pub fn from_code(code: u8) -> SeisanResult<Self> {
        match code {
            1 => Ok(PackEncoding::Int16),
            3 => Ok(PackEncoding::Int32),
            other => Err(SeisanError::UnsupportedEncoding(other)),
        }
    }

    pub fn to_code(&self) -> u8 {
        match self {
            PackEncoding::Int16 => 1,
            PackEncoding::Int32 => 3,
        }
    }

    pub fn sample_width(&self) -> usize {
        match self {
            PackEncoding::Int16 => 2,
            PackEncoding::Int32 => 4,
        }
    }
}

impl PackByteOrder {
    /// Код SEED: 1 = big-endian, 0 = little-endian.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(PackByteOrder::Big),
            0 => Some(PackByteOrder::Little),
            _ => None,
        }
    }

    pub fn to_code(&self) -> u8 {
        match self {
            PackByteOrder::Big => 1,
            PackByteOrder::Little => 0,
        }
    }
}

impl PackParams {
    pub fn validate(&self) -> SeisanResult<()> {
        let len = self.record_length;
        if !len.is_power_of_two() || !(MIN_RECORD_LENGTH..=MAX_RECORD_LENGTH).contains(&len) {
            return Err(SeisanError::pack(format!(
                "record length {len} is not a power of two in {MIN_RECORD_LENGTH}..={MAX_RECORD_LENGTH}"
            )));
        }

        Ok(())
    }

    /// Смещение начала данных в записи.
    pub fn data_offset(
        &self,
        with_blockette_100: bool,
    ) -> usize {
        let blockettes = if with_blockette_100 {
            BLKT_100_SIZE + BLKT_1000_SIZE
        } else {
            BLKT_1000_SIZE
        };

        (FSDH_SIZE + blockettes).next_multiple_of(8)
    }

    /// Число выборок в одной записи.
    pub fn samples_per_record(
        &self,
        with_blockette_100: bool,
    ) -> usize {
        (self.record_length - self.data_offset(with_blockette_100)) / self.encoding.sample_width()
    }
}

impl<W: Write> MseedPacker<W> {
    pub fn new(
        writer: W,
        params: PackParams,
    ) -> SeisanResult<Self> {
        params.validate()?;

        Ok(Self {
            writer,
            params,
            sequence: 0,
            record: vec![0u8; params.record_length],
        })
    }

    pub fn params(&self) -> &PackParams {
        &self.params
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn next_sequence(&self) -> u32 {
        if self.sequence >= MAX_SEQUENCE {
            1
        } else {
            self.sequence + 1
        }
    }

    fn write_record(
        &mut self,
        trace: &Trace,
        count: usize,
    ) -> SeisanResult<()> {
        let sequence = self.next_sequence();
        let params = self.params;

        match params.byte_order {
            PackByteOrder::Big => {
                fill_record::<BigEndian>(&mut self.record, &params, sequence, trace, count)?
            }
            PackByteOrder::Little => {
                fill_record::<LittleEndian>(&mut self.record, &params, sequence, trace, count)?
            }
        }

        self.writer.write_all(&self.record)?;
        self.sequence = sequence;
        trace!(
            "{}: record {sequence:06} with {count} samples from {}",
            trace.key(),
            trace.start_time
        );

        Ok(())
    }
}

/// Разложение частоты на пару (factor, multiplier) поля FSDH.
pub fn sample_rate_factors(rate: f64) -> SeisanResult<(i16, i16)> {
    const LIMIT: f64 = i16::MAX as f64;

    if !rate.is_finite() || rate <= 0.0 {
        return Err(SeisanError::pack(format!("invalid sample rate {rate}")));
    }

    let is_integral = |v: f64| (v - v.round()).abs() < 1e-6;

    if rate >= 1.0 {
        if rate > LIMIT {
            return Err(SeisanError::pack(format!("sample rate {rate} too high")));
        }
        if is_integral(rate) {
            return Ok((rate.round() as i16, 1));
        }

        // rate = factor / divisor
        let mut best = (rate.round() as i16, 1i16);
        for divisor in [10i16, 100, 1000, 10000] {
            let scaled = rate * divisor as f64;
            if scaled > LIMIT {
                break;
            }
            best = (scaled.round() as i16, -divisor);
            if is_integral(scaled) {
                break;
            }
        }
        Ok(best)
    } else {
        let period = 1.0 / rate;
        if period > LIMIT {
            return Err(SeisanError::pack(format!("sample rate {rate} too low")));
        }
        if is_integral(period) {
            return Ok((-(period.round() as i16), 1));
        }

        // rate = multiplier / period
        let mut best = (-(period.round() as i16), 1i16);
        for multiplier in [10i16, 100, 1000, 10000] {
            let scaled = period * multiplier as f64;
            if scaled > LIMIT {
                break;
            }
            best = (-(scaled.round() as i16), multiplier);
            if is_integral(scaled) {
                break;
            }
        }
        Ok(best)
    }
}

fn fill_record<E: Endian>(
    buf: &mut [u8],
    params: &PackParams,
    sequence: u32,
    trace: &Trace,
    count: usize,
) -> SeisanResult<()> {
    let template = &trace.template;
    let with_b100 = template.srate_blockette.is_some();
    let data_offset = params.data_offset(with_b100);

    let btime = trace.start_time.to_btime().ok_or_else(|| {
        SeisanError::pack(format!(
            "{}: start time {} not representable",
            template.key, trace.start_time
        ))
    })?;
    let (factor, multiplier) = sample_rate_factors(trace.sample_rate)?;
    let num_samples = u16::try_from(count)
        .map_err(|_| SeisanError::pack(format!("{count} samples do not fit one record")))?;

    buf.fill(0);

    // Фиксированный заголовок
    buf[0..6].copy_from_slice(format!("{sequence:06}").as_bytes());
    buf[6] = b'D';
    buf[7] = b' ';
    write_padded(&mut buf[8..13], &template.key.station);
    write_padded(&mut buf[13..15], &template.key.location);
    write_padded(&mut buf[15..18], &template.key.channel);
    write_padded(&mut buf[18..20], &template.key.network);

    E::write_u16(&mut buf[20..22], btime.year);
    E::write_u16(&mut buf[22..24], btime.day);
    buf[24] = btime.hour;
    buf[25] = btime.minute;
    buf[26] = btime.second;
    E::write_u16(&mut buf[28..30], btime.fract);

    E::write_u16(&mut buf[30..32], num_samples);
    E::write_i16(&mut buf[32..34], factor);
    E::write_i16(&mut buf[34..36], multiplier);
    if template.time_questionable {
        buf[38] = TIME_TAG_QUESTIONABLE;
    }
    buf[39] = if with_b100 { 2 } else { 1 };
    E::write_u16(&mut buf[44..46], data_offset as u16);
    E::write_u16(&mut buf[46..48], FSDH_SIZE as u16);

    // Бланкетты
    let mut pos = FSDH_SIZE;
    if let Some(rate) = template.srate_blockette {
        E::write_u16(&mut buf[pos..pos + 2], 100);
        E::write_u16(&mut buf[pos + 2..pos + 4], (pos + BLKT_100_SIZE) as u16);
        E::write_f32(&mut buf[pos + 4..pos + 8], rate);
        pos += BLKT_100_SIZE;
    }

    E::write_u16(&mut buf[pos..pos + 2], 1000);
    E::write_u16(&mut buf[pos + 2..pos + 4], 0);
    buf[pos + 4] = params.encoding.to_code();
    buf[pos + 5] = params.byte_order.to_code();
    buf[pos + 6] = params.record_length.trailing_zeros() as u8;

    // Данные
    let samples = &trace.samples[..count];
    match params.encoding {
        PackEncoding::Int32 => {
            E::write_i32_into(samples, &mut buf[data_offset..data_offset + count * 4]);
        }
        PackEncoding::Int16 => {
            let narrow = samples
                .iter()
                .map(|&s| i16::try_from(s))
                .collect::<Result<Vec<i16>, _>>()
                .map_err(|_| {
                    SeisanError::pack(format!(
                        "{}: sample value out of INT16 range",
                        template.key
                    ))
                })?;
            E::write_i16_into(&narrow, &mut buf[data_offset..data_offset + count * 2]);
        }
    }

    Ok(())
}

fn write_padded(
    dest: &mut [u8],
    src: &str,
) {
    let bytes = src.as_bytes();
    for (i, slot) in dest.iter_mut().enumerate() {
        *slot = bytes.get(i).copied().unwrap_or(b' ');
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl<W: Write> Packer for MseedPacker<W> {
    fn pack(
        &mut self,
        trace: &mut Trace,
        flush: bool,
    ) -> SeisanResult<PackedCounts> {
        let per_record = self
            .params
            .samples_per_record(trace.template.srate_blockette.is_some());
        let mut counts = PackedCounts::default();

        while !trace.is_empty() {
            let available = trace.len();
            if available < per_record && !flush {
                break;
            }

            let count = available.min(per_record);
            self.write_record(trace, count)?;
            trace.consume_front(count);

            counts.records += 1;
            counts.samples += count as u64;
        }

        if flush {
            self.writer.flush()?;
        }

        debug!(
            "{}: packed {} samples into {} records",
            trace.key(),
            counts.samples,
            counts.records
        );

        Ok(counts)
    }
}

impl Default for PackParams {
    fn default() -> Self {
        Self {
            record_length: DEFAULT_RECORD_LENGTH,
            encoding: PackEncoding::Int32,
            byte_order: PackByteOrder::Big,
            srate_blockette: false,
        }
    }
}

impl FromStr for PackEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code: u8 = s
            .trim()
            .parse()
            .map_err(|_| format!("Invalid encoding '{s}'. Use: 1 (INT16) or 3 (INT32)"))?;

        PackEncoding::from_code(code).map_err(|e| e.to_string())
    }
}

impl FromStr for PackByteOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .ok()
            .and_then(PackByteOrder::from_code)
            .ok_or_else(|| format!("Invalid byte order '{s}'. Use: 1 (big) or 0 (little)"))
    }
}
