//! Сборка логических блоков «заголовок канала + данные» из физических
//! записей.

use log::{trace, warn};
use seisan_types::{ByteOrder, ChannelHeader, SeisanError, SeisanResult, CHANNEL_HEADER_SIZE};

use crate::{
    header::{decode_channel_header, DecodeOptions},
    samples::normalize_samples,
};

/// Заголовок канала и его нормализованные выборки.
#[derive(Debug, Clone)]
pub struct DecodedBlock {
    pub header: ChannelHeader,
    pub samples: Vec<i32>,
}

impl DecodedBlock {
    /// Нормализует сырые данные под заголовок.
    ///
    /// Расхождение объявленного и фактического числа выборок — только
    /// предупреждение: дальше используется фактическое.
    pub fn from_raw(
        header: ChannelHeader,
        raw: &[u8],
        order: ByteOrder,
    ) -> SeisanResult<Self> {
        let samples = normalize_samples(raw, header.sample_width, order)?;

        if samples.len() != header.sample_count as usize {
            warn!(
                "{}: number of samples in channel header ({}) != data section ({})",
                header.trace_key(),
                header.sample_count,
                samples.len()
            );
        }

        Ok(Self { header, samples })
    }
}

enum DecoderState {
    AwaitingHeader,
    AwaitingData {
        header: ChannelHeader,
        expected: usize,
    },
}

/// Автомат AwaitingHeader ⇄ AwaitingData над потоком записей.
pub struct BlockDecoder<'a> {
    options: &'a DecodeOptions,
    byte_order: ByteOrder,
    state: DecoderState,
    header_buf: Box<[u8; CHANNEL_HEADER_SIZE]>,
    header_len: usize,
    data_buf: Vec<u8>,
    blocks: u64,
}

impl<'a> BlockDecoder<'a> {
    pub fn new(
        options: &'a DecodeOptions,
        byte_order: ByteOrder,
    ) -> Self {
        Self {
            options,
            byte_order,
            state: DecoderState::AwaitingHeader,
            header_buf: Box::new([0u8; CHANNEL_HEADER_SIZE]),
            header_len: 0,
            data_buf: Vec::new(),
            blocks: 0,
        }
    }

    /// Максимальная длина следующей записи для текущего логического блока.
    pub fn remaining(&self) -> usize {
        match &self.state {
            DecoderState::AwaitingHeader => CHANNEL_HEADER_SIZE - self.header_len,
            DecoderState::AwaitingData { expected, .. } => expected - self.data_buf.len(),
        }
    }

    pub fn is_awaiting_header(&self) -> bool {
        matches!(self.state, DecoderState::AwaitingHeader)
    }

    /// Нет незавершённого заголовка или секции данных.
    pub fn is_idle(&self) -> bool {
        self.is_awaiting_header() && self.header_len == 0
    }

    /// Число выданных блоков.
    pub fn blocks(&self) -> u64 {
        self.blocks
    }

    /// Подаёт очередную запись. Возвращает блок, когда секция данных
    /// собрана полностью.
    pub fn feed(
        &mut self,
        record: &[u8],
    ) -> SeisanResult<Option<DecodedBlock>> {
        match self.state {
            DecoderState::AwaitingHeader => {
                self.feed_header(record)?;
                Ok(None)
            }
            DecoderState::AwaitingData { .. } => self.feed_data(record),
        }
    }

    fn feed_header(
        &mut self,
        record: &[u8],
    ) -> SeisanResult<()> {
        // Записи, начинающиеся с пробела, — строки главного заголовка
        if self.header_len == 0 && record.first() == Some(&b' ') {
            trace!("Skipping {}-byte non-channel record", record.len());
            return Ok(());
        }

        let accumulated = self.header_len + record.len();
        if accumulated > CHANNEL_HEADER_SIZE {
            return Err(SeisanError::HeaderOverflow {
                accumulated: self.header_len,
                record: record.len(),
                limit: CHANNEL_HEADER_SIZE,
            });
        }

        self.header_buf[self.header_len..accumulated].copy_from_slice(record);
        self.header_len = accumulated;

        if self.header_len < CHANNEL_HEADER_SIZE {
            return Ok(());
        }

        self.header_len = 0;
        let header = decode_channel_header(&self.header_buf, self.options)?;
        let expected = header.data_length();

        if expected == 0 {
            warn!("{}: channel header declares no samples", header.trace_key());
            return Ok(());
        }

        self.data_buf.clear();
        self.data_buf
            .try_reserve(expected)
            .map_err(|_| SeisanError::Allocation(expected))?;
        self.state = DecoderState::AwaitingData { header, expected };

        Ok(())
    }

    fn feed_data(
        &mut self,
        record: &[u8],
    ) -> SeisanResult<Option<DecodedBlock>> {
        let expected = match &self.state {
            DecoderState::AwaitingData { expected, .. } => *expected,
            DecoderState::AwaitingHeader => return Ok(None),
        };

        let accumulated = self.data_buf.len() + record.len();
        if accumulated > expected {
            return Err(SeisanError::DataOverflow {
                expected,
                accumulated,
            });
        }

        self.data_buf.extend_from_slice(record);
        if accumulated < expected {
            return Ok(None);
        }

        let header = match std::mem::replace(&mut self.state, DecoderState::AwaitingHeader) {
            DecoderState::AwaitingData { header, .. } => header,
            DecoderState::AwaitingHeader => return Ok(None),
        };

        let block = DecodedBlock::from_raw(header, &self.data_buf, self.byte_order)?;
        self.data_buf.clear();
        self.blocks += 1;

        Ok(Some(block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(count: u32, width: u8) -> Vec<u8> {
        let mut buf = vec![b' '; CHANNEL_HEADER_SIZE];
        let fields: [(usize, String); 10] = [
            (0, "TEST ".into()),
            (5, "S  Z".into()),
            (9, " 99".into()),
            (13, "  1".into()),
            (23, " 0".into()),
            (26, " 0".into()),
            (29, " 0.000".into()),
            (36, "   20.0".into()),
            (43, format!("{count:7}")),
            (76, (width as char).to_string()),
        ];
        for (off, text) in fields.iter() {
            buf[*off..*off + text.len()].copy_from_slice(text.as_bytes());
        }
        buf
    }

    fn samples_bytes(values: &[i32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_ne_bytes()).collect()
    }

    #[test]
    fn test_header_then_data() {
        let opts = DecodeOptions::default();
        let mut dec = BlockDecoder::new(&opts, ByteOrder::Native);

        assert_eq!(dec.remaining(), CHANNEL_HEADER_SIZE);
        assert!(dec.feed(&header_bytes(3, b'4')).unwrap().is_none());
        assert!(!dec.is_awaiting_header());
        assert_eq!(dec.remaining(), 12);

        let block = dec
            .feed(&samples_bytes(&[10, -20, 30]))
            .unwrap()
            .expect("block complete");

        assert_eq!(block.header.station, "TEST");
        assert_eq!(block.samples, vec![10, -20, 30]);
        assert!(dec.is_idle());
        assert_eq!(dec.blocks(), 1);
    }

    #[test]
    fn test_space_records_skipped() {
        let opts = DecodeOptions::default();
        let mut dec = BlockDecoder::new(&opts, ByteOrder::Native);

        let main_header_line = [b' '; 80];
        assert!(dec.feed(&main_header_line).unwrap().is_none());
        assert!(dec.is_idle());
    }

    #[test]
    fn test_header_across_records() {
        let opts = DecodeOptions::default();
        let mut dec = BlockDecoder::new(&opts, ByteOrder::Native);
        let header = header_bytes(2, b'2');

        for chunk in header.chunks(255) {
            dec.feed(chunk).unwrap();
        }
        assert_eq!(dec.remaining(), 4);

        // Данные тоже могут быть разбиты на несколько записей
        let data: Vec<u8> = [7i16, -7].iter().flat_map(|v| v.to_ne_bytes()).collect();
        assert!(dec.feed(&data[..1]).unwrap().is_none());
        let block = dec.feed(&data[1..]).unwrap().unwrap();

        assert_eq!(block.samples, vec![7, -7]);
    }

    #[test]
    fn test_continuation_starting_with_space_is_accepted() {
        // Продолжение заголовка может начинаться с пробела
        let opts = DecodeOptions::default();
        let mut dec = BlockDecoder::new(&opts, ByteOrder::Native);
        let header = header_bytes(1, b'4');

        dec.feed(&header[..10]).unwrap();
        dec.feed(&header[10..]).unwrap();

        assert!(!dec.is_awaiting_header());
    }

    #[test]
    fn test_header_overflow() {
        let opts = DecodeOptions::default();
        let mut dec = BlockDecoder::new(&opts, ByteOrder::Native);

        dec.feed(&[b'X'; 1000]).unwrap();
        let err = dec.feed(&[b'X'; 41]).unwrap_err();

        assert!(matches!(
            err,
            SeisanError::HeaderOverflow {
                accumulated: 1000,
                record: 41,
                ..
            }
        ));
    }

    #[test]
    fn test_data_overflow() {
        let opts = DecodeOptions::default();
        let mut dec = BlockDecoder::new(&opts, ByteOrder::Native);

        dec.feed(&header_bytes(2, b'4')).unwrap();
        let err = dec.feed(&[0u8; 12]).unwrap_err();

        assert!(matches!(
            err,
            SeisanError::DataOverflow {
                expected: 8,
                accumulated: 12
            }
        ));
    }

    #[test]
    fn test_zero_sample_header_returns_to_header_state() {
        let opts = DecodeOptions::default();
        let mut dec = BlockDecoder::new(&opts, ByteOrder::Native);

        dec.feed(&header_bytes(0, b'4')).unwrap();
        assert!(dec.is_idle());
    }

    #[test]
    fn test_from_raw_count_mismatch_uses_decoded() {
        let opts = DecodeOptions::default();
        let mut dec = BlockDecoder::new(&opts, ByteOrder::Native);
        dec.feed(&header_bytes(5, b'4')).unwrap();

        let header = match &dec.state {
            DecoderState::AwaitingData { header, .. } => header.clone(),
            DecoderState::AwaitingHeader => panic!("header expected"),
        };

        let block = DecodedBlock::from_raw(header, &samples_bytes(&[1, 2]), ByteOrder::Native)
            .unwrap();
        assert_eq!(block.header.sample_count, 5);
        assert_eq!(block.samples.len(), 2);
    }
}
