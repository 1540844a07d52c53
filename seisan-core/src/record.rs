//! Чтение физических записей SeisAn.
//!
//! Каждая запись обрамлена полем длины и его зеркалом:
//!
//! ```text
//! [LEN][PAYLOAD ... LEN bytes][LEN]
//! ```
//!
//! `LEN` занимает 1 байт в PC формате и 4 байта в формате 7.0+.
//! Несовпадение зеркала считается повреждением файла.

use std::io::{BufReader, Read, Seek, SeekFrom};

use log::{trace, warn};
use seisan_types::{SeisanError, SeisanFormat, SeisanResult};

use crate::binary::{decode_length_prefix, read_full};

/// Одна физическая запись. Данные указывают во внутренний буфер читателя
/// и действительны до следующего вызова [`RecordReader::next_record`].
#[derive(Debug, Clone, Copy)]
pub struct RawRecord<'a> {
    /// Полезная нагрузка записи
    pub data: &'a [u8],
    /// Длина, объявленная в поле длины (до исправления)
    pub declared_len: u32,
    /// Смещение поля длины от начала файла
    pub offset: u64,
    /// Длина была исправлена эвристикой конца файла
    pub repaired: bool,
}

/// Статистика, накопленная [`RecordReader`] в процессе чтения.
#[derive(Debug, Default, Clone)]
pub struct RecordStats {
    /// Прочитанных записей
    pub records: u64,
    /// Байт полезной нагрузки
    pub payload_bytes: u64,
    /// Записей, исправленных эвристикой конца файла
    pub repaired: u64,
}

/// Последовательный читатель записей одного файла.
pub struct RecordReader<R: Read> {
    reader: BufReader<R>,
    format: SeisanFormat,
    buf: Vec<u8>,
    pos: u64,
    stream_len: u64,
    stats: RecordStats,
    done: bool,
}

#[derive(Debug, Clone, Copy)]
struct RecordMeta {
    offset: u64,
    declared: u32,
    length: usize,
    repaired: bool,
}

impl<R: Read + Seek> RecordReader<R> {
    /// Создаёт читатель с текущей позиции потока.
    ///
    /// Для PC формата сразу пропускает сигнатурный байт.
    pub fn new(
        mut inner: R,
        format: SeisanFormat,
    ) -> SeisanResult<Self> {
        let start = inner.stream_position()?;
        let stream_len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(start))?;

        let mut reader = BufReader::new(inner);
        let mut pos = start;

        let sig_len = format.variant.signature_len();
        if sig_len > 0 {
            let mut sig = [0u8; 1];
            let n = read_full(&mut reader, &mut sig[..sig_len])?;
            pos += n as u64;
        }

        Ok(Self {
            reader,
            format,
            buf: Vec::new(),
            pos,
            stream_len,
            stats: RecordStats::default(),
            done: false,
        })
    }
}

impl<R: Read> RecordReader<R> {
    /// Возвращает следующую запись, `Ok(None)` на чистом EOF.
    ///
    /// `limit` — максимальная длина, ожидаемая для текущего логического
    /// блока. Запись длиннее ровно на 1 байт, которая после исправления
    /// заканчивается точно на конце файла, укорачивается с предупреждением.
    /// Любое другое превышение — ошибка.
    ///
    /// После первой ошибки читатель больше не выдаёт записей.
    pub fn next_record(
        &mut self,
        limit: Option<usize>,
    ) -> SeisanResult<Option<RawRecord<'_>>> {
        if self.done {
            return Ok(None);
        }

        let meta = match self.read_record(limit) {
            Ok(Some(meta)) => meta,
            Ok(None) => {
                self.done = true;
                return Ok(None);
            }
            Err(e) => {
                self.done = true;
                return Err(e);
            }
        };

        self.stats.records += 1;
        self.stats.payload_bytes += meta.length as u64;
        if meta.repaired {
            self.stats.repaired += 1;
        }

        Ok(Some(RawRecord {
            data: &self.buf[..meta.length],
            declared_len: meta.declared,
            offset: meta.offset,
            repaired: meta.repaired,
        }))
    }

    fn read_record(
        &mut self,
        limit: Option<usize>,
    ) -> SeisanResult<Option<RecordMeta>> {
        let offset = self.pos;
        let width = self.format.variant.prefix_width();

        let mut prefix = [0u8; 4];
        let n = read_full(&mut self.reader, &mut prefix[..width])?;
        self.pos += n as u64;

        if n == 0 {
            return Ok(None);
        }
        if n < width {
            return Err(SeisanError::Truncated {
                offset,
                expected: width,
                actual: n,
            });
        }

        let declared =
            decode_length_prefix(&prefix[..width], self.format.variant, self.format.byte_order);
        let mut length = declared as usize;
        let mut repaired = false;

        trace!("Record of {declared} bytes at offset {offset}");

        if let Some(max) = limit {
            if length > max {
                // Известный дефект файлов SeisAn: последняя запись на 1 байт
                // длиннее данных и без этого байта ровно упирается в EOF
                let corrected_end = offset + (2 * width + length - 1) as u64;

                if length - max == 1 && corrected_end == self.stream_len {
                    warn!(
                        "Record at byte offset {offset}: length {declared} is 1 byte longer than expected {max} at end of file, corrected"
                    );
                    length -= 1;
                    repaired = true;
                } else {
                    return Err(SeisanError::RecordTooLong {
                        offset,
                        declared,
                        expected: max,
                    });
                }
            }
        }

        if self.buf.len() < length {
            self.buf
                .try_reserve(length - self.buf.len())
                .map_err(|_| SeisanError::Allocation(length))?;
            self.buf.resize(length, 0);
        }

        let got = read_full(&mut self.reader, &mut self.buf[..length])?;
        self.pos += got as u64;

        if got < length {
            return Err(SeisanError::Truncated {
                offset,
                expected: length,
                actual: got,
            });
        }

        let mut mirror_bytes = [0u8; 4];
        let n = read_full(&mut self.reader, &mut mirror_bytes[..width])?;
        self.pos += n as u64;

        if n < width {
            return Err(SeisanError::Truncated {
                offset,
                expected: width,
                actual: n,
            });
        }

        let mirror = decode_length_prefix(
            &mirror_bytes[..width],
            self.format.variant,
            self.format.byte_order,
        );

        if mirror != declared && !(repaired && mirror as usize == length) {
            return Err(SeisanError::FramingMismatch {
                offset,
                leading: declared,
                mirror,
            });
        }

        Ok(Some(RecordMeta {
            offset,
            declared,
            length,
            repaired,
        }))
    }

    /// Текущее смещение от начала файла.
    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn format(&self) -> SeisanFormat {
        self.format
    }

    /// Накопленная статистика чтения.
    pub fn stats(&self) -> &RecordStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use seisan_types::{ByteOrder, FormatVariant};

    use super::*;
    use crate::binary::{encode_record, encode_u32, LEGACY_PC_SIGNATURE};

    const STANDARD: SeisanFormat = SeisanFormat {
        variant: FormatVariant::Standard,
        byte_order: ByteOrder::Native,
    };

    fn standard_file(payloads: &[&[u8]]) -> Vec<u8> {
        let mut raw = Vec::new();
        for p in payloads {
            encode_record(&mut raw, FormatVariant::Standard, ByteOrder::Native, p).unwrap();
        }
        raw
    }

    #[test]
    fn test_reads_records_in_order() {
        let raw = standard_file(&[b"first", b"second record", b""]);
        let mut reader = RecordReader::new(Cursor::new(raw), STANDARD).unwrap();

        let r = reader.next_record(None).unwrap().unwrap();
        assert_eq!(r.data, b"first");
        assert_eq!(r.offset, 0);

        let r = reader.next_record(None).unwrap().unwrap();
        assert_eq!(r.data, b"second record");
        assert_eq!(r.offset, 13);

        let r = reader.next_record(None).unwrap().unwrap();
        assert!(r.data.is_empty());

        assert!(reader.next_record(None).unwrap().is_none());
        assert_eq!(reader.stats().records, 3);
        assert_eq!(reader.stats().payload_bytes, 18);
    }

    #[test]
    fn test_swapped_lengths() {
        let fmt = SeisanFormat {
            variant: FormatVariant::Standard,
            byte_order: ByteOrder::Swapped,
        };
        let mut raw = Vec::new();
        encode_record(&mut raw, FormatVariant::Standard, ByteOrder::Swapped, b"xyz").unwrap();

        let mut reader = RecordReader::new(Cursor::new(raw), fmt).unwrap();
        assert_eq!(reader.next_record(None).unwrap().unwrap().data, b"xyz");
    }

    #[test]
    fn test_legacy_pc_skips_signature() {
        let fmt = SeisanFormat {
            variant: FormatVariant::LegacyPc,
            byte_order: ByteOrder::for_little_endian(),
        };
        let mut raw = vec![LEGACY_PC_SIGNATURE];
        encode_record(&mut raw, FormatVariant::LegacyPc, fmt.byte_order, b"abc").unwrap();
        encode_record(&mut raw, FormatVariant::LegacyPc, fmt.byte_order, &[9u8; 200]).unwrap();

        let mut reader = RecordReader::new(Cursor::new(raw), fmt).unwrap();

        let r = reader.next_record(None).unwrap().unwrap();
        assert_eq!(r.data, b"abc");
        assert_eq!(r.offset, 1);
        assert_eq!(reader.next_record(None).unwrap().unwrap().data.len(), 200);
        assert!(reader.next_record(None).unwrap().is_none());
    }

    #[test]
    fn test_mirror_mismatch_terminates() {
        let mut raw = standard_file(&[b"good"]);
        raw.extend_from_slice(&encode_u32(3, ByteOrder::Native));
        raw.extend_from_slice(b"bad");
        raw.extend_from_slice(&encode_u32(4, ByteOrder::Native));
        raw.extend_from_slice(&standard_file(&[b"never read"]));

        let mut reader = RecordReader::new(Cursor::new(raw), STANDARD).unwrap();
        reader.next_record(None).unwrap().unwrap();

        let err = reader.next_record(None).unwrap_err();
        match err {
            SeisanError::FramingMismatch {
                offset,
                leading,
                mirror,
            } => {
                assert_eq!(offset, 12);
                assert_eq!(leading, 3);
                assert_eq!(mirror, 4);
            }
            other => panic!("unexpected error: {other}"),
        }

        // Последовательность завершена
        assert!(reader.next_record(None).unwrap().is_none());
    }

    #[test]
    fn test_short_read_is_error() {
        let mut raw = standard_file(&[b"0123456789"]);
        raw.truncate(raw.len() - 6);

        let mut reader = RecordReader::new(Cursor::new(raw), STANDARD).unwrap();
        let err = reader.next_record(None).unwrap_err();

        assert!(matches!(
            err,
            SeisanError::Truncated {
                expected: 10,
                actual: 8,
                ..
            }
        ));
    }

    #[test]
    fn test_partial_prefix_is_error() {
        let raw = vec![1u8, 0];
        let mut reader = RecordReader::new(Cursor::new(raw), STANDARD).unwrap();

        assert!(matches!(
            reader.next_record(None),
            Err(SeisanError::Truncated { .. })
        ));
    }

    #[test]
    fn test_record_over_limit_terminates() {
        let raw = standard_file(&[b"0123456789", b"tail"]);
        let mut reader = RecordReader::new(Cursor::new(raw), STANDARD).unwrap();

        let err = reader.next_record(Some(8)).unwrap_err();
        assert!(matches!(
            err,
            SeisanError::RecordTooLong {
                declared: 10,
                expected: 8,
                ..
            }
        ));
        assert_eq!(err.offset(), Some(0));
        assert!(reader.next_record(None).unwrap().is_none());
    }

    #[test]
    fn test_one_byte_excess_not_at_eof_is_error() {
        // Лишний байт, но после записи есть ещё данные
        let raw = standard_file(&[b"0123456789", b"tail"]);
        let mut reader = RecordReader::new(Cursor::new(raw), STANDARD).unwrap();

        assert!(matches!(
            reader.next_record(Some(9)),
            Err(SeisanError::RecordTooLong { .. })
        ));
    }

    #[test]
    fn test_eof_repair_of_last_record() {
        // Последняя запись объявляет N+1 байт, содержит N байт и зеркало
        let mut raw = standard_file(&[b"head"]);
        raw.extend_from_slice(&encode_u32(6, ByteOrder::Native));
        raw.extend_from_slice(b"12345");
        raw.extend_from_slice(&encode_u32(6, ByteOrder::Native));

        let mut reader = RecordReader::new(Cursor::new(raw), STANDARD).unwrap();
        reader.next_record(None).unwrap().unwrap();

        let r = reader.next_record(Some(5)).unwrap().unwrap();
        assert_eq!(r.data, b"12345");
        assert_eq!(r.declared_len, 6);
        assert!(r.repaired);

        assert!(reader.next_record(Some(0)).unwrap().is_none());
        assert_eq!(reader.stats().repaired, 1);
    }

    #[test]
    fn test_buffer_reused_and_grown() {
        let raw = standard_file(&[b"ab", &[1u8; 4096], b"cd"]);
        let mut reader = RecordReader::new(Cursor::new(raw), STANDARD).unwrap();

        assert_eq!(reader.next_record(None).unwrap().unwrap().data, b"ab");
        assert_eq!(reader.next_record(None).unwrap().unwrap().data.len(), 4096);
        assert_eq!(reader.next_record(None).unwrap().unwrap().data, b"cd");
    }
}
