//! Определение варианта формата SeisAn и порядка байт по первым байтам файла.

use std::io::{Read, Seek, SeekFrom};

use log::debug;
use seisan_types::{ByteOrder, FormatVariant, SeisanError, SeisanFormat, SeisanResult};

use crate::binary::{decode_u32, read_full, LEGACY_PC_SIGNATURE};

/// Длина первой записи файла SeisAn 7.0+ (первая строка главного заголовка)
pub const STANDARD_IDENT: u32 = 80;

/// Определяет формат, не сдвигая позицию потока.
///
/// Читает до 4 байт и возвращает поток в исходную позицию.
pub fn detect_format<R: Read + Seek + ?Sized>(reader: &mut R) -> SeisanResult<SeisanFormat> {
    let start = reader.stream_position()?;
    let mut ident = [0u8; 4];
    let n = read_full(reader, &mut ident)?;

    reader.seek(SeekFrom::Start(start))?;

    let format = classify_ident(&ident[..n])?;
    debug!("Detected {format}");

    Ok(format)
}

/// Классифицирует первые (до 4) байт файла.
pub fn classify_ident(bytes: &[u8]) -> SeisanResult<SeisanFormat> {
    if bytes.first() == Some(&LEGACY_PC_SIGNATURE) {
        // PC формат всегда little-endian на диске
        return Ok(SeisanFormat {
            variant: FormatVariant::LegacyPc,
            byte_order: ByteOrder::for_little_endian(),
        });
    }

    let mut ident = [0u8; 4];
    ident[..bytes.len().min(4)].copy_from_slice(&bytes[..bytes.len().min(4)]);

    if bytes.len() == 4 {
        for order in [ByteOrder::Native, ByteOrder::Swapped] {
            if decode_u32(&ident, order) == STANDARD_IDENT {
                return Ok(SeisanFormat {
                    variant: FormatVariant::Standard,
                    byte_order: order,
                });
            }
        }
    }

    Err(SeisanError::UnrecognizedFormat {
        ident: u32::from_be_bytes(ident),
    })
}
