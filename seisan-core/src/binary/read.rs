use std::io::{ErrorKind, Read};

use byteorder::{ByteOrder as _, NativeEndian};
use seisan_types::{ByteOrder, FormatVariant};

/// Читает до заполнения `buf` или до EOF. Возвращает число прочитанных байт.
pub fn read_full<R: Read + ?Sized>(
    reader: &mut R,
    buf: &mut [u8],
) -> std::io::Result<usize> {
    let mut filled = 0;

    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(filled)
}

pub fn decode_u32(
    bytes: &[u8],
    order: ByteOrder,
) -> u32 {
    let v = NativeEndian::read_u32(bytes);
    if order.is_swapped() {
        v.swap_bytes()
    } else {
        v
    }
}

/// Декодирует поле длины записи (или её зеркала).
///
/// `bytes` должен иметь длину `variant.prefix_width()`.
pub fn decode_length_prefix(
    bytes: &[u8],
    variant: FormatVariant,
    order: ByteOrder,
) -> u32 {
    match variant {
        FormatVariant::LegacyPc => bytes[0] as u32,
        FormatVariant::Standard => decode_u32(bytes, order),
    }
}
