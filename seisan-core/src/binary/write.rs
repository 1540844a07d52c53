use seisan_types::{ByteOrder, FormatVariant, SeisanError, SeisanResult};

/// Сигнатурный байт в начале файла PC формата
pub const LEGACY_PC_SIGNATURE: u8 = b'K';

pub fn encode_u32(
    val: u32,
    order: ByteOrder,
) -> [u8; 4] {
    if order.is_swapped() {
        val.swap_bytes().to_ne_bytes()
    } else {
        val.to_ne_bytes()
    }
}

/// Дописывает в `out` одну физическую запись: длина, данные, зеркало длины.
pub fn encode_record(
    out: &mut Vec<u8>,
    variant: FormatVariant,
    order: ByteOrder,
    payload: &[u8],
) -> SeisanResult<()> {
    match variant {
        FormatVariant::LegacyPc => {
            let len = u8::try_from(payload.len()).map_err(|_| {
                SeisanError::pack(format!(
                    "PC record of {} bytes exceeds 255-byte limit",
                    payload.len()
                ))
            })?;
            out.push(len);
            out.extend_from_slice(payload);
            out.push(len);
        }
        FormatVariant::Standard => {
            let len = u32::try_from(payload.len())
                .map_err(|_| SeisanError::pack("record longer than 4 GiB"))?;
            out.extend_from_slice(&encode_u32(len, order));
            out.extend_from_slice(payload);
            out.extend_from_slice(&encode_u32(len, order));
        }
    }

    Ok(())
}
