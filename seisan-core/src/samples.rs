//! Нормализация выборок: 16/32-битные целые любого порядка байт → `i32`
//! в порядке байт хоста.

use byteorder::{ByteOrder as _, NativeEndian};
use seisan_types::{ByteOrder, SeisanError, SeisanResult};

/// Преобразует сырые байты данных в выборки `i32`.
///
/// `width` — ширина выборки в байтах (2 или 4). 16-битные выборки
/// расширяются со знаком. Хвост короче одной выборки игнорируется.
pub fn normalize_samples(
    raw: &[u8],
    width: usize,
    order: ByteOrder,
) -> SeisanResult<Vec<i32>> {
    let swap = order.is_swapped();

    match width {
        4 => {
            let count = raw.len() / 4;
            let mut out = vec![0i32; count];
            NativeEndian::read_i32_into(&raw[..count * 4], &mut out);

            if swap {
                for s in out.iter_mut() {
                    *s = s.swap_bytes();
                }
            }

            Ok(out)
        }
        2 => {
            let count = raw.len() / 2;
            let mut narrow = vec![0i16; count];
            NativeEndian::read_i16_into(&raw[..count * 2], &mut narrow);

            Ok(narrow
                .into_iter()
                .map(|s| i32::from(if swap { s.swap_bytes() } else { s }))
                .collect())
        }
        other => Err(SeisanError::UnsupportedSampleWidth(other)),
    }
}
