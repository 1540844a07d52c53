/// Вариант физического формата SeisAn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatVariant {
    /// PC формат до версии 7.0: 1-байтовые длины, всегда little-endian
    LegacyPc,
    /// Формат 7.0+: 4-байтовые длины, порядок байт определяется по файлу
    Standard,
}

/// Порядок байт многобайтовых чисел в файле относительно хоста
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Совпадает с порядком байт хоста
    Native,
    /// Требуется перестановка байт
    Swapped,
}

/// Результат определения формата: вариант + порядок байт.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeisanFormat {
    pub variant: FormatVariant,
    pub byte_order: ByteOrder,
}

impl FormatVariant {
    /// Ширина поля длины записи (и её зеркала) в байтах
    pub fn prefix_width(&self) -> usize {
        match self {
            FormatVariant::LegacyPc => 1,
            FormatVariant::Standard => 4,
        }
    }

    /// Количество сигнатурных байт перед первой записью
    pub fn signature_len(&self) -> usize {
        match self {
            FormatVariant::LegacyPc => 1,
            FormatVariant::Standard => 0,
        }
    }
}

impl ByteOrder {
    /// Порядок байт для данных, записанных в little-endian.
    pub fn for_little_endian() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Swapped
        } else {
            ByteOrder::Native
        }
    }

    pub fn is_swapped(&self) -> bool {
        *self == ByteOrder::Swapped
    }
}

impl std::fmt::Display for FormatVariant {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            FormatVariant::LegacyPc => write!(f, "SeisAn PC (pre-7.0)"),
            FormatVariant::Standard => write!(f, "SeisAn 7.0+"),
        }
    }
}

impl std::fmt::Display for SeisanFormat {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self.byte_order {
            ByteOrder::Native => write!(f, "{}, native byte order", self.variant),
            ByteOrder::Swapped => write!(f, "{}, swapped byte order", self.variant),
        }
    }
}
