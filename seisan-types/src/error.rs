use thiserror::Error;

/// Результат для операций чтения SeisAn
pub type SeisanResult<T> = std::result::Result<T, SeisanError>;

/// Типы ошибок чтения и нормализации SeisAn.
///
/// Все варианты, кроме [`SeisanError::Io`] и [`SeisanError::Pack`],
/// прерывают обработку только текущего файла.
#[derive(Debug, Error)]
pub enum SeisanError {
    /// Первые байты файла не похожи ни на один из вариантов SeisAn
    #[error("Unrecognized SeisAn format: leading bytes {ident:#010x}")]
    UnrecognizedFormat { ident: u32 },

    /// Длина записи и её зеркало в конце записи не совпадают
    #[error(
        "Record length mismatch at byte offset {offset}: next {leading} != previous {mirror}"
    )]
    FramingMismatch { offset: u64, leading: u32, mirror: u32 },

    /// Объявленная длина записи больше ожидаемой для текущего блока
    #[error(
        "Record at byte offset {offset} declares {declared} bytes, at most {expected} expected"
    )]
    RecordTooLong {
        offset: u64,
        declared: u32,
        expected: usize,
    },

    /// Файл закончился посреди записи
    #[error("Short read at byte offset {offset}: only {actual} of {expected} bytes")]
    Truncated {
        offset: u64,
        expected: usize,
        actual: usize,
    },

    /// Накопленный заголовок канала длиннее 1040 байт
    #[error("Channel header overflow: {accumulated} + {record} bytes exceeds {limit}")]
    HeaderOverflow {
        accumulated: usize,
        record: usize,
        limit: usize,
    },

    /// Накопленные данные канала длиннее объявленных в заголовке
    #[error("Data section overflow: {accumulated} bytes accumulated, {expected} expected")]
    DataOverflow { expected: usize, accumulated: usize },

    /// Ширина выборки не 2 и не 4 байта
    #[error("Unsupported sample width: {0} bytes")]
    UnsupportedSampleWidth(usize),

    /// Текстовое поле заголовка канала не разбирается
    #[error("Invalid channel header field {field}: '{value}'")]
    InvalidField { field: &'static str, value: String },

    /// Не удалось выделить память под буфер записи
    #[error("Cannot allocate {0} bytes for record buffer")]
    Allocation(usize),

    /// Неподдерживаемый формат кодирования Mini-SEED
    #[error("Unsupported Mini-SEED encoding: {0}")]
    UnsupportedEncoding(u8),

    /// Ошибка упаковки трассы в записи Mini-SEED
    #[error("Pack error: {0}")]
    Pack(String),

    /// Ошибки ввода/вывода (автоконвертируются из std::io::Error)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SeisanError {
    /// Удобные конструкторы
    pub fn invalid_field<S: Into<String>>(
        field: &'static str,
        value: S,
    ) -> Self {
        Self::InvalidField {
            field,
            value: value.into(),
        }
    }

    pub fn pack<S: Into<String>>(s: S) -> Self {
        Self::Pack(s.into())
    }

    /// Смещение в файле, к которому относится ошибка (если известно).
    pub fn offset(&self) -> Option<u64> {
        match self {
            Self::FramingMismatch { offset, .. }
            | Self::RecordTooLong { offset, .. }
            | Self::Truncated { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}
