use std::path::PathBuf;

use thiserror::Error;

pub type ConvertResult<T> = std::result::Result<T, ConvertError>;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// Некорректная комбинация параметров
    #[error("Configuration error: {0}")]
    Config(String),

    /// Входной файл не открывается
    #[error("Cannot open input file {}: {source}", path.display())]
    OpenInput {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Выходной файл не создаётся
    #[error("Cannot open output file {}: {source}", path.display())]
    CreateOutput {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Ошибка чтения SeisAn или упаковки Mini-SEED
    #[error("SeisAn error: {0}")]
    Seisan(#[from] seisan_types::SeisanError),

    /// Ошибка записи
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    pub fn config<S: Into<String>>(s: S) -> Self {
        Self::Config(s.into())
    }
}
