use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use seisan_core::{DecodeOptions, PackParams};

use crate::{ConvertError, ConvertResult};

/// Расширение выходных файлов при записи «по файлу на вход»
pub const OUTPUT_EXTENSION: &str = "mseed";

/// Куда писать записи Mini-SEED.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputTarget {
    /// `<input>.mseed` рядом с каждым входным файлом
    #[default]
    PerInput,
    /// Один общий файл
    File(PathBuf),
    /// Стандартный вывод (`-o -`)
    Stdout,
}

/// Полная конфигурация конвертации.
#[derive(Debug, Clone, Default)]
pub struct ConvertConfig {
    /// Параметры декодирования заголовков каналов
    pub decode: DecodeOptions,
    /// Параметры упаковки Mini-SEED
    pub pack: PackParams,
    /// Копить трассы всех входных файлов и упаковать один раз в конце
    pub buffer_all: bool,
    /// Куда писать результат
    pub output: OutputTarget,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl OutputTarget {
    /// Путь выходного файла для `<input>.mseed`.
    pub fn per_input_path(input: &Path) -> PathBuf {
        let mut name = OsString::from(input.as_os_str());
        name.push(".");
        name.push(OUTPUT_EXTENSION);
        PathBuf::from(name)
    }
}

impl ConvertConfig {
    /// Проверяет согласованность параметров.
    pub fn validate(&self) -> ConvertResult<()> {
        self.pack
            .validate()
            .map_err(|e| ConvertError::config(e.to_string()))?;

        if self.buffer_all && self.output == OutputTarget::PerInput {
            return Err(ConvertError::config(
                "buffering all input requires an output file (-o)",
            ));
        }

        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl std::fmt::Display for OutputTarget {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            OutputTarget::PerInput => write!(f, "<input>.{OUTPUT_EXTENSION}"),
            OutputTarget::File(path) => write!(f, "{}", path.display()),
            OutputTarget::Stdout => write!(f, "stdout"),
        }
    }
}

impl std::str::FromStr for OutputTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Err("Output file name is empty".to_string()),
            "-" => Ok(OutputTarget::Stdout),
            path => Ok(OutputTarget::File(PathBuf::from(path))),
        }
    }
}
