//! Чтение файла SeisAn целиком: определение формата, разбор записей,
//! сборка логических блоков.

use std::io::{Read, Seek};

use log::warn;
use seisan_types::{SeisanFormat, SeisanResult};

use crate::{
    decoder::{BlockDecoder, DecodedBlock},
    detect::detect_format,
    header::DecodeOptions,
    record::{RecordReader, RecordStats},
};

/// Последовательный читатель блоков одного файла SeisAn.
pub struct SeisanReader<'a, R: Read> {
    records: RecordReader<R>,
    decoder: BlockDecoder<'a>,
    done: bool,
}

impl<'a, R: Read + Seek> SeisanReader<'a, R> {
    /// Определяет формат и готовит чтение с текущей позиции.
    pub fn new(
        mut inner: R,
        options: &'a DecodeOptions,
    ) -> SeisanResult<Self> {
        let format = detect_format(&mut inner)?;

        Ok(Self {
            records: RecordReader::new(inner, format)?,
            decoder: BlockDecoder::new(options, format.byte_order),
            done: false,
        })
    }
}

impl<R: Read> SeisanReader<'_, R> {
    /// Следующий полный блок или `Ok(None)` в конце файла.
    ///
    /// После ошибки блоков больше не выдаётся.
    pub fn next_block(&mut self) -> SeisanResult<Option<DecodedBlock>> {
        if self.done {
            return Ok(None);
        }

        let result = self.read_block();
        if !matches!(result, Ok(Some(_))) {
            self.done = true;
        }

        result
    }

    fn read_block(&mut self) -> SeisanResult<Option<DecodedBlock>> {
        loop {
            let limit = self.decoder.remaining();

            let Some(record) = self.records.next_record(Some(limit))? else {
                break;
            };

            if let Some(block) = self.decoder.feed(record.data)? {
                return Ok(Some(block));
            }
        }

        if !self.decoder.is_idle() {
            warn!(
                "End of file inside a channel block at byte offset {}",
                self.records.position()
            );
        }

        Ok(None)
    }

    pub fn format(&self) -> SeisanFormat {
        self.records.format()
    }

    pub fn record_stats(&self) -> &RecordStats {
        self.records.stats()
    }

    /// Число выданных блоков.
    pub fn blocks(&self) -> u64 {
        self.decoder.blocks()
    }
}

impl<R: Read> Iterator for SeisanReader<'_, R> {
    type Item = SeisanResult<DecodedBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_block().transpose()
    }
}
