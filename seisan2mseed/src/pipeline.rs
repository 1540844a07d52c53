use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use log::{debug, error, info, warn};
use seisan_core::{MseedPacker, PackedCounts, Packer, SeisanReader, TraceGroup};

use crate::{ConvertConfig, ConvertError, ConvertResult, OutputTarget, PackTotals};

/// Накопление трасс из входных файлов и их упаковка.
///
/// Без `buffer_all` каждый добавленный блок сразу упаковывается с
/// `flush`, и группа очищается. С `buffer_all` упаковка выполняется один
/// раз в [`Converter::finish`].
pub struct Converter<'c> {
    config: &'c ConvertConfig,
    group: TraceGroup,
    totals: PackTotals,
}

impl<'c> Converter<'c> {
    pub fn new(config: &'c ConvertConfig) -> Self {
        Self {
            config,
            group: TraceGroup::new(config.pack.srate_blockette),
            totals: PackTotals::default(),
        }
    }

    /// Читает один входной файл.
    ///
    /// Ошибка прерывает только этот файл: уже добавленные трассы остаются
    /// в группе и будут упакованы.
    pub fn convert_file(
        &mut self,
        path: &Path,
        packer: &mut dyn Packer,
    ) -> ConvertResult<()> {
        let config = self.config;
        let file = File::open(path).map_err(|source| ConvertError::OpenInput {
            path: path.to_path_buf(),
            source,
        })?;

        let mut reader = SeisanReader::new(file, &config.decode)?;
        debug!("{}: {}", path.display(), reader.format());

        while let Some(block) = reader.next_block()? {
            self.group.add_block(block);

            if !config.buffer_all {
                self.pack_group(packer, true)?;
            }
        }

        let stats = reader.record_stats();
        debug!(
            "{}: {} records, {} blocks, {} repaired",
            path.display(),
            stats.records,
            reader.blocks(),
            stats.repaired
        );

        Ok(())
    }

    /// Читает файл, записывая ошибку в лог и в итоги.
    pub fn process(
        &mut self,
        path: &Path,
        packer: &mut dyn Packer,
    ) {
        info!("Reading {}", path.display());

        match self.convert_file(path, packer) {
            Ok(()) => self.totals.files_read += 1,
            Err(e) => {
                error!("{}: {e}", path.display());
                self.totals.files_failed += 1;
            }
        }
    }

    /// Упаковывает все трассы группы.
    ///
    /// Трасса, которую не удалось упаковать, отбрасывается, остальные
    /// упаковываются. Возвращается первая ошибка.
    pub fn pack_group(
        &mut self,
        packer: &mut dyn Packer,
        flush: bool,
    ) -> ConvertResult<PackedCounts> {
        let mut counts = PackedCounts::default();
        let mut packed_traces = 0;
        let mut first_error = None;

        for trace in self.group.iter_mut() {
            match packer.pack(trace, flush) {
                Ok(packed) => {
                    packed_traces += 1;
                    counts.records += packed.records;
                    counts.samples += packed.samples;
                }
                Err(e) => {
                    warn!("{}: {} samples dropped", trace.key(), trace.len());
                    trace.consume_front(trace.len());
                    self.totals.pack_failures += 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        self.totals.add_packed(packed_traces, counts);
        if flush {
            self.group.clear();
        } else {
            self.group.remove_empty();
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(counts),
        }
    }

    /// Упаковывает остаток и возвращает итоги.
    ///
    /// Ошибка упаковки остатка только записывается в лог.
    pub fn finish(
        mut self,
        packer: &mut dyn Packer,
    ) -> PackTotals {
        if !self.group.is_empty() {
            if let Err(e) = self.pack_group(packer, true) {
                error!("Packing buffered traces: {e}");
            }
        }

        self.totals
    }

    pub fn totals(&self) -> &PackTotals {
        &self.totals
    }

    pub fn group(&self) -> &TraceGroup {
        &self.group
    }
}

/// Конвертирует входные файлы в один поток записей.
pub fn convert_into<W: Write>(
    config: &ConvertConfig,
    inputs: &[PathBuf],
    writer: W,
) -> ConvertResult<(PackTotals, W)> {
    let mut packer = MseedPacker::new(writer, config.pack)?;
    let mut converter = Converter::new(config);

    for input in inputs {
        converter.process(input, &mut packer);
    }

    let totals = converter.finish(&mut packer);
    let mut writer = packer.into_inner();
    writer.flush()?;

    Ok((totals, writer))
}

/// Выполняет прогон согласно конфигурации.
///
/// Ошибки отдельных файлов не прерывают прогон и учитываются в
/// [`PackTotals::files_failed`].
pub fn run(
    config: &ConvertConfig,
    inputs: &[PathBuf],
) -> ConvertResult<PackTotals> {
    config.validate()?;

    let totals = match &config.output {
        OutputTarget::File(path) => {
            let file = create_output(path)?;
            convert_into(config, inputs, BufWriter::new(file))?.0
        }
        OutputTarget::Stdout => convert_into(config, inputs, io::stdout().lock())?.0,
        OutputTarget::PerInput => {
            let mut totals = PackTotals::default();

            for input in inputs {
                let out_path = OutputTarget::per_input_path(input);
                let file = match create_output(&out_path) {
                    Ok(f) => f,
                    Err(e) => {
                        error!("{e}");
                        totals.files_failed += 1;
                        continue;
                    }
                };

                debug!("{} -> {}", input.display(), out_path.display());
                let (file_totals, _) =
                    convert_into(config, std::slice::from_ref(input), BufWriter::new(file))?;
                totals.merge(&file_totals);
            }

            totals
        }
    };

    Ok(totals)
}

fn create_output(path: &Path) -> ConvertResult<File> {
    File::create(path).map_err(|source| ConvertError::CreateOutput {
        path: path.to_path_buf(),
        source,
    })
}
