use std::path::PathBuf;

use clap::{ArgAction, Parser};
use log::{error, info, warn, LevelFilter};
use seisan2mseed::{run, ConvertConfig, OutputTarget};
use seisan_core::{
    ChannelMap, ChannelMapping, DecodeOptions, PackByteOrder, PackEncoding, PackParams,
    DEFAULT_RECORD_LENGTH,
};

#[derive(Parser, Debug)]
#[command(
    name = "seisan2mseed",
    version = env!("CARGO_PKG_VERSION"),
    about = "Convert SeisAn waveform data to Mini-SEED",
    long_about = None,
)]
struct Cli {
    /// Код сети для всех трасс
    #[arg(short = 'n', long)]
    network: Option<String>,
    /// Код локации для всех трасс
    #[arg(short = 'l', long)]
    location: Option<String>,
    /// Перевод компонента SeisAn в канал SEED, например 'SBIZ=SHZ'
    #[arg(short = 'T', long = "translate", value_name = "COMP=CHAN")]
    translate: Vec<ChannelMapping>,
    /// Не ограничивать годы после 2050
    #[arg(short = 'Y', long)]
    retain_future_year: bool,
    /// Упаковать все трассы один раз после чтения всех файлов
    #[arg(short = 'B', long)]
    buffer_all: bool,
    /// Добавлять бланкетту 100 с точной частотой дискретизации
    #[arg(short = 'S', long)]
    srate_blockette: bool,
    /// Длина записи Mini-SEED, степень двойки 256..65536
    #[arg(short = 'r', long, default_value_t = DEFAULT_RECORD_LENGTH)]
    record_length: usize,
    /// Кодирование: 1 = INT16, 3 = INT32
    #[arg(short = 'e', long, default_value = "3")]
    encoding: PackEncoding,
    /// Порядок байт: 1 = big-endian, 0 = little-endian
    #[arg(short = 'b', long, default_value = "1")]
    byte_order: PackByteOrder,
    /// Выходной файл ('-' = stdout). По умолчанию: <input>.mseed
    #[arg(short = 'o', long)]
    output: Option<OutputTarget>,
    /// Подробный вывод (-v, -vv)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,
    /// Тихий режим (только ошибки)
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    quiet: bool,
    /// Входные файлы SeisAn
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let level = match (cli.quiet, cli.verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_target(false)
        .format_timestamp_secs()
        .init();

    if let Err(e) = ctrlc::set_handler(|| {
        warn!("Termination signal received, exiting");
        std::process::exit(0);
    }) {
        warn!("Failed to set signal handler: {e}");
    }

    let config = ConvertConfig {
        decode: DecodeOptions {
            network: cli.network.unwrap_or_default(),
            location: cli.location,
            channel_map: cli.translate.into_iter().collect::<ChannelMap>(),
            retain_future_year: cli.retain_future_year,
        },
        pack: PackParams {
            record_length: cli.record_length,
            encoding: cli.encoding,
            byte_order: cli.byte_order,
            srate_blockette: cli.srate_blockette,
        },
        buffer_all: cli.buffer_all,
        output: cli.output.unwrap_or_default(),
    };

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  Input files   : {}", cli.files.len());
    info!("  Record length : {}", config.pack.record_length);
    info!("  Encoding      : {:?}", config.pack.encoding);
    info!("  Byte order    : {:?}", config.pack.byte_order);
    info!("  Buffer all    : {}", config.buffer_all);
    info!("  Output        : {}", config.output);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    match run(&config, &cli.files) {
        Ok(totals) => {
            info!("\n{totals}");
            if totals.files_failed > 0 {
                warn!("{} input file(s) could not be fully read", totals.files_failed);
            }
        }
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}
