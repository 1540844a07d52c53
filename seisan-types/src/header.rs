use crate::HpTime;

/// Размер логического заголовка канала SeisAn (байт)
pub const CHANNEL_HEADER_SIZE: usize = 1040;

/// Заголовок канала SeisAn после декодирования
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelHeader {
    /// Код сети (в SeisAn отсутствует, задаётся пользователем)
    pub network: String,
    /// Код станции, до 5 символов
    pub station: String,
    /// Код локации, 2 символа
    pub location: String,
    /// Код канала SEED, до 3 символов
    pub channel: String,
    /// Исходный 4-символьный компонент SeisAn
    pub component: String,
    /// Время первой выборки
    pub start_time: HpTime,
    /// Флаг неточного времени ('E' в заголовке)
    pub time_uncertain: bool,
    /// Номинальная частота дискретизации, Гц
    pub sample_rate: f64,
    /// Количество выборок, объявленное в заголовке
    pub sample_count: u32,
    /// Ширина выборки в байтах (2 или 4)
    pub sample_width: usize,
    /// Коэффициент усиления, если задан (не применяется)
    pub gain: Option<f64>,
}

/// Идентичность трассы: сеть, станция, локация, канал.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TraceKey {
    pub network: String,
    pub station: String,
    pub location: String,
    pub channel: String,
}

impl ChannelHeader {
    /// Ожидаемая длина секции данных в байтах.
    pub fn data_length(&self) -> usize {
        self.sample_count as usize * self.sample_width
    }

    pub fn trace_key(&self) -> TraceKey {
        TraceKey {
            network: self.network.clone(),
            station: self.station.clone(),
            location: self.location.clone(),
            channel: self.channel.clone(),
        }
    }
}

impl TraceKey {
    pub fn new(
        network: &str,
        station: &str,
        location: &str,
        channel: &str,
    ) -> Self {
        Self {
            network: network.to_string(),
            station: station.to_string(),
            location: location.to_string(),
            channel: channel.to_string(),
        }
    }
}

impl std::fmt::Display for TraceKey {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.network, self.station, self.location, self.channel
        )
    }
}
