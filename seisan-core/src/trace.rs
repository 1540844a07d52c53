//! Накопление декодированных блоков в непрерывные трассы.

use log::{debug, trace};
use seisan_types::{HpTime, TraceKey, HPTMODULUS};

use crate::decoder::DecodedBlock;

/// Допуск относительного расхождения частот дискретизации
pub const RATE_TOLERANCE: f64 = 0.0001;

/// Шаблон записи Mini-SEED для трассы.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceTemplate {
    pub key: TraceKey,
    /// Частота первого блока трассы
    pub sample_rate: f64,
    /// Флаг неточного времени последнего добавленного блока
    pub time_questionable: bool,
    /// Точная частота для бланкетты 100
    pub srate_blockette: Option<f32>,
}

/// Непрерывная последовательность выборок одного канала.
#[derive(Debug, Clone)]
pub struct Trace {
    pub template: TraceTemplate,
    pub start_time: HpTime,
    pub sample_rate: f64,
    pub samples: Vec<i32>,
}

/// Набор трасс. У одного ключа может быть несколько сегментов, если
/// между блоками есть разрывы.
#[derive(Debug, Default)]
pub struct TraceGroup {
    traces: Vec<Trace>,
    with_srate_blockette: bool,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl Trace {
    fn from_block(
        block: DecodedBlock,
        with_srate_blockette: bool,
    ) -> Self {
        let DecodedBlock { header, samples } = block;

        Self {
            template: TraceTemplate {
                key: header.trace_key(),
                sample_rate: header.sample_rate,
                time_questionable: header.time_uncertain,
                srate_blockette: with_srate_blockette.then_some(header.sample_rate as f32),
            },
            start_time: header.start_time,
            sample_rate: header.sample_rate,
            samples,
        }
    }

    pub fn key(&self) -> &TraceKey {
        &self.template.key
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Время последней выборки.
    pub fn end_time(&self) -> HpTime {
        self.start_time
            .offset_by_samples(self.samples.len().saturating_sub(1), self.sample_rate)
    }

    /// Ожидаемое время выборки, следующей за последней.
    pub fn next_time(&self) -> HpTime {
        self.start_time
            .offset_by_samples(self.samples.len(), self.sample_rate)
    }

    /// Удаляет первые `count` выборок и сдвигает время начала.
    pub fn consume_front(
        &mut self,
        count: usize,
    ) {
        let count = count.min(self.samples.len());
        self.start_time = self.start_time.offset_by_samples(count, self.sample_rate);
        self.samples.drain(..count);
    }

    fn half_period(&self) -> i64 {
        (HPTMODULUS as f64 / self.sample_rate / 2.0).round() as i64
    }
}

impl TraceGroup {
    pub fn new(with_srate_blockette: bool) -> Self {
        Self {
            traces: Vec::new(),
            with_srate_blockette,
        }
    }

    /// Добавляет блок в подходящую трассу или открывает новый сегмент.
    ///
    /// Блоки без выборок пропускаются.
    pub fn add_block(
        &mut self,
        block: DecodedBlock,
    ) -> Option<&Trace> {
        if block.samples.is_empty() {
            debug!("{}: empty block skipped", block.header.trace_key());
            return None;
        }

        let key = block.header.trace_key();
        let idx = match self.find_adjacent(&key, &block) {
            Some((idx, Adjacency::Append)) => {
                let tr = &mut self.traces[idx];
                tr.samples.extend_from_slice(&block.samples);
                tr.template.time_questionable = block.header.time_uncertain;
                trace!("{key}: appended {} samples", block.samples.len());
                idx
            }
            Some((idx, Adjacency::Prepend)) => {
                let tr = &mut self.traces[idx];
                let mut samples = block.samples;
                let added = samples.len();
                samples.extend_from_slice(&tr.samples);
                tr.samples = samples;
                tr.start_time = block.header.start_time;
                tr.template.time_questionable = block.header.time_uncertain;
                trace!("{key}: prepended {added} samples");
                idx
            }
            None => {
                debug!("{key}: new trace segment at {}", block.header.start_time);
                self.traces
                    .push(Trace::from_block(block, self.with_srate_blockette));
                self.traces.len() - 1
            }
        };

        self.traces.get(idx)
    }

    fn find_adjacent(
        &self,
        key: &TraceKey,
        block: &DecodedBlock,
    ) -> Option<(usize, Adjacency)> {
        let rate = block.header.sample_rate;
        let start = block.header.start_time;
        let next = start.offset_by_samples(block.samples.len(), rate);

        self.traces.iter().enumerate().find_map(|(idx, tr)| {
            if tr.key() != key || !rates_match(tr.sample_rate, rate) {
                return None;
            }

            let tolerance = tr.half_period();
            if (start.0 - tr.next_time().0).abs() <= tolerance {
                Some((idx, Adjacency::Append))
            } else if (next.0 - tr.start_time.0).abs() <= tolerance {
                Some((idx, Adjacency::Prepend))
            } else {
                None
            }
        })
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Trace> {
        self.traces.iter_mut()
    }

    /// Общее число выборок во всех трассах.
    pub fn total_samples(&self) -> usize {
        self.traces.iter().map(Trace::len).sum()
    }

    pub fn clear(&mut self) {
        self.traces.clear();
    }

    /// Удаляет трассы, в которых не осталось выборок.
    pub fn remove_empty(&mut self) {
        self.traces.retain(|tr| !tr.is_empty());
    }
}

enum Adjacency {
    Append,
    Prepend,
}

fn rates_match(
    a: f64,
    b: f64,
) -> bool {
    (1.0 - a / b).abs() < RATE_TOLERANCE
}
