use seisan_core::PackedCounts;

/// Итоги всего прогона.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackTotals {
    /// Упакованных трасс (с учётом повторной упаковки по блокам)
    pub traces: u64,
    pub samples: u64,
    pub records: u64,
    /// Полностью прочитанных входных файлов
    pub files_read: u64,
    /// Файлов, чтение которых прервано ошибкой
    pub files_failed: u64,
    /// Трасс, отброшенных из-за ошибки упаковки
    pub pack_failures: u64,
}

impl PackTotals {
    pub fn add_packed(
        &mut self,
        traces: usize,
        counts: PackedCounts,
    ) {
        self.traces += traces as u64;
        self.samples += counts.samples;
        self.records += counts.records;
    }

    pub fn merge(
        &mut self,
        other: &PackTotals,
    ) {
        self.traces += other.traces;
        self.samples += other.samples;
        self.records += other.records;
        self.files_read += other.files_read;
        self.files_failed += other.files_failed;
        self.pack_failures += other.pack_failures;
    }

    /// Однострочная сводка.
    pub fn summary_line(&self) -> String {
        format!(
            "Packed {} trace(s) of {} samples into {} records",
            self.traces, self.samples, self.records
        )
    }
}

impl std::fmt::Display for PackTotals {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(f, "  Files read    : {}", self.files_read)?;
        writeln!(f, "  Files failed  : {}", self.files_failed)?;
        writeln!(f, "  Pack failures : {}", self.pack_failures)?;
        writeln!(f, "  Traces        : {}", self.traces)?;
        writeln!(f, "  Samples       : {}", self.samples)?;
        writeln!(f, "  Records       : {}", self.records)?;
        writeln!(f, "  {}", self.summary_line())?;
        write!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")
    }
}
