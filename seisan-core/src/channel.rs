//! Перевод 4-символьного компонента SeisAn в пару (канал, локация) SEED.

use std::str::FromStr;

/// Локация по умолчанию
pub const DEFAULT_LOCATION: &str = "00";

/// Пользовательское соответствие компонент → канал (`SBIZ=SHZ`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMapping {
    pub component: String,
    pub channel: String,
}

/// Упорядоченная таблица соответствий. При поиске побеждает первое
/// точное совпадение в порядке добавления.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelMap {
    entries: Vec<ChannelMapping>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl ChannelMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        component: &str,
        channel: &str,
    ) {
        self.entries.push(ChannelMapping {
            component: component.to_string(),
            channel: channel.to_string(),
        });
    }

    pub fn lookup(
        &self,
        component: &str,
    ) -> Option<&str> {
        self.entries
            .iter()
            .find(|m| m.component == component)
            .map(|m| m.channel.as_str())
    }

    /// Переводит компонент в (канал, локация).
    ///
    /// Пользовательская таблица проверяется первой и всегда даёт локацию
    /// `"00"`; иначе применяется [`default_translation`].
    pub fn translate(
        &self,
        component: &str,
    ) -> (String, String) {
        match self.lookup(component) {
            Some(channel) => (channel.to_string(), DEFAULT_LOCATION.to_string()),
            None => default_translation(component),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChannelMapping> {
        self.entries.iter()
    }
}

/// Правило по умолчанию.
///
/// Канал: символы 1, 2 и 4 компонента; если 2-й символ пробел, а 1-й и
/// 4-й нет, вместо пробела подставляется `'H'` (`"S  Z"` → `"SHZ"`).
/// Локация: `"00"`, либо `<3-й символ>0`, если 3-й символ не пробел.
pub fn default_translation(component: &str) -> (String, String) {
    let c: Vec<char> = component
        .chars()
        .chain(std::iter::repeat(' '))
        .take(4)
        .collect();

    let mut channel = [c[0], c[1], c[3]];
    if channel[0] != ' ' && channel[2] != ' ' && channel[1] == ' ' {
        channel[1] = 'H';
    }

    let location = if c[2] != ' ' {
        format!("{}0", c[2])
    } else {
        DEFAULT_LOCATION.to_string()
    };

    (channel.iter().collect(), location)
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl FromStr for ChannelMapping {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((component, channel)) if !component.is_empty() && !channel.is_empty() => {
                Ok(ChannelMapping {
                    component: component.to_string(),
                    channel: channel.to_string(),
                })
            }
            _ => Err(format!(
                "Invalid mapping '{s}'. Use: component=channel, e.g. 'SBIZ=SHZ'"
            )),
        }
    }
}

impl FromIterator<ChannelMapping> for ChannelMap {
    fn from_iter<I: IntoIterator<Item = ChannelMapping>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
