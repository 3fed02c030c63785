//! Script: the injected content and timing of a presentation.
//!
//! A script file only needs to carry what it changes: it is laid over the
//! built-in mission narrative object by object, at any depth. Arrays are
//! replaced whole.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::particles::FieldConfig;
use crate::engine::phase::Phase;
use crate::engine::pointer::BackdropTuning;
use crate::engine::typewriter::TypewriterTiming;
use crate::error::{PresenterError, PresenterResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Script {
    pub timings: Timings,
    pub intro: IntroText,
    pub choice: ChoiceText,
    pub transit: TransitText,
    pub resolution: ResolutionText,
    pub fields: Fields,
    pub backdrop: BackdropTuning,
}

impl Script {
    pub fn load(path: impl AsRef<Path>) -> PresenterResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
            .map_err(|e| PresenterError::script(format!("{}: {e}", path.display())))
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut merged = serde_json::to_value(Script::default())?;
        overlay(&mut merged, serde_json::from_str(json)?);
        serde_json::from_value(merged)
    }

    pub fn to_json(&self) -> PresenterResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| PresenterError::script(e.to_string()))
    }
}

/// Lay `patch` over `base`: objects merge key by key, anything else replaces.
fn overlay(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

// ---------------------------------------------------------------------------
// Timings
// ---------------------------------------------------------------------------

/// Per-phase durations in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseDurations {
    pub intro: u64,
    pub choice: u64,
    pub transit: u64,
    pub resolution: u64,
}

impl Default for PhaseDurations {
    fn default() -> Self {
        PhaseDurations {
            intro: 900,
            choice: 900,
            transit: 600,
            resolution: 1300,
        }
    }
}

impl PhaseDurations {
    pub fn get(&self, phase: Phase) -> Duration {
        let ms = match phase {
            Phase::Intro => self.intro,
            Phase::Choice => self.choice,
            Phase::Transit => self.transit,
            Phase::Resolution => self.resolution,
        };
        Duration::from_millis(ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub char_delay_ms: u64,
    pub line_delay_ms: u64,
    pub settle_ms: u64,
    /// How long the hyperdrive runs before arrival.
    pub arrival_ms: u64,
    /// Length of the white-out that ends the hyperdrive.
    pub flash_ms: u64,
    pub frame_ms: u64,
    pub enter_ms: PhaseDurations,
    pub exit_ms: PhaseDurations,
}

impl Default for Timings {
    fn default() -> Self {
        Timings {
            char_delay_ms: 32,
            line_delay_ms: 560,
            settle_ms: 800,
            arrival_ms: 2600,
            flash_ms: 2300,
            frame_ms: 16,
            enter_ms: PhaseDurations::default(),
            // Resolution never exits.
            exit_ms: PhaseDurations {
                intro: 900,
                choice: 900,
                transit: 600,
                resolution: 0,
            },
        }
    }
}

impl Timings {
    pub fn typewriter(&self) -> TypewriterTiming {
        TypewriterTiming {
            char_delay: Duration::from_millis(self.char_delay_ms),
            line_delay: Duration::from_millis(self.line_delay_ms),
            settle: Duration::from_millis(self.settle_ms),
        }
    }

    pub fn arrival(&self) -> Duration {
        Duration::from_millis(self.arrival_ms)
    }

    pub fn flash(&self) -> Duration {
        Duration::from_millis(self.flash_ms)
    }

    pub fn frame(&self) -> Duration {
        Duration::from_millis(self.frame_ms.max(1))
    }

    pub fn enter(&self, phase: Phase) -> Duration {
        self.enter_ms.get(phase)
    }

    pub fn exit(&self, phase: Phase) -> Duration {
        self.exit_ms.get(phase)
    }
}

// ---------------------------------------------------------------------------
// Particle fields
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub count: usize,
    pub config: FieldConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fields {
    pub streaks: FieldSpec,
    pub dust: FieldSpec,
    pub glyphs: FieldSpec,
}

impl Default for Fields {
    fn default() -> Self {
        Fields {
            streaks: FieldSpec {
                count: 220,
                config: FieldConfig::streaks(),
            },
            dust: FieldSpec {
                count: 32,
                config: FieldConfig::dust(),
            },
            glyphs: FieldSpec {
                count: 14,
                config: FieldConfig::glyphs(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Scene text
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntroText {
    pub header: String,
    pub version: String,
    pub status: String,
    pub prompt: String,
    pub lines: Vec<String>,
    pub waiting: String,
    pub footer_left: String,
    pub footer_right: String,
}

impl Default for IntroText {
    fn default() -> Self {
        IntroText {
            header: "MISSION: ETERNITY / PRE-FLIGHT".into(),
            version: "SPACEX-ROMANCE v2.26".into(),
            status: "СТАТУС КОНСОЛИ: ОНЛАЙН".into(),
            prompt: "root@love-x:>".into(),
            lines: vec![
                "Инициализация протокола \"LOVE-X\"...".into(),
                "Проверка систем жизнеобеспечения... НОРМА".into(),
                "Анализ совместимости экипажа... 100%".into(),
                "Командир: Ваня... ГОТОВ".into(),
                "Второй пилот: Даша... ПОИСК СИГНАЛА...".into(),
                "СВЯЗЬ УСТАНОВЛЕНА ❤️".into(),
            ],
            waiting: "ОЖИДАНИЕ СИГНАЛА ОТ ВТОРОГО ПИЛОТА...".into(),
            footer_left: "Дата запуска: 14.02.2026".into(),
            footer_right: "RELAY LINK: VANYA ⇄ DASHA".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Passenger {
    pub name: String,
    pub seat: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoiceText {
    pub badge: String,
    pub title: String,
    pub subtitle: String,
    pub orbit: String,
    pub passengers: Vec<Passenger>,
    pub paragraphs: Vec<String>,
    pub action: String,
    pub hint_left: String,
    pub hint_right: String,
}

impl Default for ChoiceText {
    fn default() -> Self {
        ChoiceText {
            badge: "LOVE-X / ORBITAL BOARDING".into(),
            title: "Mission: Eternity".into(),
            subtitle: "Реализм Илона Маска. Романтика, которой хватает на всю вселенную.".into(),
            orbit: "Текущая орбита: MARS INSERTION ♥ 100%".into(),
            passengers: vec![
                Passenger {
                    name: "ВАНЯ".into(),
                    seat: "01A".into(),
                    role: "КОМАНДИР".into(),
                },
                Passenger {
                    name: "ДАША".into(),
                    seat: "01B".into(),
                    role: "МОЯ ВСЕЛЕННАЯ".into(),
                },
            ],
            paragraphs: vec![
                "Забудь про тестовые запуски и симуляции. В масштабах бесконечной Вселенной \
                 шансы встретить своего человека стремятся к нулю, но мы сломали эту \
                 статистику. Теперь перед нами — главная миссия нашей жизни."
                    .into(),
                "Земля — это лишь точка старта. Мы берем билет в один конец, потому что я не \
                 планирую возвращаться в прошлое, где нас не было. Впереди неизвестность, но \
                 термодинамика бессильна: даже в ледяном космосе мне будет тепло, пока твой \
                 скафандр рядом с моим."
                    .into(),
                "Если ты нажимаешь «Полетели», ты выбираешь не просто планету. Ты выбираешь \
                 быть моей единственной константой в любом уравнении. Все турбулентности, \
                 перегрузки и черные дыры мы пройдем вместе. Эта Вселенная теперь наша."
                    .into(),
            ],
            action: "НАЧАТЬ ПОЛЁТ".into(),
            hint_left: "НАЖМИ, ЕСЛИ ГОТОВА ЛЕТЕТЬ НАВСЕГДА".into(),
            hint_right: "ETA МАРС: ∞ ЛЕТ, ∞ МОМЕНТОВ".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitText {
    pub caption: String,
}

impl Default for TransitText {
    fn default() -> Self {
        TransitText {
            caption: "ГИПЕРПРЫЖОК АКТИВИРОВАН · LOVE-X".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionText {
    pub header: String,
    pub headline: String,
    pub message: String,
    pub signature: String,
}

impl Default for ResolutionText {
    fn default() -> Self {
        ResolutionText {
            header: "МАРС. ПОВЕРХНОСТЬ. КООРДИНАТЫ: VANJA × DASHA".into(),
            headline: "Я готов лететь на Марс, только если ты будешь рядом.".into(),
            message: "С Днём святого Валентина, Даша.".into(),
            signature: "MISSION: ETERNITY // STATUS: ONLY WITH YOU.".into(),
        }
    }
}
