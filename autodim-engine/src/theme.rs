//! 配色主题与外部协作方（图纸分析、主题生成）的接入点。

use autodim_core::document::Entity;
use serde::{Deserialize, Serialize};

use crate::errors::EngineError;

pub const DEFAULT_THEME: &str = "Cyber Dark";
/// 协作方生成的主题统一使用此名称。
pub const CUSTOM_THEME: &str = "Custom (AI)";

pub const EMPTY_DRAWING_MESSAGE: &str = "Please upload a drawing first.";
pub const ANALYSIS_UNAVAILABLE_MESSAGE: &str = "AI Analysis unavailable.";
pub const ANALYSIS_EMPTY_MESSAGE: &str = "Could not analyze drawing.";

/// 六个颜色键，值均为 `#rrggbb` 形式的十六进制字符串。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Theme {
    pub background: String,
    pub lines: String,
    pub dimensions: String,
    pub text: String,
    pub grid: String,
    pub accent: String,
}

const PRESETS: [(&str, [&str; 6]); 5] = [
    (
        "Cyber Dark",
        ["#0a0a0a", "#e2e8f0", "#06b6d4", "#ffffff", "#262626", "#d946ef"],
    ),
    (
        "Deep Ocean",
        ["#020617", "#94a3b8", "#fbbf24", "#f8fafc", "#1e293b", "#38bdf8"],
    ),
    (
        "Neon Nights",
        ["#2e0225", "#f5d0fe", "#22d3ee", "#fae8ff", "#4a044e", "#f0abfc"],
    ),
    (
        "Matrix Code",
        ["#000000", "#22c55e", "#15803d", "#4ade80", "#052e16", "#86efac"],
    ),
    (
        "Obsidian Red",
        ["#000000", "#d1d5db", "#ef4444", "#ffffff", "#374151", "#dc2626"],
    ),
];

impl Theme {
    fn from_colors([background, lines, dimensions, text, grid, accent]: [&str; 6]) -> Self {
        Self {
            background: background.to_string(),
            lines: lines.to_string(),
            dimensions: dimensions.to_string(),
            text: text.to_string(),
            grid: grid.to_string(),
            accent: accent.to_string(),
        }
    }

    /// 按名称查找预设主题，大小写敏感。
    pub fn preset(name: &str) -> Result<Self, EngineError> {
        PRESETS
            .iter()
            .find(|(preset, _)| *preset == name)
            .map(|(_, colors)| Self::from_colors(*colors))
            .ok_or_else(|| EngineError::UnknownTheme(name.to_string()))
    }

    pub fn preset_names() -> impl Iterator<Item = &'static str> {
        PRESETS.iter().map(|(name, _)| *name)
    }

    /// 解析协作方返回的 JSON 主题记录，六个键缺一不可且必须是十六进制颜色。
    pub fn from_json(raw: &str) -> Result<Self, EngineError> {
        let theme: Theme = serde_json::from_str(raw.trim())
            .map_err(|err| EngineError::InvalidTheme(err.to_string()))?;
        for (key, value) in theme.colors() {
            if !is_hex_color(value) {
                return Err(EngineError::InvalidTheme(format!(
                    "{key} is not a hex color: {value}"
                )));
            }
        }
        Ok(theme)
    }

    pub fn colors(&self) -> [(&'static str, &str); 6] {
        [
            ("background", &self.background),
            ("lines", &self.lines),
            ("dimensions", &self.dimensions),
            ("text", &self.text),
            ("grid", &self.grid),
            ("accent", &self.accent),
        ]
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_colors(PRESETS[0].1)
    }
}

fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(digits) => {
            matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

/// 发送给分析协作方的图纸概要。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawingSummary {
    pub lines: usize,
    pub polylines: usize,
    pub circles: usize,
}

impl DrawingSummary {
    pub fn from_entities(entities: &[Entity]) -> Self {
        entities
            .iter()
            .fold(Self::default(), |mut summary, entity| {
                match entity {
                    Entity::Line(_) => summary.lines += 1,
                    Entity::Polyline(_) => summary.polylines += 1,
                    Entity::Circle(_) => summary.circles += 1,
                }
                summary
            })
    }

    pub fn is_empty(&self) -> bool {
        self.lines + self.polylines + self.circles == 0
    }

    pub fn describe(&self) -> String {
        format!(
            "Drawing contains {} lines, {} polylines and {} circles. \
             It has a mix of linear, angular, and radial geometry.",
            self.lines, self.polylines, self.circles
        )
    }
}

/// 根据图纸概要生成自然语言分析。失败时返回错误，由调用方替换为占位文本。
pub trait DrawingAnalyst {
    fn analyze(&self, summary: &str) -> Result<String, EngineError>;
}

/// 根据自由文本描述生成主题，返回包含六个颜色键的 JSON 文本。
pub trait ThemeGenerator {
    fn generate(&self, prompt: &str) -> Result<String, EngineError>;
}
