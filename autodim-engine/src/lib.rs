pub mod analysis;
pub mod command;
pub mod theme;

pub mod errors {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("unknown dimension category: {0}")]
        UnknownDimensionKind(String),
        #[error("unknown theme preset: {0}")]
        UnknownTheme(String),
        #[error("invalid theme record: {0}")]
        InvalidTheme(String),
        #[error("collaborator failed: {0}")]
        Collaborator(String),
    }
}

pub mod session {
    use autodim_core::document::{
        BoundingBox, Circle, Dimension, DimensionConfig, DimensionKind, Entity, Line, Polyline,
    };
    use autodim_core::geometry::Point2;
    use tracing::{debug, info, warn};

    use crate::analysis;
    use crate::errors::EngineError;
    use crate::theme::{
        ANALYSIS_EMPTY_MESSAGE, ANALYSIS_UNAVAILABLE_MESSAGE, CUSTOM_THEME, DEFAULT_THEME,
        DrawingAnalyst, DrawingSummary, EMPTY_DRAWING_MESSAGE, Theme, ThemeGenerator,
    };

    /// 一次编辑会话：当前图元、标注开关与主题。标注随图元或开关变化即时重算。
    #[derive(Debug)]
    pub struct Session {
        entities: Vec<Entity>,
        config: DimensionConfig,
        dimensions: Vec<Dimension>,
        theme: Theme,
        theme_name: String,
    }

    impl Session {
        pub fn new() -> Self {
            Self::with_config(DimensionConfig::default())
        }

        pub fn with_config(config: DimensionConfig) -> Self {
            let mut session = Self {
                entities: Vec::new(),
                config,
                dimensions: Vec::new(),
                theme: Theme::default(),
                theme_name: DEFAULT_THEME.to_string(),
            };
            session.regenerate();
            session
        }

        /// 替换全部图元，保留开关和主题。
        pub fn load_entities(&mut self, entities: Vec<Entity>) {
            self.entities = entities;
            self.regenerate();
            info!(
                entities = self.entities.len(),
                dimensions = self.dimensions.len(),
                "已载入图纸"
            );
        }

        #[inline]
        pub fn entities(&self) -> &[Entity] {
            &self.entities
        }

        #[inline]
        pub fn dimensions(&self) -> &[Dimension] {
            &self.dimensions
        }

        #[inline]
        pub fn config(&self) -> DimensionConfig {
            self.config
        }

        pub fn set_config(&mut self, config: DimensionConfig) {
            self.config = config;
            self.regenerate();
        }

        pub fn set_enabled(&mut self, kind: DimensionKind, enabled: bool) {
            if self.config.is_enabled(kind) == enabled {
                return;
            }
            self.config.set(kind, enabled);
            self.regenerate();
        }

        /// 切换某类标注，返回切换后的状态。
        pub fn toggle(&mut self, kind: DimensionKind) -> bool {
            let enabled = !self.config.is_enabled(kind);
            self.set_enabled(kind, enabled);
            enabled
        }

        pub fn bounding_box(&self) -> BoundingBox {
            analysis::bounding_box(&self.entities)
        }

        pub fn summary(&self) -> DrawingSummary {
            DrawingSummary::from_entities(&self.entities)
        }

        #[inline]
        pub fn theme(&self) -> &Theme {
            &self.theme
        }

        #[inline]
        pub fn theme_name(&self) -> &str {
            &self.theme_name
        }

        pub fn select_preset(&mut self, name: &str) -> Result<(), EngineError> {
            self.theme = Theme::preset(name)?;
            self.theme_name = name.to_string();
            debug!(theme = name, "已切换主题");
            Ok(())
        }

        /// 请求协作方生成主题。失败时保留当前主题并返回 `false`。
        pub fn apply_generated_theme(
            &mut self,
            generator: &dyn ThemeGenerator,
            prompt: &str,
        ) -> bool {
            match generator.generate(prompt).and_then(|raw| Theme::from_json(&raw)) {
                Ok(theme) => {
                    self.theme = theme;
                    self.theme_name = CUSTOM_THEME.to_string();
                    info!(prompt, "已应用生成主题");
                    true
                }
                Err(err) => {
                    warn!(prompt, error = %err, "主题生成失败，保留当前主题");
                    false
                }
            }
        }

        /// 取得图纸分析文本；空图纸不会调用协作方。
        pub fn analyze(&self, analyst: &dyn DrawingAnalyst) -> String {
            let summary = self.summary();
            if summary.is_empty() {
                return EMPTY_DRAWING_MESSAGE.to_string();
            }
            match analyst.analyze(&summary.describe()) {
                Ok(text) if text.trim().is_empty() => ANALYSIS_EMPTY_MESSAGE.to_string(),
                Ok(text) => text,
                Err(err) => {
                    warn!(error = %err, "图纸分析失败");
                    ANALYSIS_UNAVAILABLE_MESSAGE.to_string()
                }
            }
        }

        /// 为 CLI / 快速验证填充一组示例图元（两条相接线段、矩形多段线、圆）。
        pub fn populate_demo(&mut self) {
            let entities = vec![
                Entity::Line(Line::new(Point2::new(0.0, 0.0), Point2::new(100.0, 0.0))),
                Entity::Line(Line::new(Point2::new(100.0, 0.0), Point2::new(100.0, 60.0))),
                Entity::Polyline(Polyline::new(
                    [
                        Point2::new(10.0, 10.0),
                        Point2::new(70.0, 10.0),
                        Point2::new(70.0, 50.0),
                        Point2::new(10.0, 50.0),
                    ],
                    true,
                )),
                Entity::Circle(Circle::new(Point2::new(40.0, 30.0), 12.5)),
            ];
            debug!(entities = entities.len(), "已创建演示图元");
            self.load_entities(entities);
        }

        fn regenerate(&mut self) {
            self.dimensions = analysis::generate_dimensions(&self.entities, &self.config);
        }
    }

    impl Default for Session {
        fn default() -> Self {
            Self::new()
        }
    }

}
