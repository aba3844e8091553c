pub mod cli;
pub mod errors;
pub mod loader;

use std::path::PathBuf;

use autodim_config::AppConfig;
use autodim_core::document::DimensionConfig;
use errors::FrontendError;
use tracing::info;

/// CLI 运行参数，由配置文件与命令行覆盖项合成。
#[derive(Debug, Clone)]
pub struct CliOptions {
    pub input: Option<PathBuf>,
    pub output: PathBuf,
    pub dimensions: DimensionConfig,
    pub theme: String,
}

impl CliOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            input: None,
            output: config.output.file_name.clone(),
            dimensions: config.dimensions,
            theme: config.theme.preset.clone(),
        }
    }
}

/// 执行一次自动标注。
pub fn run_cli(options: &CliOptions) -> Result<(), FrontendError> {
    info!(
        input = ?options.input,
        output = %options.output.display(),
        "启动 CLI 前端"
    );
    cli::run(options)
}
