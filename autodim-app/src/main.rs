use std::path::PathBuf;

use autodim_config::{AppConfig, ConfigError};
use autodim_core::document::DimensionKind;
use autodim_engine::command::parse_dimension_kind;
use autodim_frontend::CliOptions;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

const USAGE: &str = "用法: autodim [--config <path>] [--output <path>] [--theme <name>] \
                     [--no-linear] [--no-angular] [--no-radius] [--no-bounding] [input.dxf]";

/// 命令行覆盖项，优先级高于配置文件。
#[derive(Debug, Default)]
struct Overrides {
    config: Option<PathBuf>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    theme: Option<String>,
    disabled: Vec<DimensionKind>,
}

fn main() {
    let overrides = match parse_args(std::env::args().skip(1)) {
        Ok(overrides) => overrides,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    };

    let config = load_configuration(overrides.config.clone());
    init_logging(&config);
    info!("启动 AutoDim");

    let mut options = CliOptions::from_config(&config);
    options.input = overrides.input;
    if let Some(output) = overrides.output {
        options.output = output;
    }
    if let Some(theme) = overrides.theme {
        options.theme = theme;
    }
    for kind in overrides.disabled {
        options.dimensions.set(kind, false);
    }

    if let Err(err) = autodim_frontend::run_cli(&options) {
        error!(error = %err, "自动标注失败");
        std::process::exit(1);
    }
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Overrides, String> {
    let mut overrides = Overrides::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "--output" | "--theme" => {
                let Some(value) = args.next() else {
                    return Err(format!("`{arg}` 需要提供参数值"));
                };
                match arg.as_str() {
                    "--config" => overrides.config = Some(PathBuf::from(value)),
                    "--output" => overrides.output = Some(PathBuf::from(value)),
                    _ => overrides.theme = Some(value),
                }
            }
            flag if flag.starts_with("--no-") => {
                let kind = parse_dimension_kind(&flag["--no-".len()..])
                    .map_err(|err| format!("未知参数：{flag}（{err}）"))?;
                overrides.disabled.push(kind);
            }
            other if other.starts_with("--") => return Err(format!("未知参数：{other}")),
            path => {
                if overrides.input.is_some() {
                    return Err(format!("只能指定一个输入文件：{path}"));
                }
                overrides.input = Some(PathBuf::from(path));
            }
        }
    }
    Ok(overrides)
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
