use std::env;
use std::path::{Path, PathBuf};

use autodim_core::document::DimensionConfig;
use autodim_engine::session::Session;
use autodim_io::{DrawingLoader, DxfFacade};
use tracing::{info, warn};

use crate::errors::FrontendError;

/// 未指定输入文件时尝试读取的样例 DXF 路径。
pub const SAMPLE_ENV: &str = "AUTODIM_SAMPLE_DXF";

/// 图纸来源，便于前端呈现加载信息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawingSource {
    Dxf(PathBuf),
    Demo,
}

/// 统一封装加载后的会话与元信息。
#[derive(Debug)]
pub struct LoadedSession {
    pub session: Session,
    pub source: DrawingSource,
}

/// 显式路径读取失败直接报错；环境变量 `AUTODIM_SAMPLE_DXF` 指定的样例读取失败时回退到内置示例。
pub fn load_session(
    input: Option<&Path>,
    config: DimensionConfig,
) -> Result<LoadedSession, FrontendError> {
    let sample = env::var_os(SAMPLE_ENV).map(PathBuf::from);
    load_session_from(input, sample, config)
}

pub(crate) fn load_session_from(
    input: Option<&Path>,
    sample: Option<PathBuf>,
    config: DimensionConfig,
) -> Result<LoadedSession, FrontendError> {
    let mut session = Session::with_config(config);
    let loader = DxfFacade::new();

    if let Some(path) = input {
        let entities = loader.load(path)?;
        session.load_entities(entities);
        return Ok(LoadedSession {
            session,
            source: DrawingSource::Dxf(path.to_path_buf()),
        });
    }

    if let Some(path) = sample {
        match loader.load(&path) {
            Ok(entities) => {
                info!(path = %path.display(), "从样例 DXF 加载图纸成功");
                session.load_entities(entities);
                return Ok(LoadedSession {
                    session,
                    source: DrawingSource::Dxf(path),
                });
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "加载样例 DXF 失败，回退到内置示例");
            }
        }
    }

    session.populate_demo();
    Ok(LoadedSession {
        session,
        source: DrawingSource::Demo,
    })
}
