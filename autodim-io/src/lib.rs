use std::fs;
use std::path::Path;

use autodim_core::document::{Dimension, Entity};
use thiserror::Error;
use tracing::info;

mod decoder;
mod encoder;

pub use decoder::{DxfDecoder, decode, decode_bytes};
pub use encoder::{ACAD_VERSION, DEFAULT_LAYER, DIMENSION_LAYER, DxfEncoder, encode};

/// 输入无法按行拆分为组码对时的结构性错误。
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("binary DXF is not supported, expected an ASCII group-code stream")]
    BinaryDxf,
}

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path:?}: {source}")]
    Decode {
        path: std::path::PathBuf,
        #[source]
        source: DecodeError,
    },
    #[error("drawing has no entities, nothing to save")]
    EmptyDrawing,
}

pub trait DrawingLoader {
    fn load(&self, path: &Path) -> Result<Vec<Entity>, IoError>;
}

pub trait DrawingSaver {
    fn save(
        &self,
        entities: &[Entity],
        dimensions: &[Dimension],
        path: &Path,
    ) -> Result<(), IoError>;
}

pub struct DxfFacade;

impl DxfFacade {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DxfFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawingLoader for DxfFacade {
    fn load(&self, path: &Path) -> Result<Vec<Entity>, IoError> {
        let data = fs::read(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let entities = decode_bytes(&data).map_err(|source| IoError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), entities = entities.len(), "已读取 DXF");
        Ok(entities)
    }
}

impl DrawingSaver for DxfFacade {
    fn save(
        &self,
        entities: &[Entity],
        dimensions: &[Dimension],
        path: &Path,
    ) -> Result<(), IoError> {
        if entities.is_empty() {
            return Err(IoError::EmptyDrawing);
        }
        let output = encode(entities, dimensions);
        fs::write(path, output).map_err(|source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            path = %path.display(),
            entities = entities.len(),
            dimensions = dimensions.len(),
            "已写出 DXF"
        );
        Ok(())
    }
}
