//! Decoding raw blobs into tables.
//!
//! Tensors arrive either as `torch.save` archives or as safetensors files,
//! each holding a single rank-2 tensor. The format is detected from the
//! bytes, not the key. Descriptions and records arrive as JSON.

use candle_core::{DType, Device, Tensor};
use thiserror::Error;

use crate::records::{DescriptionMap, FeatureRecords};
use crate::table::{FeatureRow, RowTable};
use crate::torch::{is_torch_archive, load_torch};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    #[error("Expected exactly one tensor, found {0}")]
    TensorCount(usize),

    #[error("Expected a rank-2 tensor, found shape {0:?}")]
    Rank(Vec<usize>),

    #[error("Shape mismatch: indices {indices:?} vs values {values:?}")]
    ShapeMismatch {
        indices: Vec<usize>,
        values: Vec<usize>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive has no data.pkl")]
    MissingPickle,

    #[error("Non-contiguous tensor of shape {0:?}")]
    NonContiguous(Vec<usize>),

    #[error("Storage record {0} is shorter than its tensor")]
    Truncated(String),
}

pub type Result<T> = std::result::Result<T, DecodeError>;

/// Read the only tensor in a torch archive or safetensors buffer.
fn decode_tensor(bytes: &[u8]) -> Result<Tensor> {
    let tensors: Vec<Tensor> = if is_torch_archive(bytes) {
        load_torch(bytes)?
    } else {
        candle_core::safetensors::load_buffer(bytes, &Device::Cpu)?
            .into_values()
            .collect()
    };
    if tensors.len() != 1 {
        return Err(DecodeError::TensorCount(tensors.len()));
    }

    let tensor = tensors
        .into_iter()
        .next()
        .ok_or(DecodeError::TensorCount(0))?;
    if tensor.rank() != 2 {
        return Err(DecodeError::Rank(tensor.dims().to_vec()));
    }
    Ok(tensor)
}

/// Build a row table from an indices tensor and a values tensor of the same shape.
///
/// Indices are widened to `i64` and values converted to `f32` whatever their
/// stored dtype.
pub fn decode_table(indices: &[u8], values: &[u8]) -> Result<RowTable> {
    let indices = decode_tensor(indices)?;
    let values = decode_tensor(values)?;

    if indices.dims() != values.dims() {
        return Err(DecodeError::ShapeMismatch {
            indices: indices.dims().to_vec(),
            values: values.dims().to_vec(),
        });
    }

    let indices = indices.to_dtype(DType::I64)?.to_vec2::<i64>()?;
    let values = values.to_dtype(DType::F32)?.to_vec2::<f32>()?;

    Ok(indices
        .into_iter()
        .zip(values)
        .map(|(indices, values)| FeatureRow { indices, values })
        .collect())
}

pub fn decode_descriptions(bytes: &[u8]) -> Result<DescriptionMap> {
    Ok(serde_json::from_slice(bytes)?)
}

pub fn decode_records(bytes: &[u8]) -> Result<FeatureRecords> {
    Ok(serde_json::from_slice(bytes)?)
}
