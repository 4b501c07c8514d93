//! Tensors written by `torch.save`.
//!
//! The archive is a zip holding `<dir>/data.pkl` and one raw storage record
//! per tensor under `<dir>/data/`. The pickle is either a bare tensor or a
//! dict of tensors.

use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use candle_core::pickle::{Object, Stack, TensorInfo};
use candle_core::{Device, Tensor};
use zip::ZipArchive;

use crate::decode::{DecodeError, Result};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Name given to a tensor pickled on its own.
const BARE_TENSOR_NAME: &str = "data";

pub(crate) fn is_torch_archive(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_MAGIC)
}

/// Read every tensor in a `torch.save` archive.
pub(crate) fn load_torch(bytes: &[u8]) -> Result<Vec<Tensor>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let pickle_name = archive
        .file_names()
        .find(|name| name.ends_with("data.pkl"))
        .map(str::to_string)
        .ok_or(DecodeError::MissingPickle)?;
    let record_dir = pickle_name.trim_end_matches(".pkl").to_string();

    let mut stack = Stack::empty();
    stack.read_loop(&mut BufReader::new(archive.by_name(&pickle_name)?))?;
    let infos = tensor_infos(stack.finalize()?, Path::new(&record_dir))?;

    infos
        .iter()
        .map(|info| read_record(&mut archive, info))
        .collect()
}

fn tensor_infos(obj: Object, record_dir: &Path) -> Result<Vec<TensorInfo>> {
    let entries = match obj {
        Object::Dict(entries) => entries,
        tensor => vec![(Object::Unicode(BARE_TENSOR_NAME.to_string()), tensor)],
    };

    let mut infos = Vec::new();
    for (name, value) in entries {
        if let Some(info) = value.into_tensor_info(name, record_dir)? {
            infos.push(info);
        }
    }
    Ok(infos)
}

fn read_record<R: Read + Seek>(archive: &mut ZipArchive<R>, info: &TensorInfo) -> Result<Tensor> {
    let layout = &info.layout;
    if !layout.is_contiguous() {
        return Err(DecodeError::NonContiguous(layout.dims().to_vec()));
    }

    let mut storage = Vec::new();
    archive.by_name(&info.path)?.read_to_end(&mut storage)?;

    let elem_size = info.dtype.size_in_bytes();
    let start = layout.start_offset() * elem_size;
    let end = start + layout.shape().elem_count() * elem_size;
    let data = storage
        .get(start..end)
        .ok_or_else(|| DecodeError::Truncated(info.path.clone()))?;

    Ok(Tensor::from_raw_buffer(
        data,
        info.dtype,
        layout.dims(),
        &Device::Cpu,
    )?)
}
