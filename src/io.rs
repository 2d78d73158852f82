//! Safetensors I/O for epoched data.
//!
//! Caller-side persistence surface: the pipeline itself never touches a
//! file. The format is the plain safetensors layout — `[E, C, T]` epochs as
//! F32, `[C, 3]` positions as F32, channel names as newline-joined UTF-8.
use anyhow::{bail, Context, Result};
use ndarray::{Array2, Array3};
use std::collections::HashMap;
use std::path::Path;

use crate::epoch::EpochSet;

fn parse_header(bytes: &[u8]) -> Result<(HashMap<String, serde_json::Value>, usize)> {
    if bytes.len() < 8 {
        bail!("safetensors file too small");
    }
    let n = u64::from_le_bytes(bytes[..8].try_into()?) as usize;
    let header: HashMap<String, serde_json::Value> =
        serde_json::from_slice(&bytes[8..8 + n]).context("failed to parse safetensors header")?;
    Ok((header, 8 + n))
}

fn entry_range(entry: &serde_json::Value) -> Result<(usize, usize)> {
    let offsets = entry["data_offsets"]
        .as_array()
        .context("missing data_offsets")?;
    let s = offsets[0].as_u64().context("bad offset")? as usize;
    let e = offsets[1].as_u64().context("bad offset")? as usize;
    Ok((s, e))
}

fn read_f32_tensor(bytes: &[u8], data_start: usize, entry: &serde_json::Value) -> Result<Vec<f32>> {
    let (s, e) = entry_range(entry)?;
    let raw = &bytes[data_start + s..data_start + e];
    Ok(raw
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

fn shape_of(entry: &serde_json::Value) -> Result<Vec<usize>> {
    entry["shape"]
        .as_array()
        .context("missing shape")?
        .iter()
        .map(|v| v.as_u64().map(|u| u as usize).context("bad shape entry"))
        .collect()
}

/// Epoched recording loaded from an `epochs.safetensors` file.
pub struct EpochFile {
    /// `[E, C, T]` epoch tensor.
    pub epochs: Array3<f32>,
    /// `[C, 3]` channel positions in metres.
    pub chan_pos: Array2<f32>,
    /// Channel names (generated as `ch00`, `ch01`, … if not saved).
    pub ch_names: Vec<String>,
}

impl EpochFile {
    /// Read `epochs` (F32 `[E, C, T]`), `chan_pos` (F32 `[C, 3]`) and the
    /// optional newline-joined `ch_names` from a safetensors file.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let (header, data_start) = parse_header(&bytes)?;

        let epochs_entry = header.get("epochs").context("missing 'epochs' key")?;
        let shape = shape_of(epochs_entry)?;
        if shape.len() != 3 {
            bail!("'epochs' must be 3-D [trials, channels, samples], got {shape:?}");
        }
        let values = read_f32_tensor(&bytes, data_start, epochs_entry)?;
        let epochs = Array3::from_shape_vec((shape[0], shape[1], shape[2]), values)?;

        let pos_entry = header.get("chan_pos").context("missing 'chan_pos' key")?;
        let pos_shape = shape_of(pos_entry)?;
        let pos_values = read_f32_tensor(&bytes, data_start, pos_entry)?;
        let chan_pos = Array2::from_shape_vec((pos_shape[0], pos_shape[1]), pos_values)?;

        let ch_names = if let Some(entry) = header.get("ch_names") {
            let (s, e) = entry_range(entry)?;
            let raw = std::str::from_utf8(&bytes[data_start + s..data_start + e])?;
            raw.split('\n').filter(|s| !s.is_empty()).map(String::from).collect()
        } else {
            (0..epochs.dim().1).map(|i| format!("ch{i:02}")).collect()
        };

        Ok(Self { epochs, chan_pos, ch_names })
    }
}

// ── Writer ───────────────────────────────────────────────────────────────────

/// Minimal safetensors builder for F32 tensors plus one UTF-8 blob.
struct StWriter {
    entries: Vec<(String, Vec<u8>, &'static str, Vec<usize>)>,
}

impl StWriter {
    fn new() -> Self {
        Self { entries: Vec::new() }
    }

    fn add_f32(&mut self, name: &str, data: &[f32], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "F32", shape.to_vec()));
    }

    fn add_utf8(&mut self, name: &str, text: &str) {
        let bytes = text.as_bytes().to_vec();
        let len = bytes.len();
        self.entries.push((name.to_string(), bytes, "U8", vec![len]));
    }

    fn write(&self, path: &Path) -> Result<()> {
        use std::io::Write;
        let mut header_map = serde_json::Map::new();
        let mut offset: usize = 0;
        for (name, data, dtype, shape) in &self.entries {
            header_map.insert(
                name.clone(),
                serde_json::json!({
                    "dtype": dtype,
                    "shape": shape,
                    "data_offsets": [offset, offset + data.len()],
                }),
            );
            offset += data.len();
        }
        let hdr_bytes = serde_json::to_vec(&header_map)?;
        let pad = (8 - hdr_bytes.len() % 8) % 8;
        let padded: Vec<u8> = hdr_bytes
            .into_iter()
            .chain(std::iter::repeat(b' ').take(pad))
            .collect();
        let mut f = std::fs::File::create(path)?;
        f.write_all(&(padded.len() as u64).to_le_bytes())?;
        f.write_all(&padded)?;
        for (_, data, _, _) in &self.entries {
            f.write_all(data)?;
        }
        Ok(())
    }
}

/// Write an epoch set back out in the same layout [`EpochFile::load`]
/// reads.
pub fn write_epoch_set(path: &Path, epochs: &EpochSet) -> Result<()> {
    let mut w = StWriter::new();
    let data = epochs.data();
    let flat: Vec<f32> = data.iter().copied().collect();
    let (n_e, n_c, n_t) = data.dim();
    w.add_f32("epochs", &flat, &[n_e, n_c, n_t]);

    let pos = epochs.positions();
    let pos_flat: Vec<f32> = pos.iter().copied().collect();
    w.add_f32("chan_pos", &pos_flat, &[pos.nrows(), pos.ncols()]);

    w.add_utf8("ch_names", &epochs.ch_names().join("\n"));
    w.write(path)
}
