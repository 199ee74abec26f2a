//! Filter pipeline
//!
//! A chain of byte-level transforms applied to a tile on its way to and
//! from persistent storage (spec §4.7). Each stage writes a metadata
//! block recording what it needs to reverse itself; [`FilterPipeline`]
//! frames those blocks as `[stage_count: u32][ (tag: u8, len: u32,
//! bytes) ... ]` around the stage-specific payloads described in
//! [`compression_filter`] and [`var_string_rle`] — the pipeline-level
//! framing is this crate's own (spec §4.7 only pins down the individual
//! compression filter's own metadata layout, reproduced byte-exactly in
//! [`compression_filter`]; see DESIGN.md).

pub mod compression_filter;
pub mod dict;
pub mod options;
pub mod var_string_rle;
pub mod webp;

use crate::compression::Compressor;
use crate::error::{Error, Result};
use var_string_rle::strings_from_offsets;

const TAG_COMPRESSION: u8 = 1;
const TAG_VAR_STRING_RLE: u8 = 2;
const TAG_DICT: u8 = 3;

/// One stage of a [`FilterPipeline`].
#[derive(Debug, Clone)]
pub enum FilterStage {
    Compression(Compressor),
    /// Must be the pipeline's first stage (spec §4.7); consumes the
    /// offsets tile and a `STRING_ASCII` data tile.
    VarStringRle,
    /// Must be the pipeline's first stage, for the same reason as
    /// `VarStringRle`.
    Dict,
}

/// An ordered chain of filters. `forward`/`reverse` mirror spec §4.7's
/// data flow: storage ⇄ filter pipeline ⇄ local slab buffer.
#[derive(Debug, Clone)]
pub struct FilterPipeline {
    stages: Vec<FilterStage>,
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterPipeline {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn with_stages(stages: Vec<FilterStage>) -> Result<Self> {
        for (i, stage) in stages.iter().enumerate() {
            if i > 0 && matches!(stage, FilterStage::VarStringRle | FilterStage::Dict) {
                return Err(Error::InvalidArgument(
                    "VarStringRle/Dict must be the first filter in the chain".into(),
                ));
            }
        }
        Ok(Self { stages })
    }

    pub fn push(&mut self, stage: FilterStage) -> Result<()> {
        if matches!(stage, FilterStage::VarStringRle | FilterStage::Dict) && !self.stages.is_empty() {
            return Err(Error::InvalidArgument(
                "VarStringRle/Dict must be the first filter in the chain".into(),
            ));
        }
        self.stages.push(stage);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Worst-case output size across the whole chain, used to size
    /// fixed-allocation output buffers up front (spec §4.7).
    pub fn overhead(&self, nbytes: usize) -> usize {
        self.stages.iter().fold(nbytes, |acc, stage| match stage {
            FilterStage::Compression(c) => acc + c.overhead(acc),
            FilterStage::VarStringRle => acc + acc / 2 + 18,
            FilterStage::Dict => acc + acc / 2 + 9,
        })
    }

    /// Applies every stage in order. `offsets` must be `Some` (a tile's
    /// offsets component, one `u64` start position per string) iff the
    /// first stage is `VarStringRle` or `Dict`.
    pub fn forward(&self, data: &[u8], offsets: Option<&[u64]>) -> Result<(Vec<u8>, Vec<u8>)> {
        let mut cur_data = data.to_vec();
        let mut cur_offsets = offsets.map(|o| o.to_vec());
        let mut blocks: Vec<(u8, Vec<u8>)> = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            match stage {
                FilterStage::VarStringRle => {
                    let offs = cur_offsets
                        .take()
                        .ok_or_else(|| Error::InvalidArgument("VarStringRle requires an offsets tile".into()))?;
                    let strings = strings_from_offsets(&cur_data, &offs)?;
                    let encoded = var_string_rle::encode(&strings);
                    cur_data = var_string_rle::serialize(&encoded);
                    blocks.push((TAG_VAR_STRING_RLE, Vec::new()));
                }
                FilterStage::Dict => {
                    let offs = cur_offsets
                        .take()
                        .ok_or_else(|| Error::InvalidArgument("Dict requires an offsets tile".into()))?;
                    let strings = strings_from_offsets(&cur_data, &offs)?;
                    let encoded = dict::encode(&strings);
                    cur_data = dict::serialize(&encoded);
                    blocks.push((TAG_DICT, Vec::new()));
                }
                FilterStage::Compression(compressor) => {
                    let (meta, data) = compression_filter::forward(compressor, &[], &[&cur_data])?;
                    cur_data = data;
                    blocks.push((TAG_COMPRESSION, meta));
                }
            }
        }

        let mut out_meta = Vec::new();
        out_meta.extend_from_slice(&(blocks.len() as u32).to_ne_bytes());
        for (tag, bytes) in &blocks {
            out_meta.push(*tag);
            out_meta.extend_from_slice(&(bytes.len() as u32).to_ne_bytes());
            out_meta.extend_from_slice(bytes);
        }
        Ok((out_meta, cur_data))
    }

    /// Reverses [`forward`]. Returns the reconstructed data tile and,
    /// when the first stage was `VarStringRle`/`Dict`, the reconstructed
    /// offsets tile.
    pub fn reverse(&self, meta: &[u8], data: &[u8]) -> Result<(Vec<u8>, Option<Vec<u64>>)> {
        if meta.len() < 4 {
            return Err(Error::Compression("filter pipeline metadata truncated".into()));
        }
        let stage_count = u32::from_ne_bytes(meta[0..4].try_into().unwrap()) as usize;
        let mut pos = 4usize;
        let mut blocks = Vec::with_capacity(stage_count);
        for _ in 0..stage_count {
            if pos + 5 > meta.len() {
                return Err(Error::Compression("filter pipeline block header truncated".into()));
            }
            let tag = meta[pos];
            let len = u32::from_ne_bytes(meta[pos + 1..pos + 5].try_into().unwrap()) as usize;
            pos += 5;
            if pos + len > meta.len() {
                return Err(Error::Compression("filter pipeline block body truncated".into()));
            }
            blocks.push((tag, meta[pos..pos + len].to_vec()));
            pos += len;
        }
        if blocks.len() != self.stages.len() {
            return Err(Error::Compression(
                "filter pipeline metadata does not match configured stage count".into(),
            ));
        }

        let mut cur_data = data.to_vec();
        let mut offsets_out: Option<Vec<u64>> = None;

        for (stage, (tag, block_meta)) in self.stages.iter().zip(blocks.iter()).rev() {
            match (stage, *tag) {
                (FilterStage::Compression(compressor), TAG_COMPRESSION) => {
                    let (_, data_parts) = compression_filter::reverse(compressor, block_meta, &cur_data)?;
                    cur_data = data_parts.into_iter().next().ok_or_else(|| {
                        Error::Compression("compression filter produced no data part".into())
                    })?;
                }
                (FilterStage::VarStringRle, TAG_VAR_STRING_RLE) => {
                    let encoded = var_string_rle::deserialize(&cur_data)?;
                    let (d, offs) = var_string_rle::decode(&encoded)?;
                    cur_data = d;
                    offsets_out = Some(offs);
                }
                (FilterStage::Dict, TAG_DICT) => {
                    let encoded = dict::deserialize(&cur_data)?;
                    let decoded = dict::decode(&encoded)?;
                    let mut offsets = Vec::with_capacity(decoded.len());
                    let mut flat = Vec::new();
                    for word in &decoded {
                        offsets.push(flat.len() as u64);
                        flat.extend_from_slice(word);
                    }
                    cur_data = flat;
                    offsets_out = Some(offsets);
                }
                _ => {
                    return Err(Error::Compression(
                        "filter pipeline metadata tag does not match configured stage".into(),
                    ))
                }
            }
        }

        Ok((cur_data, offsets_out))
    }
}
