//! Dictionary encoding of variable-length strings
//!
//! Grounded on `original_source/tiledb/sm/compressors/dict_compressor.h`:
//! each distinct string is assigned an id in first-seen order; the id
//! stream and a serialized dictionary are transmitted separately so the
//! reverse path can look ids back up (spec §4.7).

use crate::endian::bytesize_for;
use crate::error::{Error, Result};
use std::collections::HashMap;

/// The id stream plus the dictionary it indexes into, in first-seen
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictEncoded {
    pub ids: Vec<u64>,
    pub dict: Vec<Vec<u8>>,
    /// Byte width chosen for `ids` on the wire, from the distinct-string
    /// count (spec §4.7: `∈ {1,2,4,8} bytes`).
    pub id_bytesize: u8,
}

/// Assigns each distinct string in `strings` an id in first-seen order.
pub fn encode(strings: &[&[u8]]) -> DictEncoded {
    let mut word_ids: HashMap<&[u8], u64> = HashMap::new();
    let mut dict = Vec::new();
    let mut ids = Vec::with_capacity(strings.len());
    for &s in strings {
        let id = *word_ids.entry(s).or_insert_with(|| {
            dict.push(s.to_vec());
            (dict.len() - 1) as u64
        });
        ids.push(id);
    }
    let id_bytesize = bytesize_for(dict.len().saturating_sub(1).max(0) as u64);
    DictEncoded { ids, dict, id_bytesize }
}

/// Reverses [`encode`]: looks each id up in `dict` to reconstruct the
/// original string sequence.
pub fn decode(encoded: &DictEncoded) -> Result<Vec<Vec<u8>>> {
    encoded
        .ids
        .iter()
        .map(|&id| {
            encoded
                .dict
                .get(id as usize)
                .cloned()
                .ok_or_else(|| Error::Compression(format!("dict id {} out of range", id)))
        })
        .collect()
}

/// Serializes the id stream (fixed-width `id_bytesize` per entry) and
/// the dictionary (`(len: u32, bytes)*`) into a single byte stream.
pub fn serialize(encoded: &DictEncoded) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(encoded.ids.len() as u32).to_ne_bytes());
    out.extend_from_slice(&(encoded.dict.len() as u32).to_ne_bytes());
    out.push(encoded.id_bytesize);
    for &id in &encoded.ids {
        crate::endian::encode_be(id, encoded.id_bytesize, &mut out);
    }
    for word in &encoded.dict {
        out.extend_from_slice(&(word.len() as u32).to_be_bytes());
        out.extend_from_slice(word);
    }
    out
}

pub fn deserialize(bytes: &[u8]) -> Result<DictEncoded> {
    if bytes.len() < 9 {
        return Err(Error::Compression("dict stream header truncated".into()));
    }
    let id_num = u32::from_ne_bytes(bytes[0..4].try_into().unwrap()) as usize;
    let dict_num = u32::from_ne_bytes(bytes[4..8].try_into().unwrap()) as usize;
    let id_bytesize = bytes[8];
    let mut pos = 9usize;
    let mut ids = Vec::with_capacity(id_num);
    for _ in 0..id_num {
        ids.push(crate::endian::decode_be(&bytes[pos..], id_bytesize));
        pos += id_bytesize as usize;
    }
    let mut dict = Vec::with_capacity(dict_num);
    for _ in 0..dict_num {
        let len = u32::from_be_bytes(bytes[pos..pos + 4].try_into().unwrap()) as usize;
        pos += 4;
        dict.push(bytes[pos..pos + len].to_vec());
        pos += len;
    }
    Ok(DictEncoded { ids, dict, id_bytesize })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs<'a>(v: &[&'a str]) -> Vec<&'a [u8]> {
        v.iter().map(|s| s.as_bytes()).collect()
    }

    #[test]
    fn test_scenario_s4_dict_encoding() {
        let input = strs(&[
            "HG543232", "HG543232", "HG543232", "HG54", "HG54", "A", "HG543232", "HG54",
        ]);
        let encoded = encode(&input);
        assert_eq!(encoded.ids, vec![0, 0, 0, 1, 1, 2, 0, 1]);
        assert_eq!(
            encoded.dict,
            vec![b"HG543232".to_vec(), b"HG54".to_vec(), b"A".to_vec()]
        );
    }

    #[test]
    fn test_roundtrip() {
        let input = strs(&["x", "y", "x", "z", "y"]);
        let encoded = encode(&input);
        let decoded = decode(&encoded).unwrap();
        let decoded_refs: Vec<&[u8]> = decoded.iter().map(|v| v.as_slice()).collect();
        assert_eq!(decoded_refs, input);
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let input = strs(&["a", "b", "a"]);
        let encoded = encode(&input);
        let bytes = serialize(&encoded);
        let back = deserialize(&bytes).unwrap();
        assert_eq!(back, encoded);
    }

    #[test]
    fn test_decode_rejects_out_of_range_id() {
        let bad = DictEncoded { ids: vec![5], dict: vec![b"a".to_vec()], id_bytesize: 1 };
        assert!(decode(&bad).is_err());
    }
}
