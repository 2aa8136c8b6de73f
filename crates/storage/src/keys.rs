//! Fixed-width key layouts for the slasher tables.
//!
//! All integers are big-endian so that byte order matches numeric order: the
//! records of one validator are contiguous and sorted by target epoch.

use lambdaslash_types::primitives::{Epoch, ValidatorIndex};

use crate::api::Table;
use crate::error::Error;

/// Length of a single encoded integer.
pub const U64_KEY_LEN: usize = 8;

/// Length of an attestation record key.
pub const RECORD_KEY_LEN: usize = 2 * U64_KEY_LEN;

/// Layout: validator_index (8 bytes BE) || target_epoch (8 bytes BE)
pub fn encode_record_key(validator: ValidatorIndex, target: Epoch) -> Vec<u8> {
    let mut key = Vec::with_capacity(RECORD_KEY_LEN);
    key.extend_from_slice(&validator.to_be_bytes());
    key.extend_from_slice(&target.to_be_bytes());
    key
}

/// Inverse of [`encode_record_key`].
pub fn decode_record_key(bytes: &[u8]) -> Result<(ValidatorIndex, Epoch), Error> {
    if bytes.len() != RECORD_KEY_LEN {
        return Err(Error::CorruptKey {
            table: Table::AttestationRecords,
            len: bytes.len(),
        });
    }
    let (validator, target) = bytes.split_at(U64_KEY_LEN);
    Ok((
        decode_u64_key(Table::AttestationRecords, validator)?,
        decode_u64_key(Table::AttestationRecords, target)?,
    ))
}

/// Prefix shared by every record key of one validator.
pub fn record_key_prefix(validator: ValidatorIndex) -> Vec<u8> {
    validator.to_be_bytes().to_vec()
}

/// Layout: validator_index (8 bytes BE)
pub fn encode_validator_key(validator: ValidatorIndex) -> Vec<u8> {
    validator.to_be_bytes().to_vec()
}

/// Layout: chunk_index (8 bytes BE)
pub fn encode_chunk_key(chunk_index: u64) -> Vec<u8> {
    chunk_index.to_be_bytes().to_vec()
}

/// Decode a single big-endian `u64` key from `table`.
pub fn decode_u64_key(table: Table, bytes: &[u8]) -> Result<u64, Error> {
    let array: [u8; U64_KEY_LEN] = bytes.try_into().map_err(|_| Error::CorruptKey {
        table,
        len: bytes.len(),
    })?;
    Ok(u64::from_be_bytes(array))
}
