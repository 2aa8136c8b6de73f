use crate::primitives::{Decode, DecodeError, Encode};

/// Which of the two span arrays a chunk belongs to.
///
/// Each kind is a separate partition: a chunk saved under one kind is never
/// visible under the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanKind {
    MinSpan,
    MaxSpan,
}

impl SpanKind {
    /// Label used for metrics and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanKind::MinSpan => "min_span",
            SpanKind::MaxSpan => "max_span",
        }
    }
}

impl std::fmt::Display for SpanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-length array of span values covering a contiguous range of epochs.
///
/// The length is chosen by the surround-vote detector (`elems_per_chunk`); a
/// chunk of zeros is a legitimate stored value, distinct from a missing chunk.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Chunk(Vec<u16>);

impl Chunk {
    pub fn new(data: Vec<u16>) -> Self {
        Self(data)
    }

    /// A chunk of `len` zero spans.
    pub fn zeroed(len: usize) -> Self {
        Self(vec![0; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.0
    }

    /// Sets the span at `index`, returning `false` if it is out of range.
    pub fn set(&mut self, index: usize, value: u16) -> bool {
        match self.0.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// SSZ list encoding: little-endian `u16`s back to back.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.as_ssz_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Vec::<u16>::from_ssz_bytes(bytes).map(Self)
    }
}
