//! Text encodings spoken on a worker's pipe.

/// Encoding of the bytes exchanged with a piped worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeEncoding {
    /// UTF-8, understood by CSharpier 0.14 and later.
    Utf8,
    /// Single-byte legacy encoding (ISO-8859-1) used by 0.12 and 0.13.
    /// Characters outside the range are sent as `?`.
    Legacy,
}

impl PipeEncoding {
    pub fn for_utf8(use_utf8: bool) -> Self {
        if use_utf8 {
            PipeEncoding::Utf8
        } else {
            PipeEncoding::Legacy
        }
    }

    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            PipeEncoding::Utf8 => text.as_bytes().to_vec(),
            PipeEncoding::Legacy => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
        }
    }

    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            PipeEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            PipeEncoding::Legacy => bytes.iter().map(|&b| char::from(b)).collect(),
        }
    }
}
