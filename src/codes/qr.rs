//! # Scan Payloads
//!
//! The text a QR code carries, and the text a rider may type instead of scanning.
//!
//! Structured payloads look like `FUL1:P:<order_id>:<code>`: a format tag, a type letter
//! (`P` pickup, `D` delivery), the order id and the code. Anything without the `FUL` prefix is
//! treated as a bare code typed by hand, which carries no type and no order: the caller resolves
//! those from the order's current phase.

use crate::codes::issuer::CODE_ALPHABET;
use crate::model::{CodeKind, OrderId};
use thiserror::Error;

/// Current payload version tag.
pub const FORMAT_TAG: &str = "FUL1";
const FORMAT_PREFIX: &str = "FUL";

/// What a scan or a typed entry decoded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScannedCode {
    Structured {
        code: String,
        kind: CodeKind,
        order_id: OrderId,
    },
    Bare {
        code: String,
    },
}

impl ScannedCode {
    pub fn code(&self) -> &str {
        match self {
            ScannedCode::Structured { code, .. } | ScannedCode::Bare { code } => code,
        }
    }

    /// The type claimed by the payload, `None` for bare codes.
    pub fn kind(&self) -> Option<CodeKind> {
        match self {
            ScannedCode::Structured { kind, .. } => Some(*kind),
            ScannedCode::Bare { .. } => None,
        }
    }

    /// The order claimed by the payload, `None` for bare codes.
    pub fn order_id(&self) -> Option<&OrderId> {
        match self {
            ScannedCode::Structured { order_id, .. } => Some(order_id),
            ScannedCode::Bare { .. } => None,
        }
    }
}

/// The input could not be read as a code. Never fatal: ask for manual entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("empty scan")]
    Empty,
    #[error("unsupported payload version: {0}")]
    UnsupportedVersion(String),
    #[error("malformed payload: {0}")]
    Malformed(&'static str),
    #[error("unknown code type: {0}")]
    UnknownKind(String),
    #[error("not a confirmation code")]
    NotACode,
}

/// Encoder/decoder for scan payloads. Holds only the expected code length.
#[derive(Debug, Clone, Copy)]
pub struct QrCodec {
    code_length: usize,
}

impl QrCodec {
    pub fn new(code_length: usize) -> Self {
        Self { code_length }
    }

    pub fn encode(&self, code: &str, kind: CodeKind, order_id: &OrderId) -> String {
        format!("{}:{}:{}:{}", FORMAT_TAG, kind.tag(), order_id, code)
    }

    pub fn decode(&self, payload: &str) -> Result<ScannedCode, DecodeError> {
        let payload = payload.trim();
        if payload.is_empty() {
            return Err(DecodeError::Empty);
        }
        if payload.starts_with(FORMAT_PREFIX) && payload.contains(':') {
            return self.decode_structured(payload);
        }
        self.decode_bare(payload)
    }

    fn decode_structured(&self, payload: &str) -> Result<ScannedCode, DecodeError> {
        let (tag, rest) = payload
            .split_once(':')
            .ok_or(DecodeError::Malformed("missing fields"))?;
        if tag != FORMAT_TAG {
            return Err(DecodeError::UnsupportedVersion(tag.to_string()));
        }
        let (kind, rest) = rest
            .split_once(':')
            .ok_or(DecodeError::Malformed("missing order id"))?;
        // The code is the last field; order ids may themselves contain separators.
        let (order_id, code) = rest
            .rsplit_once(':')
            .ok_or(DecodeError::Malformed("missing code"))?;

        let kind = CodeKind::from_tag(kind).ok_or_else(|| DecodeError::UnknownKind(kind.to_string()))?;
        if order_id.is_empty() {
            return Err(DecodeError::Malformed("empty order id"));
        }
        let code = self
            .normalize(code)
            .ok_or(DecodeError::Malformed("invalid code"))?;

        Ok(ScannedCode::Structured {
            code,
            kind,
            order_id: OrderId::from(order_id),
        })
    }

    fn decode_bare(&self, input: &str) -> Result<ScannedCode, DecodeError> {
        self.normalize(input)
            .map(|code| ScannedCode::Bare { code })
            .ok_or(DecodeError::NotACode)
    }

    /// Upper-cases and drops grouping characters (`K7QM-2XWD`, `k7qm 2xwd`), then checks shape.
    fn normalize(&self, raw: &str) -> Option<String> {
        let code: String = raw
            .chars()
            .filter(|c| !matches!(c, '-' | ' '))
            .map(|c| c.to_ascii_uppercase())
            .collect();
        let valid = code.len() == self.code_length
            && code.bytes().all(|b| CODE_ALPHABET.contains(&b));
        valid.then_some(code)
    }
}
