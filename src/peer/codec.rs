use crate::error::{Result, SignalError};
use crate::peer::types::SessionDescription;
use base64::{engine::general_purpose, Engine as _};
use std::fmt;

/// Максимальный размер конверта в обе стороны (256 KiB)
pub const MAX_ENVELOPE_LEN: usize = 256 * 1024;

/// Текстовая форма описания сессии для передачи: `base64(JSON)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope(String);

impl Envelope {
    /// Оборачивает текст, пришедший с удалённой стороны; проверки будут при `decode`
    pub fn from_wire(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Кодирует описание сессии в конверт.
/// Конверт больше `MAX_ENVELOPE_LEN` не создаётся: его не примет `decode`.
pub fn encode(desc: &SessionDescription) -> Result<Envelope> {
    // 1. struct -> JSON
    let json = serde_json::to_vec(desc).map_err(|e| SignalError::Envelope(e.to_string()))?;

    // 2. base64 (длину считаем заранее, до аллокации)
    let encoded_len = base64::encoded_len(json.len(), true).unwrap_or(usize::MAX);
    check_len(encoded_len)?;

    Ok(Envelope(general_purpose::STANDARD.encode(json)))
}

/// Декодирует конверт обратно в описание сессии
pub fn decode(envelope: &Envelope) -> Result<SessionDescription> {
    let text = envelope.as_str().trim();
    if text.is_empty() {
        return Err(SignalError::Envelope("empty envelope".into()));
    }
    check_len(text.len())?;

    // 1. base64 -> bytes
    let json = general_purpose::STANDARD
        .decode(text)
        .map_err(|e| SignalError::Envelope(format!("not base64: {e}")))?;

    // 2. JSON -> struct
    serde_json::from_slice(&json)
        .map_err(|e| SignalError::Envelope(format!("not a session description: {e}")))
}

fn check_len(len: usize) -> Result<()> {
    if len > MAX_ENVELOPE_LEN {
        return Err(SignalError::Envelope(format!(
            "envelope of {} bytes exceeds {} byte limit",
            len, MAX_ENVELOPE_LEN
        )));
    }
    Ok(())
}
