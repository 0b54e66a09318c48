//! Ошибки сигналинга

/// Result с ошибкой сигналинга
pub type Result<T> = std::result::Result<T, SignalError>;

/// Всё, что завершает попытку сигналинга. Повторов нет.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Не удалось создать или закрыть peer connection
    #[error("Peer connection error: {0}")]
    Connection(String),

    /// Соединение не создало или не установило локальный offer
    #[error("Failed to create offer: {0}")]
    CreateOffer(String),

    /// Обмен запрос/ответ не завершился
    #[error("Signaling transport error: {0}")]
    Transport(String),

    /// Конверт не base64, не JSON или не описание сессии
    #[error("Malformed envelope: {0}")]
    Envelope(String),

    /// Соединение отвергло удалённое описание
    #[error("Failed to set remote description: {0}")]
    RemoteDescription(String),

    /// Обмен запущен без offer, ждущего ответа
    #[error("No local offer awaiting an answer")]
    NoLocalOffer,

    /// Локальный offer уже ждёт ответа
    #[error("Local offer already pending an answer")]
    OfferPending,

    /// Неверный параметр конфигурации
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
