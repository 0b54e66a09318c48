//! Транспорты сигналинга.
//!
//! Один запрос несёт наш конверт, ответ несёт конверт удалённой стороны:
//! - HTTP: `POST <endpoint>`, конверт в теле
//! - построчно: печатаем конверт, ответ читаем одной строкой (copy-paste)

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Request};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Result, SignalError};
use crate::peer::codec::{Envelope, MAX_ENVELOPE_LEN};

/// Адрес сигналинга по умолчанию
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/post";

/// Предел тела ответа: конверт и немного места на перевод строки
pub const MAX_BODY_LEN: usize = MAX_ENVELOPE_LEN + 64;

/// Один обмен конвертами: запрос -> ответ
#[async_trait]
pub trait SignalTransport: Send + Sync {
    async fn exchange(&self, body: Envelope) -> Result<Envelope>;
}

/// POST конверта, тело ответа возвращается как конверт. Без таймаута и повторов.
pub struct HttpTransport {
    endpoint: Url,
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl HttpTransport {
    /// Проверяет адрес и создаёт HTTP(S) клиент
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = parse_endpoint(endpoint)?;

        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .build();

        let client: Client<_, Full<Bytes>> = Client::builder(TokioExecutor::new()).build(https);

        Ok(Self { endpoint, client })
    }

    /// Адрес, на который уходит POST
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl SignalTransport for HttpTransport {
    async fn exchange(&self, body: Envelope) -> Result<Envelope> {
        debug!(endpoint = %self.endpoint, len = body.len(), "POST envelope");

        let request = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.as_str())
            .header(CONTENT_TYPE, "text/plain;charset=UTF-8")
            .body(Full::new(Bytes::from(body.into_string())))
            .map_err(|e| SignalError::Transport(format!("Failed to build request: {e}")))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| SignalError::Transport(format!("POST {} failed: {e}", self.endpoint)))?;

        // статус не проверяем: плохое тело всё равно не пройдёт decode
        let status = response.status();
        if !status.is_success() {
            warn!(%status, endpoint = %self.endpoint, "Signaling endpoint returned non-success status");
        }

        // тело читаем не больше лимита конверта (плюс запас на пробелы)
        let body_bytes = Limited::new(response.into_body(), MAX_BODY_LEN)
            .collect()
            .await
            .map_err(|e| SignalError::Transport(format!("Failed to read response body: {e}")))?
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes);
        debug!(%status, len = text.len(), "Received response body");
        Ok(Envelope::from_wire(text.trim()))
    }
}

/// Принимаются только http/https адреса с хостом
pub fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint)
        .map_err(|e| SignalError::Config(format!("Invalid endpoint {endpoint:?}: {e}")))?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(SignalError::Config(format!(
            "Endpoint must be an http(s) URL, got {endpoint:?}"
        ))),
    }
}

/// Пишет конверт одной строкой и читает ответ из следующей непустой строки.
/// Для ручного сигналинга через copy-paste.
pub struct LineTransport<R, W> {
    io: Mutex<(R, W)>,
}

/// Построчный транспорт поверх stdin/stdout
pub type StdioTransport = LineTransport<BufReader<Stdin>, Stdout>;

impl StdioTransport {
    /// Транспорт на stdin/stdout процесса
    pub fn stdio() -> Self {
        LineTransport::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> LineTransport<R, W> {
    /// Создаёт транспорт из reader и writer
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            io: Mutex::new((reader, writer)),
        }
    }

    /// Возвращает reader и writer обратно
    pub fn into_inner(self) -> (R, W) {
        self.io.into_inner()
    }
}

#[async_trait]
impl<R, W> SignalTransport for LineTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn exchange(&self, body: Envelope) -> Result<Envelope> {
        let mut io = self.io.lock().await;
        let (reader, writer) = &mut *io;

        writer.write_all(body.as_str().as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;

        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                return Err(SignalError::Transport(
                    "input closed before an answer was read".into(),
                ));
            }
            if !line.trim().is_empty() {
                return Ok(Envelope::from_wire(line.trim()));
            }
        }
    }
}
