#![allow(dead_code)]

use std::future::Future;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use postsig_lib::error::{Result, SignalError};
use postsig_lib::logger::{LogTrackSurface, OutputLog};
use postsig_lib::peer::{
    ConnectionState, Connector, Envelope, PeerConnection, PeerEvents, SdpType,
    SessionDescription, TrackInfo,
};
use postsig_lib::transport::SignalTransport;
use postsig_lib::SignalingClient;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

pub const OFFER_SDP: &str = "v=0...";
pub const OFFER_ENVELOPE: &str = "eyJ0eXBlIjoib2ZmZXIiLCJzZHAiOiJ2PTAuLi4ifQ==";
pub const ANSWER_ENVELOPE: &str = "eyJ0eXBlIjoiYW5zd2VyIiwic2RwIjoidj0wLi4uIn0=";

/// What the fake connection has been asked to do
#[derive(Default)]
pub struct FakeState {
    pub local: Mutex<Option<SessionDescription>>,
    pub remote: Mutex<Option<SessionDescription>>,
    pub remote_calls: Mutex<usize>,
    pub fail_offer: bool,
    pub offer_sdp: Option<String>,
}

/// Behaves like a browser connection for the parts signaling touches
pub struct FakePeer {
    state: Arc<FakeState>,
    events: Arc<dyn PeerEvents>,
}

#[async_trait]
impl PeerConnection for FakePeer {
    async fn create_offer(&self) -> Result<SessionDescription> {
        if self.state.fail_offer {
            return Err(SignalError::CreateOffer("offer refused".into()));
        }
        let sdp = self.state.offer_sdp.clone().unwrap_or_else(|| OFFER_SDP.into());
        let offer = SessionDescription::offer(sdp);
        *self.state.local.lock().unwrap() = Some(offer.clone());
        self.events.on_local_candidate_gathered(None);
        Ok(offer)
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        *self.state.remote_calls.lock().unwrap() += 1;
        if self.state.local.lock().unwrap().is_none() {
            return Err(SignalError::RemoteDescription("no local description".into()));
        }
        if desc.sdp_type != SdpType::Answer {
            return Err(SignalError::RemoteDescription(format!(
                "invalid state change: remote {}",
                desc.sdp_type
            )));
        }
        *self.state.remote.lock().unwrap() = Some(desc);
        self.events
            .on_connection_state_changed(ConnectionState::Connecting);
        self.events.on_track_added(TrackInfo {
            kind: "video".into(),
            id: "video".into(),
            stream_id: "pion".into(),
            codec: "video/H264".into(),
        });
        Ok(())
    }

    async fn local_description(&self) -> Option<SessionDescription> {
        self.state.local.lock().unwrap().clone()
    }

    async fn remote_description(&self) -> Option<SessionDescription> {
        self.state.remote.lock().unwrap().clone()
    }

    async fn close(&self) -> Result<()> {
        self.events.on_connection_state_changed(ConnectionState::Closed);
        Ok(())
    }
}

pub struct FakeConnector {
    pub state: Arc<FakeState>,
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, events: Arc<dyn PeerEvents>) -> Result<Box<dyn PeerConnection>> {
        Ok(Box::new(FakePeer {
            state: self.state.clone(),
            events,
        }))
    }
}

/// Replies with a scripted result and records every request body
pub struct ScriptedTransport {
    reply: std::result::Result<String, String>,
    pub sent: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn replying(body: &str) -> Self {
        Self {
            reply: Ok(body.into()),
            sent: Mutex::default(),
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            reply: Err(msg.into()),
            sent: Mutex::default(),
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SignalTransport for ScriptedTransport {
    async fn exchange(&self, body: Envelope) -> Result<Envelope> {
        self.sent.lock().unwrap().push(body.into_string());
        match &self.reply {
            Ok(text) => Ok(Envelope::from_wire(text.clone())),
            Err(msg) => Err(SignalError::Transport(msg.clone())),
        }
    }
}

pub struct Harness {
    pub client: SignalingClient,
    pub state: Arc<FakeState>,
    pub transport: Arc<ScriptedTransport>,
    pub log: OutputLog,
}

pub async fn harness(transport: ScriptedTransport) -> Harness {
    harness_with(FakeState::default(), transport).await
}

pub async fn harness_with(state: FakeState, transport: ScriptedTransport) -> Harness {
    let state = Arc::new(state);
    let transport = Arc::new(transport);
    let log = OutputLog::quiet();
    let client = SignalingClient::connect(
        &FakeConnector {
            state: state.clone(),
        },
        transport.clone(),
        log.clone(),
        Arc::new(LogTrackSurface::new(log.clone())),
    )
    .await
    .unwrap();

    Harness {
        client,
        state,
        transport,
        log,
    }
}

/// Accepts one HTTP request, answers it with `status` and `reply`, and
/// resolves to the request body it received.
pub async fn serve_once(status: &'static str, reply: &'static str) -> (String, JoinHandle<String>) {
    serve_once_with(status, move |_| async move { reply.to_string() }).await
}

/// Like `serve_once`, but the reply is built from the request body
pub async fn serve_once_with<F, Fut>(status: &'static str, handler: F) -> (String, JoinHandle<String>)
where
    F: FnOnce(String) -> Fut + Send + 'static,
    Fut: Future<Output = String> + Send,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/post", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let body = read_request_body(&mut stream).await;
        let reply = handler(body.clone()).await;

        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{reply}",
            reply.len()
        );
        // the client may hang up early (body limit), that is fine here
        let _ = stream.write_all(response.as_bytes()).await;
        let _ = stream.shutdown().await;
        body
    });

    (url, handle)
}

async fn read_request_body(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed before sending a full request");
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(end) = text.find("\r\n\r\n") {
            let head = &text[..end];
            let len = head
                .lines()
                .find_map(|l| {
                    let (k, v) = l.split_once(':')?;
                    k.eq_ignore_ascii_case("content-length")
                        .then(|| v.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= end + 4 + len {
                assert!(head.starts_with("POST /post HTTP/1.1"), "unexpected request: {head}");
                return text[end + 4..end + 4 + len].to_string();
            }
        }
    }
}
