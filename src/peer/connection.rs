use crate::error::{Result, SignalError};
use crate::peer::ice::{to_rtc_servers, ServerConfig};
use crate::peer::types::{ConnectionState, LocalCandidate, SessionDescription, TrackInfo};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::APIBuilder;
use webrtc::ice_transport::ice_candidate::RTCIceCandidate;
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::policy::bundle_policy::RTCBundlePolicy;
use webrtc::peer_connection::policy::rtcp_mux_policy::RTCRtcpMuxPolicy;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::{RTCRtpTransceiver, RTCRtpTransceiverInit};
use webrtc::track::track_remote::TrackRemote;

/// События соединения во время согласования и работы.
///
/// Только наблюдение: в сигналинг отсюда ничего не возвращается.
pub trait PeerEvents: Send + Sync {
    /// Пришёл удалённый трек
    fn on_track_added(&self, track: TrackInfo);
    /// Сменилось состояние peer connection
    fn on_connection_state_changed(&self, state: ConnectionState);
    /// `None` = сбор кандидатов завершён
    fn on_local_candidate_gathered(&self, candidate: Option<LocalCandidate>);
}

/// Соединение, которым управляет клиент сигналинга
#[async_trait]
pub trait PeerConnection: Send + Sync {
    /// Создаёт offer, ставит его локальным описанием и возвращает
    async fn create_offer(&self) -> Result<SessionDescription>;
    /// Применяет описание удалённой стороны (answer)
    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;
    async fn local_description(&self) -> Option<SessionDescription>;
    async fn remote_description(&self) -> Option<SessionDescription>;
    async fn close(&self) -> Result<()>;
}

/// Фабрика соединений
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, events: Arc<dyn PeerEvents>) -> Result<Box<dyn PeerConnection>>;
}

/// Ждёт ли `create_offer` окончания сбора ICE кандидатов
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum GatherPolicy {
    /// Offer несёт все собранные кандидаты (без trickle)
    #[default]
    Complete,
    /// Offer возвращается сразу после set_local_description
    Immediate,
}

/// Создаёт webrtc соединения с одним recvonly видео трансивером
#[derive(Debug, Clone)]
pub struct RtcConnector {
    pub ice_servers: Vec<ServerConfig>,
    pub gather: GatherPolicy,
}

impl RtcConnector {
    /// ICE серверы и политика сбора кандидатов для всех соединений фабрики
    pub fn new(ice_servers: Vec<ServerConfig>, gather: GatherPolicy) -> Self {
        Self {
            ice_servers,
            gather,
        }
    }
}

#[async_trait]
impl Connector for RtcConnector {
    async fn connect(&self, events: Arc<dyn PeerEvents>) -> Result<Box<dyn PeerConnection>> {
        let pc = new_peer(&self.ice_servers, events).await?;
        Ok(Box::new(RtcPeer {
            pc,
            gather: self.gather,
        }))
    }
}

/// Соединение поверх `RTCPeerConnection`
pub struct RtcPeer {
    pc: Arc<RTCPeerConnection>,
    gather: GatherPolicy,
}

#[async_trait]
impl PeerConnection for RtcPeer {
    async fn create_offer(&self) -> Result<SessionDescription> {
        debug!("Creating offer...");
        let offer = self
            .pc
            .create_offer(None)
            .await
            .map_err(|e| SignalError::CreateOffer(e.to_string()))?;

        // promise берём до set_local_description, иначе можно пропустить конец сбора
        let mut gather_complete = self.pc.gathering_complete_promise().await;

        debug!("Setting local description (offer)...");
        self.pc
            .set_local_description(offer)
            .await
            .map_err(|e| SignalError::CreateOffer(e.to_string()))?;

        if self.gather == GatherPolicy::Complete {
            debug!("Waiting for ICE gathering to complete");
            let _ = gather_complete.recv().await;
        }

        let local = self
            .pc
            .local_description()
            .await
            .ok_or_else(|| SignalError::CreateOffer("no local description after set".into()))?;
        SessionDescription::from_rtc(&local)
            .ok_or_else(|| SignalError::CreateOffer("local description has no type".into()))
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        self.pc
            .set_remote_description(desc.into_rtc())
            .await
            .map_err(|e| SignalError::RemoteDescription(e.to_string()))
    }

    async fn local_description(&self) -> Option<SessionDescription> {
        self.pc
            .local_description()
            .await
            .and_then(|d| SessionDescription::from_rtc(&d))
    }

    async fn remote_description(&self) -> Option<SessionDescription> {
        self.pc
            .remote_description()
            .await
            .and_then(|d| SessionDescription::from_rtc(&d))
    }

    async fn close(&self) -> Result<()> {
        self.pc
            .close()
            .await
            .map_err(|e| SignalError::Connection(e.to_string()))
    }
}

/// Создаёт peer connection и подключает обработчики к `events`
pub async fn new_peer(
    ice_servers: &[ServerConfig],
    events: Arc<dyn PeerEvents>,
) -> Result<Arc<RTCPeerConnection>> {
    let mut media_engine = MediaEngine::default();
    media_engine
        .register_default_codecs()
        .map_err(|e| SignalError::Connection(format!("Failed to register codecs: {e}")))?;

    let registry = register_default_interceptors(Registry::new(), &mut media_engine)
        .map_err(|e| SignalError::Connection(format!("Failed to register interceptors: {e}")))?;

    let api = APIBuilder::new()
        .with_media_engine(media_engine)
        .with_interceptor_registry(registry)
        .build();

    let pc = Arc::new(
        api.new_peer_connection(rtc_config(ice_servers))
            .await
            .map_err(|e| SignalError::Connection(e.to_string()))?,
    );

    // принимаем один видео трек
    pc.add_transceiver_from_kind(
        RTPCodecType::Video,
        Some(RTCRtpTransceiverInit {
            direction: RTCRtpTransceiverDirection::Recvonly,
            send_encodings: vec![],
        }),
    )
    .await
    .map_err(|e| SignalError::Connection(format!("Failed to add transceiver: {e}")))?;

    let cand_events = events.clone();
    pc.on_ice_candidate(Box::new(move |cand: Option<RTCIceCandidate>| {
        match cand {
            Some(c) => match c.to_json() {
                Ok(init) => {
                    debug!(candidate = %init.candidate, "Local ICE candidate");
                    cand_events.on_local_candidate_gathered(Some(LocalCandidate {
                        candidate: init.candidate,
                        sdp_mid: init.sdp_mid,
                        sdp_mline_index: init.sdp_mline_index,
                    }));
                }
                Err(e) => warn!("Failed to serialize local candidate: {e}"),
            },
            None => {
                debug!("ICE candidate gathering completed (null candidate received)");
                cand_events.on_local_candidate_gathered(None);
            }
        }
        Box::pin(async {})
    }));

    pc.on_ice_connection_state_change(Box::new(move |st: RTCIceConnectionState| {
        debug!("ICE connection state changed to: {st}");
        Box::pin(async {})
    }));

    let state_events = events.clone();
    pc.on_peer_connection_state_change(Box::new(move |st: RTCPeerConnectionState| {
        info!("Peer connection state changed to: {st}");
        state_events.on_connection_state_changed(st.into());
        Box::pin(async {})
    }));

    let track_events = events;
    pc.on_track(Box::new(
        move |track: Arc<TrackRemote>,
              _receiver: Arc<RTCRtpReceiver>,
              _transceiver: Arc<RTCRtpTransceiver>| {
            let info = TrackInfo {
                kind: track.kind().to_string(),
                id: track.id(),
                stream_id: track.stream_id(),
                codec: track.codec().capability.mime_type,
            };
            info!(kind = %info.kind, id = %info.id, codec = %info.codec, "Remote track added");
            track_events.on_track_added(info);
            tokio::spawn(drain_track(track));
            Box::pin(async {})
        },
    ));

    Ok(pc)
}

fn rtc_config(ice_servers: &[ServerConfig]) -> RTCConfiguration {
    RTCConfiguration {
        ice_servers: to_rtc_servers(ice_servers),
        bundle_policy: RTCBundlePolicy::MaxBundle,
        rtcp_mux_policy: RTCRtcpMuxPolicy::Require,
        ..Default::default()
    }
}

/// Читает RTP до конца трека.
/// Интерсепторы (NACK, отчёты) работают, только пока трек читают.
async fn drain_track(track: Arc<TrackRemote>) {
    let mut packets: u64 = 0;
    let mut bytes: u64 = 0;

    loop {
        match track.read_rtp().await {
            Ok((pkt, _attributes)) => {
                packets += 1;
                bytes += pkt.payload.len() as u64;
            }
            Err(e) => {
                debug!("Track {} read ended: {e}", track.id());
                break;
            }
        }
    }

    info!(
        "Track {} ended after {} packets / {} bytes",
        track.id(),
        packets,
        bytes
    );
}
