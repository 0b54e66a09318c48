use std::sync::Arc;

use tracing::{debug, error, info, instrument, trace};

use crate::error::{Result, SignalError};
use crate::logger::{OutputLog, TrackSurface};
use crate::peer::codec::{self, Envelope};
use crate::peer::connection::{Connector, PeerConnection, PeerEvents};
use crate::peer::types::{ConnectionState, LocalCandidate, SessionDescription, TrackInfo};
use crate::session::Session;
use crate::transport::SignalTransport;

/// Передаёт события соединения в лог и на поверхность треков
struct ClientEvents {
    log: OutputLog,
    surface: Arc<dyn TrackSurface>,
}

impl PeerEvents for ClientEvents {
    fn on_track_added(&self, track: TrackInfo) {
        self.surface.attach(track);
    }

    fn on_connection_state_changed(&self, state: ConnectionState) {
        self.log.append(state.to_string());
    }

    fn on_local_candidate_gathered(&self, candidate: Option<LocalCandidate>) {
        match candidate {
            Some(c) => trace!(candidate = %c.candidate, "gathered"),
            None => debug!("Local candidate gathering finished"),
        }
    }
}

/// Клиент сигналинга: создаёт локальный offer, одним обменом через
/// транспорт получает answer удалённой стороны и применяет его.
pub struct SignalingClient {
    peer: Box<dyn PeerConnection>,
    transport: Arc<dyn SignalTransport>,
    log: OutputLog,
    session: Session,
}

impl SignalingClient {
    /// Создаёт соединение через `connector` и новую сессию.
    /// События соединения пишутся в `log`, треки уходят на `surface`.
    pub async fn connect(
        connector: &dyn Connector,
        transport: Arc<dyn SignalTransport>,
        log: OutputLog,
        surface: Arc<dyn TrackSurface>,
    ) -> Result<Self> {
        let events = Arc::new(ClientEvents {
            log: log.clone(),
            surface,
        });
        let peer = connector.connect(events).await?;
        let session = Session::new();
        info!(session = %session.id, "Peer connection ready");

        Ok(Self {
            peer,
            transport,
            log,
            session,
        })
    }

    /// Текущая сессия: id, offer и answer
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Видимый лог клиента
    pub fn log(&self) -> &OutputLog {
        &self.log
    }

    /// Соединение, которым управляет клиент
    pub fn peer(&self) -> &dyn PeerConnection {
        self.peer.as_ref()
    }

    /// Запрашивает offer у соединения и запоминает его в сессии.
    /// Пока offer ждёт ответа, второй не создаётся (`OfferPending`).
    #[instrument(skip_all, fields(session = %self.session.id))]
    pub async fn create_offer(&mut self) -> Result<SessionDescription> {
        if self.session.offer_pending() {
            return Err(SignalError::OfferPending);
        }

        let offer = self.peer.create_offer().await?;
        debug!(len = offer.sdp.len(), "Local offer set");
        self.session.local_offer = Some(offer.clone());
        self.session.peer_answer = None;
        Ok(offer)
    }

    /// Один обмен запрос/ответ; задача ждёт ответа, не блокируя рантайм
    #[instrument(skip_all, fields(session = %self.session.id, len = envelope.len()))]
    pub async fn send_offer(&self, envelope: Envelope) -> Result<Envelope> {
        let reply = self.transport.exchange(envelope).await?;
        debug!(len = reply.len(), "Received answer envelope");
        Ok(reply)
    }

    /// Декодирует конверт и применяет его как удалённое описание.
    /// Если decode не прошёл, соединение не трогаем.
    #[instrument(skip_all, fields(session = %self.session.id))]
    pub async fn apply_answer(&mut self, envelope: &Envelope) -> Result<()> {
        let answer = codec::decode(envelope)?;
        self.peer.set_remote_description(answer.clone()).await?;
        info!(sdp_type = %answer.sdp_type, "Remote description set");
        self.session.peer_answer = Some(answer);
        Ok(())
    }

    /// Запуск обмена: отправить ждущий offer и применить ответ.
    /// Без offer запрос не делается. Ошибки пишутся в лог.
    pub async fn start_session(&mut self) -> Result<SessionDescription> {
        let result = self.exchange().await;
        if let Err(e) = &result {
            self.report(e);
        }
        result
    }

    /// Создание offer и сразу запуск обмена
    pub async fn connect_once(&mut self) -> Result<SessionDescription> {
        if let Err(e) = self.create_offer().await {
            self.report(&e);
            return Err(e);
        }
        self.start_session().await
    }

    /// Закрывает соединение
    pub async fn close(&self) -> Result<()> {
        self.peer.close().await
    }

    async fn exchange(&mut self) -> Result<SessionDescription> {
        if !self.session.offer_pending() {
            return Err(SignalError::NoLocalOffer);
        }
        let offer = self
            .session
            .local_offer
            .clone()
            .ok_or(SignalError::NoLocalOffer)?;

        let envelope = codec::encode(&offer)?;
        let reply = self.send_offer(envelope).await?;
        self.apply_answer(&reply).await?;

        self.session
            .peer_answer
            .clone()
            .ok_or_else(|| SignalError::RemoteDescription("answer not recorded".into()))
    }

    fn report(&self, e: &SignalError) {
        error!(session = %self.session.id, "{e}");
        self.log.append(e.to_string());
    }
}
