use serde::{Deserialize, Serialize};
use std::fmt;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

/// Тип описания сессии
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
    Pranswer,
    Rollback,
}

impl fmt::Display for SdpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SdpType::Offer => "offer",
            SdpType::Answer => "answer",
            SdpType::Pranswer => "pranswer",
            SdpType::Rollback => "rollback",
        };
        f.write_str(s)
    }
}

/// Offer/answer, которым обмениваемся с удалённой стороной.
///
/// Порядок полей важен для конверта: `{"type":..,"sdp":..}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub sdp_type: SdpType,
    pub sdp: String,
}

impl SessionDescription {
    /// Описание типа offer
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    /// Описание типа answer
    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Answer,
            sdp: sdp.into(),
        }
    }

    /// `None`, если тип у webrtc не задан (unspecified)
    pub fn from_rtc(desc: &RTCSessionDescription) -> Option<Self> {
        let sdp_type = match desc.sdp_type {
            RTCSdpType::Offer => SdpType::Offer,
            RTCSdpType::Answer => SdpType::Answer,
            RTCSdpType::Pranswer => SdpType::Pranswer,
            RTCSdpType::Rollback => SdpType::Rollback,
            RTCSdpType::Unspecified => return None,
        };
        Some(Self {
            sdp_type,
            sdp: desc.sdp.clone(),
        })
    }

    /// Конвертация в описание webrtc
    pub fn into_rtc(self) -> RTCSessionDescription {
        let mut desc = RTCSessionDescription::default();
        desc.sdp_type = match self.sdp_type {
            SdpType::Offer => RTCSdpType::Offer,
            SdpType::Answer => RTCSdpType::Answer,
            SdpType::Pranswer => RTCSdpType::Pranswer,
            SdpType::Rollback => RTCSdpType::Rollback,
        };
        desc.sdp = self.sdp;
        desc
    }
}

/// ICE кандидат, собранный на нашей стороне
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LocalCandidate {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    pub sdp_mline_index: Option<u16>,
}

/// Удалённый медиа трек, как его видит поверхность вывода
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    pub kind: String,
    pub id: String,
    pub stream_id: String,
    pub codec: String,
}

/// Состояние peer connection, строкой как в браузере
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::New => "new",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Failed => "failed",
            ConnectionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

impl From<RTCPeerConnectionState> for ConnectionState {
    fn from(st: RTCPeerConnectionState) -> Self {
        match st {
            RTCPeerConnectionState::Unspecified | RTCPeerConnectionState::New => {
                ConnectionState::New
            }
            RTCPeerConnectionState::Connecting => ConnectionState::Connecting,
            RTCPeerConnectionState::Connected => ConnectionState::Connected,
            RTCPeerConnectionState::Disconnected => ConnectionState::Disconnected,
            RTCPeerConnectionState::Failed => ConnectionState::Failed,
            RTCPeerConnectionState::Closed => ConnectionState::Closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rtc_conversion_keeps_type_and_sdp() {
        let desc = SessionDescription::answer("v=0...");
        let rtc = desc.clone().into_rtc();
        assert_eq!(rtc.sdp_type, RTCSdpType::Answer);
        assert_eq!(SessionDescription::from_rtc(&rtc), Some(desc));
    }

    #[test]
    fn unspecified_rtc_description_is_rejected() {
        let rtc = RTCSessionDescription::default();
        assert_eq!(SessionDescription::from_rtc(&rtc), None);
    }

    #[test]
    fn connection_state_display_matches_browser_names() {
        assert_eq!(
            ConnectionState::from(RTCPeerConnectionState::Connecting).to_string(),
            "connecting"
        );
        assert_eq!(ConnectionState::Failed.to_string(), "failed");
    }
}
