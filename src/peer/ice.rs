use crate::error::{Result, SignalError};
use crate::utils::add_ice_url_scheme;
use serde::{Deserialize, Serialize};
use webrtc::ice_transport::ice_server::RTCIceServer;

/// Публичный STUN сервер Google
pub const DEFAULT_STUN_URL: &str = "stun:stun.l.google.com:19302";

/// Тип ICE сервера
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IceServerKind {
    Stun,
    Turn,
}

/// Конфигурация ICE сервера
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub kind: IceServerKind,
    pub url: String,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl ServerConfig {
    /// STUN сервер без логина и пароля
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            kind: IceServerKind::Stun,
            url: url.into(),
            username: None,
            credential: None,
        }
    }
}

/// Серверы по умолчанию: один публичный STUN
pub fn default_servers() -> Vec<ServerConfig> {
    vec![ServerConfig::stun(DEFAULT_STUN_URL)]
}

/// Проверка: пустой URL и TURN без логина/пароля не допускаются
pub fn validate_servers(servers: &[ServerConfig]) -> Result<()> {
    for server in servers {
        if server.url.trim().is_empty() {
            return Err(SignalError::Config("ICE server URL cannot be empty".into()));
        }

        if server.kind == IceServerKind::Turn
            && (server.username.is_none() || server.credential.is_none())
        {
            return Err(SignalError::Config(format!(
                "TURN server {} requires username and credential",
                server.url
            )));
        }
    }
    Ok(())
}

/// Конвертация в `RTCIceServer` (схема URL добавляется при необходимости)
pub fn to_rtc_servers(servers: &[ServerConfig]) -> Vec<RTCIceServer> {
    servers
        .iter()
        .map(|config| RTCIceServer {
            urls: vec![add_ice_url_scheme(config)],
            username: config.username.clone().unwrap_or_default(),
            credential: config.credential.clone().unwrap_or_default(),
        })
        .collect()
}
