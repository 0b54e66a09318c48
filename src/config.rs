use clap::Parser;

use crate::error::{Result, SignalError};
use crate::peer::connection::GatherPolicy;
use crate::peer::ice::{default_servers, validate_servers, IceServerKind, ServerConfig};
use crate::transport::{parse_endpoint, DEFAULT_ENDPOINT};

/// Аргументы командной строки (каждый можно задать и через env)
#[derive(Debug, Clone, Parser)]
#[clap(name = "postsig", about = "Receive one WebRTC video stream, signaled by a single POST")]
pub struct Cli {
    /// Signaling endpoint the offer is POSTed to
    #[clap(long, env = "POSTSIG_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// ICE server URL; repeat for several. Defaults to Google's public STUN
    #[clap(long = "ice-server", env = "POSTSIG_ICE_SERVERS", value_delimiter = ',')]
    pub ice_servers: Vec<String>,

    /// Username for `turn:` servers
    #[clap(long, env = "POSTSIG_TURN_USERNAME")]
    pub turn_username: Option<String>,

    /// Credential for `turn:` servers
    #[clap(long, env = "POSTSIG_TURN_CREDENTIAL")]
    pub turn_credential: Option<String>,

    /// Wait for ICE gathering before sending the offer, or send it at once
    #[clap(long, env = "POSTSIG_GATHER", value_enum, default_value_t = GatherPolicy::Complete)]
    pub gather: GatherPolicy,

    /// Print the offer and read the answer from stdin instead of POSTing
    #[clap(long, env = "POSTSIG_MANUAL", default_value = "false")]
    pub manual: bool,

    /// Don't echo the connection log to stdout
    #[clap(long, short, env = "POSTSIG_QUIET", default_value = "false")]
    pub quiet: bool,
}

/// Как offer доходит до удалённой стороны
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signaling {
    Http { endpoint: String },
    Manual,
}

/// Проверенная конфигурация запуска
#[derive(Debug, Clone)]
pub struct Config {
    pub signaling: Signaling,
    pub ice_servers: Vec<ServerConfig>,
    pub gather: GatherPolicy,
    pub echo_log: bool,
}

/// Валидация: адрес сигналинга, ICE серверы (TURN требует логин и пароль)
impl TryFrom<Cli> for Config {
    type Error = SignalError;

    fn try_from(cli: Cli) -> Result<Self> {
        let signaling = if cli.manual {
            Signaling::Manual
        } else {
            parse_endpoint(&cli.endpoint)?;
            Signaling::Http {
                endpoint: cli.endpoint,
            }
        };

        let ice_servers = if cli.ice_servers.is_empty() {
            default_servers()
        } else {
            cli.ice_servers
                .iter()
                .map(|url| server_from_url(url, &cli.turn_username, &cli.turn_credential))
                .collect()
        };
        validate_servers(&ice_servers)?;

        Ok(Self {
            signaling,
            ice_servers,
            gather: cli.gather,
            echo_log: !cli.quiet,
        })
    }
}

/// `turn:`/`turns:` получают TURN логин/пароль, всё остальное считается STUN
fn server_from_url(url: &str, username: &Option<String>, credential: &Option<String>) -> ServerConfig {
    let url = url.trim();
    if url.starts_with("turn:") || url.starts_with("turns:") {
        ServerConfig {
            kind: IceServerKind::Turn,
            url: url.into(),
            username: username.clone(),
            credential: credential.clone(),
        }
    } else {
        ServerConfig::stun(url)
    }
}
