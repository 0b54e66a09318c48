use crate::peer::types::TrackInfo;
use std::sync::{Arc, Mutex, Once};
use tracing_subscriber::EnvFilter;

/// Ставит глобальный tracing subscriber; фильтр берётся из `RUST_LOG`
pub fn configure_tracing() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,webrtc=warn"));
        let _ = tracing::subscriber::set_global_default(
            tracing_subscriber::FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_target(false)
                .finish(),
        );
    });
}

/// Видимый лог: строки только добавляются, при `echo` печатаются в stdout
/// с меткой времени. Клоны делят один список строк.
#[derive(Clone, Default)]
pub struct OutputLog {
    lines: Arc<Mutex<Vec<String>>>,
    echo: bool,
}

impl OutputLog {
    /// Лог, который печатает каждую строку
    pub fn console() -> Self {
        Self {
            lines: Arc::default(),
            echo: true,
        }
    }

    /// Лог без вывода, только запись
    pub fn quiet() -> Self {
        Self::default()
    }

    /// Добавляет строку (и печатает её, если включён echo)
    pub fn append(&self, msg: impl Into<String>) {
        let msg = msg.into();
        if self.echo {
            let now = chrono::Local::now();
            println!("[{}] {}", now.format("%Y-%m-%d %H:%M:%S%.3f"), msg);
        }
        match self.lines.lock() {
            Ok(mut lines) => lines.push(msg),
            Err(poisoned) => poisoned.into_inner().push(msg),
        }
    }

    /// Копия всех строк
    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }
}

/// Куда подключаются пришедшие медиа треки
pub trait TrackSurface: Send + Sync {
    fn attach(&self, track: TrackInfo);
}

/// Показывает треки строками в логе
pub struct LogTrackSurface {
    log: OutputLog,
}

impl LogTrackSurface {
    pub fn new(log: OutputLog) -> Self {
        Self { log }
    }
}

impl TrackSurface for LogTrackSurface {
    fn attach(&self, track: TrackInfo) {
        self.log.append(format!(
            "{} track {} ({}) from stream {}",
            track.kind, track.id, track.codec, track.stream_id
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_lines() {
        let log = OutputLog::quiet();
        let other = log.clone();
        other.append("connecting");
        log.append("connected");
        assert_eq!(log.lines(), vec!["connecting", "connected"]);
        assert!(other.contains("connected"));
    }

    #[test]
    fn track_surface_writes_one_line() {
        let log = OutputLog::quiet();
        LogTrackSurface::new(log.clone()).attach(TrackInfo {
            kind: "video".into(),
            id: "video0".into(),
            stream_id: "pion".into(),
            codec: "video/H264".into(),
        });
        assert_eq!(log.lines(), vec!["video track video0 (video/H264) from stream pion"]);
    }
}
