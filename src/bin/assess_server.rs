//! Assessment server: receives landmark frames over TCP from a pose provider,
//! scores them, and replies with assessment results.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use reba_posture::config::{Config, ConfigSource, ScoringConfig};
use reba_posture::monitor::{AssessMode, Monitor};
use reba_posture::pose::LandmarkFrame;
use reba_posture::protocol::{self, ClientMessage, MessageStream, ServerMessage};
use reba_posture::reba::{parse_weight, ActivityType, AssessmentContext, Assessor};
use reba_posture::session::{CameraFacing, CaptureSession};

const CONFIG_PATH: &str = "config.toml";

// ===========================================================================
// Connection handling
// ===========================================================================

/// Per-connection state. Each provider gets its own session and context.
struct Connection {
    session: CaptureSession,
    monitor: Monitor,
    context: AssessmentContext,
    last_timestamp_us: u64,
}

impl Connection {
    fn new(scoring: ScoringConfig, mode: AssessMode, camera: CameraFacing) -> Result<Self> {
        let mut session = CaptureSession::new(camera);
        session.start()?;
        let monitor = Monitor::new(Assessor::new(scoring), mode, session.slot().clone());
        Ok(Self {
            session,
            monitor,
            context: AssessmentContext::default(),
            last_timestamp_us: 0,
        })
    }

    /// Handle one client message, returning the reply (if any).
    fn handle(&mut self, msg: ClientMessage) -> Option<ServerMessage> {
        match msg {
            ClientMessage::Frame {
                timestamp_us,
                landmarks,
            } => {
                let frame = match LandmarkFrame::from_slots(landmarks) {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::warn!(error = %e, timestamp_us, "frame rejected");
                        return Some(ServerMessage::Rejected {
                            error: e.to_string(),
                        });
                    }
                };
                self.last_timestamp_us = timestamp_us;
                self.session.accept(frame.clone());
                self.monitor
                    .on_frame(&frame, &self.context)
                    .map(|result| ServerMessage::Assessment {
                        timestamp_us,
                        result: (*result).clone(),
                    })
            }
            ClientMessage::SetContext { weight, activity } => {
                self.context =
                    AssessmentContext::new(parse_weight(&weight), ActivityType::parse_lenient(&activity));
                tracing::info!(
                    weight_kg = self.context.object_weight_kg,
                    activity = %self.context.activity,
                    "context updated"
                );
                None
            }
            ClientMessage::SetMode { mode } => {
                self.monitor.set_mode(mode);
                tracing::info!(?mode, "mode changed");
                Some(ServerMessage::Ready { mode })
            }
            ClientMessage::Snapshot => Some(match self.monitor.snapshot(&self.context) {
                Some(result) => ServerMessage::Assessment {
                    timestamp_us: self.last_timestamp_us,
                    result: (*result).clone(),
                },
                None => ServerMessage::Rejected {
                    error: "no frame received yet".to_string(),
                },
            }),
            ClientMessage::SwitchCamera => match self.session.switch_camera() {
                Ok(_) => None,
                Err(e) => Some(ServerMessage::Rejected {
                    error: e.to_string(),
                }),
            },
        }
    }
}

async fn serve_connection(mut stream: MessageStream, config: Arc<Config>) -> Result<()> {
    let mut conn = Connection::new(
        config.scoring.clone(),
        config.session.mode,
        config.session.camera,
    )?;
    protocol::send_message(
        &mut stream,
        &ServerMessage::Ready {
            mode: conn.monitor.mode(),
        },
    )
    .await?;

    while let Some(msg) = protocol::recv_message::<ClientMessage>(&mut stream).await? {
        if let Some(reply) = conn.handle(msg) {
            protocol::send_message(&mut stream, &reply).await?;
        }
    }

    if conn.session.is_capturing() {
        conn.session.stop()?;
    }
    Ok(())
}

// ===========================================================================
// Main
// ===========================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| CONFIG_PATH.to_string());
    let (config, source) =
        Config::load_or_default(&path).with_context(|| format!("failed to load {}", path))?;
    config.log.init();
    if source == ConfigSource::Defaults {
        tracing::info!(%path, "config not found, using defaults");
    }

    tracing::info!(version = env!("GIT_VERSION"), "assessment server");
    tracing::info!(
        mode = ?config.session.mode,
        side = ?config.scoring.side,
        min_visibility = config.scoring.min_visibility,
        "scoring configured"
    );

    let bind_addr: std::net::SocketAddr = config
        .server
        .listen_addr
        .parse()
        .context("invalid listen_addr")?;
    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!(%bind_addr, "listening");

    let config = Arc::new(config);
    loop {
        let (tcp_stream, addr) = listener.accept().await?;
        tcp_stream.set_nodelay(true)?;
        tracing::info!(%addr, "client connected");

        let config = Arc::clone(&config);
        tokio::spawn(async move {
            let stream = protocol::message_stream(tcp_stream);
            match serve_connection(stream, config).await {
                Ok(()) => tracing::info!(%addr, "client disconnected"),
                Err(e) => tracing::warn!(%addr, error = %e, "connection error"),
            }
        });
    }
}
