//! FireSource process entry point (spec §6 CLI: optional input-file override).

use clap::Parser;
use fire_source::{reader, sender};
use shared::config::SimConfig;
use shared::init_logging;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "fire_source")]
#[command(about = "Replays scripted fire events to the scheduler")]
struct Cli {
    /// Path to the fire events file (default: fire_events.txt).
    #[arg(default_value = "fire_events.txt")]
    events_file: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = init_logging() {
        eprintln!("failed to initialize logging: {e}");
        return ExitCode::from(2);
    }

    let cli = Cli::parse();

    let config = match SimConfig::load() {
        Ok(c) => c,
        Err(e) => {
            error!("configuration error: {e}");
            return ExitCode::from(2);
        }
    };

    let contents = match std::fs::read_to_string(&cli.events_file) {
        Ok(c) => c,
        Err(e) => {
            error!("failed to read {}: {e}", cli.events_file);
            return ExitCode::from(2);
        }
    };

    let events = reader::parse_fire_events(&contents);
    let offsets = reader::offsets_from_start(&events);
    info!(count = events.len(), file = %cli.events_file, "loaded fire events");

    let bind_addr = format!("0.0.0.0:{}", config.ports.fire_source_port);
    let socket = match UdpSocket::bind(&bind_addr).await {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("failed to bind {bind_addr}: {e}");
            return ExitCode::from(3);
        }
    };

    let scheduler_addr: std::net::SocketAddr =
        match format!("127.0.0.1:{}", config.ports.scheduler_port).parse() {
            Ok(addr) => addr,
            Err(e) => {
                error!("invalid scheduler address: {e}");
                return ExitCode::from(2);
            }
        };

    let mut acks = shared::net::spawn_recv_loop(socket.clone(), config.timing.socket_recv_timeout);
    let program_start = Instant::now();

    for (event, offset) in events.iter().zip(offsets.iter()) {
        let target = program_start + *offset;
        let now = Instant::now();
        if target > now {
            tokio::time::sleep(target - now).await;
        }

        let text = event.message.encode();
        info!(zone = event.message.zone_id, "dispatching fire event");
        let acked = sender::send_with_ack(
            &socket,
            scheduler_addr,
            &text,
            &mut acks,
            config.timing.ack_timeout,
            config.timing.resend_attempts,
        )
        .await;
        if !acked {
            tracing::warn!(
                zone = event.message.zone_id,
                "no acknowledgement after all retries, moving on"
            );
        }
    }

    info!("all fire events dispatched");
    ExitCode::SUCCESS
}
