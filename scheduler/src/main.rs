//! Scheduler process entry point (spec §6: no positional args).

use clap::Parser;
use scheduler::SchedulerState;
use shared::config::SimConfig;
use shared::init_logging;
use shared::net;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "scheduler")]
#[command(about = "Assigns drones to fire events and tracks fleet state")]
struct Cli {
    /// Path to the zone geometry file (spec §6).
    #[arg(long, default_value = "zones.txt")]
    zones_file: String,
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

    let zones = match scheduler::zones::ZoneRegistry::load(&cli.zones_file).await {
        Ok(z) => z,
        Err(e) => {
            error!("failed to load {}: {e}", cli.zones_file);
            return ExitCode::from(2);
        }
    };
    info!(zones = zones.len(), "loaded zone geometry");

    let bind_addr = format!("0.0.0.0:{}", config.ports.scheduler_port);
    let socket = match UdpSocket::bind(&bind_addr).await {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("failed to bind {bind_addr}: {e}");
            return ExitCode::from(3);
        }
    };
    info!(addr = %bind_addr, "scheduler listening");

    let mut inbound = net::spawn_recv_loop(socket.clone(), config.timing.socket_recv_timeout);
    let mut state = SchedulerState::new(zones, config);
    let mut ticker = tokio::time::interval(config.timing.tick_interval);

    loop {
        tokio::select! {
            datagram = inbound.recv() => {
                let Some(datagram) = datagram else {
                    error!("receive loop terminated unexpectedly");
                    break;
                };
                let effects = state.handle_datagram(datagram.from, &datagram.text, Instant::now());
                for effect in effects {
                    if let Err(e) = net::send_datagram(&socket, effect.addr, &effect.text).await {
                        error!(to = %effect.addr, "send failed: {e}");
                    }
                }
            }
            _ = ticker.tick() => {
                let effects = state.tick(Instant::now());
                for effect in effects {
                    if let Err(e) = net::send_datagram(&socket, effect.addr, &effect.text).await {
                        error!(to = %effect.addr, "send failed: {e}");
                    }
                }
            }
        }
    }

    ExitCode::SUCCESS
}
