//! DroneAgent process entry point (spec §6 CLI: `droneId baseX baseY`).

use clap::Parser;
use drone_agent::wire::{self, DroneInbound};
use drone_agent::DroneAgent;
use shared::config::SimConfig;
use shared::init_logging;
use shared::protocol::encode_zone_info_request;
use shared::types::Location;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "drone_agent")]
#[command(about = "Simulates one fire-response drone")]
struct Cli {
    drone_id: u32,
    base_x: i64,
    base_y: i64,
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

    let own_port = config.ports.drone_port(cli.drone_id);
    let bind_addr = format!("0.0.0.0:{own_port}");
    let socket = match UdpSocket::bind(&bind_addr).await {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("failed to bind {bind_addr}: {e}");
            return ExitCode::from(3);
        }
    };

    let scheduler_addr: SocketAddr = match format!("127.0.0.1:{}", config.ports.scheduler_port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("invalid scheduler address: {e}");
            return ExitCode::from(2);
        }
    };

    info!(drone_id = cli.drone_id, addr = %bind_addr, "drone agent online");

    let base = Location::new(cli.base_x, cli.base_y);
    let now = Instant::now();
    let mut agent = DroneAgent::new(cli.drone_id, base, config.drone_spec, config.timing.recovery_delay, now);

    if let Err(e) = shared::net::send_datagram(&socket, scheduler_addr, &agent.status_message(now).encode()).await {
        error!("failed to send initial status: {e}");
    }

    let mut inbound = shared::net::spawn_recv_loop(socket.clone(), config.timing.socket_recv_timeout);
    let mut sim_ticker = tokio::time::interval(config.timing.tick_interval);
    let mut status_ticker = tokio::time::interval(config.timing.status_interval);

    loop {
        tokio::select! {
            datagram = inbound.recv() => {
                let Some(datagram) = datagram else {
                    error!("receive loop terminated unexpectedly");
                    break;
                };
                let now = Instant::now();
                match wire::decode(&datagram.text) {
                    Ok(DroneInbound::Assignment(assignment)) => {
                        let event = assignment.event;
                        if let Some(zone_id) = agent.receive_assignment(event.zone_id, event.severity, event.error, now) {
                            let request = encode_zone_info_request(zone_id);
                            if let Err(e) = shared::net::send_datagram(&socket, scheduler_addr, &request).await {
                                error!("failed to send zone info request: {e}");
                            }
                        } else {
                            send_status(&socket, scheduler_addr, &agent, now).await;
                        }
                    }
                    Ok(DroneInbound::ZoneInfoResponse { zone_id, cx, cy }) => {
                        agent.receive_zone_info(zone_id, Location::new(cx, cy), now);
                        send_status(&socket, scheduler_addr, &agent, now).await;
                    }
                    Err(e) => {
                        tracing::warn!(from = %datagram.from, "discarding malformed datagram: {e}");
                    }
                }
            }
            _ = sim_ticker.tick() => {
                let now = Instant::now();
                if agent.tick(now) {
                    send_status(&socket, scheduler_addr, &agent, now).await;
                }
            }
            _ = status_ticker.tick() => {
                send_status(&socket, scheduler_addr, &agent, Instant::now()).await;
            }
        }
    }

    ExitCode::SUCCESS
}

async fn send_status(socket: &UdpSocket, scheduler_addr: SocketAddr, agent: &DroneAgent, now: Instant) {
    let text = agent.status_message(now).encode();
    if let Err(e) = shared::net::send_datagram(socket, scheduler_addr, &text).await {
        error!("failed to send status: {e}");
    }
}
