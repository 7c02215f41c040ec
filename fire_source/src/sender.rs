//! Ack/retry transmission (spec §4.3, §6 "Acknowledgement ... any datagram;
//! presence within T_ack suffices"), grounded in the teacher's HTTP client
//! retry shape (`mission_planner`'s external weather calls), adapted to
//! UDP send/recv-with-timeout.

use shared::net::InboundDatagram;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

/// Sends `text` to `scheduler_addr`, resending up to `resend_attempts`
/// times if no datagram arrives on `acks` within `ack_timeout`. Returns
/// `true` once any datagram is observed, `false` if every attempt timed
/// out (best-effort delivery only, per spec's Non-goals).
pub async fn send_with_ack(
    socket: &UdpSocket,
    scheduler_addr: SocketAddr,
    text: &str,
    acks: &mut mpsc::UnboundedReceiver<InboundDatagram>,
    ack_timeout: Duration,
    resend_attempts: u32,
) -> bool {
    for attempt in 0..=resend_attempts {
        if let Err(e) = shared::net::send_datagram(socket, scheduler_addr, text).await {
            tracing::warn!("send failed on attempt {attempt}: {e}");
            continue;
        }
        match tokio::time::timeout(ack_timeout, acks.recv()).await {
            Ok(Some(_ack)) => return true,
            Ok(None) => {
                tracing::warn!("ack channel closed");
                return false;
            }
            Err(_) => {
                tracing::warn!(attempt, "no ack within timeout, retrying");
            }
        }
    }
    false
}
