//! UDP transport shared by all three processes: a dedicated receive task
//! feeds the owner task's mailbox (spec §5 "Suspension points" / "no
//! arbitrary operation blocks the owner task"), the same split the teacher
//! uses between `SimulationEngine`'s update loop and its `mpsc`-fed event
//! channel.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct InboundDatagram {
    pub from: SocketAddr,
    pub text: String,
}

/// Spawns the receive task. Every socket read uses a bounded timeout
/// (default 1s, spec §5) so the loop periodically yields even with no
/// traffic; timeouts are silently retried, not treated as errors.
pub fn spawn_recv_loop(
    socket: Arc<UdpSocket>,
    recv_timeout: Duration,
) -> mpsc::UnboundedReceiver<InboundDatagram> {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut buf = [0u8; 2048];
        loop {
            match tokio::time::timeout(recv_timeout, socket.recv_from(&mut buf)).await {
                Ok(Ok((len, from))) => {
                    let text = String::from_utf8_lossy(&buf[..len]).to_string();
                    if tx.send(InboundDatagram { from, text }).is_err() {
                        break;
                    }
                }
                Ok(Err(e)) => {
                    tracing::warn!("socket recv error: {e}");
                }
                Err(_) => {
                    // recv timeout elapsed, loop again
                }
            }
        }
    });

    rx
}

pub async fn send_datagram(
    socket: &UdpSocket,
    addr: SocketAddr,
    text: &str,
) -> std::io::Result<()> {
    socket.send_to(text.as_bytes(), addr).await?;
    Ok(())
}
