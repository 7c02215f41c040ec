//! Drone-side datagram decoding. The scheduler's `decode_inbound` (in
//! `shared::protocol`) is scoped to what the *scheduler* receives; a drone
//! receives assignments and zone-info responses instead, so it gets its
//! own small dispatcher built from the same wire primitives (spec §6).

use shared::protocol::AssignmentMessage;
use shared::DroneNetError;

#[derive(Debug, Clone, PartialEq)]
pub enum DroneInbound {
    Assignment(AssignmentMessage),
    ZoneInfoResponse { zone_id: u32, cx: i64, cy: i64 },
}

pub fn decode(text: &str) -> Result<DroneInbound, DroneNetError> {
    let text = text.trim();
    if let Some(rest) = text.strip_prefix("ZONE_INFO:") {
        let mut parts = rest.splitn(3, ':');
        let zone_id: u32 = parts
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| DroneNetError::Protocol(format!("bad zone info response: {text}")))?;
        let cx: i64 = parts
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| DroneNetError::Protocol(format!("bad zone info response: {text}")))?;
        let cy: i64 = parts
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| DroneNetError::Protocol(format!("bad zone info response: {text}")))?;
        return Ok(DroneInbound::ZoneInfoResponse { zone_id, cx, cy });
    }
    Ok(DroneInbound::Assignment(AssignmentMessage::decode(text)?))
}
