//! Wire protocol: all datagrams are whitespace-separated ASCII text (spec §6).

use crate::types::{FaultKind, Location, Severity};
use crate::DroneNetError;
use rand::seq::SliceRandom;

/// Parsed shape of a fire event or assignment datagram, shared by both
/// because an assignment is "the full event serialization with
/// `assignedDroneId` set" (spec §4.1).
#[derive(Debug, Clone, PartialEq)]
pub struct FireEventMessage {
    pub time: String,
    pub zone_id: u32,
    pub kind: String,
    pub severity: Severity,
    pub error: Option<FaultKind>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentMessage {
    pub event: FireEventMessage,
    pub assigned_drone_id: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DroneStatusMessage {
    pub drone_id: u32,
    pub state: String,
    pub x: i64,
    pub y: i64,
    pub task: Option<(u32, Severity)>,
    pub fire_out: Option<u32>,
    pub capacity_remaining: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    FireEvent(FireEventMessage),
    DroneStatus(DroneStatusMessage),
    ZoneInfoRequest(u32),
    ZoneInfoResponse { zone_id: u32, cx: i64, cy: i64 },
}

fn drone_token(id: u32) -> String {
    format!("drone{id}")
}

fn parse_drone_token(tok: &str) -> Option<u32> {
    tok.strip_prefix("drone").and_then(|n| n.parse().ok())
}

/// Resolves the `ERROR` wire token per spec §6: "choose one uniformly at
/// random, excluding NONE".
pub fn resolve_error_token(token: &str) -> Result<Option<FaultKind>, DroneNetError> {
    match token {
        "NONE" => Ok(None),
        "ERROR" => {
            const CHOICES: [FaultKind; 4] = [
                FaultKind::DroneStuck,
                FaultKind::NozzleJam,
                FaultKind::DoorStuck,
                FaultKind::ArrivalSensorFailed,
            ];
            let mut rng = rand::thread_rng();
            Ok(CHOICES.choose(&mut rng).copied())
        }
        other => Ok(Some(other.parse()?)),
    }
}

impl FireEventMessage {
    /// Encodes as `HH:MM:SS Z KIND SEV [ERR]`. `error` is written literally
    /// (never re-randomized) since by the time this is serialized the
    /// random choice, if any, has already been made.
    pub fn encode(&self) -> String {
        match self.error {
            Some(err) => format!(
                "{} {} {} {} {}",
                self.time, self.zone_id, self.kind, self.severity, err
            ),
            None => format!("{} {} {} {}", self.time, self.zone_id, self.kind, self.severity),
        }
    }

    pub fn decode(text: &str) -> Result<Self, DroneNetError> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() < 4 {
            return Err(DroneNetError::Protocol(format!(
                "fire event needs at least 4 fields: {text}"
            )));
        }
        let zone_id: u32 = tokens[1]
            .parse()
            .map_err(|_| DroneNetError::Protocol(format!("bad zone id: {}", tokens[1])))?;
        let severity: Severity = tokens[3].parse()?;
        let error = match tokens.get(4) {
            Some(tok) => resolve_error_token(tok)?,
            None => None,
        };

        Ok(FireEventMessage {
            time: tokens[0].to_string(),
            zone_id,
            kind: tokens[2].to_string(),
            severity,
            error,
        })
    }
}

impl AssignmentMessage {
    pub fn encode(&self) -> String {
        format!("{} {}", self.event.encode(), self.assigned_drone_id)
    }

    pub fn decode(text: &str) -> Result<Self, DroneNetError> {
        let (body, drone_tok) = text
            .rsplit_once(' ')
            .ok_or_else(|| DroneNetError::Protocol(format!("assignment missing drone id: {text}")))?;
        let assigned_drone_id: u32 = drone_tok
            .parse()
            .map_err(|_| DroneNetError::Protocol(format!("bad assigned drone id: {drone_tok}")))?;
        let event = FireEventMessage::decode(body)?;
        Ok(AssignmentMessage {
            event,
            assigned_drone_id,
        })
    }
}

impl DroneStatusMessage {
    pub fn encode(&self) -> String {
        let mut parts = vec![
            drone_token(self.drone_id),
            self.state.clone(),
            self.x.to_string(),
            self.y.to_string(),
        ];
        if let Some((zone, sev)) = self.task {
            parts.push(format!("TASK:{zone}:{sev}"));
        }
        if let Some(zone) = self.fire_out {
            parts.push(format!("FIRE_OUT:{zone}"));
        }
        if let Some(capacity) = self.capacity_remaining {
            parts.push(format!("CAPACITY:{capacity}"));
        }
        parts.join(" ")
    }

    /// Classifier from spec §6: "token 0 begins with 'drone' and the last
    /// two tokens parse as integers". Applied literally; a status message
    /// carrying a trailing `TASK:`/`FIRE_OUT:`/`CAPACITY:` suffix still
    /// classifies correctly because those suffixes are not plain integers,
    /// so callers that need to distinguish inbound kinds should try
    /// `ZONE_INFO_REQUEST:` and `FireEventMessage::decode` first and fall
    /// back to this classifier last.
    pub fn looks_like_status(text: &str) -> bool {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() < 2 {
            return false;
        }
        if !tokens[0].starts_with("drone") {
            return false;
        }
        let last = tokens[tokens.len() - 1];
        let second_last = tokens[tokens.len() - 2];
        last.parse::<i64>().is_ok() && second_last.parse::<i64>().is_ok()
    }

    pub fn decode(text: &str) -> Result<Self, DroneNetError> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() < 4 {
            return Err(DroneNetError::Protocol(format!(
                "drone status needs at least 4 fields: {text}"
            )));
        }
        let drone_id = parse_drone_token(tokens[0])
            .ok_or_else(|| DroneNetError::Protocol(format!("bad drone id token: {}", tokens[0])))?;
        let x: i64 = tokens[2]
            .parse()
            .map_err(|_| DroneNetError::Protocol(format!("bad x: {}", tokens[2])))?;
        let y: i64 = tokens[3]
            .parse()
            .map_err(|_| DroneNetError::Protocol(format!("bad y: {}", tokens[3])))?;

        let mut task = None;
        let mut fire_out = None;
        let mut capacity_remaining = None;

        for tok in &tokens[4..] {
            if let Some(rest) = tok.strip_prefix("TASK:") {
                let mut parts = rest.splitn(2, ':');
                let zone: u32 = parts
                    .next()
                    .and_then(|v| v.parse().ok())
                    .ok_or_else(|| DroneNetError::Protocol(format!("bad TASK zone: {tok}")))?;
                let sev: Severity = parts
                    .next()
                    .ok_or_else(|| DroneNetError::Protocol(format!("bad TASK severity: {tok}")))?
                    .parse()?;
                task = Some((zone, sev));
            } else if let Some(rest) = tok.strip_prefix("FIRE_OUT:") {
                fire_out = Some(
                    rest.parse()
                        .map_err(|_| DroneNetError::Protocol(format!("bad FIRE_OUT zone: {tok}")))?,
                );
            } else if let Some(rest) = tok.strip_prefix("CAPACITY:") {
                capacity_remaining = Some(
                    rest.parse()
                        .map_err(|_| DroneNetError::Protocol(format!("bad CAPACITY: {tok}")))?,
                );
            }
        }

        Ok(DroneStatusMessage {
            drone_id,
            state: tokens[1].to_string(),
            x,
            y,
            task,
            fire_out,
            capacity_remaining,
        })
    }
}

pub fn encode_zone_info_request(zone_id: u32) -> String {
    format!("ZONE_INFO_REQUEST:{zone_id}")
}

pub fn encode_zone_info_response(zone_id: u32, center: Location) -> String {
    format!("ZONE_INFO:{zone_id}:{}:{}", center.x, center.y)
}

/// Decodes any inbound datagram the Scheduler might receive: a zone info
/// request, a drone status, or a fire event, in that priority order
/// (spec §6, §7 "Malformed message": callers log-and-discard on `Err`).
pub fn decode_inbound(text: &str) -> Result<InboundMessage, DroneNetError> {
    let text = text.trim();
    if let Some(rest) = text.strip_prefix("ZONE_INFO_REQUEST:") {
        let zone_id: u32 = rest
            .parse()
            .map_err(|_| DroneNetError::Protocol(format!("bad zone info request: {text}")))?;
        return Ok(InboundMessage::ZoneInfoRequest(zone_id));
    }
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
        return Ok(InboundMessage::ZoneInfoResponse { zone_id, cx, cy });
    }
    if DroneStatusMessage::looks_like_status(text) {
        return Ok(InboundMessage::DroneStatus(DroneStatusMessage::decode(text)?));
    }
    Ok(InboundMessage::FireEvent(FireEventMessage::decode(text)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fire_event_round_trips() {
        let msg = FireEventMessage {
            time: "14:03:15".into(),
            zone_id: 1,
            kind: "FIRE_DETECTED".into(),
            severity: Severity::Low,
            error: None,
        };
        let encoded = msg.encode();
        assert_eq!(encoded, "14:03:15 1 FIRE_DETECTED Low");
        assert_eq!(FireEventMessage::decode(&encoded).unwrap(), msg);
    }

    #[test]
    fn fire_event_with_error_round_trips() {
        let msg = FireEventMessage {
            time: "14:08:30".into(),
            zone_id: 4,
            kind: "FIRE_DETECTED".into(),
            severity: Severity::Moderate,
            error: Some(FaultKind::DroneStuck),
        };
        let encoded = msg.encode();
        assert_eq!(encoded, "14:08:30 4 FIRE_DETECTED Moderate DRONE_STUCK");
        assert_eq!(FireEventMessage::decode(&encoded).unwrap(), msg);
    }

    #[test]
    fn assignment_round_trips() {
        let msg = AssignmentMessage {
            event: FireEventMessage {
                time: "14:03:15".into(),
                zone_id: 1,
                kind: "FIRE_DETECTED".into(),
                severity: Severity::Low,
                error: None,
            },
            assigned_drone_id: 7,
        };
        let encoded = msg.encode();
        assert_eq!(encoded, "14:03:15 1 FIRE_DETECTED Low 7");
        assert_eq!(AssignmentMessage::decode(&encoded).unwrap(), msg);
    }

    #[test]
    fn drone_status_round_trips_with_all_optional_fields() {
        let msg = DroneStatusMessage {
            drone_id: 1,
            state: "EN_ROUTE".into(),
            x: 5,
            y: 5,
            task: Some((1, Severity::Low)),
            fire_out: Some(2),
            capacity_remaining: Some(8.0),
        };
        let encoded = msg.encode();
        assert_eq!(
            encoded,
            "drone1 EN_ROUTE 5 5 TASK:1:Low FIRE_OUT:2 CAPACITY:8"
        );
        assert_eq!(DroneStatusMessage::decode(&encoded).unwrap(), msg);
    }

    #[test]
    fn minimal_drone_status_is_classified_correctly() {
        let text = "drone1 IDLE 0 0";
        assert!(DroneStatusMessage::looks_like_status(text));
        let decoded = DroneStatusMessage::decode(text).unwrap();
        assert_eq!(decoded.drone_id, 1);
        assert_eq!(decoded.state, "IDLE");
    }

    #[test]
    fn fire_event_is_not_classified_as_status() {
        let text = "14:03:15 1 FIRE_DETECTED Low";
        assert!(!DroneStatusMessage::looks_like_status(text));
    }

    #[test]
    fn zone_info_request_and_response_round_trip() {
        let req = encode_zone_info_request(3);
        assert_eq!(req, "ZONE_INFO_REQUEST:3");
        match decode_inbound(&req).unwrap() {
            InboundMessage::ZoneInfoRequest(z) => assert_eq!(z, 3),
            other => panic!("unexpected decode: {other:?}"),
        }

        let resp = encode_zone_info_response(3, Location::new(350, 300));
        assert_eq!(resp, "ZONE_INFO:3:350:300");
        match decode_inbound(&resp).unwrap() {
            InboundMessage::ZoneInfoResponse { zone_id, cx, cy } => {
                assert_eq!(zone_id, 3);
                assert_eq!(cx, 350);
                assert_eq!(cy, 300);
            }
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn error_token_excludes_none() {
        for _ in 0..50 {
            let resolved = resolve_error_token("ERROR").unwrap();
            assert!(resolved.is_some());
        }
        assert_eq!(resolve_error_token("NONE").unwrap(), None);
    }

    #[test]
    fn malformed_datagram_is_reported_not_panicked() {
        assert!(FireEventMessage::decode("garbage").is_err());
        assert!(decode_inbound("garbage").is_err());
    }
}
