use shared::types::{Location, Zone};
use shared::DroneNetError;
use std::collections::HashMap;
use std::path::Path;

/// Zone geometry, loaded once at startup and read-only thereafter (spec §5).
/// Fire flag and severity per zone are owned separately by the scheduler's
/// fire-tracking state since they are mutable (spec §3).
#[derive(Debug, Default, Clone)]
pub struct ZoneRegistry {
    zones: HashMap<u32, Zone>,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self {
            zones: HashMap::new(),
        }
    }

    pub fn insert(&mut self, zone: Zone) {
        self.zones.insert(zone.id, zone);
    }

    /// Looks up a zone's center, falling back to the deterministic grid
    /// formula for unknown zones (spec §7 "Unknown zone").
    pub fn center_of(&self, zone_id: u32) -> Location {
        self.zones
            .get(&zone_id)
            .map(|z| z.center())
            .unwrap_or_else(|| Zone::fallback_center(zone_id))
    }

    pub fn get(&self, zone_id: u32) -> Option<&Zone> {
        self.zones.get(&zone_id)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Parses `zones.txt` (spec §6): `zoneId x1 y1 x2 y2` per non-blank,
    /// non-`#` line, origin top-left.
    pub fn parse(contents: &str) -> Self {
        let mut registry = ZoneRegistry::new();
        for (line_no, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match Self::parse_line(line) {
                Ok(zone) => registry.insert(zone),
                Err(e) => {
                    tracing::warn!("zones.txt:{}: {e}", line_no + 1);
                }
            }
        }
        registry
    }

    fn parse_line(line: &str) -> Result<Zone, DroneNetError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(DroneNetError::Protocol(format!(
                "expected 5 fields, got {}: {line}",
                fields.len()
            )));
        }
        let id: u32 = fields[0]
            .parse()
            .map_err(|_| DroneNetError::Protocol(format!("bad zone id: {line}")))?;
        let x1: i64 = fields[1]
            .parse()
            .map_err(|_| DroneNetError::Protocol(format!("bad x1: {line}")))?;
        let y1: i64 = fields[2]
            .parse()
            .map_err(|_| DroneNetError::Protocol(format!("bad y1: {line}")))?;
        let x2: i64 = fields[3]
            .parse()
            .map_err(|_| DroneNetError::Protocol(format!("bad x2: {line}")))?;
        let y2: i64 = fields[4]
            .parse()
            .map_err(|_| DroneNetError::Protocol(format!("bad y2: {line}")))?;
        Ok(Zone::new(id, Location::new(x1, y1), Location::new(x2, y2)))
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DroneNetError> {
        let contents = tokio::fs::read_to_string(path).await?;
        Ok(Self::parse(&contents))
    }
}
