//! Authoritative layout store
//!
//! The store owns the durable list of [`PlacedObject`] records and the active
//! colour. The editor only reads snapshots and dispatches [`LayoutIntent`]s; it
//! never treats its own scene nodes as the source of truth.
//!
//! [`MemoryStore`] is the in-process implementation used by the application and
//! the tests. It applies intents synchronously and bumps a revision counter on
//! every mutation so the editor can detect external rebuilds cheaply.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};

/// 24-bit RGB colour, stored as `0xRRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub u32);

impl Color {
    pub const GREEN: Color = Color(0x00ff00);
    pub const BLUE: Color = Color(0x0000ff);
    pub const PURPLE: Color = Color(0x800080);
    pub const YELLOW: Color = Color(0xffff00);
    pub const DEFAULT_ACTIVE: Color = Color(0x0070f3);

    pub fn hex(self) -> u32 {
        self.0 & 0xff_ffff
    }

    /// Linear 0..1 components, alpha appended
    pub fn to_rgba(self, alpha: f32) -> [f32; 4] {
        let hex = self.hex();
        [
            ((hex >> 16) & 0xff) as f32 / 255.0,
            ((hex >> 8) & 0xff) as f32 / 255.0,
            (hex & 0xff) as f32 / 255.0,
            alpha,
        ]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.hex())
    }
}

/// Kinds of object prototype that can be dragged from the palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrototypeKind {
    /// Unit cube primitive
    #[default]
    Square,
    /// Multi-mesh model loaded from an OBJ file
    Sofa,
}

impl PrototypeKind {
    pub const ALL: [PrototypeKind; 2] = [PrototypeKind::Square, PrototypeKind::Sofa];

    pub fn label(self) -> &'static str {
        match self {
            PrototypeKind::Square => "Square",
            PrototypeKind::Sofa => "Sofa",
        }
    }
}

impl fmt::Display for PrototypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrototypeKind::Square => f.write_str("square"),
            PrototypeKind::Sofa => f.write_str("sofa"),
        }
    }
}

/// Record position quantised to half-grid units.
///
/// Placements land on integer (x, z) cells with a half-integer resting height,
/// so doubling every coordinate keeps the key exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionKey {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl PositionKey {
    pub fn from_position(x: f32, y: f32, z: f32) -> Self {
        Self {
            x: (x * 2.0).round() as i32,
            y: (y * 2.0).round() as i32,
            z: (z * 2.0).round() as i32,
        }
    }
}

/// A committed placement, as persisted by the store
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacedObject {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub color: Color,
    #[serde(default)]
    pub kind: PrototypeKind,
}

impl PlacedObject {
    pub fn new(position: [f32; 3], color: Color, kind: PrototypeKind) -> Self {
        Self {
            x: position[0],
            y: position[1],
            z: position[2],
            color,
            kind,
        }
    }

    pub fn position(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    pub fn key(&self) -> PositionKey {
        PositionKey::from_position(self.x, self.y, self.z)
    }
}

/// Mutation requests dispatched by the editor
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutIntent {
    AddRecord(PlacedObject),
    RemoveRecord(PositionKey),
    RecolorRecord { index: usize, color: Color },
    SetActiveColor(Color),
    Reset,
}

/// Read/dispatch interface of the authoritative store
pub trait LayoutStore {
    /// Snapshot of the full record list
    fn records(&self) -> Vec<PlacedObject>;

    /// The live active colour, read at the moment of use
    fn active_color(&self) -> Color;

    /// Monotonic counter bumped by every mutation of the record list
    fn revision(&self) -> u64;

    /// Fire-and-forget mutation request
    fn dispatch(&mut self, intent: LayoutIntent);
}

/// In-memory store applying intents immediately
#[derive(Debug, Clone)]
pub struct MemoryStore {
    records: Vec<PlacedObject>,
    active_color: Color,
    default_color: Color,
    revision: u64,
}

impl MemoryStore {
    pub fn new(default_color: Color) -> Self {
        Self {
            records: Vec::new(),
            active_color: default_color,
            default_color,
            revision: 0,
        }
    }

    pub fn with_records(default_color: Color, records: Vec<PlacedObject>) -> Self {
        Self {
            records,
            ..Self::new(default_color)
        }
    }

    /// Reads a flat JSON record list; a missing file yields an empty store
    pub fn load_json(path: &Path, default_color: Color) -> Result<Self> {
        if !path.exists() {
            log::info!("layout file {} not found, starting empty", path.display());
            return Ok(Self::new(default_color));
        }

        let text = fs::read_to_string(path).map_err(|source| EditorError::Layout {
            path: path.to_path_buf(),
            source,
        })?;
        let records: Vec<PlacedObject> = serde_json::from_str(&text)?;
        log::info!("loaded {} records from {}", records.len(), path.display());
        Ok(Self::with_records(default_color, records))
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(&self.records)?;
        fs::write(path, text).map_err(|source| EditorError::Layout {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("saved {} records to {}", self.records.len(), path.display());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PlacedObject> {
        self.records.get(index)
    }

    /// Replaces the whole list, as an external writer would
    pub fn replace_records(&mut self, records: Vec<PlacedObject>) {
        self.records = records;
        self.revision += 1;
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Color::DEFAULT_ACTIVE)
    }
}

impl LayoutStore for MemoryStore {
    fn records(&self) -> Vec<PlacedObject> {
        self.records.clone()
    }

    fn active_color(&self) -> Color {
        self.active_color
    }

    fn revision(&self) -> u64 {
        self.revision
    }

    fn dispatch(&mut self, intent: LayoutIntent) {
        log::debug!("store intent: {:?}", intent);
        match intent {
            LayoutIntent::AddRecord(record) => {
                self.records.push(record);
                self.revision += 1;
            }
            LayoutIntent::RemoveRecord(key) => {
                match self.records.iter().position(|r| r.key() == key) {
                    Some(index) => {
                        self.records.remove(index);
                        self.revision += 1;
                    }
                    None => log::warn!("remove: no record at {:?}", key),
                }
            }
            LayoutIntent::RecolorRecord { index, color } => match self.records.get_mut(index) {
                Some(record) => {
                    record.color = color;
                    self.revision += 1;
                }
                None => log::warn!("recolor: index {} out of range", index),
            },
            LayoutIntent::SetActiveColor(color) => {
                self.active_color = color;
            }
            LayoutIntent::Reset => {
                self.records.clear();
                self.active_color = self.default_color;
                self.revision += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_key_is_exact_for_half_units() {
        let a = PositionKey::from_position(0.0, 0.5, 1.0);
        let b = PositionKey::from_position(0.0001, 0.4999, 1.0);
        assert_eq!(a, b);
        assert_eq!(a, PositionKey { x: 0, y: 1, z: 2 });
    }

    #[test]
    fn test_reducers() {
        let mut store = MemoryStore::default();
        let start = store.revision();

        store.dispatch(LayoutIntent::AddRecord(PlacedObject::new(
            [0.0, 0.5, 1.0],
            Color::GREEN,
            PrototypeKind::Square,
        )));
        store.dispatch(LayoutIntent::AddRecord(PlacedObject::new(
            [2.0, 0.5, 1.0],
            Color::GREEN,
            PrototypeKind::Square,
        )));
        assert_eq!(store.len(), 2);

        store.dispatch(LayoutIntent::RecolorRecord {
            index: 1,
            color: Color::BLUE,
        });
        assert_eq!(store.get(1).map(|r| r.color), Some(Color::BLUE));

        store.dispatch(LayoutIntent::RemoveRecord(PositionKey::from_position(
            0.0, 0.5, 1.0,
        )));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(0).map(|r| r.x), Some(2.0));
        assert_eq!(store.revision(), start + 4);

        // Out of range recolor and unknown removal leave the list alone
        store.dispatch(LayoutIntent::RecolorRecord {
            index: 7,
            color: Color::PURPLE,
        });
        store.dispatch(LayoutIntent::RemoveRecord(PositionKey::from_position(
            9.0, 0.5, 9.0,
        )));
        assert_eq!(store.len(), 1);
        assert_eq!(store.revision(), start + 4);
    }

    #[test]
    fn test_active_color_does_not_bump_revision() {
        let mut store = MemoryStore::default();
        let revision = store.revision();
        store.dispatch(LayoutIntent::SetActiveColor(Color::PURPLE));
        assert_eq!(store.active_color(), Color::PURPLE);
        assert_eq!(store.revision(), revision);

        store.dispatch(LayoutIntent::Reset);
        assert_eq!(store.active_color(), Color::DEFAULT_ACTIVE);
    }

    #[test]
    fn test_record_json_shape() {
        let record = PlacedObject::new([0.0, 0.5, 1.0], Color::GREEN, PrototypeKind::Square);
        let json = serde_json::to_value(record).unwrap();
        assert_eq!(json["color"], 0x00ff00);
        assert_eq!(json["kind"], "square");

        let parsed: PlacedObject =
            serde_json::from_str(r#"{"x":1,"y":0.5,"z":-2,"color":255}"#).unwrap();
        assert_eq!(parsed.kind, PrototypeKind::Square);
        assert_eq!(parsed.color, Color::BLUE);
    }

    #[test]
    fn test_color_components() {
        assert_eq!(Color::GREEN.to_rgba(1.0), [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(Color(0x0000ff).to_string(), "#0000ff");
    }
}
