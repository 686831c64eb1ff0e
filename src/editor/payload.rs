//! Drag payload protocol
//!
//! A palette drag carries `{ "type": "<kind>" }` as JSON under a dedicated
//! format key. Transfers under any other key belong to someone else and are
//! ignored.

use serde::{Deserialize, Serialize};

use crate::store::PrototypeKind;

pub const DRAG_FORMAT: &str = "application/x-plinth-prototype";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragPayload {
    #[serde(rename = "type")]
    pub kind: PrototypeKind,
}

/// One entry of a native drag/drop data channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragTransfer {
    pub format: String,
    pub data: String,
}

impl DragTransfer {
    pub fn new(format: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            data: data.into(),
        }
    }

    /// Transfer started by dragging a palette entry
    pub fn for_prototype(kind: PrototypeKind) -> Self {
        let data = serde_json::json!({ "type": kind }).to_string();
        Self::new(DRAG_FORMAT, data)
    }

    /// The recognised payload, if this transfer carries one
    pub fn payload(&self) -> Option<DragPayload> {
        if self.format != DRAG_FORMAT {
            return None;
        }
        match serde_json::from_str(&self.data) {
            Ok(payload) => Some(payload),
            Err(err) => {
                log::debug!("ignoring drag payload {:?}: {}", self.data, err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_transfer_is_recognised() {
        let transfer = DragTransfer::for_prototype(PrototypeKind::Sofa);
        assert_eq!(transfer.data, r#"{"type":"sofa"}"#);
        assert_eq!(
            transfer.payload(),
            Some(DragPayload {
                kind: PrototypeKind::Sofa
            })
        );
    }

    #[test]
    fn test_foreign_transfers_are_ignored() {
        assert!(DragTransfer::new("text/plain", r#"{"type":"square"}"#)
            .payload()
            .is_none());
        assert!(DragTransfer::new(DRAG_FORMAT, r#"{"type":"lamp"}"#)
            .payload()
            .is_none());
        assert!(DragTransfer::new(DRAG_FORMAT, "square").payload().is_none());
    }
}
