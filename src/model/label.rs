//! Free-form canvas annotations.

use serde::{Deserialize, Serialize};

use crate::types::{LabelId, Position};

/// Text alignment of a label's content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

/// A cosmetic annotation placed on the workflow canvas.
///
/// Labels never participate in execution, and edge validation rejects any
/// edge endpoint that names one.
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub id: LabelId,
    pub content: String,
    pub alignment: Alignment,
    pub position: Position,
}
