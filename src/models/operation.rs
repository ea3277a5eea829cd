use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationType {
    Move,
    Copy,
    CreateDir,
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Move => write!(f, "move"),
            Self::Copy => write!(f, "copy"),
            Self::CreateDir => write!(f, "create_dir"),
        }
    }
}

impl std::str::FromStr for OperationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "move" => Ok(Self::Move),
            "copy" => Ok(Self::Copy),
            "create_dir" => Ok(Self::CreateDir),
            _ => Err(format!("unknown operation type: {s}")),
        }
    }
}

/// One journaled file-system effect of a materialization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    pub operation_id: String,
    pub batch_id: String,
    pub operation_type: OperationType,
    /// Empty for `CreateDir`.
    pub source_path: String,
    pub destination_path: String,
    pub executed_at: String,
    pub undone: bool,
}
