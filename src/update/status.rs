//! Update lifecycle status

use serde::{Deserialize, Serialize};

/// Lifecycle state of an update.
///
/// Codes are persisted durably and match rows written by earlier releases.
/// Codes 0, 2 and 4 belonged to retired states and stay reserved; they must
/// never be reassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum UpdateStatus {
    /// Every asset, launch asset included, is present.
    Ready,
    /// Manifest resolved, assets not yet confirmed present.
    Pending,
    /// Assets are being copied from the app's embedded resources.
    Embedded,
    /// Served by a local developer tool; never becomes `Ready` or `Pending`.
    Development,
}

impl UpdateStatus {
    pub const RESERVED_CODES: [i64; 3] = [0, 2, 4];

    pub fn code(self) -> i64 {
        match self {
            UpdateStatus::Ready => 1,
            UpdateStatus::Pending => 3,
            UpdateStatus::Embedded => 5,
            UpdateStatus::Development => 6,
        }
    }
}

impl TryFrom<i64> for UpdateStatus {
    type Error = String;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(UpdateStatus::Ready),
            3 => Ok(UpdateStatus::Pending),
            5 => Ok(UpdateStatus::Embedded),
            6 => Ok(UpdateStatus::Development),
            c if Self::RESERVED_CODES.contains(&c) => {
                Err(format!("status code {} is reserved for a retired state", c))
            }
            c => Err(format!("unknown status code {}", c)),
        }
    }
}

impl From<UpdateStatus> for i64 {
    fn from(status: UpdateStatus) -> Self {
        status.code()
    }
}

impl std::fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Ready => write!(f, "ready"),
            Self::Embedded => write!(f, "embedded"),
            Self::Development => write!(f, "development"),
        }
    }
}
