use crate::disk::AccessFlags;
use chrono::DateTime;
use chrono::Utc;
use core::fmt::Debug;

/// Provide OS specific methods
pub trait OSManager: Debug {
    fn current_time(&self) -> DateTime<Utc>;
}

/// Ownership and permissions given to objects added to an image.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AppendPolicy {
    pub owner: u16,
    pub group: u16,
    pub owner_access: AccessFlags,
    pub group_access: AccessFlags,
    pub other_access: AccessFlags,
}

impl Default for AppendPolicy {
    fn default() -> Self {
        return Self {
            owner: 0,
            group: 0,
            owner_access: AccessFlags::new(true, true, true, true),
            group_access: AccessFlags::new(true, true, false, false),
            other_access: AccessFlags::new(true, true, false, false),
        };
    }
}
