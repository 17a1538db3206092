//! Header and footer status banner.
//!
//! Connectivity and sync are hardwired: the intake form works offline-first and never queues
//! anything for upload, so the banner always reports online with nothing pending.

use crate::constants::{PRODUCT_LINE, SUPPORT_LINE};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusBanner {
    pub online: bool,
    pub pending_sync: u32,
    pub emergency_alerts: u32,
    pub product_line: String,
    pub support_line: String,
}

impl StatusBanner {
    pub fn new(emergency_alerts: u32) -> Self {
        Self {
            online: true,
            pending_sync: 0,
            emergency_alerts,
            product_line: PRODUCT_LINE.to_string(),
            support_line: SUPPORT_LINE.to_string(),
        }
    }

    /// The alert badge is only shown for a non-zero counter.
    pub fn shows_alert(&self) -> bool {
        self.emergency_alerts > 0
    }
}
