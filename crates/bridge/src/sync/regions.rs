//! Source region id to Target state code table.

use std::collections::HashMap;

use tracing::warn;

use profile_bridge_core::{SourceRegionId, TargetStateCode};

/// Region lookup with an explicit fallback for unmapped regions.
#[derive(Debug, Clone, Default)]
pub struct RegionTable {
    codes: HashMap<SourceRegionId, TargetStateCode>,
    fallback: TargetStateCode,
}

impl RegionTable {
    #[must_use]
    pub const fn new(
        codes: HashMap<SourceRegionId, TargetStateCode>,
        fallback: TargetStateCode,
    ) -> Self {
        Self { codes, fallback }
    }

    /// Target state code for a Source region, or the fallback.
    ///
    /// Every fallback use is logged.
    #[must_use]
    pub fn state_for(&self, region: Option<SourceRegionId>) -> TargetStateCode {
        if let Some(code) = region.and_then(|id| self.codes.get(&id)) {
            return *code;
        }
        warn!(
            region_id = region.map(|id| id.as_i32()),
            fallback = %self.fallback,
            "Unmapped region, using fallback state code"
        );
        self.fallback
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
