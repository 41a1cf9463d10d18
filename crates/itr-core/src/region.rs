//! Region templates and the field-to-box lookup.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geom::BoundingBox;
use crate::record::PageRange;

/// What a region is for. Drives the calibration overlay color and the
/// check-mark mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionClass {
    /// Record or table boundary, drawn for calibration only.
    Boundary,
    /// A value box written by the autofill mode.
    Field,
    /// A cell receiving a check glyph in the NA mode.
    CheckTarget,
}

/// Preset-configured region: record-relative page offset plus a box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionTemplate {
    /// Page offset within the record set, 0-based.
    pub page: usize,
    #[serde(rename = "box")]
    pub bounds: BoundingBox,
    pub class: RegionClass,
}

/// A region template bound to an absolute page index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocatedRegion {
    pub page: usize,
    pub bounds: BoundingBox,
    pub class: RegionClass,
}

/// Map a field name onto an absolute page and box for one record set.
///
/// `None` when the field has no configured template, or when the
/// template's page offset was truncated away by an incomplete trailing
/// record set. Either way the caller records SkippedNoRegion and moves
/// on; other fields are not blocked.
pub fn locate(
    regions: &BTreeMap<String, RegionTemplate>,
    field: &str,
    pages: PageRange,
) -> Option<LocatedRegion> {
    let template = regions.get(field)?;
    if !pages.contains_offset(template.page) {
        return None;
    }
    Some(LocatedRegion {
        page: pages.start + template.page,
        bounds: template.bounds,
        class: template.class,
    })
}

/// Every located region of one record set, for calibration overlays.
/// Field order follows the map's (sorted) iteration order.
pub fn locate_all<'a>(
    regions: &'a BTreeMap<String, RegionTemplate>,
    pages: PageRange,
) -> impl Iterator<Item = (&'a str, LocatedRegion)> + 'a {
    regions.iter().filter_map(move |(field, _)| {
        locate(regions, field, pages).map(|region| (field.as_str(), region))
    })
}
