//! Release panel: download totals, pie slices and star-curve markers.

use serde::Serialize;

use super::render::{format_number, releases_html};
use crate::github::Release;
use crate::history::{nearest_value_before, parse_key, to_axis_series, AxisPoint, History, SampledHistory};

/// Distinct pie labels before the rest is folded into [`OTHERS_LABEL`].
pub const MAX_PIE_LABELS: usize = 9;

pub const OTHERS_LABEL: &str = "Others";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadSlice {
    pub label: String,
    pub downloads: u64,
}

/// A release drawn on the star curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleaseMarker {
    pub x: i64,
    pub y: u64,
    pub tag: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReleasePanel {
    /// Number of releases listed
    pub total: u64,
    pub total_downloads: u64,
    pub total_downloads_label: String,
    pub slices: Vec<DownloadSlice>,
    pub markers: Vec<ReleaseMarker>,
    pub history: History,
    pub series: Vec<AxisPoint>,
    pub html: String,
}

impl ReleasePanel {
    /// Assemble the panel. Markers are only placed when a star history exists.
    pub fn build(releases: &[Release], sampled: SampledHistory, stars: Option<&History>) -> Self {
        let total_downloads = releases.iter().map(Release::download_count).sum();

        Self {
            total: sampled.total,
            total_downloads,
            total_downloads_label: format_number(total_downloads),
            slices: download_slices(releases),
            markers: stars.map(|h| release_markers(releases, h)).unwrap_or_default(),
            series: to_axis_series(&sampled.history),
            history: sampled.history,
            html: releases_html(releases),
        }
    }
}

/// Downloads per release in listing order. Once [`MAX_PIE_LABELS`] labels
/// exist, later releases accumulate into [`OTHERS_LABEL`].
pub fn download_slices(releases: &[Release]) -> Vec<DownloadSlice> {
    let mut slices: Vec<DownloadSlice> = Vec::new();

    for release in releases {
        let label = if slices.len() >= MAX_PIE_LABELS {
            OTHERS_LABEL
        } else {
            release.tag_name.as_str()
        };
        let downloads = release.download_count();

        match slices.iter_mut().find(|s| s.label == label) {
            Some(slice) => slice.downloads += downloads,
            None => slices.push(DownloadSlice {
                label: label.to_string(),
                downloads,
            }),
        }
    }

    slices
}

/// Place each published release on the star curve.
///
/// Releases with no star sample within the lookback window are omitted.
pub fn release_markers(releases: &[Release], stars: &History) -> Vec<ReleaseMarker> {
    releases
        .iter()
        .filter_map(|release| {
            let ts = release.published_at.as_deref().or(release.created_at.as_deref())?;
            let x = parse_key(ts)?.timestamp_millis();
            let day = ts.get(..10)?;
            let y = nearest_value_before(stars, day)?.as_count()?;
            Some(ReleaseMarker {
                x,
                y,
                tag: release.tag_name.clone(),
            })
        })
        .collect()
}
