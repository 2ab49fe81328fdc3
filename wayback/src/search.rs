use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::client::Client;
use crate::error::Result;

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// One point-in-time capture of a URL held by the Wayback Machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Playback URL of the capture, `<base>/web/<timestamp>/<url>`.
    pub url: String,
    /// Why the crawler took this capture, empty when not recorded.
    pub reason: String,
    /// HTTP status the crawler saw, 0 when not recorded.
    pub status_code: u16,
    pub timestamp: DateTime<Utc>,
}

/// Per-year crawl activity: 12 monthly capture counts per year.
#[derive(Debug, Deserialize)]
struct Sparkline {
    #[serde(default)]
    years: BTreeMap<i32, Vec<u64>>,
}

/// One month's aggregated capture data, all lists aligned by index.
#[derive(Debug, Deserialize)]
pub(crate) struct CalendarPoint {
    #[serde(default, rename = "cnt")]
    count: usize,
    #[serde(default, rename = "why")]
    whys: Vec<Vec<String>>,
    // Upstream mixes numbers and strings here.
    #[serde(default, rename = "st")]
    status_codes: Vec<serde_json::Value>,
    #[serde(default, rename = "ts")]
    timestamps: Vec<u64>,
}

impl CalendarPoint {
    fn is_empty(&self) -> bool {
        self.count == 0
            && self.whys.is_empty()
            && self.status_codes.is_empty()
            && self.timestamps.is_empty()
    }
}

/// The calendarcaptures payload encloses each point list in a redundant
/// single-element array. The upstream contract is undocumented, so accept
/// the unwrapped shape too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum CalendarEntry {
    Wrapped(Vec<Vec<Option<CalendarPoint>>>),
    Flat(Vec<Option<CalendarPoint>>),
}

impl CalendarEntry {
    pub(crate) fn into_points(self) -> Vec<CalendarPoint> {
        let slots = match self {
            CalendarEntry::Wrapped(layers) => layers.into_iter().next().unwrap_or_default(),
            CalendarEntry::Flat(slots) => slots,
        };
        slots
            .into_iter()
            .flatten()
            .filter(|point| !point.is_empty())
            .collect()
    }
}

impl Client {
    /// Search the Wayback Machine for snapshots of `url`, most recent first.
    pub fn search(&self, url: &str) -> Result<Vec<Snapshot>> {
        let safe = urlencoding::encode(url).into_owned();
        let sparkline = self.sparkline_for(&safe)?;
        let points = self.calendar_captures(&safe, &sparkline)?;

        let mut snapshots = flatten_points(&self.config.base_url, url, &points);
        sort_most_recent_first(&mut snapshots);

        Ok(snapshots)
    }

    fn sparkline_for(&self, safe_url: &str) -> Result<Sparkline> {
        let query_url = format!(
            "{}/__wb/sparkline?url={}&collection=web&output=json",
            self.config.base_url, safe_url
        );
        self.fetch_json(&query_url)
    }

    /// One calendarcaptures request per year with any recorded crawls; the
    /// response covers the whole year, so the remaining months are skipped.
    fn calendar_captures(
        &self,
        safe_url: &str,
        sparkline: &Sparkline,
    ) -> Result<Vec<CalendarPoint>> {
        let mut points = Vec::new();

        for (year, month_counts) in &sparkline.years {
            if !month_counts.iter().any(|&count| count > 0) {
                continue;
            }

            let query_url = format!(
                "{}/__wb/calendarcaptures?url={}&selected_year={}",
                self.config.base_url, safe_url, year
            );
            let entries: Vec<CalendarEntry> = self.fetch_json(&query_url)?;

            for entry in entries {
                points.extend(entry.into_points());
            }
        }

        Ok(points)
    }
}

/// Expand calendar points into one Snapshot per recorded capture.
///
/// Individually malformed entries (a missing timestamp slot, a timestamp
/// that does not parse) are skipped, never fatal.
pub(crate) fn flatten_points(base_url: &str, url: &str, points: &[CalendarPoint]) -> Vec<Snapshot> {
    let mut snapshots = Vec::new();

    for point in points {
        for i in 0..point.count {
            let Some(&ts) = point.timestamps.get(i) else {
                warn!("skipping capture of {url} with missing timestamp");
                continue;
            };

            let timestamp = match NaiveDateTime::parse_from_str(&ts.to_string(), TIMESTAMP_FORMAT) {
                Ok(naive) => naive.and_utc(),
                Err(_) => {
                    warn!("skipping capture of {url} after failed parse of timestamp {ts}");
                    continue;
                }
            };

            snapshots.push(Snapshot {
                url: format!("{}/web/{}/{}", base_url, ts, url),
                reason: point.whys.get(i).map(|parts| parts.concat()).unwrap_or_default(),
                status_code: point.status_codes.get(i).map_or(0, status_code_of),
                timestamp,
            });
        }
    }

    snapshots
}

pub(crate) fn sort_most_recent_first(snapshots: &mut [Snapshot]) {
    snapshots.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

fn status_code_of(value: &serde_json::Value) -> u16 {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|n| u16::try_from(n).ok())
            .unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}
