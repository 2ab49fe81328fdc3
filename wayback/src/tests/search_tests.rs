use chrono::{TimeZone, Utc};
use serde_json::json;

use crate::search::{flatten_points, sort_most_recent_first, CalendarEntry, CalendarPoint, Snapshot};

const BASE: &str = "https://web.archive.org";
const URL: &str = "http://example.com/";

fn point(value: serde_json::Value) -> CalendarPoint {
    serde_json::from_value(value).expect("calendar point fixture")
}

#[test]
fn flattens_aligned_capture_lists() {
    let points = [point(json!({
        "cnt": 2,
        "why": [["fallback"], ["live", "crawl"]],
        "st": [200, "301"],
        "ts": [20200101000000u64, 20200102000000u64]
    }))];

    let snapshots = flatten_points(BASE, URL, &points);

    assert_eq!(snapshots.len(), 2);
    assert_eq!(
        snapshots[0],
        Snapshot {
            url: format!("{BASE}/web/20200101000000/{URL}"),
            reason: "fallback".to_string(),
            status_code: 200,
            timestamp: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
        }
    );
    // Multi-part reasons are joined, string statuses coerced.
    assert_eq!(snapshots[1].reason, "livecrawl");
    assert_eq!(snapshots[1].status_code, 301);
}

#[test]
fn count_beyond_timestamps_skips_the_missing_entries() {
    let points = [point(json!({
        "cnt": 3,
        "why": [["a"], ["b"], ["c"]],
        "st": [200, 200, 200],
        "ts": [20200101000000u64, 20200102000000u64]
    }))];

    let snapshots = flatten_points(BASE, URL, &points);

    assert_eq!(snapshots.len(), 2);
}

#[test]
fn missing_reason_and_status_slots_get_defaults() {
    let points = [point(json!({
        "cnt": 2,
        "why": [["only one"]],
        "st": [null],
        "ts": [20200101000000u64, 20200102000000u64]
    }))];

    let snapshots = flatten_points(BASE, URL, &points);

    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0].reason, "only one");
    assert_eq!(snapshots[0].status_code, 0);
    assert_eq!(snapshots[1].reason, "");
    assert_eq!(snapshots[1].status_code, 0);
}

#[test]
fn unparseable_timestamps_skip_the_entry_not_the_search() {
    let points = [point(json!({
        "cnt": 3,
        "st": [200, 200, 200],
        // Month 13 cannot parse; the short value cannot either.
        "ts": [20201301000000u64, 999u64, 20200102000000u64]
    }))];

    let snapshots = flatten_points(BASE, URL, &points);

    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].url, format!("{BASE}/web/20200102000000/{URL}"));
}

#[test]
fn snapshots_sort_descending_for_any_input_order() {
    let orders = [[0usize, 1, 2], [2, 1, 0], [1, 2, 0], [0, 2, 1], [2, 0, 1], [1, 0, 2]];
    let stamps = [20200101000000u64, 20200102000000, 20200103000000];

    for order in orders {
        let ts: Vec<u64> = order.iter().map(|&i| stamps[i]).collect();
        let points = [point(json!({ "cnt": 3, "ts": ts }))];

        let mut snapshots = flatten_points(BASE, URL, &points);
        sort_most_recent_first(&mut snapshots);

        let sorted: Vec<_> = snapshots.iter().map(|s| s.timestamp).collect();
        assert!(
            sorted.windows(2).all(|pair| pair[0] > pair[1]),
            "not strictly descending for input order {order:?}: {sorted:?}"
        );
    }
}

#[test]
fn calendar_entries_accept_wrapped_and_flat_shapes() {
    let wrapped: CalendarEntry =
        serde_json::from_value(json!([[{ "cnt": 1, "ts": [20200101000000u64] }]])).unwrap();
    assert_eq!(wrapped.into_points().len(), 1);

    let flat: CalendarEntry =
        serde_json::from_value(json!([{ "cnt": 1, "ts": [20200101000000u64] }])).unwrap();
    assert_eq!(flat.into_points().len(), 1);
}

#[test]
fn null_and_empty_points_are_discarded() {
    let entry: CalendarEntry = serde_json::from_value(json!([[
        {},
        null,
        { "cnt": 0, "why": [], "st": [], "ts": [] },
        { "cnt": 1, "ts": [20200101000000u64] }
    ]]))
    .unwrap();

    assert_eq!(entry.into_points().len(), 1);
}

#[test]
fn only_the_first_wrapping_layer_is_read() {
    let entry: CalendarEntry = serde_json::from_value(json!([
        [{ "cnt": 1, "ts": [20200101000000u64] }],
        [{ "cnt": 1, "ts": [20200102000000u64] }]
    ]))
    .unwrap();

    assert_eq!(entry.into_points().len(), 1);
}
