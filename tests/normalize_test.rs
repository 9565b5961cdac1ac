use chart_pane_core::normalize_bars;
use serde_json::json;

#[test]
fn test_descending_input_is_returned_ascending() {
    let raw = vec![
        json!({"time": 300, "close": 3}),
        json!({"time": 200, "close": 2}),
        json!({"time": 100, "close": 1}),
    ];
    let times: Vec<i64> = normalize_bars(&raw).iter().map(|bar| bar.time).collect();
    assert_eq!(times, vec![100, 200, 300]);
}

#[test]
fn test_duplicates_keep_last_record() {
    let raw = vec![json!({"t": 0}), json!({"time": 1, "close": 10}), json!({"time": 1, "close": 20})];
    let bars = normalize_bars(&raw);
    assert_eq!(bars.len(), 1);
    assert_eq!(bars[0].close, 20.0);
}

#[test]
fn test_incomplete_records_are_dropped_not_zeroed() {
    let raw = vec![
        json!({"time": 1, "open": 1, "high": 2, "low": 0.5}),
        json!({"time": 2, "volume": 100}),
        json!({"close": 5}),
        json!({"time": -5, "close": 5}),
        json!({"time": "2024-02-30", "close": 5}),
        json!({"time": 3, "open": 1, "high": 2, "low": 0.5, "close": 1.5}),
        json!({"time": 4, "open": 10, "high": 12, "close": 11}),
        json!({"time": 5, "high": 12, "close": 11}),
    ];
    let bars = normalize_bars(&raw);
    assert_eq!(bars.len(), 1);
    assert_eq!(bars[0].time, 3);
    assert_eq!(bars[0].open, 1.0);
    assert!(bars.iter().all(|bar| bar.close != 0.0));
}

#[test]
fn test_mixed_sources_share_one_time_axis() {
    let raw = vec![
        json!({"Timestamp": 1_704_153_600_000i64, "Open": 1, "High": 2, "Low": 1, "Close": 2}),
        json!({"DATE": "2024-01-01", "Index": 55}),
        json!({"date": "2024-01-03T00:00:00Z", "yield": 4.1, "volume": 7}),
    ];
    let bars = normalize_bars(&raw);
    let times: Vec<i64> = bars.iter().map(|bar| bar.time).collect();
    assert_eq!(times, vec![1_704_067_200, 1_704_153_600, 1_704_240_000]);

    // 값만 있는 레코드는 OHLC가 모두 같은 합성 Bar
    assert_eq!(bars[0].open, 55.0);
    assert_eq!(bars[0].high, 55.0);
    assert_eq!(bars[2].volume, Some(7.0));
}

#[test]
fn test_empty_and_invalid_input() {
    assert!(normalize_bars(&[]).is_empty());
    assert!(normalize_bars(&[json!(null), json!("bar"), json!([1, 2])]).is_empty());
}
