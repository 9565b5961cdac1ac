mod common_test_utils;

use chart_pane_core::indicator::disparity::DISPARITY_BASELINE;
use chart_pane_core::indicator::{
    build_cross_markers, disparity, ma_oscillator, macd, pad_with_whitespace, rsi, sma,
};
use chart_pane_core::model::{Bar, IndicatorPoint, MarkerShape};
use common_test_utils::{bars_from_closes, wave_bars};
use std::collections::HashSet;

fn values(series: &[IndicatorPoint]) -> Vec<f64> {
    series.iter().filter_map(|point| point.value).collect()
}

#[test]
fn test_sma_length_and_window_mean() {
    let data = wave_bars(50, 60);
    for period in 1..=60 {
        let result = sma(&data, period);
        assert_eq!(result.len(), (data.len() + 1).saturating_sub(period));

        for (offset, point) in result.iter().enumerate() {
            let window = &data[offset..offset + period];
            let mean = window.iter().map(|bar| bar.close).sum::<f64>() / period as f64;
            assert!((point.value.unwrap() - mean).abs() < 1e-9);
            assert_eq!(point.time, window[period - 1].time);
        }
    }
}

#[test]
fn test_sma_example() {
    let data = bars_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0], 1);
    assert_eq!(values(&sma(&data, 3)), vec![2.0, 3.0, 4.0]);
    assert!(sma(&data, 0).is_empty());
    assert!(sma(&data, 6).is_empty());
}

#[test]
fn test_rsi_bounds_and_extremes() {
    let data = wave_bars(200, 60);
    assert!(
        values(&rsi(&data, 14))
            .iter()
            .all(|value| (0.0..=100.0).contains(value))
    );

    let rising = bars_from_closes(&(1..=40).map(f64::from).collect::<Vec<_>>(), 60);
    assert!(values(&rsi(&rising, 14)).iter().all(|value| *value == 100.0));

    let falling = bars_from_closes(&(1..=40).rev().map(f64::from).collect::<Vec<_>>(), 60);
    assert!(values(&rsi(&falling, 14)).iter().all(|value| *value < 1e-9));
}

#[test]
fn test_macd_histogram_matches_lines() {
    let data = wave_bars(150, 60);
    let output = macd(&data, 12, 26, 9);
    assert!(!output.histogram.is_empty());

    for bar in &output.histogram {
        let m = output.macd.iter().find(|p| p.time == bar.time).unwrap();
        let s = output.signal.iter().find(|p| p.time == bar.time).unwrap();
        assert!((bar.value - (m.value.unwrap() - s.value.unwrap())).abs() < 1e-9);
    }
}

#[test]
fn test_oscillator_and_disparity_inner_join() {
    let data = wave_bars(120, 60);
    let fast: HashSet<i64> = sma(&data, 5).iter().map(|p| p.time).collect();
    let slow: HashSet<i64> = sma(&data, 20).iter().map(|p| p.time).collect();

    let oscillator = ma_oscillator(&data, 5, 20);
    assert!(!oscillator.is_empty());
    assert!(
        oscillator
            .iter()
            .all(|p| fast.contains(&p.time) && slow.contains(&p.time))
    );

    let ratio = disparity(&data, 20);
    assert!(ratio.iter().all(|p| slow.contains(&p.time)));
}

#[test]
fn test_disparity_is_baseline_when_close_equals_average() {
    let data = bars_from_closes(&[7.5; 30], 3600);
    let result = disparity(&data, 10);
    assert_eq!(result.len(), 21);
    assert!(result.iter().all(|p| p.value == Some(DISPARITY_BASELINE)));
}

#[test]
fn test_cross_markers_properties() {
    let a: Vec<IndicatorPoint> = (0..6).map(|i| IndicatorPoint::new(i, i as f64)).collect();
    assert!(build_cross_markers(&a, &a, "g", "d").is_empty());

    // 3 시점에서 a가 b(2.5)를 한 번 상향 돌파
    let b: Vec<IndicatorPoint> = (0..6).map(|i| IndicatorPoint::new(i, 2.5)).collect();
    let markers = build_cross_markers(&a, &b, "g", "d");
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].time, 3);
    assert_eq!(markers[0].shape, MarkerShape::ArrowUp);

    let reversed = build_cross_markers(&b, &a, "g", "d");
    assert_eq!(reversed.len(), 1);
    assert_eq!(reversed[0].shape, MarkerShape::ArrowDown);

    assert_eq!(markers, build_cross_markers(&a, &b, "g", "d"));
}

#[test]
fn test_pad_with_whitespace_properties() {
    let data = wave_bars(40, 60);
    let series = sma(&data, 10);
    let padded = pad_with_whitespace(&data, &series);

    assert_eq!(padded.len(), data.len());
    assert_eq!(padded[0].time, data[0].time);
    assert!(padded[..9].iter().all(IndicatorPoint::is_whitespace));
    assert_eq!(pad_with_whitespace(&data, &padded), padded);
}

#[test]
fn test_corrupt_bar_does_not_poison_window() {
    let mut data = wave_bars(60, 60);
    data[30] = Bar::synthetic(data[30].time, f64::NAN);

    assert!(values(&sma(&data, 5)).iter().all(|v| v.is_finite()));
    assert!(values(&rsi(&data, 14)).iter().all(|v| v.is_finite()));
    let output = macd(&data, 12, 26, 9);
    assert!(values(&output.macd).iter().all(|v| v.is_finite()));
    assert!(output.histogram.iter().all(|bar| bar.value.is_finite()));
}
