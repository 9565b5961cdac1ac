use crate::model::{Candle, IndicatorPoint, IndicatorSeries};

/// 지표 시리즈 앞을 화이트스페이스로 채워 부모 캔들 시리즈와 정렬
///
/// 시리즈의 첫 시각보다 앞선 모든 캔들 시각에 값 없는 점을 붙입니다.
/// 시리즈가 이미 첫 캔들 시각 이전(또는 같은 시각)에 시작하면 그대로 반환합니다.
/// 빈 시리즈는 전체 캔들 시각의 화이트스페이스가 됩니다.
///
/// # Arguments
/// * `full_data` - 전체 캔들 데이터 (시간 오름차순)
/// * `series` - 더 짧은 지표 시리즈
pub fn pad_with_whitespace<C: Candle>(
    full_data: &[C],
    series: &[IndicatorPoint],
) -> IndicatorSeries {
    let Some(first_candle) = full_data.first() else {
        return series.to_vec();
    };

    let start = match series.first() {
        Some(point) if point.time <= first_candle.time() => return series.to_vec(),
        Some(point) => point.time,
        None => i64::MAX,
    };

    let mut padded: IndicatorSeries = full_data
        .iter()
        .map(|candle| candle.time())
        .take_while(|time| *time < start)
        .map(IndicatorPoint::whitespace)
        .collect();
    padded.extend_from_slice(series);
    padded
}
