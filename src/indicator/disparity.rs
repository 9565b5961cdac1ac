use crate::indicator::ma::sma;
use crate::indicator::utils::{finite_closes, join_on_time, to_series};
use crate::model::{Candle, IndicatorSeries};

/// 기준선 (괴리 없음)
pub const DISPARITY_BASELINE: f64 = 100.0;

/// 이격도: `100 * close / SMA(period)`
///
/// 종가와 이동평균이 모두 있는 시각에서만 값을 가지며, 100이 기준선입니다.
/// 이동평균이 0인 시각은 값이 정의되지 않으므로 제외됩니다.
pub fn disparity<C: Candle>(data: &[C], period: usize) -> IndicatorSeries {
    let closes = finite_closes(data);
    let average: Vec<(i64, f64)> = sma(data, period)
        .into_iter()
        .filter_map(|point| point.value.map(|value| (point.time, value)))
        .collect();

    to_series(join_on_time(&closes, &average, |close, ma| {
        DISPARITY_BASELINE * close / ma
    }))
}
