use crate::indicator::ma::sma;
use crate::indicator::utils::inner_join;
use crate::model::{Candle, IndicatorSeries};

/// 이동평균 오실레이터: `SMA(fast) - SMA(slow)`
///
/// 두 이동평균이 모두 있는 시각에서만 값을 가집니다 (inner join).
///
/// # Arguments
/// * `data` - 캔들 데이터 (시간 오름차순)
/// * `fast_period` - 단기 이동평균 기간
/// * `slow_period` - 장기 이동평균 기간
pub fn ma_oscillator<C: Candle>(
    data: &[C],
    fast_period: usize,
    slow_period: usize,
) -> IndicatorSeries {
    let fast = sma(data, fast_period);
    let slow = sma(data, slow_period);
    inner_join(&fast, &slow, |f, s| f - s)
}
