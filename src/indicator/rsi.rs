use crate::indicator::utils::{TimedValue, finite_closes, to_series};
use crate::model::{Candle, IndicatorSeries};

/// 평균 상승폭/하락폭으로부터 RSI 값 계산
///
/// 평균 하락폭이 0이면 100으로 정의합니다.
fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    (100.0 - (100.0 / (1.0 + rs))).clamp(0.0, 100.0)
}

/// 상대강도지수(RSI) 시리즈 계산 (Wilder 평활)
///
/// 처음 `period`개 변화량으로 평균 상승/하락폭을 구한 뒤,
/// 이후에는 `avg = (avg * (period - 1) + new) / period`로 갱신합니다.
/// 첫 값은 `period`번째 캔들(0부터 셈)의 시각에 찍힙니다.
///
/// # Arguments
/// * `data` - 캔들 데이터 (시간 오름차순)
/// * `period` - RSI 계산 기간 (일반적으로 14)
///
/// # Returns
/// * `IndicatorSeries` - 0~100 범위의 RSI 시리즈.
///   `period == 0`이거나 캔들이 `period + 1`개 미만이면 빈 시리즈
pub fn rsi<C: Candle>(data: &[C], period: usize) -> IndicatorSeries {
    let values = finite_closes(data);
    if period == 0 || values.len() <= period {
        return Vec::new();
    }

    let p = period as f64;
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    // 첫 번째 평균 게인/로스 계산
    for i in 1..=period {
        let change = values[i].1 - values[i - 1].1;
        if change > 0.0 {
            avg_gain += change;
        } else {
            avg_loss -= change;
        }
    }
    avg_gain /= p;
    avg_loss /= p;

    let mut result: Vec<TimedValue> = Vec::with_capacity(values.len() - period);
    result.push((values[period].0, rsi_value(avg_gain, avg_loss)));

    // 나머지 구간은 Wilder 방식으로 평활
    for i in period + 1..values.len() {
        let change = values[i].1 - values[i - 1].1;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        avg_gain = (avg_gain * (p - 1.0) + gain) / p;
        avg_loss = (avg_loss * (p - 1.0) + loss) / p;
        result.push((values[i].0, rsi_value(avg_gain, avg_loss)));
    }

    to_series(result)
}
