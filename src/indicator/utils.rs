use crate::model::{Candle, IndicatorPoint, IndicatorSeries};

/// 시각과 값의 쌍. 지표 계산 내부에서 사용하는 표현
pub(crate) type TimedValue = (i64, f64);

/// 공통 이동평균 계산 함수들
pub mod moving_average {
    use super::TimedValue;

    /// 지수이동평균(EMA) 계산을 위한 알파값 계산
    ///
    /// # Arguments
    /// * `period` - EMA 기간
    ///
    /// # Returns
    /// * `f64` - 알파값 (평활화 계수)
    pub fn calculate_ema_alpha(period: usize) -> f64 {
        2.0 / (period + 1) as f64
    }

    /// 지수이동평균(EMA) 한 스텝 계산
    ///
    /// # Arguments
    /// * `current_price` - 현재 가격
    /// * `previous_ema` - 이전 EMA 값
    /// * `alpha` - 평활화 계수
    ///
    /// # Returns
    /// * `f64` - 계산된 EMA 값
    pub fn calculate_ema_step(current_price: f64, previous_ema: f64, alpha: f64) -> f64 {
        alpha * current_price + (1.0 - alpha) * previous_ema
    }

    /// 누적합 슬라이딩 윈도우 단순이동평균
    ///
    /// 윈도우 마지막 시각에 값이 찍히며, 결과 길이는 `values.len() - period + 1`입니다.
    /// 데이터가 부족하거나 `period == 0`이면 빈 벡터를 반환합니다.
    pub(crate) fn sliding_sma(values: &[TimedValue], period: usize) -> Vec<TimedValue> {
        if period == 0 || values.len() < period {
            return Vec::new();
        }

        let mut result = Vec::with_capacity(values.len() - period + 1);
        let mut sum: f64 = values[..period].iter().map(|(_, v)| v).sum();
        result.push((values[period - 1].0, sum / period as f64));

        for i in period..values.len() {
            sum += values[i].1 - values[i - period].1;
            result.push((values[i].0, sum / period as f64));
        }

        result
    }

    /// SMA로 시드한 지수이동평균
    ///
    /// 첫 값은 처음 `period`개 값의 평균이며 `period - 1`번째 시각에 찍힙니다.
    pub(crate) fn seeded_ema(values: &[TimedValue], period: usize) -> Vec<TimedValue> {
        if period == 0 || values.len() < period {
            return Vec::new();
        }

        let alpha = calculate_ema_alpha(period);
        let seed = values[..period].iter().map(|(_, v)| v).sum::<f64>() / period as f64;

        let mut result = Vec::with_capacity(values.len() - period + 1);
        result.push((values[period - 1].0, seed));

        let mut ema = seed;
        for &(time, value) in &values[period..] {
            ema = calculate_ema_step(value, ema, alpha);
            result.push((time, ema));
        }

        result
    }
}

/// 종가가 유한한 캔들만 (시각, 종가)로 추출
///
/// 손상된 캔들 하나가 이후 윈도우 전체를 NaN으로 오염시키지 않도록 걸러냅니다.
pub(crate) fn finite_closes<C: Candle>(data: &[C]) -> Vec<TimedValue> {
    data.iter()
        .map(|candle| (candle.time(), candle.close_price()))
        .filter(|(_, close)| close.is_finite())
        .collect()
}

/// 값이 있고 유한한 점만 추출 (화이트스페이스 제외)
pub(crate) fn finite_points(series: &[IndicatorPoint]) -> Vec<TimedValue> {
    series
        .iter()
        .filter_map(|point| point.value.map(|value| (point.time, value)))
        .filter(|(_, value)| value.is_finite())
        .collect()
}

pub(crate) fn to_series(values: Vec<TimedValue>) -> IndicatorSeries {
    values
        .into_iter()
        .filter(|(_, value)| value.is_finite())
        .map(|(time, value)| IndicatorPoint::new(time, value))
        .collect()
}

/// 두 시간 오름차순 시리즈를 공통 시각으로만 결합 (inner join)
///
/// 한쪽에만 있는 시각은 버리며, 결합 결과가 유한하지 않으면 해당 점도 버립니다.
pub(crate) fn join_on_time(
    left: &[TimedValue],
    right: &[TimedValue],
    combine: impl Fn(f64, f64) -> f64,
) -> Vec<TimedValue> {
    let mut result = Vec::with_capacity(left.len().min(right.len()));
    let (mut i, mut j) = (0, 0);

    while i < left.len() && j < right.len() {
        let (lt, lv) = left[i];
        let (rt, rv) = right[j];
        if lt < rt {
            i += 1;
        } else if lt > rt {
            j += 1;
        } else {
            let value = combine(lv, rv);
            if value.is_finite() {
                result.push((lt, value));
            }
            i += 1;
            j += 1;
        }
    }

    result
}

/// 지표 시리즈 두 개를 공통 시각으로 결합
pub fn inner_join(
    left: &[IndicatorPoint],
    right: &[IndicatorPoint],
    combine: impl Fn(f64, f64) -> f64,
) -> IndicatorSeries {
    to_series(join_on_time(
        &finite_points(left),
        &finite_points(right),
        combine,
    ))
}
