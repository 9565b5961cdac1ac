use crate::indicator::utils::{finite_closes, moving_average, to_series};
use crate::model::{Candle, IndicatorSeries};

/// 단순이동평균(SMA) 시리즈 계산
///
/// 누적합 슬라이딩 윈도우로 계산하며, 각 값은 직전 `period`개 종가의 산술평균입니다.
/// 값은 윈도우 마지막 캔들의 시각에 찍힙니다.
///
/// # Arguments
/// * `data` - 캔들 데이터 (시간 오름차순)
/// * `period` - 계산 기간
///
/// # Returns
/// * `IndicatorSeries` - 길이 `max(0, n - period + 1)`의 시리즈
///   (`period == 0`이거나 데이터가 부족하면 빈 시리즈)
pub fn sma<C: Candle>(data: &[C], period: usize) -> IndicatorSeries {
    to_series(moving_average::sliding_sma(&finite_closes(data), period))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Bar;

    fn bars(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, close)| Bar::synthetic(i as i64 + 1, *close))
            .collect()
    }

    #[test]
    fn test_sma_example() {
        let values: Vec<f64> = sma(&bars(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3)
            .iter()
            .filter_map(|p| p.value)
            .collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_sma_length() {
        let data = bars(&[3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0]);
        for period in 0..12 {
            let expected = if period == 0 {
                0
            } else {
                (data.len() + 1).saturating_sub(period)
            };
            assert_eq!(sma(&data, period).len(), expected, "period {}", period);
        }
    }

    #[test]
    fn test_sma_timestamped_at_window_end() {
        let result = sma(&bars(&[1.0, 2.0, 3.0]), 2);
        assert_eq!(result[0].time, 2);
        assert_eq!(result[1].time, 3);
    }

    #[test]
    fn test_sma_skips_non_finite_close() {
        let mut data = bars(&[1.0, 2.0, 3.0, 4.0]);
        data[1].close = f64::NAN;
        let result = sma(&data, 2);
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|p| p.value.is_some_and(f64::is_finite)));
    }
}
