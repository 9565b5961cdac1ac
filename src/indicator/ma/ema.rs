use crate::indicator::utils::{finite_closes, moving_average, to_series};
use crate::model::{Candle, IndicatorSeries};

/// 지수이동평균(EMA) 시리즈 계산
///
/// 처음 `period`개 종가의 SMA로 시드한 뒤 `alpha = 2 / (period + 1)`로 평활화합니다.
pub fn ema<C: Candle>(data: &[C], period: usize) -> IndicatorSeries {
    to_series(moving_average::seeded_ema(&finite_closes(data), period))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Bar;

    #[test]
    fn test_ema_constant_series() {
        let data: Vec<Bar> = (0..10).map(|i| Bar::synthetic(i, 7.0)).collect();
        let result = ema(&data, 4);
        assert_eq!(result.len(), 7);
        assert!(
            result
                .iter()
                .all(|p| p.value.is_some_and(|v| (v - 7.0).abs() < 1e-9))
        );
    }

    #[test]
    fn test_ema_reacts_to_recent_values() {
        let mut data: Vec<Bar> = (0..10).map(|i| Bar::synthetic(i, 10.0)).collect();
        data.push(Bar::synthetic(10, 20.0));
        let result = ema(&data, 3);
        let last = result.last().and_then(|p| p.value).unwrap();
        assert!(last > 10.0 && last < 20.0);
    }

    #[test]
    fn test_ema_insufficient_data() {
        let data = vec![Bar::synthetic(1, 1.0)];
        assert!(ema(&data, 2).is_empty());
    }
}
