use crate::indicator::utils::{finite_closes, join_on_time, moving_average, to_series};
use crate::model::{Candle, HistogramPoint, IndicatorSeries};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// MACD 계산 파라미터
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MACDParams {
    /// 빠른 EMA 기간 (일반적으로 12)
    pub fast_period: usize,
    /// 느린 EMA 기간 (일반적으로 26)
    pub slow_period: usize,
    /// 시그널 라인 기간 (일반적으로 9)
    pub signal_period: usize,
}

impl Default for MACDParams {
    fn default() -> Self {
        MACDParams {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

impl Display for MACDParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{},{}",
            self.fast_period, self.slow_period, self.signal_period
        )
    }
}

impl MACDParams {
    /// 이 파라미터로 MACD 계산
    pub fn compute<C: Candle>(&self, data: &[C]) -> MACDOutput {
        macd(data, self.fast_period, self.slow_period, self.signal_period)
    }
}

/// MACD 계산 결과
///
/// 세 시리즈는 각각 자기 시간 도메인을 가지며,
/// 시그널 라인과 히스토그램은 MACD 라인보다 늦게 시작합니다.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MACDOutput {
    /// MACD 라인 (빠른 EMA - 느린 EMA)
    pub macd: IndicatorSeries,
    /// 시그널 라인 (MACD의 EMA)
    pub signal: IndicatorSeries,
    /// 히스토그램 (MACD - 시그널), 부호에 따라 2색 분류
    pub histogram: Vec<HistogramPoint>,
}

impl MACDOutput {
    pub fn is_empty(&self) -> bool {
        self.macd.is_empty()
    }
}

/// MACD(Moving Average Convergence Divergence) 계산
///
/// MACD는 두 개의 이동평균선(빠른 EMA와 느린 EMA)의 차이를 계산하고,
/// 이 값에 대한 시그널 라인(MACD의 EMA)을 제공하는 기술적 지표입니다.
///
/// # Arguments
/// * `data` - 캔들 데이터 (시간 오름차순)
/// * `fast_period` - 빠른 EMA 기간
/// * `slow_period` - 느린 EMA 기간
/// * `signal_period` - 시그널 라인 기간
///
/// # Returns
/// * `MACDOutput` - 기간이 0이거나 데이터가 부족하면 빈 결과
pub fn macd<C: Candle>(
    data: &[C],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> MACDOutput {
    if fast_period == 0 || slow_period == 0 || signal_period == 0 {
        return MACDOutput::default();
    }

    let closes = finite_closes(data);
    let fast_ema = moving_average::seeded_ema(&closes, fast_period);
    let slow_ema = moving_average::seeded_ema(&closes, slow_period);

    let macd_line = join_on_time(&fast_ema, &slow_ema, |fast, slow| fast - slow);
    let signal_line = moving_average::seeded_ema(&macd_line, signal_period);
    let histogram = join_on_time(&macd_line, &signal_line, |m, s| m - s)
        .into_iter()
        .map(|(time, value)| HistogramPoint::new(time, value))
        .collect();

    MACDOutput {
        macd: to_series(macd_line),
        signal: to_series(signal_line),
        histogram,
    }
}
