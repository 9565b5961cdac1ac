pub mod ema;
pub mod sma;

use crate::model::{Candle, IndicatorSeries};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub use ema::ema;
pub use sma::sma;

/// 이동평균 계산 방식
///
/// 메인 차트에 항상 그려지는 이동평균선(생명선, 추세선 등)에 사용됩니다.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MAType {
    /// 단순이동평균 (Simple Moving Average)
    /// 모든 데이터에 동일한 가중치를 부여합니다.
    #[default]
    SMA,
    /// 지수이동평균 (Exponential Moving Average)
    /// 최근 데이터에 더 큰 가중치를 부여합니다.
    EMA,
}

impl MAType {
    /// 지정된 방식으로 이동평균 시리즈 계산
    ///
    /// # Arguments
    /// * `data` - 캔들 데이터 (시간 오름차순)
    /// * `period` - 이동평균 기간
    ///
    /// # Returns
    /// * `IndicatorSeries` - 이동평균 시리즈
    pub fn compute<C: Candle>(&self, data: &[C], period: usize) -> IndicatorSeries {
        match self {
            MAType::SMA => sma(data, period),
            MAType::EMA => ema(data, period),
        }
    }
}

impl Display for MAType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MAType::SMA => write!(f, "SMA"),
            MAType::EMA => write!(f, "EMA"),
        }
    }
}
