// 기술적 지표 엔진
// 모든 함수는 순수 함수이며, 시간 오름차순 캔들 데이터를 입력으로 받습니다.

pub mod cross;
pub mod disparity;
pub mod ma;
pub mod macd;
pub mod oscillator;
pub mod rsi;
pub mod utils;
pub mod whitespace;

use crate::config::IndicatorParams;
use crate::model::{Bar, Candle, CrossMarker, IndicatorSeries};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

pub use cross::{DEFAULT_CROSS_EPSILON, build_cross_markers, build_cross_markers_with_epsilon};
pub use disparity::disparity;
pub use ma::{ema, sma};
pub use macd::{MACDOutput, MACDParams, macd};
pub use oscillator::ma_oscillator;
pub use rsi::rsi;
pub use whitespace::pad_with_whitespace;

/// 보조 차트에 표시할 수 있는 지표 종류 (오버레이 상태)
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    /// 이동평균 오실레이터 (+ 골든/데드 크로스)
    MaOscillator,
    /// 상대강도지수
    Rsi,
    /// MACD
    Macd,
    /// 이격도
    Disparity,
    /// 공포/탐욕 지수 (외부 시리즈)
    #[serde(rename = "fg_index")]
    FearGreed,
}

impl IndicatorKind {
    /// 모든 지표 종류 (툴바 순서)
    pub const ALL: [IndicatorKind; 5] = [
        IndicatorKind::MaOscillator,
        IndicatorKind::Rsi,
        IndicatorKind::Macd,
        IndicatorKind::Disparity,
        IndicatorKind::FearGreed,
    ];

    /// 툴바 액션 키
    pub fn key(&self) -> &'static str {
        match self {
            IndicatorKind::MaOscillator => "ma_oscillator",
            IndicatorKind::Rsi => "rsi",
            IndicatorKind::Macd => "macd",
            IndicatorKind::Disparity => "disparity",
            IndicatorKind::FearGreed => "fg_index",
        }
    }
}

impl Display for IndicatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for IndicatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IndicatorKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("알 수 없는 지표 키: {}", s))
    }
}

/// 크로스 마커 스타일
#[derive(Debug, Clone, PartialEq)]
pub struct CrossStyle {
    pub up_color: String,
    pub down_color: String,
    pub epsilon: f64,
}

impl Default for CrossStyle {
    fn default() -> Self {
        CrossStyle {
            up_color: "#26a69a".to_owned(),
            down_color: "#ef5350".to_owned(),
            epsilon: DEFAULT_CROSS_EPSILON,
        }
    }
}

/// 미리 계산된 지표 한 종류의 결과
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorOutput {
    MaOscillator {
        fast: IndicatorSeries,
        slow: IndicatorSeries,
        oscillator: IndicatorSeries,
        /// 단기/장기 이동평균의 골든/데드 크로스
        markers: Vec<CrossMarker>,
    },
    Rsi {
        rsi: IndicatorSeries,
    },
    Macd {
        output: MACDOutput,
        /// MACD/시그널 크로스
        markers: Vec<CrossMarker>,
    },
    Disparity {
        disparity: IndicatorSeries,
    },
    FearGreed {
        index: IndicatorSeries,
    },
}

impl IndicatorOutput {
    pub fn kind(&self) -> IndicatorKind {
        match self {
            IndicatorOutput::MaOscillator { .. } => IndicatorKind::MaOscillator,
            IndicatorOutput::Rsi { .. } => IndicatorKind::Rsi,
            IndicatorOutput::Macd { .. } => IndicatorKind::Macd,
            IndicatorOutput::Disparity { .. } => IndicatorKind::Disparity,
            IndicatorOutput::FearGreed { .. } => IndicatorKind::FearGreed,
        }
    }

    /// 범례 값과 펄스 표시 위치의 기준이 되는 주 시리즈
    pub fn primary_series(&self) -> &IndicatorSeries {
        match self {
            IndicatorOutput::MaOscillator { oscillator, .. } => oscillator,
            IndicatorOutput::Rsi { rsi } => rsi,
            IndicatorOutput::Macd { output, .. } => &output.macd,
            IndicatorOutput::Disparity { disparity } => disparity,
            IndicatorOutput::FearGreed { index } => index,
        }
    }

    pub fn markers(&self) -> &[CrossMarker] {
        match self {
            IndicatorOutput::MaOscillator { markers, .. } | IndicatorOutput::Macd { markers, .. } => {
                markers
            }
            _ => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.primary_series().is_empty()
    }
}

/// 한 보조 차트의 지표 결과 컬렉션
///
/// 마운트 시점에 모든 지표를 한 번에 계산해 두므로,
/// 툴바 전환은 재계산 없이 이미 계산된 결과만 다시 그립니다.
#[derive(Debug, Clone)]
pub struct IndicatorSet {
    /// 이 컬렉션의 이름
    name: String,
    /// 순서가 유지되는 키 목록
    kinds: Vec<IndicatorKind>,
    /// 키-값 쌍으로 저장된 지표 결과
    data: HashMap<IndicatorKind, IndicatorOutput>,
}

impl Display for IndicatorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IndicatorSet({})", self.name)
    }
}

impl IndicatorSet {
    /// 새 컬렉션 생성
    pub fn new(
        name: String,
        kinds: Vec<IndicatorKind>,
        data: HashMap<IndicatorKind, IndicatorOutput>,
    ) -> Self {
        IndicatorSet { name, kinds, data }
    }

    /// 캔들 데이터에서 모든 지표를 계산
    ///
    /// # Arguments
    /// * `name` - 컬렉션 이름 (로그용)
    /// * `data` - 캔들 데이터 (시간 오름차순)
    /// * `params` - 이 차트의 타임프레임 계열 파라미터
    /// * `style` - 크로스 마커 스타일
    /// * `fear_greed` - 공포/탐욕 지수 시리즈 (없으면 해당 지표 생략)
    ///
    /// # Returns
    /// * `IndicatorSet` - 계산된 지표 컬렉션
    pub fn build<C: Candle>(
        name: &str,
        data: &[C],
        params: &IndicatorParams,
        style: &CrossStyle,
        fear_greed: Option<&[Bar]>,
    ) -> Self {
        let mut kinds = Vec::with_capacity(IndicatorKind::ALL.len());
        let mut outputs = HashMap::new();

        let osc = &params.ma_oscillator;
        let fast = sma(data, osc.fast_period);
        let slow = sma(data, osc.slow_period);
        let oscillator = ma_oscillator(data, osc.fast_period, osc.slow_period);
        let markers = build_cross_markers_with_epsilon(
            &fast,
            &slow,
            &style.up_color,
            &style.down_color,
            style.epsilon,
        );
        outputs.insert(
            IndicatorKind::MaOscillator,
            IndicatorOutput::MaOscillator {
                fast,
                slow,
                oscillator,
                markers,
            },
        );

        outputs.insert(
            IndicatorKind::Rsi,
            IndicatorOutput::Rsi {
                rsi: rsi(data, params.rsi_period),
            },
        );

        let output = params.macd.compute(data);
        let markers = build_cross_markers_with_epsilon(
            &output.macd,
            &output.signal,
            &style.up_color,
            &style.down_color,
            style.epsilon,
        );
        outputs.insert(IndicatorKind::Macd, IndicatorOutput::Macd { output, markers });

        outputs.insert(
            IndicatorKind::Disparity,
            IndicatorOutput::Disparity {
                disparity: disparity(data, params.disparity_period),
            },
        );

        if let Some(series) = fear_greed {
            outputs.insert(
                IndicatorKind::FearGreed,
                IndicatorOutput::FearGreed {
                    index: utils::to_series(utils::finite_closes(series)),
                },
            );
        }

        for kind in IndicatorKind::ALL {
            if outputs.contains_key(&kind) {
                kinds.push(kind);
            }
        }

        debug!(
            "{} 지표 계산 완료: 캔들 {}개, 지표 {:?}",
            name,
            data.len(),
            kinds
        );
        IndicatorSet::new(name.to_owned(), kinds, outputs)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 키 목록 참조 반환
    pub fn kinds(&self) -> &[IndicatorKind] {
        &self.kinds
    }

    /// 지정된 종류의 결과 반환 (계산되지 않은 종류면 None)
    pub fn get(&self, kind: IndicatorKind) -> Option<&IndicatorOutput> {
        self.data.get(&kind)
    }

    /// 모든 결과를 키 순서대로 반환
    pub fn get_all(&self) -> Vec<&IndicatorOutput> {
        self.kinds
            .iter()
            .filter_map(|kind| self.data.get(kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trending(count: usize) -> Vec<Bar> {
        (0..count)
            .map(|i| Bar::synthetic(i as i64 * 86_400, 100.0 + (i as f64 / 8.0).sin() * 20.0))
            .collect()
    }

    #[test]
    fn test_kind_keys_roundtrip() {
        for kind in IndicatorKind::ALL {
            assert_eq!(kind.key().parse::<IndicatorKind>().unwrap(), kind);
        }
        assert!("volume".parse::<IndicatorKind>().is_err());
    }

    #[test]
    fn test_kind_serde_uses_toolbar_keys() {
        let json = serde_json::to_string(&IndicatorKind::FearGreed).unwrap();
        assert_eq!(json, "\"fg_index\"");
        let kind: IndicatorKind = serde_json::from_str("\"ma_oscillator\"").unwrap();
        assert_eq!(kind, IndicatorKind::MaOscillator);
    }

    #[test]
    fn test_build_without_fear_greed() {
        let set = IndicatorSet::build(
            "daily",
            &trending(200),
            &IndicatorParams::default(),
            &CrossStyle::default(),
            None,
        );
        assert_eq!(set.kinds().len(), 4);
        assert!(set.get(IndicatorKind::FearGreed).is_none());
        let osc = set.get(IndicatorKind::MaOscillator).unwrap();
        assert!(!osc.is_empty());
        assert!(!osc.markers().is_empty());
        assert_eq!(set.get_all().len(), 4);
    }

    #[test]
    fn test_build_with_fear_greed() {
        let fg = vec![Bar::synthetic(1, 25.0), Bar::synthetic(2, 75.0)];
        let set = IndicatorSet::build(
            "daily",
            &trending(10),
            &IndicatorParams::default(),
            &CrossStyle::default(),
            Some(&fg),
        );
        let output = set.get(IndicatorKind::FearGreed).unwrap();
        assert_eq!(output.primary_series().len(), 2);
        // 데이터가 부족한 지표는 빈 결과지만 키는 유지됨
        assert!(set.get(IndicatorKind::Macd).unwrap().is_empty());
        assert_eq!(set.kinds().len(), 5);
    }
}
