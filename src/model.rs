use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::fmt::Display;

/// 캔들 데이터에 접근하기 위한 공통 인터페이스
///
/// 지표 엔진은 이 트레이트만 알면 되므로, 외부 데이터 타입도
/// 구현만 제공하면 그대로 지표 계산에 사용할 수 있습니다.
pub trait Candle: Debug {
    /// 캔들 시각 (유닉스 초)
    fn time(&self) -> i64;
    /// 시가
    fn open_price(&self) -> f64;
    /// 고가
    fn high_price(&self) -> f64;
    /// 저가
    fn low_price(&self) -> f64;
    /// 종가
    fn close_price(&self) -> f64;
    /// 거래량 (없을 수 있음)
    fn volume(&self) -> Option<f64>;
}

/// 정규화된 OHLC(+거래량) 레코드
///
/// 한 시리즈 안에서 `time`은 항상 엄격하게 증가합니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl Bar {
    /// 새 Bar 생성
    pub fn new(time: i64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Bar {
            time,
            open,
            high,
            low,
            close,
            volume: None,
        }
    }

    /// 단일 값만 있는 레코드(거시지표, 지수 등)를 합성 Bar로 변환
    ///
    /// open = high = low = close = value
    pub fn synthetic(time: i64, value: f64) -> Self {
        Bar::new(time, value, value, value, value)
    }

    /// 거래량 설정
    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }
}

impl Display for Bar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Bar(t={}, o={}, h={}, l={}, c={})",
            self.time, self.open, self.high, self.low, self.close
        )
    }
}

impl Candle for Bar {
    fn time(&self) -> i64 {
        self.time
    }
    fn open_price(&self) -> f64 {
        self.open
    }
    fn high_price(&self) -> f64 {
        self.high
    }
    fn low_price(&self) -> f64 {
        self.low
    }
    fn close_price(&self) -> f64 {
        self.close
    }
    fn volume(&self) -> Option<f64> {
        self.volume
    }
}

/// 지표 시리즈의 한 점
///
/// `value`가 `None`이면 화이트스페이스(시각만 있는 자리표시자)입니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    pub time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl IndicatorPoint {
    /// 값이 있는 점 생성
    pub fn new(time: i64, value: f64) -> Self {
        IndicatorPoint {
            time,
            value: Some(value),
        }
    }

    /// 화이트스페이스 점 생성
    pub fn whitespace(time: i64) -> Self {
        IndicatorPoint { time, value: None }
    }

    pub fn is_whitespace(&self) -> bool {
        self.value.is_none()
    }
}

/// 지표 시리즈 (시간 오름차순)
pub type IndicatorSeries = Vec<IndicatorPoint>;

/// 히스토그램 막대의 2색 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HistogramTone {
    /// value >= 0
    Positive,
    /// value < 0
    Negative,
}

impl HistogramTone {
    pub fn classify(value: f64) -> Self {
        if value >= 0.0 {
            HistogramTone::Positive
        } else {
            HistogramTone::Negative
        }
    }
}

/// 히스토그램 시리즈의 한 점
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramPoint {
    pub time: i64,
    pub value: f64,
    pub tone: HistogramTone,
}

impl HistogramPoint {
    pub fn new(time: i64, value: f64) -> Self {
        HistogramPoint {
            time,
            value,
            tone: HistogramTone::classify(value),
        }
    }
}

/// 마커 위치
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerPosition {
    AboveBar,
    BelowBar,
}

/// 마커 모양
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerShape {
    ArrowUp,
    ArrowDown,
}

/// 골든/데드 크로스 마커
///
/// 이미 계산된 두 시리즈에서 파생되며 저장되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossMarker {
    pub time: i64,
    pub position: MarkerPosition,
    pub shape: MarkerShape,
    pub color: String,
}

impl CrossMarker {
    /// 골든 크로스 (상향 돌파) 마커
    pub fn golden(time: i64, color: &str) -> Self {
        CrossMarker {
            time,
            position: MarkerPosition::BelowBar,
            shape: MarkerShape::ArrowUp,
            color: color.to_owned(),
        }
    }

    /// 데드 크로스 (하향 돌파) 마커
    pub fn dead(time: i64, color: &str) -> Self {
        CrossMarker {
            time,
            position: MarkerPosition::AboveBar,
            shape: MarkerShape::ArrowDown,
            color: color.to_owned(),
        }
    }

    pub fn is_golden(&self) -> bool {
        self.shape == MarkerShape::ArrowUp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_bar() {
        let bar = Bar::synthetic(10, 4.5);
        assert_eq!(bar.open, 4.5);
        assert_eq!(bar.high, 4.5);
        assert_eq!(bar.low, 4.5);
        assert_eq!(bar.close, 4.5);
        assert_eq!(bar.volume, None);
    }

    #[test]
    fn test_histogram_tone() {
        assert_eq!(HistogramTone::classify(0.0), HistogramTone::Positive);
        assert_eq!(HistogramTone::classify(1.5), HistogramTone::Positive);
        assert_eq!(HistogramTone::classify(-0.1), HistogramTone::Negative);
    }

    #[test]
    fn test_marker_serialization() {
        let marker = CrossMarker::golden(100, "#00ff00");
        let json = serde_json::to_string(&marker).unwrap();
        assert!(json.contains("\"belowBar\""));
        assert!(json.contains("\"arrowUp\""));
    }
}
