//! 차트 렌더링 표면 포트
//!
//! 차트 라이브러리, 차트를 감싸는 컨테이너(범례/펄스 점/거터 스페이서),
//! 공용 툴바를 각각 트레이트로 추상화합니다.
//! 동기화 엔진은 이 트레이트에만 의존하며, 실제 구현은 호스트가 주입합니다.

pub mod headless;

use crate::model::{Bar, CrossMarker, IndicatorSeries};
use crate::observable::SubscriptionId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

pub use headless::{HeadlessChart, HeadlessContainer, HeadlessToolbar, SeriesSnapshot};

/// 차트 표면 호출 오류
#[derive(Debug, Clone, PartialEq)]
pub enum ChartError {
    /// 이미 제거된 차트/컨테이너
    Disposed,
    /// 존재하지 않는 시리즈
    UnknownSeries(SeriesId),
    /// 아직 초기화되지 않아 측정할 수 없음
    NotReady(String),
    /// 프리셋과 전달된 차트 구성이 맞지 않음
    InvalidGroup(String),
}

impl fmt::Display for ChartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartError::Disposed => write!(f, "이미 제거된 차트입니다"),
            ChartError::UnknownSeries(id) => write!(f, "알 수 없는 시리즈: {}", id),
            ChartError::NotReady(msg) => write!(f, "차트가 준비되지 않음: {}", msg),
            ChartError::InvalidGroup(msg) => write!(f, "잘못된 차트 그룹 구성: {}", msg),
        }
    }
}

impl std::error::Error for ChartError {}

pub type ChartResult<T> = Result<T, ChartError>;

/// 가시 논리 범위 (봉 인덱스 공간)
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct LogicalRange {
    pub from: f64,
    pub to: f64,
}

impl LogicalRange {
    pub fn new(from: f64, to: f64) -> Self {
        LogicalRange { from, to }
    }
}

impl fmt::Display for LogicalRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.2}, {:.2}]", self.from, self.to)
    }
}

/// 시리즈 식별자 (차트 인스턴스 내에서 유일)
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesId(pub u64);

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "series#{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    Candlestick,
    Line,
    Histogram,
    /// 기준값 위/아래를 다른 색으로 칠하는 시리즈
    Baseline,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SeriesOptions {
    pub color: String,
    pub line_width: u32,
    /// Baseline 시리즈의 기준값
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_value: Option<f64>,
}

impl SeriesOptions {
    pub fn line(color: &str) -> Self {
        SeriesOptions {
            color: color.to_owned(),
            line_width: 2,
            base_value: None,
        }
    }

    pub fn baseline(color: &str, base_value: f64) -> Self {
        SeriesOptions {
            base_value: Some(base_value),
            ..Self::line(color)
        }
    }
}

/// 히스토그램 막대 (색상 확정)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HistogramBar {
    pub time: i64,
    pub value: f64,
    pub color: String,
}

/// 시리즈 데이터
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "points", rename_all = "snake_case")]
pub enum SeriesData {
    Candles(Vec<Bar>),
    /// 화이트스페이스 점을 포함할 수 있는 선/기준선 데이터
    Line(IndicatorSeries),
    Histogram(Vec<HistogramBar>),
}

impl SeriesData {
    pub fn len(&self) -> usize {
        match self {
            SeriesData::Candles(bars) => bars.len(),
            SeriesData::Line(points) => points.len(),
            SeriesData::Histogram(bars) => bars.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 데이터에 포함된 모든 시각
    pub fn times(&self) -> Vec<i64> {
        match self {
            SeriesData::Candles(bars) => bars.iter().map(|bar| bar.time).collect(),
            SeriesData::Line(points) => points.iter().map(|point| point.time).collect(),
            SeriesData::Histogram(bars) => bars.iter().map(|bar| bar.time).collect(),
        }
    }

    /// 가격축 범위 계산용 값 (화이트스페이스 제외)
    pub fn values(&self) -> Vec<f64> {
        match self {
            SeriesData::Candles(bars) => bars.iter().flat_map(|bar| [bar.low, bar.high]).collect(),
            SeriesData::Line(points) => points.iter().filter_map(|point| point.value).collect(),
            SeriesData::Histogram(bars) => bars.iter().map(|bar| bar.value).collect(),
        }
    }
}

/// 가시 범위 변경 핸들러 (범위가 없으면 None)
pub type RangeHandler = Rc<dyn Fn(Option<LogicalRange>)>;

/// 인자 없는 알림 핸들러 (크기 변경, 툴바 클릭 등)
pub type NotifyHandler = Rc<dyn Fn()>;

/// 차트 한 인스턴스에 대한 포트
pub trait ChartSurface {
    fn visible_logical_range(&self) -> ChartResult<Option<LogicalRange>>;

    fn set_visible_logical_range(&self, range: LogicalRange) -> ChartResult<()>;

    fn subscribe_visible_range_change(&self, handler: RangeHandler) -> ChartResult<SubscriptionId>;

    fn unsubscribe_visible_range_change(&self, id: SubscriptionId) -> ChartResult<()>;

    /// 오른쪽 가격축의 렌더링된 폭 (px)
    fn price_scale_width(&self) -> ChartResult<f64>;

    fn subscribe_price_scale_size_change(&self, handler: NotifyHandler)
    -> ChartResult<SubscriptionId>;

    fn unsubscribe_price_scale_size_change(&self, id: SubscriptionId) -> ChartResult<()>;

    /// 시각의 x 좌표 (화면 밖이거나 없는 시각이면 None)
    fn time_to_coordinate(&self, time: i64) -> ChartResult<Option<f64>>;

    /// 시리즈 가격축 기준 y 좌표
    fn price_to_coordinate(&self, series: SeriesId, price: f64) -> ChartResult<Option<f64>>;

    fn add_series(&self, kind: SeriesKind, options: SeriesOptions) -> ChartResult<SeriesId>;

    fn remove_series(&self, series: SeriesId) -> ChartResult<()>;

    fn set_series_data(&self, series: SeriesId, data: SeriesData) -> ChartResult<()>;

    fn set_series_markers(&self, series: SeriesId, markers: Vec<CrossMarker>) -> ChartResult<()>;

    fn set_series_color(&self, series: SeriesId, color: &str) -> ChartResult<()>;
}

/// 차트 하나와 그 컨테이너
#[derive(Clone)]
pub struct PaneHandles {
    pub chart: Rc<dyn ChartSurface>,
    pub container: Rc<dyn PaneContainer>,
}

impl PaneHandles {
    pub fn new(chart: Rc<dyn ChartSurface>, container: Rc<dyn PaneContainer>) -> Self {
        PaneHandles { chart, container }
    }
}

/// 펄스 점 위치 (차트 좌표 공간)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PulsePosition {
    pub x: f64,
    pub y: f64,
    pub color: String,
}

/// 차트를 감싸는 컨테이너 포트
pub trait PaneContainer {
    /// 오른쪽 거터 스페이서 폭 설정
    fn set_gutter_spacer(&self, width: f64) -> ChartResult<()>;

    /// 범례 문자열 (None이면 비움)
    fn set_legend(&self, text: Option<&str>) -> ChartResult<()>;

    /// 마지막 값 펄스 점 배치 (None이면 숨김)
    fn place_pulse(&self, position: Option<PulsePosition>) -> ChartResult<()>;

    fn observe_resize(&self, handler: NotifyHandler) -> ChartResult<SubscriptionId>;

    fn unobserve_resize(&self, id: SubscriptionId) -> ChartResult<()>;
}

/// 공용 툴바 포트
///
/// 버튼은 고정된 액션 키(`rsi`, `macd`, `lifeline` 등)로 식별됩니다.
pub trait ToolbarPort {
    fn on_action(&self, key: &str, handler: NotifyHandler) -> ChartResult<SubscriptionId>;

    fn off_action(&self, key: &str, id: SubscriptionId) -> ChartResult<()>;

    /// 버튼 활성 표시 전환
    fn set_active(&self, key: &str, active: bool) -> ChartResult<()>;
}
