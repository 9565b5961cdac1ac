use crate::config::{IndicatorParams, Palette, SubPaneRole};
use crate::indicator::disparity::DISPARITY_BASELINE;
use crate::indicator::{IndicatorKind, IndicatorOutput, IndicatorSet, pad_with_whitespace};
use crate::model::{Bar, CrossMarker, HistogramTone, IndicatorPoint};
use crate::observable::{Disposables, Subscription};
use crate::surface::{
    ChartSurface, HistogramBar, LogicalRange, PaneContainer, PaneHandles, PulsePosition,
    SeriesData, SeriesId, SeriesKind, SeriesOptions,
};
use log::{debug, trace, warn};
use std::cell::{Cell, RefCell};
use std::fmt::Display;
use std::rc::Rc;

/// 펄스 점이 따라가는 마지막 데이터 점
#[derive(Debug, Clone, PartialEq)]
struct PulseAnchor {
    series: SeriesId,
    time: i64,
    value: f64,
    color: String,
}

/// 보조 차트 하나
///
/// 현재 오버레이 상태와 그 상태가 그린 시리즈/범례/펄스 점을 독점적으로 소유합니다.
/// 상태는 오버레이 컨트롤러의 전환 핸들러 안에서만 바뀝니다.
pub struct SubPane {
    name: String,
    role: SubPaneRole,
    chart: Rc<dyn ChartSurface>,
    container: Rc<dyn PaneContainer>,
    /// 화이트스페이스 정렬 기준이 되는 캔들 시간 도메인
    candles: Vec<Bar>,
    indicators: IndicatorSet,
    params: IndicatorParams,
    palette: Palette,
    state: Cell<Option<IndicatorKind>>,
    drawn: RefCell<Vec<SeriesId>>,
    anchor: RefCell<Option<PulseAnchor>>,
}

impl Display for SubPane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.state.get() {
            Some(kind) => write!(f, "SubPane({}, {:?}, {})", self.name, self.role, kind),
            None => write!(f, "SubPane({}, {:?}, none)", self.name, self.role),
        }
    }
}

impl SubPane {
    pub fn new(
        name: &str,
        role: SubPaneRole,
        handles: PaneHandles,
        candles: Vec<Bar>,
        indicators: IndicatorSet,
        params: IndicatorParams,
        palette: Palette,
    ) -> Self {
        SubPane {
            name: name.to_owned(),
            role,
            chart: handles.chart,
            container: handles.container,
            candles,
            indicators,
            params,
            palette,
            state: Cell::new(None),
            drawn: RefCell::new(Vec::new()),
            anchor: RefCell::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> SubPaneRole {
        self.role
    }

    /// 현재 오버레이 상태 (None이면 아무 지표도 표시하지 않음)
    pub fn state(&self) -> Option<IndicatorKind> {
        self.state.get()
    }

    pub fn indicators(&self) -> &IndicatorSet {
        &self.indicators
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    pub fn chart(&self) -> &Rc<dyn ChartSurface> {
        &self.chart
    }

    pub fn container(&self) -> &Rc<dyn PaneContainer> {
        &self.container
    }

    /// 현재 상태가 그린 시리즈 (그린 순서)
    pub fn drawn_series(&self) -> Vec<SeriesId> {
        self.drawn.borrow().clone()
    }

    /// 지표 상태로 전환
    ///
    /// 이전 상태의 시리즈/마커/범례/펄스 점을 모두 지운 뒤,
    /// 미리 계산된 결과로 새 지표를 그립니다. 같은 지표를 다시 적용해도 결과는 동일합니다.
    pub fn apply(&self, kind: IndicatorKind) {
        self.clear_visuals();
        self.state.set(Some(kind));

        let Some(output) = self.indicators.get(kind) else {
            warn!("{} {} 지표 데이터 없음", self.name, kind);
            self.set_legend(Some(format!("{} -", self.label(kind))));
            return;
        };

        let anchor = match output {
            IndicatorOutput::MaOscillator {
                oscillator,
                markers,
                ..
            } => {
                let id = self.draw_line(
                    SeriesKind::Baseline,
                    SeriesOptions::baseline(&self.palette.oscillator, 0.0),
                    oscillator,
                );
                if let Some(id) = id {
                    self.set_markers(id, markers.clone());
                }
                id.and_then(|id| last_anchor(id, oscillator, &self.palette.oscillator))
            }
            IndicatorOutput::Rsi { rsi } => {
                let id = self.draw_line(
                    SeriesKind::Line,
                    SeriesOptions::line(&self.palette.rsi),
                    rsi,
                );
                id.and_then(|id| last_anchor(id, rsi, &self.palette.rsi))
            }
            IndicatorOutput::Macd { output, markers } => {
                self.draw_histogram(output.histogram.iter().map(|point| HistogramBar {
                    time: point.time,
                    value: point.value,
                    color: match point.tone {
                        HistogramTone::Positive => self.palette.histogram_positive.clone(),
                        HistogramTone::Negative => self.palette.histogram_negative.clone(),
                    },
                }));
                let id = self.draw_line(
                    SeriesKind::Line,
                    SeriesOptions::line(&self.palette.macd),
                    &output.macd,
                );
                self.draw_line(
                    SeriesKind::Line,
                    SeriesOptions::line(&self.palette.signal),
                    &output.signal,
                );
                if let Some(id) = id {
                    self.set_markers(id, markers.clone());
                }
                id.and_then(|id| last_anchor(id, &output.macd, &self.palette.macd))
            }
            IndicatorOutput::Disparity { disparity } => {
                let id = self.draw_line(
                    SeriesKind::Baseline,
                    SeriesOptions::baseline(&self.palette.disparity, DISPARITY_BASELINE),
                    disparity,
                );
                id.and_then(|id| last_anchor(id, disparity, &self.palette.disparity))
            }
            IndicatorOutput::FearGreed { index } => {
                let id = self.draw_line(
                    SeriesKind::Line,
                    SeriesOptions::line(&self.palette.fear_greed),
                    index,
                );
                id.and_then(|id| last_anchor(id, index, &self.palette.fear_greed))
            }
        };

        self.set_legend(Some(self.legend_text(output)));
        *self.anchor.borrow_mut() = anchor;
        self.reproject_pulse();

        debug!("{} → {} 적용 (시리즈 {}개)", self.name, kind, self.drawn.borrow().len());
    }

    /// 모든 지표 표시를 지우고 상태를 None으로
    pub fn clear(&self) {
        self.clear_visuals();
        self.state.set(None);
    }

    /// 펄스 점을 마지막 데이터 점의 현재 화면 좌표로 다시 배치
    ///
    /// 좌표 공간 위치이므로 가시 범위나 컨테이너 크기가 바뀔 때마다 호출해야 합니다.
    pub fn reproject_pulse(&self) {
        let Some(anchor) = self.anchor.borrow().clone() else {
            return;
        };

        let x = self.chart.time_to_coordinate(anchor.time);
        let y = self.chart.price_to_coordinate(anchor.series, anchor.value);
        let position = match (x, y) {
            (Ok(Some(x)), Ok(Some(y))) => Some(PulsePosition {
                x,
                y,
                color: anchor.color,
            }),
            (Err(e), _) | (_, Err(e)) => {
                debug!("{} 펄스 좌표 계산 실패 (무시): {}", self.name, e);
                return;
            }
            _ => None,
        };

        trace!("{} 펄스 재배치: {:?}", self.name, position);
        if let Err(e) = self.container.place_pulse(position) {
            debug!("{} 펄스 배치 실패 (무시): {}", self.name, e);
        }
    }

    /// 가시 범위 변경과 컨테이너 크기 변경에 펄스 재배치를 연결
    pub fn attach_reprojection(self: &Rc<Self>) -> Subscription {
        let subscriptions = Disposables::new();

        let weak = Rc::downgrade(self);
        match self
            .chart
            .subscribe_visible_range_change(Rc::new(move |_: Option<LogicalRange>| {
                if let Some(pane) = weak.upgrade() {
                    pane.reproject_pulse();
                }
            })) {
            Ok(id) => {
                let chart = Rc::downgrade(&self.chart);
                subscriptions.push(Subscription::new(move || {
                    if let Some(chart) = chart.upgrade() {
                        if let Err(e) = chart.unsubscribe_visible_range_change(id) {
                            debug!("펄스 가시 범위 구독 해제 실패 (무시): {}", e);
                        }
                    }
                }));
            }
            Err(e) => warn!("{} 가시 범위 구독 실패: {}", self.name, e),
        }

        let weak = Rc::downgrade(self);
        match self.container.observe_resize(Rc::new(move || {
            if let Some(pane) = weak.upgrade() {
                pane.reproject_pulse();
            }
        })) {
            Ok(id) => {
                let container = Rc::downgrade(&self.container);
                subscriptions.push(Subscription::new(move || {
                    if let Some(container) = container.upgrade() {
                        if let Err(e) = container.unobserve_resize(id) {
                            debug!("펄스 컨테이너 크기 구독 해제 실패 (무시): {}", e);
                        }
                    }
                }));
            }
            Err(e) => warn!("{} 컨테이너 크기 구독 실패: {}", self.name, e),
        }

        subscriptions.into_subscription()
    }

    fn clear_visuals(&self) {
        let drawn: Vec<SeriesId> = self.drawn.borrow_mut().drain(..).collect();
        for id in drawn {
            if let Err(e) = self.chart.remove_series(id) {
                debug!("{} 시리즈 제거 실패 (무시): {}", self.name, e);
            }
        }
        *self.anchor.borrow_mut() = None;
        self.set_legend(None);
        if let Err(e) = self.container.place_pulse(None) {
            debug!("{} 펄스 숨김 실패 (무시): {}", self.name, e);
        }
    }

    fn draw_line(
        &self,
        kind: SeriesKind,
        options: SeriesOptions,
        series: &[IndicatorPoint],
    ) -> Option<SeriesId> {
        let padded = pad_with_whitespace(&self.candles, series);
        self.draw(kind, options, SeriesData::Line(padded))
    }

    fn draw_histogram(&self, bars: impl Iterator<Item = HistogramBar>) -> Option<SeriesId> {
        let options = SeriesOptions::line(&self.palette.histogram_positive);
        self.draw(
            SeriesKind::Histogram,
            options,
            SeriesData::Histogram(bars.collect()),
        )
    }

    fn draw(&self, kind: SeriesKind, options: SeriesOptions, data: SeriesData) -> Option<SeriesId> {
        let id = match self.chart.add_series(kind, options) {
            Ok(id) => id,
            Err(e) => {
                warn!("{} 시리즈 생성 실패: {}", self.name, e);
                return None;
            }
        };
        self.drawn.borrow_mut().push(id);

        if let Err(e) = self.chart.set_series_data(id, data) {
            warn!("{} 시리즈 데이터 설정 실패: {}", self.name, e);
        }
        Some(id)
    }

    fn set_markers(&self, id: SeriesId, markers: Vec<CrossMarker>) {
        if let Err(e) = self.chart.set_series_markers(id, markers) {
            debug!("{} 마커 설정 실패 (무시): {}", self.name, e);
        }
    }

    fn set_legend(&self, text: Option<String>) {
        if let Err(e) = self.container.set_legend(text.as_deref()) {
            debug!("{} 범례 설정 실패 (무시): {}", self.name, e);
        }
    }

    fn label(&self, kind: IndicatorKind) -> String {
        let params = &self.params;
        match kind {
            IndicatorKind::MaOscillator => format!(
                "MAOSC({},{})",
                params.ma_oscillator.fast_period, params.ma_oscillator.slow_period
            ),
            IndicatorKind::Rsi => format!("RSI({})", params.rsi_period),
            IndicatorKind::Macd => format!("MACD({})", params.macd),
            IndicatorKind::Disparity => format!("이격도({})", params.disparity_period),
            IndicatorKind::FearGreed => "공포/탐욕".to_owned(),
        }
    }

    fn legend_text(&self, output: &IndicatorOutput) -> String {
        let label = self.label(output.kind());
        let last = |series: &[IndicatorPoint]| series.iter().rev().find_map(|point| point.value);

        match output {
            IndicatorOutput::Macd { output, .. } => {
                match (last(&output.macd), last(&output.signal)) {
                    (Some(macd), Some(signal)) => {
                        format!("{} {:.2} / {:.2}", label, macd, signal)
                    }
                    (Some(macd), None) => format!("{} {:.2}", label, macd),
                    _ => format!("{} -", label),
                }
            }
            IndicatorOutput::FearGreed { index } => match last(index) {
                Some(value) => format!("{} {:.0}", label, value),
                None => format!("{} -", label),
            },
            other => match last(other.primary_series()) {
                Some(value) => format!("{} {:.2}", label, value),
                None => format!("{} -", label),
            },
        }
    }
}

fn last_anchor(series: SeriesId, points: &[IndicatorPoint], color: &str) -> Option<PulseAnchor> {
    points.iter().rev().find_map(|point| {
        point.value.map(|value| PulseAnchor {
            series,
            time: point.time,
            value,
            color: color.to_owned(),
        })
    })
}
