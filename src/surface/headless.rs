//! 브라우저 없이 동작하는 차트 표면 구현
//!
//! 실제 차트 라이브러리처럼 가시 범위를 프로그램으로 설정해도 변경 이벤트가 발생하므로,
//! 동기화 엔진의 루프 방지와 해제 순서를 그대로 재현할 수 있습니다.
//! 테스트와 `preset_report` 바이너리에서 사용합니다.

use super::{
    ChartError, ChartResult, ChartSurface, LogicalRange, NotifyHandler, PaneContainer,
    PulsePosition, RangeHandler, SeriesData, SeriesId, SeriesKind, SeriesOptions, ToolbarPort,
};
use crate::model::CrossMarker;
use crate::observable::{Observable, SubscriptionId};
use log::trace;
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::rc::Rc;

/// 봉 하나의 가로 폭 (px)
const BAR_SPACING: f64 = 6.0;
/// 차트 높이 (px)
const PANE_HEIGHT: f64 = 300.0;
const DEFAULT_PRICE_SCALE_WIDTH: f64 = 56.0;

/// 시리즈 하나의 현재 상태
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSnapshot {
    pub kind: SeriesKind,
    pub options: SeriesOptions,
    /// 현재 색상 (깜빡임으로 바뀔 수 있음)
    pub color: String,
    pub data: SeriesData,
    pub markers: Vec<CrossMarker>,
}

#[derive(Debug)]
struct ChartState {
    disposed: bool,
    range: Option<LogicalRange>,
    price_scale_width: f64,
    measurement_ready: bool,
    next_series: u64,
    series: BTreeMap<SeriesId, SeriesSnapshot>,
}

/// 헤드리스 차트
#[derive(Debug)]
pub struct HeadlessChart {
    name: String,
    state: RefCell<ChartState>,
    range_changed: Observable<Option<LogicalRange>>,
    size_changed: Observable<()>,
    range_writes: Cell<usize>,
}

impl HeadlessChart {
    pub fn new(name: &str) -> Self {
        HeadlessChart {
            name: name.to_owned(),
            state: RefCell::new(ChartState {
                disposed: false,
                range: None,
                price_scale_width: DEFAULT_PRICE_SCALE_WIDTH,
                measurement_ready: true,
                next_series: 1,
                series: BTreeMap::new(),
            }),
            range_changed: Observable::new(),
            size_changed: Observable::new(),
            range_writes: Cell::new(0),
        }
    }

    pub fn with_price_scale_width(self, width: f64) -> Self {
        self.state.borrow_mut().price_scale_width = width;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 사용자 스크롤/줌 흉내
    pub fn scroll_to(&self, range: LogicalRange) -> ChartResult<()> {
        self.set_visible_logical_range(range)
    }

    /// 가격축 라벨 폭이 바뀐 것처럼 폭을 바꾸고 크기 변경 이벤트 발생
    pub fn set_price_scale_width(&self, width: f64) -> ChartResult<()> {
        {
            let mut state = self.live_state()?;
            if state.price_scale_width == width {
                return Ok(());
            }
            state.price_scale_width = width;
        }
        self.size_changed.emit(&());
        Ok(())
    }

    /// false면 가격축 폭 측정이 `NotReady`로 실패
    pub fn set_measurement_ready(&self, ready: bool) {
        self.state.borrow_mut().measurement_ready = ready;
    }

    /// 차트 제거. 이후 모든 포트 호출은 `Disposed` 오류
    pub fn dispose(&self) {
        self.state.borrow_mut().disposed = true;
        self.range_changed.clear();
        self.size_changed.clear();
        trace!("{} 헤드리스 차트 제거", self.name);
    }

    pub fn is_disposed(&self) -> bool {
        self.state.borrow().disposed
    }

    /// 외부에서 가시 범위를 설정한 횟수
    pub fn range_writes(&self) -> usize {
        self.range_writes.get()
    }

    pub fn current_range(&self) -> Option<LogicalRange> {
        self.state.borrow().range
    }

    pub fn range_subscriber_count(&self) -> usize {
        self.range_changed.handler_count()
    }

    pub fn size_subscriber_count(&self) -> usize {
        self.size_changed.handler_count()
    }

    pub fn series_count(&self) -> usize {
        self.state.borrow().series.len()
    }

    pub fn series(&self, id: SeriesId) -> Option<SeriesSnapshot> {
        self.state.borrow().series.get(&id).cloned()
    }

    /// 생성 순서대로 모든 시리즈 상태
    pub fn series_snapshot(&self) -> Vec<SeriesSnapshot> {
        self.state.borrow().series.values().cloned().collect()
    }

    fn live_state(&self) -> ChartResult<std::cell::RefMut<'_, ChartState>> {
        let state = self.state.borrow_mut();
        if state.disposed {
            return Err(ChartError::Disposed);
        }
        Ok(state)
    }

    fn with_series<R>(
        &self,
        id: SeriesId,
        f: impl FnOnce(&mut SeriesSnapshot) -> R,
    ) -> ChartResult<R> {
        let mut state = self.live_state()?;
        let series = state
            .series
            .get_mut(&id)
            .ok_or(ChartError::UnknownSeries(id))?;
        Ok(f(series))
    }
}

impl ChartSurface for HeadlessChart {
    fn visible_logical_range(&self) -> ChartResult<Option<LogicalRange>> {
        Ok(self.live_state()?.range)
    }

    fn set_visible_logical_range(&self, range: LogicalRange) -> ChartResult<()> {
        self.live_state()?.range = Some(range);
        self.range_writes.set(self.range_writes.get() + 1);
        self.range_changed.emit(&Some(range));
        Ok(())
    }

    fn subscribe_visible_range_change(&self, handler: RangeHandler) -> ChartResult<SubscriptionId> {
        self.live_state()?;
        Ok(self.range_changed.subscribe(move |range| handler(*range)))
    }

    fn unsubscribe_visible_range_change(&self, id: SubscriptionId) -> ChartResult<()> {
        self.live_state()?;
        self.range_changed.unsubscribe(id);
        Ok(())
    }

    fn price_scale_width(&self) -> ChartResult<f64> {
        let state = self.live_state()?;
        if !state.measurement_ready {
            return Err(ChartError::NotReady(format!("{} 가격축", self.name)));
        }
        Ok(state.price_scale_width)
    }

    fn subscribe_price_scale_size_change(
        &self,
        handler: NotifyHandler,
    ) -> ChartResult<SubscriptionId> {
        self.live_state()?;
        Ok(self.size_changed.subscribe(move |_| handler()))
    }

    fn unsubscribe_price_scale_size_change(&self, id: SubscriptionId) -> ChartResult<()> {
        self.live_state()?;
        self.size_changed.unsubscribe(id);
        Ok(())
    }

    fn time_to_coordinate(&self, time: i64) -> ChartResult<Option<f64>> {
        let state = self.live_state()?;
        let axis: BTreeSet<i64> = state
            .series
            .values()
            .flat_map(|series| series.data.times())
            .collect();

        let Some(index) = axis.iter().position(|t| *t == time) else {
            return Ok(None);
        };
        let from = state.range.map(|range| range.from).unwrap_or(0.0);
        Ok(Some((index as f64 - from) * BAR_SPACING))
    }

    fn price_to_coordinate(&self, series: SeriesId, price: f64) -> ChartResult<Option<f64>> {
        let values = self.with_series(series, |series| series.data.values())?;
        if values.is_empty() || !price.is_finite() {
            return Ok(None);
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if max == min {
            return Ok(Some(PANE_HEIGHT / 2.0));
        }
        Ok(Some(PANE_HEIGHT * (max - price) / (max - min)))
    }

    fn add_series(&self, kind: SeriesKind, options: SeriesOptions) -> ChartResult<SeriesId> {
        let mut state = self.live_state()?;
        let id = SeriesId(state.next_series);
        state.next_series += 1;

        let data = match kind {
            SeriesKind::Candlestick => SeriesData::Candles(Vec::new()),
            SeriesKind::Histogram => SeriesData::Histogram(Vec::new()),
            SeriesKind::Line | SeriesKind::Baseline => SeriesData::Line(Vec::new()),
        };
        state.series.insert(
            id,
            SeriesSnapshot {
                kind,
                color: options.color.clone(),
                options,
                data,
                markers: Vec::new(),
            },
        );
        Ok(id)
    }

    fn remove_series(&self, series: SeriesId) -> ChartResult<()> {
        self.live_state()?
            .series
            .remove(&series)
            .map(|_| ())
            .ok_or(ChartError::UnknownSeries(series))
    }

    fn set_series_data(&self, series: SeriesId, data: SeriesData) -> ChartResult<()> {
        self.with_series(series, |series| series.data = data)
    }

    fn set_series_markers(&self, series: SeriesId, markers: Vec<CrossMarker>) -> ChartResult<()> {
        self.with_series(series, |series| series.markers = markers)
    }

    fn set_series_color(&self, series: SeriesId, color: &str) -> ChartResult<()> {
        self.with_series(series, |series| series.color = color.to_owned())
    }
}

/// 헤드리스 컨테이너
#[derive(Debug, Default)]
pub struct HeadlessContainer {
    disposed: Cell<bool>,
    spacer: Cell<f64>,
    legend: RefCell<Option<String>>,
    pulse: RefCell<Option<PulsePosition>>,
    resized: Observable<()>,
}

impl HeadlessContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 컨테이너 크기 변경 흉내
    pub fn resize(&self) {
        if !self.disposed.get() {
            self.resized.emit(&());
        }
    }

    pub fn dispose(&self) {
        self.disposed.set(true);
        self.resized.clear();
    }

    pub fn spacer(&self) -> f64 {
        self.spacer.get()
    }

    pub fn legend(&self) -> Option<String> {
        self.legend.borrow().clone()
    }

    pub fn pulse(&self) -> Option<PulsePosition> {
        self.pulse.borrow().clone()
    }

    pub fn resize_observer_count(&self) -> usize {
        self.resized.handler_count()
    }

    fn ensure_live(&self) -> ChartResult<()> {
        if self.disposed.get() {
            return Err(ChartError::Disposed);
        }
        Ok(())
    }
}

impl PaneContainer for HeadlessContainer {
    fn set_gutter_spacer(&self, width: f64) -> ChartResult<()> {
        self.ensure_live()?;
        self.spacer.set(width);
        Ok(())
    }

    fn set_legend(&self, text: Option<&str>) -> ChartResult<()> {
        self.ensure_live()?;
        *self.legend.borrow_mut() = text.map(str::to_owned);
        Ok(())
    }

    fn place_pulse(&self, position: Option<PulsePosition>) -> ChartResult<()> {
        self.ensure_live()?;
        *self.pulse.borrow_mut() = position;
        Ok(())
    }

    fn observe_resize(&self, handler: NotifyHandler) -> ChartResult<SubscriptionId> {
        self.ensure_live()?;
        Ok(self.resized.subscribe(move |_| handler()))
    }

    fn unobserve_resize(&self, id: SubscriptionId) -> ChartResult<()> {
        self.ensure_live()?;
        self.resized.unsubscribe(id);
        Ok(())
    }
}

/// 헤드리스 툴바
#[derive(Debug, Default)]
pub struct HeadlessToolbar {
    actions: RefCell<HashMap<String, Rc<Observable<()>>>>,
    active: RefCell<HashMap<String, bool>>,
}

impl HeadlessToolbar {
    pub fn new() -> Self {
        Self::default()
    }

    /// 버튼 클릭 흉내
    pub fn press(&self, key: &str) {
        let action = self.actions.borrow().get(key).cloned();
        match action {
            Some(action) => action.emit(&()),
            None => trace!("등록된 핸들러가 없는 버튼: {}", key),
        }
    }

    pub fn is_active(&self, key: &str) -> bool {
        self.active.borrow().get(key).copied().unwrap_or(false)
    }

    /// 활성 표시된 버튼 키 (정렬됨)
    pub fn active_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .active
            .borrow()
            .iter()
            .filter(|(_, active)| **active)
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn handler_count(&self, key: &str) -> usize {
        self.actions
            .borrow()
            .get(key)
            .map(|action| action.handler_count())
            .unwrap_or(0)
    }
}

impl ToolbarPort for HeadlessToolbar {
    fn on_action(&self, key: &str, handler: NotifyHandler) -> ChartResult<SubscriptionId> {
        let action = Rc::clone(
            self.actions
                .borrow_mut()
                .entry(key.to_owned())
                .or_insert_with(|| Rc::new(Observable::new())),
        );
        Ok(action.subscribe(move |_| handler()))
    }

    fn off_action(&self, key: &str, id: SubscriptionId) -> ChartResult<()> {
        if let Some(action) = self.actions.borrow().get(key) {
            action.unsubscribe(id);
        }
        Ok(())
    }

    fn set_active(&self, key: &str, active: bool) -> ChartResult<()> {
        self.active.borrow_mut().insert(key.to_owned(), active);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IndicatorPoint;

    #[test]
    fn test_programmatic_range_change_emits() {
        let chart = HeadlessChart::new("main");
        let seen = Rc::new(Cell::new(0));
        let counter = Rc::clone(&seen);
        chart
            .subscribe_visible_range_change(Rc::new(move |_: Option<LogicalRange>| counter.set(counter.get() + 1)))
            .unwrap();

        chart.set_visible_logical_range(LogicalRange::new(10.0, 50.0)).unwrap();
        assert_eq!(seen.get(), 1);
        assert_eq!(
            chart.visible_logical_range().unwrap(),
            Some(LogicalRange::new(10.0, 50.0))
        );
    }

    #[test]
    fn test_disposed_chart_rejects_calls() {
        let chart = HeadlessChart::new("main");
        chart.dispose();
        assert_eq!(chart.price_scale_width(), Err(ChartError::Disposed));
        assert!(
            chart
                .add_series(SeriesKind::Line, SeriesOptions::line("#fff"))
                .is_err()
        );
    }

    #[test]
    fn test_measurement_not_ready() {
        let chart = HeadlessChart::new("sub");
        chart.set_measurement_ready(false);
        assert!(matches!(
            chart.price_scale_width(),
            Err(ChartError::NotReady(_))
        ));
    }

    #[test]
    fn test_coordinates_follow_visible_range() {
        let chart = HeadlessChart::new("sub");
        let id = chart
            .add_series(SeriesKind::Line, SeriesOptions::line("#fff"))
            .unwrap();
        let points = (0..10).map(|i| IndicatorPoint::new(i, i as f64)).collect();
        chart.set_series_data(id, SeriesData::Line(points)).unwrap();

        assert_eq!(chart.time_to_coordinate(9).unwrap(), Some(54.0));
        chart.scroll_to(LogicalRange::new(5.0, 9.0)).unwrap();
        assert_eq!(chart.time_to_coordinate(9).unwrap(), Some(24.0));
        assert_eq!(chart.time_to_coordinate(42).unwrap(), None);
        assert_eq!(chart.price_to_coordinate(id, 9.0).unwrap(), Some(0.0));
        assert_eq!(chart.price_to_coordinate(id, 0.0).unwrap(), Some(300.0));
    }

    #[test]
    fn test_toolbar_press_dispatches_by_key() {
        let toolbar = HeadlessToolbar::new();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let id = toolbar
            .on_action("rsi", Rc::new(move || counter.set(counter.get() + 1)))
            .unwrap();

        toolbar.press("rsi");
        toolbar.press("macd");
        toolbar.off_action("rsi", id).unwrap();
        toolbar.press("rsi");
        assert_eq!(hits.get(), 1);

        toolbar.set_active("rsi", true).unwrap();
        assert_eq!(toolbar.active_keys(), vec!["rsi".to_string()]);
    }
}
