//! 프리셋 하나에 해당하는 차트 그룹
//!
//! 메인 차트(캔들 + 이동평균선)와 1~3개의 보조 차트를 마운트하고,
//! 가시 범위 연결, 가격축 폭 정렬, 펄스 재배치, 툴바 오버레이 상태 머신을 한 번에 연결합니다.
//! 해제는 [`PaneGroup::dispose`] 한 번으로 모든 구독과 타이머를 정리합니다.

use crate::config::PresetConfig;
use crate::config_loader::ConfigValidation;
use crate::indicator::{IndicatorKind, IndicatorSet, pad_with_whitespace};
use crate::model::Bar;
use crate::observable::Disposables;
use crate::overlay::{BlinkLine, BlinkTarget, BlinkToggle, OverlayController, SubPane};
use crate::scheduler::Scheduler;
use crate::surface::{
    ChartError, ChartResult, PaneHandles, SeriesData, SeriesId, SeriesKind, SeriesOptions,
    ToolbarPort,
};
use crate::sync::{link, sync_axis_widths};
use log::{debug, info, warn};
use std::cell::Cell;
use std::fmt::Display;
use std::rc::Rc;

/// 그룹 마운트에 필요한 로드된 시리즈
#[derive(Debug, Clone, Default)]
pub struct PaneData {
    /// 메인 차트 캔들
    pub main: Vec<Bar>,
    /// 보조 차트별 캔들 (프리셋의 보조 차트 순서)
    pub sub_panes: Vec<Vec<Bar>>,
    /// 공포/탐욕 지수 (없으면 FG_INDEX 비활성)
    pub fear_greed: Option<Vec<Bar>>,
}

/// 메인 차트에 그려진 이동평균선
#[derive(Debug, Clone, PartialEq)]
pub struct MaLineHandle {
    pub period: usize,
    pub series: SeriesId,
    pub color: String,
}

pub struct PaneGroup {
    name: String,
    main: PaneHandles,
    candle_series: Option<SeriesId>,
    ma_lines: Vec<MaLineHandle>,
    controller: Rc<OverlayController>,
    subscriptions: Disposables,
    disposed: Cell<bool>,
}

impl Display for PaneGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PaneGroup({}, 보조 차트 {}개)",
            self.name,
            self.controller.panes().len()
        )
    }
}

impl PaneGroup {
    /// 프리셋 구성으로 차트 그룹 마운트
    ///
    /// # Arguments
    /// * `preset` - 프리셋 설정
    /// * `main` - 메인 차트 핸들 (가시 범위 드라이버)
    /// * `sub_handles` - 보조 차트 핸들 (프리셋의 보조 차트 순서)
    /// * `data` - 로드된 시리즈
    /// * `toolbar` - 공용 툴바
    /// * `scheduler` - 더블 클릭/깜빡임 타이머
    ///
    /// # Returns
    /// * `ChartResult<PaneGroup>` - 프리셋이 유효하지 않거나 핸들 수가 맞지 않으면 `InvalidGroup`
    pub fn mount(
        preset: &PresetConfig,
        main: PaneHandles,
        sub_handles: Vec<PaneHandles>,
        data: PaneData,
        toolbar: Rc<dyn ToolbarPort>,
        scheduler: Rc<dyn Scheduler>,
    ) -> ChartResult<Self> {
        preset
            .validate()
            .map_err(|e| ChartError::InvalidGroup(e.to_string()))?;

        let expected = preset.sub_panes.len();
        if sub_handles.len() != expected || data.sub_panes.len() != expected {
            return Err(ChartError::InvalidGroup(format!(
                "보조 차트 {}개 필요, 핸들 {}개, 데이터 {}개",
                expected,
                sub_handles.len(),
                data.sub_panes.len()
            )));
        }

        let PaneData {
            main: main_bars,
            sub_panes: sub_bars,
            fear_greed,
        } = data;

        let candle_series = draw_candles(&main, &main_bars);
        let ma_lines = draw_ma_lines(&main, preset, &main_bars);

        let style = preset.cross_style();
        let panes: Vec<Rc<SubPane>> = preset
            .sub_panes
            .iter()
            .zip(sub_handles)
            .zip(sub_bars)
            .enumerate()
            .map(|(idx, ((config, handles), bars))| {
                let name = format!("{}:{}#{}", preset.name, config.timeframe, idx);
                let params = config.indicator_params();
                let indicators =
                    IndicatorSet::build(&name, &bars, &params, &style, fear_greed.as_deref());
                Rc::new(SubPane::new(
                    &name,
                    config.role,
                    handles,
                    bars,
                    indicators,
                    params,
                    preset.palette.clone(),
                ))
            })
            .collect();

        let subscriptions = Disposables::new();
        for (pane, config) in panes.iter().zip(&preset.sub_panes) {
            if config.link_viewport {
                subscriptions.push(link(&main.chart, pane.chart()));
            } else {
                debug!("{} 독립 가시 범위", pane.name());
            }
        }

        let mut axis_panes = vec![main.clone()];
        axis_panes.extend(
            panes
                .iter()
                .map(|pane| PaneHandles::new(Rc::clone(pane.chart()), Rc::clone(pane.container()))),
        );
        subscriptions.push(sync_axis_widths(&axis_panes));

        for pane in &panes {
            subscriptions.push(pane.attach_reprojection());
        }

        let blinks = [BlinkTarget::Lifeline, BlinkTarget::Trendline]
            .into_iter()
            .map(|target| {
                let period = match target {
                    BlinkTarget::Lifeline => preset.blink.lifeline_period,
                    BlinkTarget::Trendline => preset.blink.trendline_period,
                };
                let line = preset
                    .ma_line(period)
                    .and_then(|spec| ma_lines.iter().find(|line| line.period == spec.period))
                    .map(|line| BlinkLine {
                        chart: Rc::clone(&main.chart),
                        series: line.series,
                        base_color: line.color.clone(),
                    });
                if line.is_none() {
                    warn!("{} 이동평균선({})이 메인 차트에 없음", target.key(), period);
                }
                BlinkToggle::new(
                    target,
                    line,
                    &preset.palette.blink,
                    preset.toolbar.blink_interval_ms,
                    Rc::clone(&scheduler),
                )
            })
            .collect();

        let controller = OverlayController::new(
            panes,
            blinks,
            toolbar,
            scheduler,
            preset.toolbar.double_click_window_ms,
        );
        controller.attach();

        if let Some(kind) = preset.initial_overlay {
            controller.apply_all(kind);
        }

        info!(
            "차트 그룹 마운트: {} ({} {}, 메인 캔들 {}개, 보조 차트 {}개)",
            preset.name,
            preset.exchange,
            preset.symbol,
            main_bars.len(),
            expected
        );

        Ok(PaneGroup {
            name: preset.name.clone(),
            main,
            candle_series,
            ma_lines,
            controller,
            subscriptions,
            disposed: Cell::new(false),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn main(&self) -> &PaneHandles {
        &self.main
    }

    pub fn candle_series(&self) -> Option<SeriesId> {
        self.candle_series
    }

    pub fn ma_lines(&self) -> &[MaLineHandle] {
        &self.ma_lines
    }

    pub fn controller(&self) -> &Rc<OverlayController> {
        &self.controller
    }

    pub fn sub_panes(&self) -> &[Rc<SubPane>] {
        self.controller.panes()
    }

    /// 보조 차트별 현재 오버레이 상태
    pub fn states(&self) -> Vec<Option<IndicatorKind>> {
        self.controller.states()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    /// 모든 구독, 대기 중인 클릭, 깜빡임 타이머를 해제
    ///
    /// 여러 번 호출해도 되며, 차트가 먼저 제거된 경우에도 오류를 삼킵니다.
    pub fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        self.controller.dispose();
        self.subscriptions.dispose_all();
        info!("차트 그룹 해제: {}", self.name);
    }
}

fn draw_candles(main: &PaneHandles, bars: &[Bar]) -> Option<SeriesId> {
    let id = main
        .chart
        .add_series(SeriesKind::Candlestick, SeriesOptions::line("#000000"))
        .inspect_err(|e| warn!("메인 캔들 시리즈 생성 실패: {}", e))
        .ok()?;
    if let Err(e) = main
        .chart
        .set_series_data(id, SeriesData::Candles(bars.to_vec()))
    {
        warn!("메인 캔들 데이터 설정 실패: {}", e);
    }
    Some(id)
}

fn draw_ma_lines(main: &PaneHandles, preset: &PresetConfig, bars: &[Bar]) -> Vec<MaLineHandle> {
    let mut lines = Vec::with_capacity(preset.ma_lines.len());
    for spec in &preset.ma_lines {
        let series = spec.ma_type.compute(bars, spec.period);
        let id = match main
            .chart
            .add_series(SeriesKind::Line, SeriesOptions::line(&spec.color))
        {
            Ok(id) => id,
            Err(e) => {
                warn!("{}{} 이동평균선 생성 실패: {}", spec.ma_type, spec.period, e);
                continue;
            }
        };
        let padded = pad_with_whitespace(bars, &series);
        if let Err(e) = main.chart.set_series_data(id, SeriesData::Line(padded)) {
            warn!("{}{} 이동평균선 데이터 설정 실패: {}", spec.ma_type, spec.period, e);
        }
        lines.push(MaLineHandle {
            period: spec.period,
            series: id,
            color: spec.color.clone(),
        });
    }
    lines
}
