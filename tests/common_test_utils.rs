#![allow(dead_code)]

use chart_pane_core::config::{PresetConfig, SubPaneRole};
use chart_pane_core::model::Bar;
use chart_pane_core::surface::{ChartSurface, HeadlessChart, HeadlessContainer, PaneHandles};
use chart_pane_core::timeframe::Timeframe;
use std::rc::Rc;

/// 헤드리스 차트와 컨테이너 한 쌍
pub struct TestPane {
    pub chart: Rc<HeadlessChart>,
    pub container: Rc<HeadlessContainer>,
}

impl TestPane {
    pub fn new(name: &str) -> Self {
        TestPane {
            chart: Rc::new(HeadlessChart::new(name)),
            container: Rc::new(HeadlessContainer::new()),
        }
    }

    pub fn with_width(name: &str, width: f64) -> Self {
        TestPane {
            chart: Rc::new(HeadlessChart::new(name).with_price_scale_width(width)),
            container: Rc::new(HeadlessContainer::new()),
        }
    }

    pub fn handles(&self) -> PaneHandles {
        PaneHandles::new(self.chart.clone(), self.container.clone())
    }

    pub fn surface(&self) -> Rc<dyn ChartSurface> {
        self.chart.clone()
    }
}

/// 종가 배열로 합성 Bar 시리즈 생성 (시각은 `step`초 간격)
pub fn bars_from_closes(closes: &[f64], step: i64) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, close)| Bar::synthetic((i as i64 + 1) * step, *close))
        .collect()
}

/// 골든/데드 크로스가 여러 번 생기도록 진동하는 가격 시리즈
pub fn wave_bars(count: usize, step: i64) -> Vec<Bar> {
    let closes: Vec<f64> = (0..count)
        .map(|i| 100.0 + (i as f64 / 9.0).sin() * 12.0 + i as f64 * 0.05)
        .collect();
    bars_from_closes(&closes, step)
}

/// 일봉 메인 + 일봉 주 보조 차트 + 2시간봉 보조 차트 프리셋
pub fn daily_preset() -> PresetConfig {
    PresetConfig::new("test-daily", "005930", "krx", Timeframe::Day)
        .with_sub_pane(SubPaneRole::Primary, Timeframe::Day)
        .with_sub_pane(SubPaneRole::Secondary, Timeframe::Hour(2))
}
