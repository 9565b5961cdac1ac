use super::BlinkTarget;
use crate::scheduler::{Scheduler, TimerId};
use crate::surface::{ChartSurface, SeriesId};
use log::{debug, info};
use std::cell::Cell;
use std::rc::Rc;

/// 깜빡일 메인 차트 이동평균선
#[derive(Clone)]
pub struct BlinkLine {
    pub chart: Rc<dyn ChartSurface>,
    pub series: SeriesId,
    pub base_color: String,
}

/// 고정 주기로 선 색상을 교대하는 토글
///
/// 대상 선이 없으면(프리셋에 해당 기간의 이동평균선이 없으면) 시작되지 않습니다.
pub struct BlinkToggle {
    target: BlinkTarget,
    line: Option<BlinkLine>,
    blink_color: String,
    interval_ms: u64,
    scheduler: Rc<dyn Scheduler>,
    timer: Cell<Option<TimerId>>,
}

impl BlinkToggle {
    pub fn new(
        target: BlinkTarget,
        line: Option<BlinkLine>,
        blink_color: &str,
        interval_ms: u64,
        scheduler: Rc<dyn Scheduler>,
    ) -> Self {
        BlinkToggle {
            target,
            line,
            blink_color: blink_color.to_owned(),
            interval_ms,
            scheduler,
            timer: Cell::new(None),
        }
    }

    pub fn target(&self) -> BlinkTarget {
        self.target
    }

    pub fn is_running(&self) -> bool {
        self.timer.get().is_some()
    }

    /// 깜빡임 시작. 이미 실행 중이거나 대상 선이 없으면 false
    pub fn start(&self) -> bool {
        if self.is_running() {
            return false;
        }
        let Some(line) = &self.line else {
            debug!("{} 대상 이동평균선 없음", self.target.key());
            return false;
        };

        let chart = Rc::downgrade(&line.chart);
        let series = line.series;
        let base = line.base_color.clone();
        let blink = self.blink_color.clone();
        let lit = Cell::new(false);

        let id = self.scheduler.set_interval(
            self.interval_ms,
            Box::new(move || {
                let Some(chart) = chart.upgrade() else {
                    return;
                };
                let on = !lit.get();
                lit.set(on);
                let color = if on { &blink } else { &base };
                if let Err(e) = chart.set_series_color(series, color) {
                    debug!("깜빡임 색상 변경 실패 (무시): {}", e);
                }
            }),
        );
        self.timer.set(Some(id));
        info!("{} 깜빡임 시작 ({}ms)", self.target.key(), self.interval_ms);
        true
    }

    /// 깜빡임 중지 후 기본 색상 복원
    pub fn stop(&self) {
        let Some(id) = self.timer.take() else {
            return;
        };
        self.scheduler.clear(id);

        if let Some(line) = &self.line {
            if let Err(e) = line.chart.set_series_color(line.series, &line.base_color) {
                debug!("기본 색상 복원 실패 (무시): {}", e);
            }
        }
        info!("{} 깜빡임 중지", self.target.key());
    }

    /// 실행 중이면 중지, 아니면 시작. 토글 후 실행 여부 반환
    pub fn toggle(&self) -> bool {
        if self.is_running() {
            self.stop();
            false
        } else {
            self.start()
        }
    }
}
