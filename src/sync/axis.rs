use crate::observable::{Disposables, Subscription};
use crate::surface::{LogicalRange, PaneHandles};
use log::{debug, trace, warn};
use std::cell::Cell;
use std::rc::{Rc, Weak};

struct AxisGroup {
    panes: Vec<PaneHandles>,
    measuring: Cell<bool>,
}

impl AxisGroup {
    /// 한 번의 측정/패딩 패스
    fn sync_pass(&self) {
        if self.measuring.replace(true) {
            trace!("가격축 측정 중 재진입 무시");
            return;
        }

        let widths: Vec<f64> = self
            .panes
            .iter()
            .enumerate()
            .map(|(idx, pane)| match pane.chart.price_scale_width() {
                Ok(width) if width.is_finite() && width > 0.0 => width,
                Ok(_) => 0.0,
                Err(e) => {
                    debug!("{}번 차트 가격축 측정 실패, 0으로 처리: {}", idx, e);
                    0.0
                }
            })
            .collect();

        let target = widths.iter().copied().fold(0.0, f64::max);

        for (pane, width) in self.panes.iter().zip(&widths) {
            let spacer = if *width < target { target - width } else { 0.0 };
            if let Err(e) = pane.container.set_gutter_spacer(spacer) {
                debug!("거터 스페이서 설정 실패 (무시): {}", e);
            }
        }

        trace!("가격축 폭 정렬: {:?} → {}", widths, target);
        self.measuring.set(false);
    }
}

/// 그룹 내 모든 차트의 오른쪽 가격축 폭을 가장 넓은 폭에 맞춰 정렬
///
/// 좁은 차트는 컨테이너의 거터 스페이서로 차이만큼 채웁니다.
/// 생성 즉시 한 번 정렬하고, 이후 각 차트의 가시 범위 변경, 가격축 크기 변경,
/// 컨테이너 크기 변경마다 다시 정렬합니다.
/// 해제 후에도 스페이서는 마지막 폭을 유지합니다.
pub fn sync_axis_widths(panes: &[PaneHandles]) -> Subscription {
    let group = Rc::new(AxisGroup {
        panes: panes.to_vec(),
        measuring: Cell::new(false),
    });
    group.sync_pass();

    let subscriptions = Disposables::new();
    for pane in panes {
        subscribe_pane(&group, pane, &subscriptions);
    }

    debug!(
        "가격축 폭 동기화 시작: 차트 {}개, 구독 {}개",
        panes.len(),
        subscriptions.len()
    );
    // 핸들러는 약한 참조만 가지므로 해제 핸들이 그룹을 소유
    subscriptions.push(Subscription::new(move || drop(group)));
    subscriptions.into_subscription()
}

fn resync(group: &Weak<AxisGroup>) {
    if let Some(group) = group.upgrade() {
        group.sync_pass();
    }
}

fn subscribe_pane(group: &Rc<AxisGroup>, pane: &PaneHandles, subscriptions: &Disposables) {
    let weak_chart = Rc::downgrade(&pane.chart);
    let weak_container = Rc::downgrade(&pane.container);

    let weak = Rc::downgrade(group);
    match pane
        .chart
        .subscribe_visible_range_change(Rc::new(move |_: Option<LogicalRange>| resync(&weak)))
    {
        Ok(id) => {
            let chart = weak_chart.clone();
            subscriptions.push(Subscription::new(move || {
                if let Some(chart) = chart.upgrade() {
                    if let Err(e) = chart.unsubscribe_visible_range_change(id) {
                        debug!("가시 범위 구독 해제 실패 (무시): {}", e);
                    }
                }
            }));
        }
        Err(e) => warn!("가시 범위 구독 실패: {}", e),
    }

    let weak = Rc::downgrade(group);
    match pane
        .chart
        .subscribe_price_scale_size_change(Rc::new(move || resync(&weak)))
    {
        Ok(id) => {
            let chart = weak_chart;
            subscriptions.push(Subscription::new(move || {
                if let Some(chart) = chart.upgrade() {
                    if let Err(e) = chart.unsubscribe_price_scale_size_change(id) {
                        debug!("가격축 크기 구독 해제 실패 (무시): {}", e);
                    }
                }
            }));
        }
        Err(e) => warn!("가격축 크기 구독 실패: {}", e),
    }

    let weak = Rc::downgrade(group);
    match pane
        .container
        .observe_resize(Rc::new(move || resync(&weak)))
    {
        Ok(id) => {
            subscriptions.push(Subscription::new(move || {
                if let Some(container) = weak_container.upgrade() {
                    if let Err(e) = container.unobserve_resize(id) {
                        debug!("컨테이너 크기 구독 해제 실패 (무시): {}", e);
                    }
                }
            }));
        }
        Err(e) => warn!("컨테이너 크기 구독 실패: {}", e),
    }
}
