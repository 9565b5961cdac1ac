use super::{BlinkTarget, BlinkToggle, SubPane, ToolbarAction};
use crate::config::SubPaneRole;
use crate::indicator::IndicatorKind;
use crate::observable::SubscriptionId;
use crate::scheduler::{Scheduler, TimerId};
use crate::surface::ToolbarPort;
use log::{debug, info, warn};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// 툴바 이벤트로 보조 차트 오버레이 상태를 전환하는 컨트롤러
///
/// - 단일 클릭: 더블 클릭 대기 시간이 지난 뒤 모든 보조 차트를 같은 지표로 전환
/// - 더블 클릭: 대기 시간 안의 두 번째 클릭이면 보조(팔로워) 차트만 전환
/// - 이미 활성인 지표를 다시 누르면 끄지 않고 다시 그림
///
/// 더블 클릭 대기는 버튼(지표)마다 관리하지만, 다른 버튼이 눌리면
/// 대기 중인 단일 클릭을 즉시 적용해 클릭 순서대로 반영합니다.
pub struct OverlayController {
    panes: Vec<Rc<SubPane>>,
    blinks: Vec<BlinkToggle>,
    toolbar: Rc<dyn ToolbarPort>,
    scheduler: Rc<dyn Scheduler>,
    double_click_window_ms: u64,
    pending: RefCell<HashMap<IndicatorKind, TimerId>>,
    listeners: RefCell<Vec<(ToolbarAction, SubscriptionId)>>,
    disposed: Cell<bool>,
}

impl OverlayController {
    pub fn new(
        panes: Vec<Rc<SubPane>>,
        blinks: Vec<BlinkToggle>,
        toolbar: Rc<dyn ToolbarPort>,
        scheduler: Rc<dyn Scheduler>,
        double_click_window_ms: u64,
    ) -> Rc<Self> {
        Rc::new(OverlayController {
            panes,
            blinks,
            toolbar,
            scheduler,
            double_click_window_ms,
            pending: RefCell::new(HashMap::new()),
            listeners: RefCell::new(Vec::new()),
            disposed: Cell::new(false),
        })
    }

    /// 모든 툴바 버튼에 클릭 핸들러 연결
    pub fn attach(self: &Rc<Self>) {
        for action in ToolbarAction::ALL {
            let weak: Weak<Self> = Rc::downgrade(self);
            let handler = Rc::new(move || {
                if let Some(controller) = weak.upgrade() {
                    controller.press(action);
                }
            });

            match self.toolbar.on_action(action.key(), handler) {
                Ok(id) => self.listeners.borrow_mut().push((action, id)),
                Err(e) => warn!("툴바 버튼 연결 실패: {} - {}", action, e),
            }
        }
        self.refresh_toolbar();
    }

    /// 툴바 버튼 클릭 처리
    pub fn press(self: &Rc<Self>, action: ToolbarAction) {
        if self.disposed.get() {
            debug!("해제된 컨트롤러에 대한 클릭 무시: {}", action);
            return;
        }

        match action {
            ToolbarAction::Indicator(kind) => self.click_indicator(kind),
            ToolbarAction::Blink(target) => self.toggle_blink(target),
        }
    }

    fn click_indicator(self: &Rc<Self>, kind: IndicatorKind) {
        self.flush_other_pending(kind);

        let pending = self.pending.borrow_mut().remove(&kind);
        if let Some(timer) = pending {
            self.scheduler.clear(timer);
            debug!("{} 더블 클릭", kind);
            self.apply_secondary(kind);
            return;
        }

        let weak = Rc::downgrade(self);
        let timer = self.scheduler.set_timeout(
            self.double_click_window_ms,
            Box::new(move || {
                let Some(controller) = weak.upgrade() else {
                    return;
                };
                if controller.pending.borrow_mut().remove(&kind).is_none() {
                    return;
                }
                if controller.disposed.get() {
                    return;
                }
                debug!("{} 단일 클릭", kind);
                controller.apply_all(kind);
            }),
        );
        self.pending.borrow_mut().insert(kind, timer);
    }

    /// 다른 버튼의 대기 중인 단일 클릭을 타이머 만료 전에 적용
    fn flush_other_pending(&self, kind: IndicatorKind) {
        let others: Vec<(IndicatorKind, TimerId)> = {
            let mut pending = self.pending.borrow_mut();
            let keys: Vec<IndicatorKind> =
                pending.keys().copied().filter(|other| *other != kind).collect();
            keys.into_iter()
                .filter_map(|other| pending.remove(&other).map(|timer| (other, timer)))
                .collect()
        };

        for (other, timer) in others {
            self.scheduler.clear(timer);
            debug!("{} 단일 클릭 (다음 클릭 {} 이전에 확정)", other, kind);
            self.apply_all(other);
        }
    }

    /// 모든 보조 차트를 지표로 전환 (각 차트의 타임프레임 파라미터 사용)
    pub fn apply_all(&self, kind: IndicatorKind) {
        for pane in &self.panes {
            pane.apply(kind);
        }
        info!("전체 보조 차트 → {}", kind);
        self.refresh_toolbar();
    }

    /// 보조(팔로워) 차트만 지표로 전환
    ///
    /// 보조 역할의 차트가 없으면 단일 클릭과 같이 동작합니다.
    pub fn apply_secondary(&self, kind: IndicatorKind) {
        let secondaries: Vec<&Rc<SubPane>> = self
            .panes
            .iter()
            .filter(|pane| pane.role() == SubPaneRole::Secondary)
            .collect();

        if secondaries.is_empty() {
            debug!("보조 역할 차트 없음, 전체 전환으로 처리: {}", kind);
            self.apply_all(kind);
            return;
        }

        for pane in secondaries {
            pane.apply(kind);
        }
        info!("보조 차트만 → {}", kind);
        self.refresh_toolbar();
    }

    /// 생명선/추세선 깜빡임 토글 (둘은 서로 배타적)
    pub fn toggle_blink(&self, target: BlinkTarget) {
        let Some(toggle) = self.blink(target) else {
            warn!("{} 깜빡임 대상이 구성되지 않음", target.key());
            return;
        };

        if !toggle.is_running() {
            if let Some(other) = self.blink(target.other()) {
                other.stop();
            }
        }
        toggle.toggle();
        self.refresh_toolbar();
    }

    pub fn is_blinking(&self, target: BlinkTarget) -> bool {
        self.blink(target).is_some_and(BlinkToggle::is_running)
    }

    /// 보조 차트별 현재 상태 (구성 순서)
    pub fn states(&self) -> Vec<Option<IndicatorKind>> {
        self.panes.iter().map(|pane| pane.state()).collect()
    }

    pub fn panes(&self) -> &[Rc<SubPane>] {
        &self.panes
    }

    pub fn has_pending_click(&self) -> bool {
        !self.pending.borrow().is_empty()
    }

    /// 대기 중인 클릭 타이머, 깜빡임 타이머, 툴바 핸들러를 모두 해제
    pub fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }

        for (_, timer) in self.pending.borrow_mut().drain() {
            self.scheduler.clear(timer);
        }
        for toggle in &self.blinks {
            toggle.stop();
        }
        for (action, id) in self.listeners.borrow_mut().drain(..) {
            if let Err(e) = self.toolbar.off_action(action.key(), id) {
                debug!("툴바 핸들러 해제 실패 (무시): {}", e);
            }
        }
        debug!("오버레이 컨트롤러 해제");
    }

    fn blink(&self, target: BlinkTarget) -> Option<&BlinkToggle> {
        self.blinks.iter().find(|toggle| toggle.target() == target)
    }

    /// 버튼 활성 표시: 어느 보조 차트든 표시 중인 지표, 실행 중인 깜빡임
    fn refresh_toolbar(&self) {
        for action in ToolbarAction::ALL {
            let active = match action {
                ToolbarAction::Indicator(kind) => {
                    self.panes.iter().any(|pane| pane.state() == Some(kind))
                }
                ToolbarAction::Blink(target) => self.is_blinking(target),
            };
            if let Err(e) = self.toolbar.set_active(action.key(), active) {
                debug!("툴바 활성 표시 실패 (무시): {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IndicatorParams, Palette};
    use crate::indicator::{CrossStyle, IndicatorSet};
    use crate::model::Bar;
    use crate::scheduler::ManualScheduler;
    use crate::surface::{HeadlessChart, HeadlessContainer, HeadlessToolbar, PaneHandles};

    struct Fixture {
        scheduler: Rc<ManualScheduler>,
        toolbar: Rc<HeadlessToolbar>,
        controller: Rc<OverlayController>,
    }

    fn pane(role: SubPaneRole) -> Rc<SubPane> {
        let data: Vec<Bar> = (0..100)
            .map(|i| Bar::synthetic(i * 3600, 50.0 + (i as f64 / 4.0).cos() * 5.0))
            .collect();
        let params = IndicatorParams::default();
        let set = IndicatorSet::build("pane", &data, &params, &CrossStyle::default(), None);
        Rc::new(SubPane::new(
            "pane",
            role,
            PaneHandles::new(
                Rc::new(HeadlessChart::new("pane")),
                Rc::new(HeadlessContainer::new()),
            ),
            data,
            set,
            params,
            Palette::default(),
        ))
    }

    fn fixture(roles: &[SubPaneRole]) -> Fixture {
        let scheduler = Rc::new(ManualScheduler::new());
        let toolbar = Rc::new(HeadlessToolbar::new());
        let controller = OverlayController::new(
            roles.iter().map(|role| pane(*role)).collect(),
            Vec::new(),
            toolbar.clone(),
            scheduler.clone(),
            220,
        );
        controller.attach();
        Fixture {
            scheduler,
            toolbar,
            controller,
        }
    }

    #[test]
    fn test_single_click_waits_for_window() {
        let f = fixture(&[SubPaneRole::Primary, SubPaneRole::Secondary]);
        f.toolbar.press("rsi");
        assert_eq!(f.controller.states(), vec![None, None]);
        assert!(f.controller.has_pending_click());

        f.scheduler.advance(220);
        assert_eq!(
            f.controller.states(),
            vec![Some(IndicatorKind::Rsi), Some(IndicatorKind::Rsi)]
        );
        assert!(f.toolbar.is_active("rsi"));
    }

    #[test]
    fn test_double_click_targets_secondary_only() {
        let f = fixture(&[SubPaneRole::Primary, SubPaneRole::Secondary]);
        f.toolbar.press("rsi");
        f.scheduler.advance(220);

        f.toolbar.press("macd");
        f.scheduler.advance(100);
        f.toolbar.press("macd");
        assert_eq!(
            f.controller.states(),
            vec![Some(IndicatorKind::Rsi), Some(IndicatorKind::Macd)]
        );

        // 두 번째 클릭으로 대기가 취소되었으므로 단일 클릭이 뒤늦게 실행되지 않음
        f.scheduler.advance(1000);
        assert_eq!(f.controller.states()[0], Some(IndicatorKind::Rsi));
        assert_eq!(
            f.toolbar.active_keys(),
            vec!["macd".to_string(), "rsi".to_string()]
        );
    }

    #[test]
    fn test_double_click_without_secondary_falls_back() {
        let f = fixture(&[SubPaneRole::Primary]);
        f.toolbar.press("disparity");
        f.toolbar.press("disparity");
        assert_eq!(f.controller.states(), vec![Some(IndicatorKind::Disparity)]);
    }

    #[test]
    fn test_clicks_after_window_are_two_singles() {
        let f = fixture(&[SubPaneRole::Primary, SubPaneRole::Secondary]);
        f.toolbar.press("rsi");
        f.scheduler.advance(300);
        f.toolbar.press("ma_oscillator");
        f.scheduler.advance(300);
        assert_eq!(
            f.controller.states(),
            vec![
                Some(IndicatorKind::MaOscillator),
                Some(IndicatorKind::MaOscillator)
            ]
        );
        assert_eq!(f.toolbar.active_keys(), vec!["ma_oscillator".to_string()]);
    }

    #[test]
    fn test_other_button_resolves_pending_single_first() {
        let f = fixture(&[SubPaneRole::Primary, SubPaneRole::Secondary]);
        f.toolbar.press("rsi");
        f.scheduler.advance(50);
        f.toolbar.press("disparity");
        assert_eq!(
            f.controller.states(),
            vec![Some(IndicatorKind::Rsi), Some(IndicatorKind::Rsi)]
        );

        f.scheduler.advance(220);
        assert_eq!(
            f.controller.states(),
            vec![Some(IndicatorKind::Disparity), Some(IndicatorKind::Disparity)]
        );
        assert!(!f.controller.has_pending_click());
    }

    #[test]
    fn test_dispose_cancels_pending_and_detaches() {
        let f = fixture(&[SubPaneRole::Primary]);
        f.toolbar.press("rsi");
        f.controller.dispose();
        f.controller.dispose();

        f.scheduler.advance(1000);
        assert_eq!(f.controller.states(), vec![None]);
        assert_eq!(f.toolbar.handler_count("rsi"), 0);
        assert_eq!(f.scheduler.pending_count(), 0);
    }
}
