//! 타이머 포트
//!
//! 더블 클릭 판정과 생명선/추세선 깜빡임은 모두 이 트레이트를 통해 타이머를 겁니다.
//! 호스트 환경이 실제 이벤트 루프 타이머를 제공하고,
//! 테스트와 헤드리스 실행은 [`ManualScheduler`]로 가상 시간을 진행시킵니다.

use log::trace;
use std::cell::{Cell, RefCell};
use std::fmt;

/// 타이머 식별자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

pub trait Scheduler {
    /// `delay_ms` 뒤에 한 번 실행
    fn set_timeout(&self, delay_ms: u64, callback: Box<dyn FnOnce()>) -> TimerId;

    /// `interval_ms`마다 반복 실행
    fn set_interval(&self, interval_ms: u64, callback: Box<dyn FnMut()>) -> TimerId;

    /// 타이머 취소. 이미 실행됐거나 없는 타이머면 아무것도 하지 않음
    fn clear(&self, id: TimerId);
}

enum TimerCallback {
    Once(Box<dyn FnOnce()>),
    Repeat(Box<dyn FnMut()>),
}

struct Timer {
    id: TimerId,
    due: u64,
    /// 같은 시각 타이머의 실행 순서
    seq: u64,
    interval: u64,
    callback: TimerCallback,
}

/// 가상 시간 스케줄러
///
/// [`ManualScheduler::advance`]를 호출할 때만 시간이 흐르며,
/// 만기된 타이머를 만기 시각 순서대로 실행합니다.
#[derive(Default)]
pub struct ManualScheduler {
    now: Cell<u64>,
    next_id: Cell<u64>,
    next_seq: Cell<u64>,
    timers: RefCell<Vec<Timer>>,
    running: Cell<Option<TimerId>>,
    running_cleared: Cell<bool>,
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("now", &self.now.get())
            .field("pending", &self.pending_count())
            .finish()
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 현재 가상 시각 (ms)
    pub fn now(&self) -> u64 {
        self.now.get()
    }

    pub fn pending_count(&self) -> usize {
        self.timers.borrow().len()
    }

    /// 가상 시간을 `ms`만큼 진행하며 만기된 타이머 실행
    pub fn advance(&self, ms: u64) {
        let target = self.now.get().saturating_add(ms);

        while let Some(timer) = self.take_next_due(target) {
            self.now.set(timer.due);
            trace!("{} 실행 (t={})", timer.id, timer.due);

            match timer.callback {
                TimerCallback::Once(callback) => callback(),
                TimerCallback::Repeat(mut callback) => {
                    self.running.set(Some(timer.id));
                    self.running_cleared.set(false);
                    callback();
                    self.running.set(None);

                    if !self.running_cleared.get() {
                        let seq = self.bump_seq();
                        self.timers.borrow_mut().push(Timer {
                            id: timer.id,
                            due: timer.due + timer.interval,
                            seq,
                            interval: timer.interval,
                            callback: TimerCallback::Repeat(callback),
                        });
                    }
                }
            }
        }

        self.now.set(target);
    }

    fn take_next_due(&self, target: u64) -> Option<Timer> {
        let mut timers = self.timers.borrow_mut();
        let idx = timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due <= target)
            .min_by_key(|(_, timer)| (timer.due, timer.seq))
            .map(|(idx, _)| idx)?;
        Some(timers.remove(idx))
    }

    fn bump_seq(&self) -> u64 {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        seq
    }

    fn schedule(&self, delay_ms: u64, interval: u64, callback: TimerCallback) -> TimerId {
        let id = TimerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        let seq = self.bump_seq();
        self.timers.borrow_mut().push(Timer {
            id,
            due: self.now.get().saturating_add(delay_ms),
            seq,
            interval,
            callback,
        });
        id
    }
}

impl Scheduler for ManualScheduler {
    fn set_timeout(&self, delay_ms: u64, callback: Box<dyn FnOnce()>) -> TimerId {
        self.schedule(delay_ms, 0, TimerCallback::Once(callback))
    }

    fn set_interval(&self, interval_ms: u64, callback: Box<dyn FnMut()>) -> TimerId {
        // 0ms 반복은 advance가 끝나지 않으므로 최소 1ms
        let interval = interval_ms.max(1);
        self.schedule(interval, interval, TimerCallback::Repeat(callback))
    }

    fn clear(&self, id: TimerId) {
        if self.running.get() == Some(id) {
            self.running_cleared.set(true);
        }
        self.timers.borrow_mut().retain(|timer| timer.id != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_timeout_fires_once_at_due_time() {
        let scheduler = ManualScheduler::new();
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        scheduler.set_timeout(220, Box::new(move || counter.set(counter.get() + 1)));

        scheduler.advance(219);
        assert_eq!(fired.get(), 0);
        scheduler.advance(1);
        assert_eq!(fired.get(), 1);
        scheduler.advance(1000);
        assert_eq!(fired.get(), 1);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_clear_cancels_timeout() {
        let scheduler = ManualScheduler::new();
        let fired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&fired);
        let id = scheduler.set_timeout(10, Box::new(move || flag.set(true)));
        scheduler.clear(id);
        scheduler.advance(100);
        assert!(!fired.get());
    }

    #[test]
    fn test_interval_repeats_until_cleared() {
        let scheduler = ManualScheduler::new();
        let ticks = Rc::new(Cell::new(0));
        let counter = Rc::clone(&ticks);
        let id = scheduler.set_interval(1500, Box::new(move || counter.set(counter.get() + 1)));

        scheduler.advance(4500);
        assert_eq!(ticks.get(), 3);
        scheduler.clear(id);
        scheduler.advance(10_000);
        assert_eq!(ticks.get(), 3);
    }

    #[test]
    fn test_interval_can_clear_itself() {
        let scheduler = Rc::new(ManualScheduler::new());
        let ticks = Rc::new(Cell::new(0));
        let own_id = Rc::new(Cell::new(None));

        let (sched, counter, id_cell) = (Rc::clone(&scheduler), Rc::clone(&ticks), Rc::clone(&own_id));
        let id = scheduler.set_interval(
            100,
            Box::new(move || {
                counter.set(counter.get() + 1);
                if counter.get() == 2 {
                    if let Some(id) = id_cell.get() {
                        sched.clear(id);
                    }
                }
            }),
        );
        own_id.set(Some(id));

        scheduler.advance(1000);
        assert_eq!(ticks.get(), 2);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_timers_run_in_due_order() {
        let scheduler = ManualScheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for (delay, tag) in [(30, "c"), (10, "a"), (20, "b"), (10, "a2")] {
            let log = Rc::clone(&order);
            scheduler.set_timeout(delay, Box::new(move || log.borrow_mut().push(tag)));
        }
        scheduler.advance(30);
        assert_eq!(*order.borrow(), vec!["a", "a2", "b", "c"]);
        assert_eq!(scheduler.now(), 30);
    }
}
