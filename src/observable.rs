//! 단일 스레드 이벤트 구독 모델
//!
//! 모든 구독은 명시적인 해제 핸들([`Subscription`])을 반환하며,
//! 차트 그룹 해제는 보관한 핸들을 모두 호출하는 것으로 끝납니다.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// 구독 식별자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type Handler<T> = Rc<dyn Fn(&T)>;

/// 타입이 있는 이벤트 소스
pub struct Observable<T> {
    next_id: Cell<u64>,
    handlers: RefCell<Vec<(SubscriptionId, Handler<T>)>>,
}

impl<T> Default for Observable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("handlers", &self.handlers.borrow().len())
            .finish()
    }
}

impl<T> Observable<T> {
    pub fn new() -> Self {
        Observable {
            next_id: Cell::new(1),
            handlers: RefCell::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, handler: impl Fn(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(self.next_id.get().wrapping_add(1));
        self.handlers.borrow_mut().push((id, Rc::new(handler)));
        id
    }

    /// 구독 해제. 이미 해제된 id면 false
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        match handlers.iter().position(|(sid, _)| *sid == id) {
            Some(idx) => {
                handlers.remove(idx);
                true
            }
            None => false,
        }
    }

    /// 현재 구독자 모두에게 이벤트 전달
    ///
    /// 핸들러 목록을 복사한 뒤 호출하므로, 핸들러 안에서 구독/해제를 해도 됩니다.
    pub fn emit(&self, value: &T) {
        let handlers: Vec<Handler<T>> = self
            .handlers
            .borrow()
            .iter()
            .map(|(_, handler)| Rc::clone(handler))
            .collect();

        for handler in handlers {
            handler(value);
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub fn clear(&self) {
        self.handlers.borrow_mut().clear();
    }
}

/// 구독 해제 핸들
///
/// `dispose()`는 여러 번 호출해도 한 번만 실행됩니다.
/// Drop 시 자동 해제하지 않으므로, 반드시 보관했다가 해제해야 합니다.
#[must_use = "해제하지 않은 구독은 차트가 제거된 뒤에도 핸들러를 호출합니다"]
pub struct Subscription {
    teardown: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl Subscription {
    pub fn new(teardown: impl FnOnce() + 'static) -> Self {
        Subscription {
            teardown: RefCell::new(Some(Box::new(teardown))),
        }
    }

    /// 해제할 것이 없는 핸들 (구독 자체가 실패한 경우)
    pub fn empty() -> Self {
        Subscription {
            teardown: RefCell::new(None),
        }
    }

    pub fn dispose(&self) {
        let teardown = self.teardown.borrow_mut().take();
        if let Some(teardown) = teardown {
            teardown();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.teardown.borrow().is_none()
    }
}

/// 구독 핸들 묶음
#[derive(Debug, Default)]
pub struct Disposables {
    items: RefCell<Vec<Subscription>>,
}

impl Disposables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, subscription: Subscription) {
        self.items.borrow_mut().push(subscription);
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// 등록 역순으로 모두 해제
    pub fn dispose_all(&self) {
        let items: Vec<Subscription> = self.items.borrow_mut().drain(..).collect();
        for item in items.iter().rev() {
            item.dispose();
        }
    }

    /// 묶음 전체를 하나의 핸들로 변환
    pub fn into_subscription(self) -> Subscription {
        Subscription::new(move || self.dispose_all())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_and_unsubscribe() {
        let source = Observable::<i32>::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&seen);
        let id = source.subscribe(move |v| sink.borrow_mut().push(*v));
        source.emit(&1);
        assert!(source.unsubscribe(id));
        assert!(!source.unsubscribe(id));
        source.emit(&2);

        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn test_handler_may_unsubscribe_itself() {
        let source = Rc::new(Observable::<()>::new());
        let own_id = Rc::new(Cell::new(None));
        let calls = Rc::new(Cell::new(0));

        let (src, id_cell, counter) = (Rc::clone(&source), Rc::clone(&own_id), Rc::clone(&calls));
        let id = source.subscribe(move |_| {
            counter.set(counter.get() + 1);
            if let Some(id) = id_cell.get() {
                src.unsubscribe(id);
            }
        });
        own_id.set(Some(id));

        source.emit(&());
        source.emit(&());
        assert_eq!(calls.get(), 1);
        assert_eq!(source.handler_count(), 0);
    }

    #[test]
    fn test_subscription_dispose_is_idempotent() {
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        let sub = Subscription::new(move || counter.set(counter.get() + 1));

        assert!(!sub.is_disposed());
        sub.dispose();
        sub.dispose();
        assert!(sub.is_disposed());
        assert_eq!(count.get(), 1);
        assert!(Subscription::empty().is_disposed());
    }

    #[test]
    fn test_disposables_run_in_reverse_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let bag = Disposables::new();
        for i in 0..3 {
            let log = Rc::clone(&order);
            bag.push(Subscription::new(move || log.borrow_mut().push(i)));
        }

        let sub = bag.into_subscription();
        sub.dispose();
        sub.dispose();
        assert_eq!(*order.borrow(), vec![2, 1, 0]);
    }
}
