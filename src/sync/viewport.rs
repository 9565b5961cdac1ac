use crate::observable::{Disposables, Subscription};
use crate::surface::{ChartSurface, LogicalRange};
use log::{debug, trace, warn};
use std::cell::Cell;
use std::rc::{Rc, Weak};

/// 드라이버 차트의 가시 범위를 팔로워 차트에 단방향으로 전파
///
/// - 드라이버에 이미 가시 범위가 있으면 구독 전에 한 번 즉시 동기화합니다.
/// - 팔로워 쪽 범위 변경은 드라이버로 되돌아가지 않습니다.
/// - 반환된 핸들의 `dispose()`는 여러 번 호출해도 되고,
///   드라이버가 이미 제거된 뒤에 호출해도 오류를 삼킵니다.
///
/// # Arguments
/// * `driver` - 범위 변경을 발생시키는 차트 (보통 메인 차트)
/// * `follower` - 범위를 따라가는 차트
///
/// # Returns
/// * `Subscription` - 해제 핸들
pub fn link(driver: &Rc<dyn ChartSurface>, follower: &Rc<dyn ChartSurface>) -> Subscription {
    match driver.visible_logical_range() {
        Ok(Some(range)) => apply_range(follower.as_ref(), range),
        Ok(None) => trace!("드라이버 가시 범위 없음, 초기 동기화 생략"),
        Err(e) => debug!("드라이버 가시 범위 조회 실패: {}", e),
    }

    let weak_follower: Weak<dyn ChartSurface> = Rc::downgrade(follower);
    let propagating = Rc::new(Cell::new(false));

    let handler = Rc::new(move |range: Option<LogicalRange>| {
        let Some(range) = range else {
            return;
        };
        // 팔로워가 다시 드라이버를 움직이는 순환 구성에서도 한 번만 전파
        if propagating.replace(true) {
            trace!("가시 범위 전파 중 재진입 무시");
            return;
        }
        if let Some(follower) = weak_follower.upgrade() {
            apply_range(follower.as_ref(), range);
        }
        propagating.set(false);
    });

    let id = match driver.subscribe_visible_range_change(handler) {
        Ok(id) => id,
        Err(e) => {
            warn!("가시 범위 구독 실패: {}", e);
            return Subscription::empty();
        }
    };

    let weak_driver = Rc::downgrade(driver);
    Subscription::new(move || {
        let Some(driver) = weak_driver.upgrade() else {
            return;
        };
        if let Err(e) = driver.unsubscribe_visible_range_change(id) {
            debug!("가시 범위 구독 해제 실패 (무시): {}", e);
        }
    })
}

/// 하나의 드라이버에 여러 팔로워 연결 (팔로워마다 구독 하나)
pub fn link_all(driver: &Rc<dyn ChartSurface>, followers: &[Rc<dyn ChartSurface>]) -> Disposables {
    let links = Disposables::new();
    for follower in followers {
        links.push(link(driver, follower));
    }
    links
}

fn apply_range(follower: &dyn ChartSurface, range: LogicalRange) {
    if let Err(e) = follower.set_visible_logical_range(range) {
        debug!("팔로워 가시 범위 설정 실패 (무시): {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::HeadlessChart;

    fn pair() -> (Rc<HeadlessChart>, Rc<HeadlessChart>) {
        (
            Rc::new(HeadlessChart::new("driver")),
            Rc::new(HeadlessChart::new("follower")),
        )
    }

    #[test]
    fn test_range_propagates_driver_to_follower() {
        let (driver, follower) = pair();
        let (d, f): (Rc<dyn ChartSurface>, Rc<dyn ChartSurface>) =
            (driver.clone(), follower.clone());
        let sub = link(&d, &f);

        driver.scroll_to(LogicalRange::new(10.0, 50.0)).unwrap();
        assert_eq!(follower.current_range(), Some(LogicalRange::new(10.0, 50.0)));

        follower.scroll_to(LogicalRange::new(0.0, 5.0)).unwrap();
        assert_eq!(driver.current_range(), Some(LogicalRange::new(10.0, 50.0)));
        sub.dispose();
    }

    #[test]
    fn test_initial_sync_on_remount() {
        let (driver, follower) = pair();
        driver.scroll_to(LogicalRange::new(3.0, 30.0)).unwrap();

        let (d, f): (Rc<dyn ChartSurface>, Rc<dyn ChartSurface>) =
            (driver.clone(), follower.clone());
        let sub = link(&d, &f);
        assert_eq!(follower.current_range(), Some(LogicalRange::new(3.0, 30.0)));
        sub.dispose();
    }

    #[test]
    fn test_bidirectional_links_do_not_loop() {
        let (a, b) = pair();
        let (da, db): (Rc<dyn ChartSurface>, Rc<dyn ChartSurface>) = (a.clone(), b.clone());
        let ab = link(&da, &db);
        let ba = link(&db, &da);

        a.scroll_to(LogicalRange::new(1.0, 2.0)).unwrap();
        assert_eq!(b.current_range(), Some(LogicalRange::new(1.0, 2.0)));
        assert!(a.range_writes() <= 2);

        ab.dispose();
        ba.dispose();
    }

    #[test]
    fn test_dispose_after_driver_teardown() {
        let (driver, follower) = pair();
        let (d, f): (Rc<dyn ChartSurface>, Rc<dyn ChartSurface>) =
            (driver.clone(), follower.clone());
        let sub = link(&d, &f);
        assert_eq!(driver.range_subscriber_count(), 1);

        driver.dispose();
        sub.dispose();
        sub.dispose();
        assert!(sub.is_disposed());
    }

    #[test]
    fn test_dead_follower_is_ignored() {
        let (driver, follower) = pair();
        let (d, f): (Rc<dyn ChartSurface>, Rc<dyn ChartSurface>) =
            (driver.clone(), follower.clone());
        let sub = link(&d, &f);

        follower.dispose();
        driver.scroll_to(LogicalRange::new(0.0, 1.0)).unwrap();
        assert_eq!(follower.range_writes(), 0);
        sub.dispose();
    }

    #[test]
    fn test_link_all() {
        let driver: Rc<dyn ChartSurface> = Rc::new(HeadlessChart::new("driver"));
        let followers: Vec<Rc<HeadlessChart>> = (0..3)
            .map(|i| Rc::new(HeadlessChart::new(&format!("f{}", i))))
            .collect();
        let handles: Vec<Rc<dyn ChartSurface>> = followers
            .iter()
            .map(|f| f.clone() as Rc<dyn ChartSurface>)
            .collect();

        let links = link_all(&driver, &handles);
        assert_eq!(links.len(), 3);
        driver
            .set_visible_logical_range(LogicalRange::new(5.0, 6.0))
            .unwrap();
        for follower in &followers {
            assert_eq!(follower.current_range(), Some(LogicalRange::new(5.0, 6.0)));
        }
        links.dispose_all();
    }
}
