use crate::indicator::utils::{finite_points, join_on_time};
use crate::model::{CrossMarker, IndicatorPoint};

/// 부동소수점 오차로 인한 가짜 크로스를 막기 위한 기본 허용 오차
pub const DEFAULT_CROSS_EPSILON: f64 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Above,
    Below,
    /// |diff| 가 허용 오차 이내 (아직 수렴 중)
    Flat,
}

fn side(diff: f64, epsilon: f64) -> Side {
    if diff > epsilon {
        Side::Above
    } else if diff <= -epsilon {
        Side::Below
    } else {
        Side::Flat
    }
}

/// 두 시리즈의 골든/데드 크로스 마커 생성 (기본 허용 오차 사용)
///
/// # Arguments
/// * `series_a` - 기준 시리즈 (예: 단기 이동평균)
/// * `series_b` - 비교 시리즈 (예: 장기 이동평균)
/// * `up_color` - 골든 크로스 마커 색상
/// * `down_color` - 데드 크로스 마커 색상
///
/// # Returns
/// * `Vec<CrossMarker>` - 시간 순서의 크로스 마커
pub fn build_cross_markers(
    series_a: &[IndicatorPoint],
    series_b: &[IndicatorPoint],
    up_color: &str,
    down_color: &str,
) -> Vec<CrossMarker> {
    build_cross_markers_with_epsilon(
        series_a,
        series_b,
        up_color,
        down_color,
        DEFAULT_CROSS_EPSILON,
    )
}

/// 허용 오차를 지정해 크로스 마커 생성
///
/// 공통 시각에서 `diff = a - b`를 구하고, 연속된 두 점 사이에서
/// `diff <= -eps` → `diff > eps`이면 골든 크로스(위 화살표, 나중 시각),
/// `diff > eps` → `diff <= -eps`이면 데드 크로스(아래 화살표)를 만듭니다.
/// 허용 오차 안쪽(0 근처)을 지나는 전이는 마커를 만들지 않습니다.
pub fn build_cross_markers_with_epsilon(
    series_a: &[IndicatorPoint],
    series_b: &[IndicatorPoint],
    up_color: &str,
    down_color: &str,
    epsilon: f64,
) -> Vec<CrossMarker> {
    let diffs = join_on_time(&finite_points(series_a), &finite_points(series_b), |a, b| {
        a - b
    });

    diffs
        .windows(2)
        .filter_map(|pair| {
            let (_, prev) = pair[0];
            let (time, current) = pair[1];
            match (side(prev, epsilon), side(current, epsilon)) {
                (Side::Below, Side::Above) => Some(CrossMarker::golden(time, up_color)),
                (Side::Above, Side::Below) => Some(CrossMarker::dead(time, down_color)),
                _ => None,
            }
        })
        .collect()
}
