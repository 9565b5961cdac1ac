// 다중 차트 동기화
// viewport: 드라이버 → 팔로워 가시 범위 전파
// axis: 그룹 내 가격축 폭 정렬

pub mod axis;
pub mod viewport;

pub use axis::sync_axis_widths;
pub use viewport::{link, link_all};
