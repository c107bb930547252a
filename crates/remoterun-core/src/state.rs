// remote-run Session State + Observer
// author: kodeholic
//
// 세션은 Open → Closed 한 번만 전이
// can_transition_to()로 허용된 전이만 가능하게 강제
// Closed → Closed 는 전이가 아니라 no-op (close() 멱등성)

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closed,
}

impl SessionState {
    /// 허용된 다음 상태인지 검증
    pub fn can_transition_to(&self, next: &SessionState) -> bool {
        matches!((self, next), (SessionState::Open, SessionState::Closed))
    }

    pub fn is_open(&self) -> bool {
        *self == SessionState::Open
    }
}

/// 상태 변경 알림 trait
///
/// core는 출력하지 않고, CLI가 구현해서 "Connection closed" 등을 찍는다
pub trait SessionObserver: Send + Sync {
    fn on_state_changed(&self, prev: &SessionState, next: &SessionState);
}

/// 아무것도 하지 않는 observer (테스트, 라이브러리 사용처용)
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_state_changed(&self, _prev: &SessionState, _next: &SessionState) {}
}
