//! 도메인 모델.
//!
//! 리포트 주기마다 만들어지는 일회성 스냅샷과 전송 페이로드를 정의한다.

pub mod report;
