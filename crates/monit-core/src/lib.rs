//! # monit-core
//!
//! Monit 도메인 모델, 포트(trait) 정의, 에러 타입.
//! 모든 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`accumulator`] — 리포트 주기별 요청 카운터 (스레드 안전)
//! - [`models`] — 리포트 스냅샷/페이로드 구조체 (serde Serialize)
//! - [`ports`] — Hexagonal Architecture 포트 인터페이스 (async_trait)
//! - [`error`] — 핵심 에러 타입 (thiserror)
//! - [`config`] — 리포트 설정 해석 (명시값 → 환경 변수)

pub mod accumulator;
pub mod config;
pub mod error;
pub mod models;
pub mod ports;
