//! Infrastructure layer
//! 저장소 파일, 터미널, 설정 파일과 직접 통신하는 구현체 집합.

pub mod adapters;
pub mod config;
pub mod store;
