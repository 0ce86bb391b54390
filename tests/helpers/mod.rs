// ==========================================
// 集成测试共享桩
// ==========================================
#![allow(dead_code)]

pub mod http_stub;
pub mod mock_backend;
pub mod mock_config;
