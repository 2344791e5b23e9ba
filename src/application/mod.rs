pub mod cors;
pub mod dispatch;
pub mod ports;
pub mod procedures;
pub mod request_context;
pub mod services;
pub mod use_cases;
