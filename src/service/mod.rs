pub mod calendar_service;
pub mod dispatch;
pub mod interpreter;
pub mod session;
