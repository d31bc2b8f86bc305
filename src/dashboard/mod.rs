pub mod dashboard_dto;
pub mod dashboard_handlers;
pub mod dashboard_service;

pub use dashboard_dto::DashboardResponse;
pub use dashboard_handlers::get_dashboard;
