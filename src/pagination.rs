use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::notification::notification_models::Notification;
use crate::task::task_models::Task;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page() - 1) * i64::from(self.limit())
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[aliases(TaskPage = PaginatedResponse<Task>, NotificationPage = PaginatedResponse<Notification>)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: i64, params: PageParams) -> Self {
        let limit = params.limit();
        let total_pages = (total.max(0) as f64 / limit as f64).ceil() as u32;

        Self {
            data,
            total,
            page: params.page(),
            limit,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_clamping() {
        let params = PageParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 10);
        assert_eq!(params.offset(), 0);

        let params = PageParams { page: Some(0), limit: Some(1000) };
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_offset_and_total_pages() {
        let params = PageParams { page: Some(3), limit: Some(10) };
        assert_eq!(params.offset(), 20);

        let page = PaginatedResponse::new(vec![1, 2, 3], 23, params);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 3);

        let empty: PaginatedResponse<u8> = PaginatedResponse::new(vec![], 0, PageParams::default());
        assert_eq!(empty.total_pages, 0);
    }
}
