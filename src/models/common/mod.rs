pub mod pagination;
pub mod response;

pub use pagination::{PaginationInfo, PaginationQuery, page_window};
pub use response::ApiResponse;
