pub mod handler;
pub mod model;

pub use handler::{get_hotel_detail, list_hotels, search_hotels};
