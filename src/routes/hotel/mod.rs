pub mod handler;
pub mod model;

pub use handler::{create_hotel, get_my_hotel, list_my_hotels, submit_hotel, update_hotel};
