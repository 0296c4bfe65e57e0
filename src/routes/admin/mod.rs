mod handler;
mod model;

pub use handler::{
    list_audit_logs, list_hotels, offline_hotel, publish_hotel, restore_hotel, review_hotel,
};
