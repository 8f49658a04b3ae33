pub mod cookies;
pub mod uploads;
