pub mod catalog;
pub mod payment;
pub mod price;
pub mod task;
