pub mod action;
pub mod employee;
pub mod request;
pub mod role;
