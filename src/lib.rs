pub mod config;
pub mod grabber;
pub mod observability;
pub mod repo;
pub mod storage;
