pub mod config;
pub mod events;
pub mod finance;
pub mod geocode;
pub mod lease;
pub mod maintenance;
pub mod notification;
pub mod payment;
pub mod report;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_support;
