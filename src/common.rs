pub mod error;
pub mod pagination;
pub mod response;
pub mod serde_utils;
