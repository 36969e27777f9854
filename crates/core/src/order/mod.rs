//! Order payload construction.
//!
//! [`build_order`] turns a project, a selection and the saved buyer/address
//! lists into the exact payload the order endpoint expects. It performs no
//! I/O; the captcha solution is merged in afterwards.

mod builder;
mod types;

pub use builder::build_order;
pub use types::*;
