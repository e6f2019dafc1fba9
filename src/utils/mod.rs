pub mod email;
pub mod error;
pub mod helpers;
