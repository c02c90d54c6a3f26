//! Middleware applied to every request before dispatch.

pub mod request_id;
