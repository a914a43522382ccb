//! External service integrations

pub mod comprehend;
pub mod object_lambda;
