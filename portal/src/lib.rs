//! Blood bank portal core: role policy, session, route guarding and the
//! emergency blood request workflow.

pub mod config;
pub mod domain;
pub mod outbound;
