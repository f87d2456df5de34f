#![forbid(unsafe_code)]

pub mod builtin;
pub mod cache;
pub mod error;
pub mod extract;
pub mod http;
pub mod install;
pub mod links;
pub mod materialize;
pub mod paths;
pub mod platform;
pub mod registry;
pub mod resolver;
pub mod sources;
pub mod utils;
pub mod validator;
