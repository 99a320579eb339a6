// Library for tests to access modules

pub mod aggregator;
pub mod backends;
pub mod config;
pub mod models;
pub mod ordering;
pub mod render;
pub mod routes;
pub mod view;
