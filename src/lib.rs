pub mod app_config;
pub mod constants;
pub mod db;
pub mod email;
pub mod ip;
pub mod middleware;
pub mod orm;
pub mod platform;
pub mod rate_limit;
pub mod registration;
pub mod results;
pub mod session;
pub mod storage;
pub mod survey;
pub mod user;
pub mod web;
