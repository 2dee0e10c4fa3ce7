pub mod backend;
pub mod cache;
pub mod config;
pub mod db;
pub mod dto;
pub mod entity;
pub mod enums;
pub mod error;
pub mod guard;
pub mod models;
pub mod seed;
pub mod services;
pub mod state;
pub mod telemetry;
