//! User account service: registration, credential login, refresh-token
//! rotation, profile maintenance and media uploads over axum.

pub mod config;
pub mod dto;
pub mod entity;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod repository;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;
