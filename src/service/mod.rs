pub mod cookie_service;
pub mod media_service;
pub mod refresh_token_service;
pub mod token_service;
pub mod user_service;
