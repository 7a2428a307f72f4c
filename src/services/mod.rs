pub mod auth_service;
pub mod email_service;
pub mod geocoding_service;
pub mod listing_service;
pub mod media_service;
pub mod payment_service;
pub mod review_service;
