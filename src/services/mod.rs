pub mod booking_service;
pub mod catalog_service;
pub mod inventory_service;
pub mod order_service;
pub mod review_service;
pub mod session_service;
pub mod storefront_service;
