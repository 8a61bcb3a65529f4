pub mod admin_order_service;
pub mod admin_user_service;
pub mod customer_order_service;
pub mod order_view;
pub mod staff_order_service;
