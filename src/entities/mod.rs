//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod coupon;
pub mod itinerary;
pub mod itinerary_stop;
pub mod menu_item;
pub mod reservation;
pub mod review;
pub mod saved_coupon;
pub mod user;

// Re-export specific types to avoid conflicts
pub use coupon::{
    Category, Column as CouponColumn, CouponStatus, Entity as Coupon, Model as CouponModel,
};
pub use itinerary::{Column as ItineraryColumn, Entity as Itinerary, Model as ItineraryModel};
pub use itinerary_stop::{
    Column as ItineraryStopColumn, Entity as ItineraryStop, Model as ItineraryStopModel,
};
pub use menu_item::{Column as MenuItemColumn, Entity as MenuItem, Model as MenuItemModel};
pub use reservation::{
    Column as ReservationColumn, Entity as Reservation, Model as ReservationModel,
};
pub use review::{Column as ReviewColumn, Entity as Review, Model as ReviewModel};
pub use saved_coupon::{
    Column as SavedCouponColumn, Entity as SavedCoupon, Model as SavedCouponModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel, Role};
