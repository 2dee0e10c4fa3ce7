pub mod accounts;
pub mod bookings;
pub mod electricians;
pub mod orders;
pub mod products;
pub mod profiles;
pub mod reviews;
pub mod services;

pub use accounts::Entity as Accounts;
pub use bookings::Entity as Bookings;
pub use electricians::Entity as Electricians;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use profiles::Entity as Profiles;
pub use reviews::Entity as Reviews;
pub use services::Entity as Services;
