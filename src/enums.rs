//! Closed vocabularies shared by the catalog, the session gate and the
//! booking flow. Each set parses from, and serializes to, the exact label the
//! hosted backend stores.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AppError;

macro_rules! closed_set {
    ($(#[$meta:meta])* $name:ident ($what:literal) { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl FromStr for $name {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok($name::$variant),)+
                    other => Err(AppError::Validation(format!("unknown {} `{}`", $what, other))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

closed_set! {
    /// Fixed at account creation; never changes afterwards.
    Role ("role") {
        Customer => "customer",
        Seller => "seller",
        Electrician => "electrician",
    }
}

closed_set! {
    ProductCategory ("product category") {
        MobilePhones => "Mobile Phones",
        LaptopsAndComputers => "Laptops & Computers",
        AudioAndVideo => "Audio & Video",
        Gaming => "Gaming",
        HomeAppliances => "Home Appliances",
        Cameras => "Cameras",
        Accessories => "Accessories",
        SmartHome => "Smart Home",
        Tablets => "Tablets",
        Networking => "Networking",
    }
}

closed_set! {
    ServiceCategory ("service category") {
        TvRepair => "TV Repair",
        PhoneRepair => "Phone Repair",
        ComputerRepair => "Computer Repair",
        Installation => "Installation",
        Maintenance => "Maintenance",
    }
}

closed_set! {
    Location ("location") {
        NairobiCbd => "Nairobi CBD",
        Westlands => "Westlands",
        Karen => "Karen",
        Kilimani => "Kilimani",
        Lavington => "Lavington",
        Kasarani => "Kasarani",
        Thika => "Thika",
        Kiambu => "Kiambu",
        Nakuru => "Nakuru",
        Mombasa => "Mombasa",
        Kisumu => "Kisumu",
        Eldoret => "Eldoret",
        Machakos => "Machakos",
        Meru => "Meru",
        Nyeri => "Nyeri",
    }
}

closed_set! {
    FulfillmentMode ("fulfillment mode") {
        InShop => "in-shop",
        OnSite => "on-site",
    }
}

closed_set! {
    BookingStatus ("booking status") {
        Pending => "pending",
        Confirmed => "confirmed",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

closed_set! {
    OrderStatus ("order status") {
        Pending => "pending",
        Confirmed => "confirmed",
        Shipped => "shipped",
        Delivered => "delivered",
        Cancelled => "cancelled",
    }
}

/// Specialties an electrician can pick from when registering.
pub const SPECIALTY_OPTIONS: &[&str] = &[
    "TV Repair",
    "Mobile Phone Repair",
    "Computer Repair",
    "Home Wiring",
    "Appliance Installation",
    "Solar Installation",
    "CCTV Setup",
    "Networking",
    "Smart Home Systems",
    "Audio Systems",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Purchase,
    BookServices,
    ManageInventory,
    OfferServices,
}

impl Role {
    pub fn can(self, capability: Capability) -> bool {
        match self {
            Role::Customer => matches!(capability, Capability::Purchase | Capability::BookServices),
            Role::Seller => matches!(
                capability,
                Capability::Purchase | Capability::BookServices | Capability::ManageInventory
            ),
            Role::Electrician => matches!(
                capability,
                Capability::Purchase | Capability::BookServices | Capability::OfferServices
            ),
        }
    }

    /// Sellers and electricians wait for external approval.
    pub fn verified_on_signup(self) -> bool {
        match self {
            Role::Customer => true,
            Role::Seller | Role::Electrician => false,
        }
    }
}

impl BookingStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Confirmed, Completed) | (Pending | Confirmed, Cancelled)
        )
    }
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Confirmed, Shipped)
                | (Shipped, Delivered)
                | (Pending | Confirmed | Shipped, Cancelled)
        )
    }
}

/// Hourly booking slot between 08:00 and 18:00 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeSlot(u8);

impl TimeSlot {
    pub const FIRST_HOUR: u8 = 8;
    pub const LAST_HOUR: u8 = 18;

    pub fn at_hour(hour: u8) -> Option<Self> {
        (Self::FIRST_HOUR..=Self::LAST_HOUR)
            .contains(&hour)
            .then_some(Self(hour))
    }

    pub fn all() -> impl Iterator<Item = TimeSlot> {
        (Self::FIRST_HOUR..=Self::LAST_HOUR).map(TimeSlot)
    }

    pub fn hour(self) -> u8 {
        self.0
    }
}

impl FromStr for TimeSlot {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::Validation(format!("`{s}` is not a bookable time slot"));
        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        if minute != "00" || hour.len() != 2 {
            return Err(invalid());
        }
        let hour: u8 = hour.parse().map_err(|_| invalid())?;
        TimeSlot::at_hour(hour).ok_or_else(invalid)
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00", self.0)
    }
}

impl Serialize for TimeSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_from_str() {
        for location in Location::ALL {
            assert_eq!(location.as_str().parse::<Location>().unwrap(), *location);
        }
        assert!("Atlantis".parse::<Location>().is_err());
        assert_eq!(
            "Laptops & Computers".parse::<ProductCategory>().unwrap(),
            ProductCategory::LaptopsAndComputers
        );
    }

    #[test]
    fn only_customers_are_verified_on_signup() {
        assert!(Role::Customer.verified_on_signup());
        assert!(!Role::Seller.verified_on_signup());
        assert!(!Role::Electrician.verified_on_signup());
    }

    #[test]
    fn capabilities_follow_role() {
        assert!(Role::Seller.can(Capability::ManageInventory));
        assert!(!Role::Customer.can(Capability::ManageInventory));
        assert!(!Role::Electrician.can(Capability::ManageInventory));
        assert!(Role::Electrician.can(Capability::OfferServices));
        assert!(Role::Customer.can(Capability::BookServices));
    }

    #[test]
    fn booking_status_moves_forward_or_cancels() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
    }

    #[test]
    fn order_status_cannot_cancel_after_delivery() {
        use OrderStatus::*;
        assert!(Shipped.can_transition_to(Cancelled));
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Shipped));
    }

    #[test]
    fn time_slots_are_hourly_between_eight_and_six() {
        assert_eq!(TimeSlot::all().count(), 11);
        assert_eq!("08:00".parse::<TimeSlot>().unwrap().hour(), 8);
        assert_eq!("18:00".parse::<TimeSlot>().unwrap().to_string(), "18:00");
        assert!("07:00".parse::<TimeSlot>().is_err());
        assert!("19:00".parse::<TimeSlot>().is_err());
        assert!("09:30".parse::<TimeSlot>().is_err());
        assert!("9:00".parse::<TimeSlot>().is_err());
    }
}
