use chrono::{Days, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    dto::bookings::BookingForm,
    enums::{BookingStatus, Capability, FulfillmentMode, Location, TimeSlot},
    error::{AppError, AppResult},
    models::{Booking, Identity, Service},
    state::AppState,
};

pub const BOOK_SERVICE_FORM: &str = "book_service";

pub fn price_for(service: &Service, mode: FulfillmentMode) -> i64 {
    match mode {
        FulfillmentMode::InShop => service.base_price,
        FulfillmentMode::OnSite => service.on_site_price,
    }
}

/// Validates the booking form against today's UTC date. Nothing is sent and
/// `service` is not touched; two calls with the same input differ only in
/// id and timestamp.
pub fn build_booking_request(
    service: &Service,
    customer: &Identity,
    form: &BookingForm,
) -> AppResult<Booking> {
    build_booking_request_on(Utc::now().date_naive(), service, customer, form)
}

pub fn build_booking_request_on(
    today: NaiveDate,
    service: &Service,
    customer: &Identity,
    form: &BookingForm,
) -> AppResult<Booking> {
    let location = match form.mode {
        FulfillmentMode::InShop => service.shop_address.clone(),
        FulfillmentMode::OnSite => {
            let raw = form.location.trim();
            if raw.is_empty() {
                return Err(AppError::Validation(
                    "on-site bookings need a service location".into(),
                ));
            }
            raw.parse::<Location>()?.as_str().to_string()
        }
    };

    let scheduled_date = NaiveDate::parse_from_str(form.date.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("`{}` is not a valid date", form.date)))?;
    let earliest = today
        .checked_add_days(Days::new(1))
        .ok_or_else(|| AppError::Validation("date is out of range".into()))?;
    if scheduled_date < earliest {
        return Err(AppError::Validation(format!(
            "bookings open from {earliest} onwards"
        )));
    }

    let scheduled_time: TimeSlot = form.time.parse()?;

    Ok(Booking {
        id: Uuid::new_v4(),
        service_id: service.id,
        customer_id: customer.id,
        electrician_id: service.electrician_id,
        mode: form.mode,
        location,
        price: price_for(service, form.mode),
        scheduled_date,
        scheduled_time,
        notes: form.notes.trim().to_string(),
        status: BookingStatus::Pending,
        created_at: Utc::now(),
    })
}

pub async fn submit_booking(
    state: &AppState,
    service_id: Uuid,
    form: &BookingForm,
) -> AppResult<Booking> {
    let customer = state.session.require_capability(Capability::BookServices)?;
    let service = state.catalog.service(service_id).ok_or(AppError::NotFound)?;
    if service.electrician_id == customer.id {
        return Err(AppError::Validation("you cannot book your own service".into()));
    }
    let booking = build_booking_request(&service, &customer, form)?;

    let _ticket = state.guard.begin(BOOK_SERVICE_FORM)?;
    let booking = state.data.insert_booking(&customer, &booking).await?;

    tracing::info!(
        booking_id = %booking.id(),
        service_id = %service.id,
        price = booking.price(),
        "booking submitted"
    );
    Ok(booking)
}

/// Bookings where the signed-in identity is the customer or the electrician.
pub async fn list_bookings(state: &AppState) -> AppResult<Vec<Booking>> {
    let actor = state.session.actor()?;
    state.data.list_bookings(&actor).await
}

pub async fn update_booking_status(
    state: &AppState,
    id: Uuid,
    status: BookingStatus,
) -> AppResult<Booking> {
    let actor = state.session.actor()?;
    let booking = state.data.update_booking_status(&actor, id, status).await?;
    tracing::info!(booking_id = %id, status = %status, "booking status changed");
    Ok(booking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::Role;
    use crate::seed;

    fn customer() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            name: "Wanjiru".into(),
            email: "wanjiru@example.com".into(),
            role: Role::Customer,
            phone: None,
            location: Some(Location::Karen),
            verified: true,
            avatar: None,
            rating: None,
            review_count: None,
        }
    }

    fn form(mode: FulfillmentMode, location: &str, date: &str, time: &str) -> BookingForm {
        BookingForm {
            mode,
            location: location.into(),
            date: date.into(),
            time: time.into(),
            notes: String::new(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    #[test]
    fn price_follows_mode() {
        for service in seed::seed_services() {
            assert_eq!(price_for(&service, FulfillmentMode::InShop), service.base_price);
            assert_eq!(price_for(&service, FulfillmentMode::OnSite), service.on_site_price);
        }
    }

    #[test]
    fn same_day_is_rejected_and_tomorrow_accepted() {
        let service = &seed::seed_services()[0];
        let who = customer();
        let same_day = form(FulfillmentMode::InShop, "", "2025-03-10", "10:00");
        assert!(matches!(
            build_booking_request_on(today(), service, &who, &same_day),
            Err(AppError::Validation(_))
        ));
        let yesterday = form(FulfillmentMode::InShop, "", "2025-03-09", "10:00");
        assert!(build_booking_request_on(today(), service, &who, &yesterday).is_err());

        let tomorrow = form(FulfillmentMode::InShop, "", "2025-03-11", "10:00");
        let booking = build_booking_request_on(today(), service, &who, &tomorrow).unwrap();
        assert_eq!(booking.status(), BookingStatus::Pending);
        assert_eq!(booking.price(), 2_500);
        assert_eq!(booking.location(), service.shop_address);
    }

    #[test]
    fn on_site_needs_a_known_location() {
        let service = &seed::seed_services()[0];
        let who = customer();
        for location in ["", "   ", "Atlantis"] {
            let f = form(FulfillmentMode::OnSite, location, "2025-03-12", "09:00");
            assert!(matches!(
                build_booking_request_on(today(), service, &who, &f),
                Err(AppError::Validation(_))
            ));
        }
        let f = form(FulfillmentMode::OnSite, "Westlands", "2025-03-12", "09:00");
        let booking = build_booking_request_on(today(), service, &who, &f).unwrap();
        assert_eq!(booking.location(), "Westlands");
        assert_eq!(booking.price(), 4_000);
    }

    #[test]
    fn only_hourly_slots_between_eight_and_eighteen() {
        let service = &seed::seed_services()[1];
        let who = customer();
        for time in ["07:00", "19:00", "10:30", "noon", "8:00"] {
            let f = form(FulfillmentMode::InShop, "", "2025-03-12", time);
            assert!(build_booking_request_on(today(), service, &who, &f).is_err(), "{time}");
        }
        for time in ["08:00", "18:00"] {
            let f = form(FulfillmentMode::InShop, "", "2025-03-12", time);
            assert!(build_booking_request_on(today(), service, &who, &f).is_ok(), "{time}");
        }
    }

    #[test]
    fn identical_inputs_build_equal_requests() {
        let service = seed::seed_services()[2].clone();
        let who = customer();
        let f = form(FulfillmentMode::OnSite, "Karen", "2025-04-01", "14:00");
        let a = build_booking_request_on(today(), &service, &who, &f).unwrap();
        let b = build_booking_request_on(today(), &service, &who, &f).unwrap();
        assert_ne!(a.id(), b.id());
        assert!(a.same_request_as(&b));
        assert_eq!(service, seed::seed_services()[2]);
    }
}
