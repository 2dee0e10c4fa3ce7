mod common;

use chrono::{Days, Utc};
use pixelframe_storefront::{
    dto::{bookings::BookingForm, reviews::ReviewDraft},
    enums::{BookingStatus, FulfillmentMode},
    error::AppError,
    models::ReviewTarget,
    seed,
    services::{
        booking_service, review_service,
        session_service::PendingAction,
        storefront_service::{self, ActionOutcome},
    },
};

fn form_in(days: u64, mode: FulfillmentMode) -> BookingForm {
    let date = Utc::now()
        .date_naive()
        .checked_add_days(Days::new(days))
        .unwrap();
    BookingForm {
        mode,
        location: "Karen".into(),
        date: date.format("%Y-%m-%d").to_string(),
        time: "10:00".into(),
        notes: "Samsung 43\" has no picture".into(),
    }
}

#[tokio::test]
async fn book_service_opens_form_after_sign_in() {
    let (state, backend) = common::memory_state();
    state.catalog.load().await;
    let buyer = common::customer("Halima");
    backend.add_account(buyer.clone(), common::PASSWORD);

    let action = PendingAction::BookService {
        service_id: seed::service_id(1),
    };
    assert!(matches!(
        storefront_service::dispatch(&state, action).await,
        Err(AppError::AuthRequired)
    ));

    let signed_in = storefront_service::login(&state, &buyer.email, common::PASSWORD)
        .await
        .unwrap();
    match signed_in.resumed {
        Some(Ok(ActionOutcome::BookingForm(service))) => {
            assert_eq!(service.id, seed::service_id(1));
        }
        other => panic!("unexpected resume {other:?}"),
    }
}

#[tokio::test]
async fn submitted_booking_keeps_its_price_snapshot() {
    let (state, backend) = common::memory_state();
    state.catalog.load().await;
    let buyer = common::sign_in(&state, &backend, common::customer("Juma")).await;

    let booking = booking_service::submit_booking(
        &state,
        seed::service_id(1),
        &form_in(2, FulfillmentMode::OnSite),
    )
    .await
    .unwrap();

    assert_eq!(booking.price(), 4_000);
    assert_eq!(booking.location(), "Karen");
    assert_eq!(booking.customer_id(), buyer.id);
    assert_eq!(booking.electrician_id(), seed::JOHN_MWANGI);
    assert_eq!(booking.status(), BookingStatus::Pending);
    assert_eq!(backend.booking_count(), 1);

    let mine = booking_service::list_bookings(&state).await.unwrap();
    assert_eq!(mine, vec![booking]);
}

#[tokio::test]
async fn same_day_booking_never_reaches_the_backend() {
    let (state, backend) = common::memory_state();
    state.catalog.load().await;
    common::sign_in(&state, &backend, common::customer("Kiprop")).await;
    let calls = backend.calls();

    let err = booking_service::submit_booking(
        &state,
        seed::service_id(2),
        &form_in(0, FulfillmentMode::InShop),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(backend.calls(), calls);
    assert_eq!(backend.booking_count(), 0);
}

#[tokio::test]
async fn electrician_drives_status_and_review_updates_rating() {
    let (state, backend) = common::memory_state();
    state.catalog.load().await;
    let buyer = common::customer("Moraa");
    common::sign_in(&state, &backend, buyer.clone()).await;
    let booking = booking_service::submit_booking(
        &state,
        seed::service_id(3),
        &form_in(3, FulfillmentMode::InShop),
    )
    .await
    .unwrap();
    assert_eq!(booking.price(), 15_000);

    let err = booking_service::update_booking_status(&state, booking.id(), BookingStatus::Confirmed)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let early_review = ReviewDraft {
        target: ReviewTarget::Booking(booking.id()),
        rating: 5,
        comment: String::new(),
    };
    assert!(matches!(
        review_service::submit_review(&state, &early_review).await,
        Err(AppError::BadRequest(_))
    ));
    state.session.logout().await.unwrap();

    common::sign_in(&state, &backend, common::seed_identity(seed::DAVID_KIPKEMOI)).await;
    let listed = booking_service::list_bookings(&state).await.unwrap();
    assert_eq!(listed.len(), 1);
    booking_service::update_booking_status(&state, booking.id(), BookingStatus::Confirmed)
        .await
        .unwrap();
    let done = booking_service::update_booking_status(&state, booking.id(), BookingStatus::Completed)
        .await
        .unwrap();
    assert_eq!(done.status(), BookingStatus::Completed);
    assert_eq!(done.price(), booking.price());

    let err = booking_service::update_booking_status(&state, booking.id(), BookingStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    state.session.logout().await.unwrap();

    backend.add_account(buyer.clone(), common::PASSWORD);
    state.session.login(&buyer.email, common::PASSWORD).await.unwrap();
    let review = ReviewDraft {
        target: ReviewTarget::Booking(booking.id()),
        rating: 3,
        comment: "Took longer than quoted".into(),
    };
    review_service::submit_review(&state, &review).await.unwrap();

    let david = state
        .catalog
        .snapshot()
        .electricians
        .iter()
        .find(|e| e.id == seed::DAVID_KIPKEMOI)
        .cloned()
        .unwrap();
    assert_eq!(david.rating, 3.0);
    assert_eq!(david.review_count, 1);
    let service = state.catalog.service(seed::service_id(3)).unwrap();
    assert_eq!(service.electrician_rating, 3.0);
}

#[tokio::test]
async fn customer_may_cancel_a_pending_booking() {
    let (state, backend) = common::memory_state();
    state.catalog.load().await;
    common::sign_in(&state, &backend, common::customer("Naliaka")).await;
    let booking = booking_service::submit_booking(
        &state,
        seed::service_id(2),
        &form_in(1, FulfillmentMode::InShop),
    )
    .await
    .unwrap();

    let cancelled =
        booking_service::update_booking_status(&state, booking.id(), BookingStatus::Cancelled)
            .await
            .unwrap();
    assert_eq!(cancelled.status(), BookingStatus::Cancelled);
    assert!(cancelled.status().is_terminal());
}

#[tokio::test]
async fn rating_outside_one_to_five_is_rejected_locally() {
    let (state, backend) = common::memory_state();
    common::sign_in(&state, &backend, common::customer("Wekesa")).await;
    let calls = backend.calls();

    let draft = ReviewDraft {
        target: ReviewTarget::Product(seed::product_id(1)),
        rating: 6,
        comment: String::new(),
    };
    assert!(matches!(
        review_service::submit_review(&state, &draft).await,
        Err(AppError::Validation(_))
    ));
    assert_eq!(backend.calls(), calls);
}
