use placedb_core::types::{Amenities, ParkingOptions, PaymentOptions, Place};
use placedb_core::{GeoPoint, PlaceCategory};
use placedb_ingest::formatter_for;

fn place() -> Place {
    let mut p = Place::new("p1", "Blue Bottle Samcheong", GeoPoint { lat: 37.58, lon: 126.98 });
    p.address = "76 Bukchon-ro 5-gil, Jongno-gu".into();
    p
}

#[test]
fn every_category_has_its_own_formatter() {
    for category in PlaceCategory::ALL {
        assert_eq!(formatter_for(category).category(), category);
    }
}

#[test]
fn cafe_without_reviews_says_so() {
    let text = formatter_for(PlaceCategory::Cafe).describe(&place());
    assert!(text.starts_with("Blue Bottle Samcheong is a cafe located at 76 Bukchon-ro 5-gil, Jongno-gu."));
    assert!(text.contains("no reviews yet"));
    assert!(text.contains("- Coffee: unknown"));
    assert!(text.contains("- No parking information"));
    assert!(text.contains("- No payment information"));
    assert!(!text.contains("[Reviews]"));
}

#[test]
fn cafe_lists_flags_bands_and_reviews() {
    let mut p = place();
    p.rating = Some(4.6);
    p.review_count = Some(120);
    p.amenities = Amenities { serves_coffee: Some(true), outdoor_seating: Some(false), ..Amenities::default() };
    p.parking = Some(ParkingOptions { paid_parking_lot: Some(true), ..ParkingOptions::default() });
    p.reviews = vec!["great pour over\nand quiet".into(), "   ".into()];
    let text = formatter_for(PlaceCategory::Cafe).describe(&p);
    assert!(text.contains("rated 4.6 out of 5 across 120 reviews"));
    assert!(text.contains("very highly"));
    assert!(text.contains("- Coffee: available"));
    assert!(text.contains("- Outdoor seating: not available"));
    assert!(text.contains("- Paid parking lot: available"));
    assert!(text.ends_with("- great pour over and quiet"));
}

#[test]
fn restaurant_falls_back_to_generic_cuisine() {
    let mut p = place();
    let text = formatter_for(PlaceCategory::Restaurant).describe(&p);
    assert!(text.contains("no rating or reviews"));
    assert!(text.contains("[Cuisine]\n- Restaurant"));

    p.primary_type = Some("Korean barbecue".into());
    p.rating = Some(3.9);
    p.review_count = Some(8);
    let text = formatter_for(PlaceCategory::Restaurant).describe(&p);
    assert!(text.contains("rated 3.9 out of 5 across 8 reviews"));
    assert!(text.contains("- Korean barbecue"));
}

#[test]
fn parking_keeps_at_most_five_reviews_and_known_payment_flags() {
    let mut p = place();
    p.rating = Some(2.5);
    p.review_count = Some(9);
    p.payment = Some(PaymentOptions { accepts_credit_cards: Some(true), ..PaymentOptions::default() });
    p.reviews = (1..=8).map(|i| format!("review {i}")).collect();
    let text = formatter_for(PlaceCategory::Parking).describe(&p);
    assert!(text.contains("is a parking lot"));
    assert!(text.contains("are low"));
    assert!(text.contains("- Credit cards: available"));
    assert!(!text.contains("Debit cards"));
    assert!(text.contains("- review 5"));
    assert!(!text.contains("- review 6"));
}

#[test]
fn activity_only_lists_known_facilities() {
    let mut p = place();
    p.amenities = Amenities { restroom: Some(true), ..Amenities::default() };
    p.parking = Some(ParkingOptions::default());
    let text = formatter_for(PlaceCategory::Activity).describe(&p);
    assert!(text.contains("no visitor feedback"));
    assert!(text.contains("- Restroom: available"));
    assert!(text.contains("- Parking: yes"));
    assert!(!text.contains("Delivery"));
    assert!(text.ends_with("[No reviews]"));
}
