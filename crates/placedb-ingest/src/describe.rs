//! Natural-language place descriptions, one formatter per category.
//!
//! The text is what gets embedded, so each formatter spells out ratings, services and
//! reviews as prose and bullet lists rather than key/value dumps. Unknown flags are written
//! as "unknown" so that an absent attribute never reads like a negative one.

use std::fmt::Write;

use placedb_core::types::{Amenities, ParkingOptions, PaymentOptions, Place};
use placedb_core::PlaceCategory;

const PARKING_REVIEW_LIMIT: usize = 5;

pub trait DescriptionFormatter: Send + Sync {
    fn category(&self) -> PlaceCategory;
    fn write(&self, out: &mut String, place: &Place) -> std::fmt::Result;

    fn describe(&self, place: &Place) -> String {
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = self.write(&mut out, place);
        out.trim().to_string()
    }
}

pub fn formatter_for(category: PlaceCategory) -> &'static dyn DescriptionFormatter {
    match category {
        PlaceCategory::Parking => &ParkingFormatter,
        PlaceCategory::Cafe => &CafeFormatter,
        PlaceCategory::Restaurant => &RestaurantFormatter,
        PlaceCategory::Activity => &ActivityFormatter,
    }
}

fn tf(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "available",
        Some(false) => "not available",
        None => "unknown",
    }
}

fn flag(out: &mut String, label: &str, value: Option<bool>) -> std::fmt::Result {
    writeln!(out, "- {label}: {}", tf(value))
}

fn flag_if_known(out: &mut String, label: &str, value: Option<bool>) -> std::fmt::Result {
    match value {
        Some(_) => flag(out, label, value),
        None => Ok(()),
    }
}

fn reviews(out: &mut String, reviews: &[String], limit: usize) -> std::fmt::Result {
    for text in reviews.iter().filter(|r| !r.trim().is_empty()).take(limit) {
        writeln!(out, "- {}", text.replace('\n', " "))?;
    }
    Ok(())
}

fn services(out: &mut String, a: &Amenities) -> std::fmt::Result {
    out.push_str("[Service]\n");
    flag(out, "Lunch", a.serves_lunch)?;
    flag(out, "Dinner", a.serves_dinner)?;
    flag(out, "Brunch", a.serves_brunch)?;
    flag(out, "Dessert", a.serves_dessert)?;
    flag(out, "Coffee", a.serves_coffee)?;
    flag(out, "Wine", a.serves_wine)?;
    flag(out, "Beer", a.serves_beer)?;
    flag(out, "Vegetarian options", a.serves_vegetarian_food)?;

    out.push_str("\n[Amenities]\n");
    flag(out, "Takeout", a.takeout)?;
    flag(out, "Delivery", a.delivery)?;
    flag(out, "Dine-in", a.dine_in)?;
    flag(out, "Reservations", a.reservable)?;
    flag(out, "Outdoor seating", a.outdoor_seating)?;
    flag(out, "Restroom", a.restroom)?;

    out.push_str("\n[Audience]\n");
    flag(out, "Dogs allowed", a.allows_dogs)?;
    flag(out, "Good for children", a.good_for_children)?;
    flag(out, "Good for groups", a.good_for_groups)?;
    flag(out, "Good for watching sports", a.good_for_watching_sports)?;
    flag(out, "Live music", a.live_music)?;
    flag(out, "Kids menu", a.menu_for_children)
}

fn payment_block(out: &mut String, payment: Option<&PaymentOptions>) -> std::fmt::Result {
    out.push_str("\n[Payment]\n");
    match payment {
        Some(p) => {
            flag(out, "Credit cards", p.accepts_credit_cards)?;
            flag(out, "Debit cards", p.accepts_debit_cards)?;
            flag(out, "Cash only", p.accepts_cash_only)
        }
        None => writeln!(out, "- No payment information"),
    }
}

fn parking_block(out: &mut String, parking: Option<&ParkingOptions>) -> std::fmt::Result {
    out.push_str("\n[Parking]\n");
    match parking {
        Some(p) => {
            flag(out, "Free parking lot", p.free_parking_lot)?;
            flag(out, "Paid parking lot", p.paid_parking_lot)?;
            flag(out, "Free street parking", p.free_street_parking)?;
            flag(out, "Valet parking", p.valet_parking)?;
            flag(out, "Free garage parking", p.free_garage_parking)?;
            flag(out, "Paid garage parking", p.paid_garage_parking)
        }
        None => writeln!(out, "- No parking information"),
    }
}

pub struct CafeFormatter;

impl DescriptionFormatter for CafeFormatter {
    fn category(&self) -> PlaceCategory { PlaceCategory::Cafe }

    fn write(&self, out: &mut String, place: &Place) -> std::fmt::Result {
        writeln!(out, "{} is a cafe located at {}.", place.name, place.address)?;
        let count = place.review_count_or_zero();
        if count == 0 {
            out.push_str("There are no reviews yet.\n\n");
        } else {
            let rating = place.rating_or_zero();
            writeln!(out, "It is rated {rating} out of 5 across {count} reviews.")?;
            let verdict = match rating {
                r if r >= 4.5 => "Visitors rate it very highly.",
                r if r >= 4.0 => "Visitors rate it well.",
                r if r >= 3.5 => "Visitors find it decent.",
                r if r >= 3.0 => "Visitors find it so-so.",
                _ => "Visitors rate it poorly.",
            };
            writeln!(out, "{verdict}\n")?;
        }
        services(out, &place.amenities)?;
        parking_block(out, place.parking.as_ref())?;
        payment_block(out, place.payment.as_ref())?;
        if !place.reviews.is_empty() {
            out.push_str("\n[Reviews]\n");
            reviews(out, &place.reviews, usize::MAX)?;
        }
        Ok(())
    }
}

pub struct RestaurantFormatter;

impl DescriptionFormatter for RestaurantFormatter {
    fn category(&self) -> PlaceCategory { PlaceCategory::Restaurant }

    fn write(&self, out: &mut String, place: &Place) -> std::fmt::Result {
        let count = place.review_count_or_zero();
        if count == 0 {
            writeln!(out, "{} is located at {} and has no rating or reviews yet.\n", place.name, place.address)?;
        } else {
            writeln!(
                out,
                "{} is located at {}, rated {} out of 5 across {count} reviews.\n",
                place.name,
                place.address,
                place.rating_or_zero()
            )?;
        }
        out.push_str("[Cuisine]\n");
        writeln!(out, "- {}\n", place.primary_type.as_deref().filter(|t| !t.trim().is_empty()).unwrap_or("Restaurant"))?;
        services(out, &place.amenities)?;
        if !place.reviews.is_empty() {
            out.push_str("\n[Reviews]\n");
            reviews(out, &place.reviews, usize::MAX)?;
        }
        Ok(())
    }
}

pub struct ParkingFormatter;

impl DescriptionFormatter for ParkingFormatter {
    fn category(&self) -> PlaceCategory { PlaceCategory::Parking }

    fn write(&self, out: &mut String, place: &Place) -> std::fmt::Result {
        let rating = place.rating_or_zero();
        write!(out, "{} is a parking lot located at {}. ", place.name, place.address)?;
        write!(
            out,
            "It has {} reviews with an average rating of {rating} based on visitor feedback. ",
            place.review_count_or_zero()
        )?;
        let summary = if rating >= 4.5 {
            "Reviews are overwhelmingly positive and visitors rate it excellent. \
             A clean and convenient place to park, recommended as a well-reviewed parking lot. "
        } else if rating >= 4.0 {
            "Reviews are favourable and most visitors are satisfied with the location and convenience. \
             A good fit for anyone looking for a well-rated parking lot. "
        } else if rating >= 3.0 {
            "The rating is average; reviews mention both good points and things to improve. \
             Check the reviews and the rating before visiting. "
        } else {
            "Both the review scores and the rating are low. \
             Check the parking conditions and recent reviews before using it. "
        };
        out.push_str(summary);

        if let Some(p) = place.payment.as_ref().filter(|p| !p.is_empty()) {
            out.push_str("\n\n[Payment]\n");
            flag_if_known(out, "Credit cards", p.accepts_credit_cards)?;
            flag_if_known(out, "Debit cards", p.accepts_debit_cards)?;
            flag_if_known(out, "Cash only", p.accepts_cash_only)?;
        }

        out.push_str("\n[Review summary]\n");
        reviews(out, &place.reviews, PARKING_REVIEW_LIMIT)
    }
}

pub struct ActivityFormatter;

impl DescriptionFormatter for ActivityFormatter {
    fn category(&self) -> PlaceCategory { PlaceCategory::Activity }

    fn write(&self, out: &mut String, place: &Place) -> std::fmt::Result {
        let rating = place.rating_or_zero();
        let count = place.review_count_or_zero();
        write!(out, "{} is located at {}, rated {rating} out of 5 with {count} reviews. ", place.name, place.address)?;
        if count > 0 {
            out.push_str(match rating {
                r if r >= 4.5 => "Visitors rate it very highly. ",
                r if r >= 4.0 => "Visitors rate it well. ",
                r if r >= 3.0 => "It receives average ratings. ",
                _ => "Its rating is low. ",
            });
        } else {
            out.push_str("Without reviews there is no visitor feedback yet. ");
        }

        out.push('\n');
        payment_block(out, place.payment.as_ref())?;

        out.push_str("\n[Facilities]\n");
        let a = &place.amenities;
        flag_if_known(out, "Restroom", a.restroom)?;
        flag_if_known(out, "Dine-in", a.dine_in)?;
        flag_if_known(out, "Delivery", a.delivery)?;
        flag_if_known(out, "Takeout", a.takeout)?;
        if place.parking.is_some() {
            out.push_str("- Parking: yes\n");
        }
        flag_if_known(out, "Good for groups", a.good_for_groups)?;
        flag_if_known(out, "Good for children", a.good_for_children)?;
        flag_if_known(out, "Reservations", a.reservable)?;

        if place.reviews.is_empty() {
            out.push_str("\n[No reviews]\n");
            Ok(())
        } else {
            out.push_str("\n[Reviews]\n");
            reviews(out, &place.reviews, usize::MAX)
        }
    }
}
