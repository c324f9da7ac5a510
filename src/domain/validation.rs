//! Payload validation for the write endpoints.
//!
//! Validators take the raw wire values, collect every problem, and
//! return either a clean draft or the full list of messages. Adapters
//! surface the first message in the `validation_error` response, same
//! as the HTML forms do.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

use super::dates::{parse_date_range, parse_iso_date};

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap_or_else(|_| unreachable!())
});
static IMAGE_URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://\S+$").unwrap_or_else(|_| unreachable!()));

/// Upper bound on booking notes length.
pub const MAX_NOTES_LEN: usize = 400;

/// A validated booking creation payload.
#[derive(Debug, Clone)]
pub struct BookingDraft {
    pub room_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: i32,
    pub notes: String,
    /// Present when the booking completes a priority-waitlist flow.
    pub group_id: Option<Uuid>,
}

/// A validated booking update payload. `None` fields were not provided
/// and keep their current value.
#[derive(Debug, Clone, Default)]
pub struct BookingPatch {
    pub room_id: Option<Uuid>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub guests: Option<i32>,
    pub notes: Option<String>,
    pub group_id: Option<Uuid>,
}

/// Validates a booking creation payload.
///
/// `today` is the server-local date; check-in must not be earlier.
///
/// # Errors
///
/// Returns every validation problem found, in field order.
pub fn validate_booking_create(
    room_id: Option<&str>,
    check_in: Option<&str>,
    check_out: Option<&str>,
    guests: Option<&Value>,
    notes: Option<&str>,
    group_id: Option<&str>,
    today: NaiveDate,
) -> Result<BookingDraft, Vec<String>> {
    let mut errors = Vec::new();

    let room_id = match room_id.map(str::trim) {
        Some(text) if !text.is_empty() => match text.parse::<Uuid>() {
            Ok(id) => Some(id),
            Err(_) => {
                errors.push("Invalid room ID".to_string());
                None
            }
        },
        _ => {
            errors.push("Missing room ID".to_string());
            None
        }
    };

    let range = match parse_date_range(check_in.unwrap_or(""), check_out.unwrap_or("")) {
        Ok(range) => Some(range),
        Err(message) => {
            errors.push(message);
            None
        }
    };
    if let Some((check_in, _)) = range
        && check_in < today
    {
        errors.push("Check-in date must be today or later".to_string());
    }

    let guests = match guests.and_then(int_from_value) {
        Some(guests) if (1..=10).contains(&guests) => Some(guests as i32),
        Some(_) => {
            errors.push("Invalid guest count".to_string());
            None
        }
        None => {
            errors.push("Missing guest count".to_string());
            None
        }
    };

    let notes = notes.unwrap_or("").trim().to_string();
    if notes.len() > MAX_NOTES_LEN {
        errors.push("Notes too long".to_string());
    }

    // A malformed group id never blocks the booking; the link back to
    // the waitlist winner is simply dropped.
    let group_id = group_id.and_then(|text| text.trim().parse::<Uuid>().ok());

    if !errors.is_empty() {
        return Err(errors);
    }

    let (check_in, check_out) = range.unwrap_or((today, today));
    Ok(BookingDraft {
        room_id: room_id.unwrap_or_default(),
        check_in,
        check_out,
        guests: guests.unwrap_or_default(),
        notes,
        group_id,
    })
}

/// Validates a booking update payload. Only provided fields are
/// validated; the check-in/check-out ordering and past-date rules are
/// re-checked by the engine once the patch is overlaid on the stored
/// booking.
///
/// # Errors
///
/// Returns every validation problem found.
pub fn validate_booking_patch(
    room_id: Option<&str>,
    check_in: Option<&str>,
    check_out: Option<&str>,
    guests: Option<&Value>,
    notes: Option<&str>,
    group_id: Option<&str>,
) -> Result<BookingPatch, Vec<String>> {
    let mut errors = Vec::new();
    let mut patch = BookingPatch::default();
    let mut provided = false;

    if let Some(text) = room_id {
        provided = true;
        match text.trim().parse::<Uuid>() {
            Ok(id) => patch.room_id = Some(id),
            Err(_) => errors.push("Invalid room ID".to_string()),
        }
    }

    if let Some(text) = check_in {
        provided = true;
        match parse_iso_date(text) {
            Some(date) => patch.check_in = Some(date),
            None => errors.push("Invalid check-in date".to_string()),
        }
    }

    if let Some(text) = check_out {
        provided = true;
        match parse_iso_date(text) {
            Some(date) => patch.check_out = Some(date),
            None => errors.push("Invalid check-out date".to_string()),
        }
    }

    if let Some(value) = guests {
        provided = true;
        match int_from_value(value) {
            Some(guests) if (1..=10).contains(&guests) => patch.guests = Some(guests as i32),
            _ => errors.push("Invalid guest count".to_string()),
        }
    }

    if let Some(text) = notes {
        provided = true;
        let notes = text.trim().to_string();
        if notes.len() > MAX_NOTES_LEN {
            errors.push("Notes too long".to_string());
        } else {
            patch.notes = Some(notes);
        }
    }

    patch.group_id = group_id.and_then(|text| text.trim().parse::<Uuid>().ok());

    if !provided {
        errors.push("No valid fields provided".to_string());
    }
    if errors.is_empty() { Ok(patch) } else { Err(errors) }
}

/// A validated hotel payload. For partial updates, `None` fields were
/// not provided.
#[derive(Debug, Clone, Default)]
pub struct HotelDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub address: Option<String>,
    pub price_per_night: Option<f64>,
    pub rating: Option<f64>,
    pub available_rooms: Option<i32>,
    pub amenities: Option<Vec<String>>,
    pub image_url: Option<String>,
}

/// Validates a hotel create/update payload.
///
/// With `partial = false` every field except the image URL is required;
/// with `partial = true` only provided fields are validated and at
/// least one must survive.
///
/// # Errors
///
/// Returns every validation problem found.
#[allow(clippy::too_many_lines)]
pub fn validate_hotel_payload(
    payload: &serde_json::Map<String, Value>,
    partial: bool,
) -> Result<HotelDraft, Vec<String>> {
    let mut errors = Vec::new();
    let mut hotel = HotelDraft::default();
    let provided = |field: &str| payload.contains_key(field);
    let should_validate = |field: &str| !partial || provided(field);

    if should_validate("title") {
        let title = string_field(payload, "title");
        if (3..=120).contains(&title.len()) {
            hotel.title = Some(title);
        } else {
            errors.push("Invalid title".to_string());
        }
    }

    if should_validate("description") {
        let description = string_field(payload, "description");
        if (10..=1200).contains(&description.len()) {
            hotel.description = Some(description);
        } else {
            errors.push("Invalid description".to_string());
        }
    }

    if should_validate("location") {
        let location = string_field(payload, "location");
        if (2..=80).contains(&location.len()) {
            hotel.location = Some(location);
        } else {
            errors.push("Invalid location".to_string());
        }
    }

    if should_validate("address") {
        let address = string_field(payload, "address");
        if (5..=180).contains(&address.len()) {
            hotel.address = Some(address);
        } else {
            errors.push("Invalid address".to_string());
        }
    }

    if should_validate("price_per_night") {
        match payload.get("price_per_night").and_then(number_from_value) {
            Some(price) if price > 0.0 && price <= 1_000_000.0 => {
                hotel.price_per_night = Some(price);
            }
            _ => errors.push("Invalid price".to_string()),
        }
    }

    if should_validate("rating") {
        match payload.get("rating").and_then(number_from_value) {
            Some(rating) if (1.0..=5.0).contains(&rating) => {
                hotel.rating = Some((rating * 10.0).round() / 10.0);
            }
            _ => errors.push("Invalid rating".to_string()),
        }
    }

    if should_validate("available_rooms") {
        match payload.get("available_rooms").and_then(int_from_value) {
            Some(rooms) if (0..=1000).contains(&rooms) => {
                hotel.available_rooms = Some(rooms as i32);
            }
            _ => errors.push("Invalid available rooms".to_string()),
        }
    }

    if should_validate("amenities") {
        let amenities = normalize_amenities(payload.get("amenities"));
        let too_long = amenities.iter().any(|amenity| amenity.len() > 40);
        if amenities.is_empty() || amenities.len() > 10 || too_long {
            errors.push("Invalid amenities".to_string());
        } else {
            hotel.amenities = Some(amenities);
        }
    }

    if provided("imageUrl") || provided("image_url") {
        let image_url = if provided("imageUrl") {
            string_field(payload, "imageUrl")
        } else {
            string_field(payload, "image_url")
        };
        if image_url.is_empty() {
            hotel.image_url = Some(String::new());
        } else if IMAGE_URL_REGEX.is_match(&image_url) && image_url.len() <= 400 {
            hotel.image_url = Some(image_url);
        } else {
            errors.push("Invalid image URL".to_string());
        }
    }

    if partial
        && errors.is_empty()
        && hotel.title.is_none()
        && hotel.description.is_none()
        && hotel.location.is_none()
        && hotel.address.is_none()
        && hotel.price_per_night.is_none()
        && hotel.rating.is_none()
        && hotel.available_rooms.is_none()
        && hotel.amenities.is_none()
        && hotel.image_url.is_none()
    {
        errors.push("No valid fields provided".to_string());
    }

    if errors.is_empty() { Ok(hotel) } else { Err(errors) }
}

/// Clean registration payload.
#[derive(Debug, Clone)]
pub struct RegisterDraft {
    pub email: String,
    pub password: String,
}

/// Individual password rule outcomes, mirrored by the registration form.
#[derive(Debug, Clone, Copy)]
pub struct PasswordRules {
    pub length: bool,
    pub lower: bool,
    pub upper: bool,
    pub digit: bool,
    pub special: bool,
    pub overlap: bool,
}

impl PasswordRules {
    /// All rules satisfied.
    #[must_use]
    pub const fn all_pass(self) -> bool {
        self.length && self.lower && self.upper && self.digit && self.special && self.overlap
    }
}

/// Evaluates the password policy against a candidate password.
///
/// The overlap rule rejects passwords sharing any three-character
/// alphanumeric fragment with the local part of the email.
#[must_use]
pub fn evaluate_password_rules(password: &str, email: &str) -> PasswordRules {
    let special_count = password
        .chars()
        .filter(|c| !c.is_ascii_alphanumeric())
        .count();

    let reference = email
        .trim()
        .to_lowercase()
        .split('@')
        .next()
        .unwrap_or_default()
        .to_string();

    PasswordRules {
        length: (8..=50).contains(&password.len()),
        lower: password.chars().any(|c| c.is_ascii_lowercase()),
        upper: password.chars().any(|c| c.is_ascii_uppercase()),
        digit: password.chars().any(|c| c.is_ascii_digit()),
        special: (1..=10).contains(&special_count),
        overlap: !has_three_char_overlap(password, &reference),
    }
}

/// Validates a registration payload.
///
/// # Errors
///
/// Returns every validation problem found.
pub fn validate_register(
    email: Option<&str>,
    password: Option<&str>,
    confirm_password: Option<&str>,
    terms_accepted: bool,
) -> Result<RegisterDraft, Vec<String>> {
    let email = email.unwrap_or("").trim().to_lowercase();
    let password = password.unwrap_or("").trim().to_string();
    let confirm = confirm_password.unwrap_or("").trim();

    let mut errors = Vec::new();
    if !EMAIL_REGEX.is_match(&email) {
        errors.push("Valid email is required.".to_string());
    }
    if !evaluate_password_rules(&password, &email).all_pass() {
        errors.push("Password does not meet security requirements.".to_string());
    }
    if password != confirm {
        errors.push("Password confirmation does not match.".to_string());
    }
    if !terms_accepted {
        errors.push("You must accept the terms to continue.".to_string());
    }

    if errors.is_empty() {
        Ok(RegisterDraft { email, password })
    } else {
        Err(errors)
    }
}

/// Lossless integer extraction from a JSON value.
///
/// Accepts integral numbers and decimal strings; rejects fractional
/// values instead of truncating them.
#[must_use]
pub fn int_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                Some(int)
            } else {
                // Reject 2.5, accept 2.0 written as a float.
                let float = number.as_f64()?;
                (float.fract() == 0.0).then_some(float as i64)
            }
        }
        Value::String(text) => {
            let text = text.trim();
            if let Ok(int) = text.parse::<i64>() {
                Some(int)
            } else {
                let float = text.parse::<f64>().ok()?;
                (float.fract() == 0.0).then_some(float as i64)
            }
        }
        _ => None,
    }
}

/// Numeric extraction from a JSON value, accepting numbers and numeric
/// strings.
#[must_use]
pub fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn string_field(payload: &serde_json::Map<String, Value>, key: &str) -> String {
    match payload.get(key) {
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}

/// Accepts amenities as an array of strings or a comma-separated
/// string; either way items are trimmed and empties dropped.
fn normalize_amenities(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(ToString::to_string)
            .collect(),
        Some(Value::String(text)) => text
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(ToString::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn has_three_char_overlap(password: &str, reference: &str) -> bool {
    let password = password.to_lowercase();
    let reference = reference.to_lowercase();
    if password.len() < 3 || reference.len() < 3 {
        return false;
    }

    let chars: Vec<char> = reference.chars().collect();
    chars.windows(3).any(|window| {
        window.iter().all(char::is_ascii_alphanumeric)
            && password.contains(&window.iter().collect::<String>())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 1, 1).unwrap_or_default()
    }

    fn value(raw: &str) -> Value {
        serde_json::from_str(raw).unwrap_or(Value::Null)
    }

    #[test]
    fn booking_create_accepts_clean_payload() {
        let room = Uuid::new_v4().to_string();
        let result = validate_booking_create(
            Some(&room),
            Some("2030-06-10"),
            Some("2030-06-12"),
            Some(&value("2")),
            Some("late arrival"),
            None,
            today(),
        );
        let Ok(draft) = result else {
            panic!("expected clean draft");
        };
        assert_eq!(draft.guests, 2);
        assert_eq!(draft.notes, "late arrival");
        assert!(draft.group_id.is_none());
    }

    #[test]
    fn booking_create_rejects_past_checkin() {
        let room = Uuid::new_v4().to_string();
        let result = validate_booking_create(
            Some(&room),
            Some("2029-12-31"),
            Some("2030-01-02"),
            Some(&value("2")),
            None,
            None,
            today(),
        );
        let Err(errors) = result else {
            panic!("expected rejection");
        };
        assert!(errors.iter().any(|e| e.contains("today or later")));
    }

    #[test]
    fn booking_create_rejects_bad_ranges_and_guests() {
        let room = Uuid::new_v4().to_string();

        let inverted = validate_booking_create(
            Some(&room),
            Some("2030-06-12"),
            Some("2030-06-10"),
            Some(&value("2")),
            None,
            None,
            today(),
        );
        assert!(inverted.is_err());

        let zero_guests = validate_booking_create(
            Some(&room),
            Some("2030-06-10"),
            Some("2030-06-12"),
            Some(&value("0")),
            None,
            None,
            today(),
        );
        assert!(zero_guests.is_err());

        let eleven = validate_booking_create(
            Some(&room),
            Some("2030-06-10"),
            Some("2030-06-12"),
            Some(&value("11")),
            None,
            None,
            today(),
        );
        assert!(eleven.is_err());
    }

    #[test]
    fn booking_create_rejects_long_notes() {
        let room = Uuid::new_v4().to_string();
        let notes = "x".repeat(MAX_NOTES_LEN + 1);
        let result = validate_booking_create(
            Some(&room),
            Some("2030-06-10"),
            Some("2030-06-12"),
            Some(&value("2")),
            Some(&notes),
            None,
            today(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn booking_patch_requires_at_least_one_field() {
        assert!(validate_booking_patch(None, None, None, None, None, None).is_err());

        let Ok(patch) =
            validate_booking_patch(None, Some("2030-06-11"), None, None, None, None)
        else {
            panic!("expected patch");
        };
        assert!(patch.check_in.is_some());
        assert!(patch.check_out.is_none());
    }

    #[test]
    fn guests_decode_losslessly() {
        assert_eq!(int_from_value(&value("2")), Some(2));
        assert_eq!(int_from_value(&value("\"3\"")), Some(3));
        assert_eq!(int_from_value(&value("2.0")), Some(2));
        assert_eq!(int_from_value(&value("2.5")), None);
        assert_eq!(int_from_value(&value("\"abc\"")), None);
        assert_eq!(int_from_value(&value("true")), None);
    }

    #[test]
    fn password_rules_enforced() {
        assert!(evaluate_password_rules("Str0ng!pass", "guest@example.com").all_pass());
        // No special character.
        assert!(!evaluate_password_rules("Str0ngpass", "guest@example.com").all_pass());
        // Shares "guest" fragment with the email local part.
        assert!(!evaluate_password_rules("guest!A1xyz", "guest@example.com").overlap);
        // Too short.
        assert!(!evaluate_password_rules("A1!x", "guest@example.com").length);
    }

    #[test]
    fn hotel_payload_full_and_partial() {
        let full: serde_json::Map<String, Value> = serde_json::from_str(
            r#"{
                "title": "Seaside Inn",
                "description": "A quiet place by the water.",
                "location": "Varna",
                "address": "1 Harbour Street",
                "price_per_night": 120.5,
                "rating": 4.55,
                "available_rooms": 10,
                "amenities": ["wifi", "parking"]
            }"#,
        )
        .unwrap_or_default();
        let Ok(draft) = validate_hotel_payload(&full, false) else {
            panic!("expected clean hotel");
        };
        assert_eq!(draft.rating, Some(4.6));

        let partial: serde_json::Map<String, Value> =
            serde_json::from_str(r#"{"rating": 9}"#).unwrap_or_default();
        assert!(validate_hotel_payload(&partial, true).is_err());

        let empty: serde_json::Map<String, Value> =
            serde_json::from_str("{}").unwrap_or_default();
        assert!(validate_hotel_payload(&empty, true).is_err());
    }
}
