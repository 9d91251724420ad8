//! Per-field rules. Every validator is pure and returns `""` when the value
//! passes, or the message to show under the field.

use crate::models::image::{ImageBlob, MAX_IMAGE_BYTES};

pub const MAX_PRICE: f64 = 10_000_000.0;

pub fn validate_title(value: &str) -> &'static str {
    let len = value.trim().chars().count();
    if len == 0 {
        "Title is required"
    } else if len < 3 {
        "Title must be at least 3 characters"
    } else if len > 100 {
        "Title must be less than 100 characters"
    } else {
        ""
    }
}

pub fn validate_category(value: &str) -> &'static str {
    let len = value.trim().chars().count();
    if len == 0 {
        "Category is required"
    } else if len < 2 {
        "Category must be at least 2 characters"
    } else if len > 50 {
        "Category must be less than 50 characters"
    } else {
        ""
    }
}

pub fn validate_price(value: &str) -> &'static str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "Price is required";
    }
    let price = match parse_price(trimmed) {
        Some(price) => price,
        None => return "Price must be a valid number",
    };
    if price <= 0.0 {
        return "Price must be greater than 0";
    }
    if price > MAX_PRICE {
        return "Price must be less than 1 crore";
    }
    if let Some((_, fraction)) = trimmed.split_once('.') {
        if fraction.chars().count() > 2 {
            return "Max 2 decimal places";
        }
    }
    ""
}

pub fn validate_description(value: &str) -> &'static str {
    let len = value.trim().chars().count();
    if len == 0 {
        "Description is required"
    } else if len < 10 {
        "Description must be at least 10 characters"
    } else if len > 1000 {
        "Description must be less than 1000 characters"
    } else {
        ""
    }
}

pub fn validate_image(image: Option<&ImageBlob>) -> &'static str {
    match image {
        None => "Image is required",
        Some(blob) if !blob.is_image() => "File must be an image",
        Some(blob) if blob.size() > MAX_IMAGE_BYTES => "Image must be less than 1MB",
        Some(_) => "",
    }
}

/// Plain decimal notation only: digits with at most one `.`, no sign,
/// exponent, `inf` or `NaN`.
pub fn parse_price(value: &str) -> Option<f64> {
    let digits = value.chars().filter(char::is_ascii_digit).count();
    let dots = value.chars().filter(|c| *c == '.').count();
    if digits == 0 || dots > 1 || digits + dots != value.len() {
        return None;
    }
    value.parse::<f64>().ok().filter(|p| p.is_finite())
}

/// What the price input keeps of a keystroke: ASCII digits and `.`.
pub fn sanitize_price(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect()
}
