use std::future::Future;

use rand::Rng;
use tracing::{debug, warn};

use crate::error::AppError;

/// Random digits appended after the two-digit prefix, first at the normal
/// width and then widened once the normal width keeps colliding.
pub const PIN_RANDOM_WIDTHS: [usize; 2] = [4, 6];
pub const PIN_ATTEMPTS_PER_WIDTH: usize = 16;

/// Last two digits of a phone number, ignoring spaces, dashes and the like.
pub fn phone_suffix(phone: Option<&str>) -> Option<String> {
    let digits: Vec<char> = phone?.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 2 {
        return None;
    }
    Some(digits[digits.len() - 2..].iter().collect())
}

fn random_digits<R: Rng + ?Sized>(rng: &mut R, count: usize) -> String {
    (0..count)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

pub fn generate_pin<R: Rng + ?Sized>(rng: &mut R, phone: Option<&str>, random_width: usize) -> String {
    let mut pin = phone_suffix(phone).unwrap_or_else(|| random_digits(rng, 2));
    pin.push_str(&random_digits(rng, random_width));
    pin
}

/// Rolls PINs until `is_taken` reports a free one.
pub async fn allocate_pin<F, Fut>(phone: Option<&str>, mut is_taken: F) -> Result<String, AppError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool, AppError>>,
{
    for width in PIN_RANDOM_WIDTHS {
        for attempt in 1..=PIN_ATTEMPTS_PER_WIDTH {
            let candidate = generate_pin(&mut rand::thread_rng(), phone, width);
            if !is_taken(candidate.clone()).await? {
                return Ok(candidate);
            }
            debug!(attempt, width, "PIN collision, re-rolling");
        }
        warn!(width, attempts = PIN_ATTEMPTS_PER_WIDTH, "PIN width exhausted, widening");
    }
    Err(AppError::Conflict("Could not allocate a unique PIN".into()))
}
