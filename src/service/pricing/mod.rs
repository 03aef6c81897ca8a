//! Price arithmetic shared by the flow and order texts.
//!
//! Rounding is `f64::round`, i.e. half away from zero, for both the markup
//! and the payment amount.

/// Fractional digits kept in a converted payment amount.
pub const PAYMENT_AMOUNT_DIGITS: i32 = 8;

pub fn apply_markup(base_price: u64, markup_percent: f64) -> u64 {
    let price = base_price as f64 * (1.0 + markup_percent / 100.0);
    price.round().max(0.0) as u64
}

/// Converts a RUB price into the payment currency. Non-positive or
/// non-finite rates fall back to 1.
pub fn payment_amount(price: u64, rate: f64) -> f64 {
    let rate = if rate.is_finite() && rate > 0.0 { rate } else { 1.0 };
    let scale = 10f64.powi(PAYMENT_AMOUNT_DIGITS);
    (price as f64 / rate * scale).round() / scale
}

/// Groups thousands with a space: `1234567` -> `"1 234 567"`.
pub fn format_price(price: u64) -> String {
    let digits = price.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}

/// Payment amount without trailing zeros: `550.0` -> `"550"`.
pub fn format_amount(amount: f64) -> String {
    let fixed = format!("{:.*}", PAYMENT_AMOUNT_DIGITS as usize, amount);
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_markup() {
        assert_eq!(apply_markup(1000, 10.0), 1100);
        assert_eq!(apply_markup(1000, 0.0), 1000);
        assert_eq!(apply_markup(999, 15.0), 1149); // 1148.85
        assert_eq!(apply_markup(10, 5.0), 11); // 10.5 rounds away from zero
        assert_eq!(apply_markup(0, 50.0), 0);
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(1234567), "1 234 567");
        assert_eq!(format_price(1000), "1 000");
        assert_eq!(format_price(999), "999");
        assert_eq!(format_price(0), "0");
        assert_eq!(format_price(100000), "100 000");
    }

    #[test]
    fn test_payment_amount() {
        assert_eq!(payment_amount(1100, 2.0), 550.0);
        assert_eq!(payment_amount(1100, 1.0), 1100.0);
        assert_eq!(payment_amount(1, 3.0), 0.33333333);
        assert_eq!(payment_amount(1000, 0.0), 1000.0);
        assert_eq!(payment_amount(1000, f64::NAN), 1000.0);
        assert_eq!(payment_amount(1000, -5.0), 1000.0);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(550.0), "550");
        assert_eq!(format_amount(0.33333333), "0.33333333");
        assert_eq!(format_amount(0.0125), "0.0125");
    }
}
