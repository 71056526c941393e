/// Price charged in the shop for a product bought at `price` (shipping included).
pub fn selling_price(price: f64, multiplier: f64) -> f64 {
    round_cents(price * multiplier)
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn format_price(value: f64) -> String {
    format!("{:.2}", value)
}

/// Parses a sheet price. Blank cells are `Ok(None)`; a lone comma is taken as the
/// decimal separator.
pub fn parse_price(raw: &str) -> Result<Option<f64>, ()> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('€')
        .trim_end_matches('€')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Ok(None);
    }
    let normalized = if !cleaned.contains('.') && cleaned.matches(',').count() == 1 {
        cleaned.replace(',', ".")
    } else {
        cleaned
    };
    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(()),
    }
}

/// Parses an inventory count. Blank cells count as zero and integral floats
/// such as `5.0` are accepted.
pub fn parse_inventory(raw: &str) -> Result<i64, ()> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    if let Ok(value) = raw.parse::<i64>() {
        return Ok(value);
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 => {
            Ok(value as i64)
        }
        _ => Err(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selling_price_is_rounded_to_cents() {
        assert_eq!(selling_price(14.0, 1.40), 19.6);
        assert_eq!(selling_price(9.99, 1.40), 13.99);
        assert_eq!(format_price(selling_price(14.0, 1.40)), "19.60");
    }

    #[test]
    fn parses_prices() {
        assert_eq!(parse_price(""), Ok(None));
        assert_eq!(parse_price(" 12.5 "), Ok(Some(12.5)));
        assert_eq!(parse_price("12,50"), Ok(Some(12.5)));
        assert_eq!(parse_price("€ 7"), Ok(Some(7.0)));
        assert_eq!(parse_price("1,000.50"), Err(()));
        assert_eq!(parse_price("cheap"), Err(()));
        assert_eq!(parse_price("NaN"), Err(()));
    }

    #[test]
    fn parses_inventory() {
        assert_eq!(parse_inventory(""), Ok(0));
        assert_eq!(parse_inventory("12"), Ok(12));
        assert_eq!(parse_inventory("5.0"), Ok(5));
        assert_eq!(parse_inventory("-2"), Ok(-2));
        assert_eq!(parse_inventory("2.5"), Err(()));
        assert_eq!(parse_inventory("many"), Err(()));
    }
}
