use chrono::{DateTime, Datelike, Local, TimeZone, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

/// Formats money as `₦47,500` or `₦47,500.50`; cents only appear when non-zero.
pub fn format_currency(amount: Decimal, symbol: &str) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let abs = rounded.abs();
    let whole = abs.trunc();
    let cents = ((abs - whole) * Decimal::ONE_HUNDRED).trunc();

    let digits = whole.normalize().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    if cents.is_zero() {
        format!("{}{}{}", sign, symbol, grouped)
    } else {
        format!("{}{}{}.{:0>2}", sign, symbol, grouped, cents.normalize().to_string())
    }
}

/// First instant of the current calendar month in server-local time.
pub fn month_start_local(now: DateTime<Local>) -> DateTime<Utc> {
    let naive = now
        .date_naive()
        .with_day(1)
        .and_then(|day| day.and_hms_opt(0, 0, 0));
    naive
        .and_then(|start| {
            Local
                .from_local_datetime(&start)
                .single()
                .or_else(|| Local.from_local_datetime(&start).earliest())
        })
        .map(|start| start.with_timezone(&Utc))
        .unwrap_or_else(|| now.with_timezone(&Utc))
}

pub fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(Decimal::from(47_500), "₦"), "₦47,500");
        assert_eq!(format_currency(Decimal::from(1_250_000), "₦"), "₦1,250,000");
        assert_eq!(format_currency(Decimal::from(999), "₦"), "₦999");
    }

    #[test]
    fn currency_keeps_non_zero_cents() {
        assert_eq!(format_currency(Decimal::new(4_750_050, 2), "₦"), "₦47,500.50");
        assert_eq!(format_currency(Decimal::new(105, 2), "$"), "$1.05");
        assert_eq!(format_currency(Decimal::new(-250_000, 2), "₦"), "-₦2,500");
    }

    #[test]
    fn month_start_is_first_day_midnight_local() {
        let now = Local.with_ymd_and_hms(2026, 10, 18, 15, 4, 5).single().expect("local time");
        let start = month_start_local(now).with_timezone(&Local);
        assert_eq!(start.day(), 1);
        assert_eq!(start.month(), 10);
        assert_eq!(start.format("%H:%M:%S").to_string(), "00:00:00");
    }

    #[test]
    fn blank_text_normalizes_to_none() {
        assert_eq!(normalize_optional_text(Some("   ".to_string())), None);
        assert_eq!(
            normalize_optional_text(Some(" fraud suspected ".to_string())).as_deref(),
            Some("fraud suspected")
        );
    }
}
