//! Display formatting for retail prices.
//!
//! Pure functions of (amount, currency) -> display string. Persistence and arithmetic stay in
//! plain `f64` retail amounts; these helpers exist solely for user-facing output.

use log::warn;

/// Returns the display symbol for an ISO-4217 currency code. Unknown codes fall back to the code
/// itself followed by a space (e.g. `"SEK 12.99"`).
pub fn currency_symbol(currency: &str) -> &str {
    match currency.to_ascii_uppercase().as_str() {
        "GBP" => "£",
        "USD" => "$",
        "EUR" => "€",
        _ => "",
    }
}

/// Formats a retail amount with its currency symbol, two decimal places and thousands separators.
/// `format_price(1234.5, "GBP")` -> `"£1,234.50"`.
pub fn format_price(amount: f64, currency: &str) -> String {
    if !amount.is_finite() {
        warn!("Tried to format a non-finite price ({amount}). Substituting 0.");
        return format_price(0.0, currency);
    }
    let symbol = currency_symbol(currency);
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;
    let grouped = group_thousands(whole);
    let sign = if negative { "-" } else { "" };
    if symbol.is_empty() {
        format!("{sign}{} {grouped}.{frac:02}", currency.to_ascii_uppercase())
    } else {
        format!("{sign}{symbol}{grouped}.{frac:02}")
    }
}

fn group_thousands(mut value: u64) -> String {
    let mut groups = Vec::new();
    loop {
        let group = value % 1000;
        value /= 1000;
        if value == 0 {
            groups.push(group.to_string());
            break;
        }
        groups.push(format!("{group:03}"));
    }
    groups.reverse();
    groups.join(",")
}
