use std::fmt;

/// Money is held as integer cents to keep arithmetic exact.
/// 1 krona = 100 cents, so 150.00 SEK = 15000 cents.
pub type Cents = i64;

/// Format cents as a decimal string: 15000 -> "150.00", -7 -> "-0.07".
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Parse a decimal string into cents: "150.00" -> 15000, "12.5" -> 1250,
/// "100" -> 10000. More than two decimal digits are truncated.
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };
    if digits.is_empty() {
        return Err(ParseCentsError::InvalidFormat);
    }

    let (units_str, decimals_str) = match digits.split_once('.') {
        Some((u, d)) => (u, d),
        None => (digits, ""),
    };
    if decimals_str.contains('.') {
        return Err(ParseCentsError::InvalidFormat);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str.parse().map_err(|_| ParseCentsError::InvalidFormat)?
    };

    let decimals: i64 = match decimals_str.len() {
        0 => 0,
        1 => {
            // One digit means tenths: "12.5" is 12.50
            decimals_str
                .parse::<i64>()
                .map_err(|_| ParseCentsError::InvalidFormat)?
                * 10
        }
        _ => decimals_str[..2]
            .parse()
            .map_err(|_| ParseCentsError::InvalidFormat)?,
    };

    let cents = units * 100 + decimals;
    Ok(if negative { -cents } else { cents })
}

/// Interest earned on a balance at a fractional rate, rounded to whole cents
/// with ties going away from zero. 100000 cents at 0.01 -> 1000 cents.
pub fn interest_on(balance_cents: Cents, rate: f64) -> Cents {
    (balance_cents as f64 * rate).round() as Cents
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    InvalidFormat,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::InvalidFormat => write!(f, "invalid money format"),
        }
    }
}

impl std::error::Error for ParseCentsError {}
