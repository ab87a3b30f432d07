use std::fmt;

use alloy::primitives::utils as alloy_units;
use alloy::primitives::U256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitsError {
    #[error("amount is empty")]
    Empty,
    #[error("amount `{0}` is negative")]
    Negative(String),
    /// Not a plain decimal, or too large for 256 bits.
    #[error("amount `{0}` is not a decimal number")]
    NotDecimal(String),
    #[error("amount `{0}` has more than {1} fractional digits")]
    TooPrecise(String, u8),
}

/// A base-unit quantity together with the decimal exponent it is shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TokenAmount {
    pub raw: U256,
    pub decimals: u8,
}

impl TokenAmount {
    pub fn new(raw: U256, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    pub fn parse(text: &str, decimals: u8) -> Result<Self, UnitsError> {
        Ok(Self {
            raw: parse_units(text, decimals)?,
            decimals,
        })
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_units(self.raw, self.decimals))
    }
}

fn scale(decimals: u8) -> U256 {
    U256::from(10u64).pow(U256::from(decimals))
}

/// Render base units as a decimal string, trimming trailing zeros.
pub fn format_units(amount: U256, decimals: u8) -> String {
    if amount.is_zero() {
        return "0".into();
    }
    if decimals == 0 {
        return amount.to_string();
    }
    let scale = scale(decimals);
    let whole = amount / scale;
    let frac = amount % scale;
    if frac.is_zero() {
        format!("{whole}")
    } else {
        let mut frac_str = format!("{:0>width$}", frac.to_string(), width = decimals as usize);
        while frac_str.ends_with('0') {
            frac_str.pop();
        }
        format!("{whole}.{frac_str}")
    }
}

/// Parse a human decimal ("0.01", "12", ".5") into base units.
///
/// The conversion itself is alloy's; the guards here reject what alloy
/// would accept differently: a sign (it returns a signed value) and more
/// fractional digits than `decimals` (it truncates them).
pub fn parse_units(text: &str, decimals: u8) -> Result<U256, UnitsError> {
    let s = text.trim();
    if s.is_empty() {
        return Err(UnitsError::Empty);
    }
    if s.starts_with('-') {
        return Err(UnitsError::Negative(s.to_string()));
    }

    // "1.2300" and "3." go to alloy as "1.23" and "3"
    let s = match s.split_once('.') {
        Some((whole, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.len() > decimals as usize {
                return Err(UnitsError::TooPrecise(text.to_string(), decimals));
            }
            match (whole.is_empty(), frac.is_empty()) {
                (true, true) => return Err(UnitsError::NotDecimal(text.to_string())),
                (_, true) => whole.to_string(),
                (true, false) => format!("0.{frac}"),
                (false, false) => format!("{whole}.{frac}"),
            }
        }
        None => s.to_string(),
    };

    // the sign is already ruled out, so the absolute value is the value
    let parsed = alloy_units::parse_units(&s, decimals)
        .map_err(|e| UnitsError::NotDecimal(format!("{text} ({e})")))?;
    Ok(parsed.get_absolute())
}
