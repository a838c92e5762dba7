use serde::{Deserialize, Serialize};

/// Precious metals tracked as gram-denominated pseudo-currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metal {
    Gold,
    Silver,
    Platinum,
    Palladium,
}

impl Metal {
    /// Currency code used for deposits in this metal (price per gram).
    pub fn code(&self) -> &'static str {
        match self {
            Metal::Gold => "AUR",
            Metal::Silver => "AGR",
            Metal::Platinum => "PTR",
            Metal::Palladium => "PDR",
        }
    }
}

/// Normalize a currency code the way it's stored in the rate archive.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Currency codes are 3 ASCII letters (ISO 4217 or a metal code).
pub fn is_valid_code(code: &str) -> bool {
    let code = code.trim();
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}
