//! Astronomical targets and coordinate normalization.
//!
//! Right ascension and declination reach the core either as decimal degrees or
//! as sexagesimal strings. They are normalized once, here, into a [`Target`]
//! holding decimal degrees.

use serde::{Deserialize, Serialize};

use crate::error::{StaraltError, StaraltResult};

/// A coordinate as received at the query boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoordinateInput {
    /// Decimal degrees.
    Degrees(f64),
    /// Sexagesimal text; hours for RA (`"01:22:05.8"`), degrees for Dec (`"-20:14:42"`).
    Sexagesimal(String),
}

impl From<f64> for CoordinateInput {
    fn from(v: f64) -> Self {
        CoordinateInput::Degrees(v)
    }
}

impl From<&str> for CoordinateInput {
    fn from(s: &str) -> Self {
        CoordinateInput::Sexagesimal(s.to_string())
    }
}

/// Fixed ICRS target in decimal degrees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    ra_deg: f64,
    dec_deg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl Target {
    /// Build a target from decimal degrees.
    ///
    /// # Errors
    /// `StaraltError::InvalidTarget` if RA is outside [0, 360) or Dec outside [-90, 90].
    pub fn new(ra_deg: f64, dec_deg: f64, name: Option<String>) -> StaraltResult<Self> {
        if !ra_deg.is_finite() || !(0.0..360.0).contains(&ra_deg) {
            return Err(StaraltError::InvalidTarget(format!(
                "RA must be in [0, 360) degrees, got {}",
                ra_deg
            )));
        }
        if !dec_deg.is_finite() || !(-90.0..=90.0).contains(&dec_deg) {
            return Err(StaraltError::InvalidTarget(format!(
                "Dec must be in [-90, 90] degrees, got {}",
                dec_deg
            )));
        }
        Ok(Self {
            ra_deg,
            dec_deg,
            name,
        })
    }

    /// Normalize boundary inputs. Both coordinates must be of the same kind.
    pub fn from_inputs(
        ra: &CoordinateInput,
        dec: &CoordinateInput,
        name: Option<String>,
    ) -> StaraltResult<Self> {
        match (ra, dec) {
            (CoordinateInput::Degrees(ra), CoordinateInput::Degrees(dec)) => {
                Self::new(*ra, *dec, name)
            }
            (CoordinateInput::Sexagesimal(ra), CoordinateInput::Sexagesimal(dec)) => {
                let ra_hours = parse_sexagesimal(ra)
                    .map_err(|e| StaraltError::InvalidTarget(format!("RA '{}': {}", ra, e)))?;
                if !(0.0..24.0).contains(&ra_hours) {
                    return Err(StaraltError::InvalidTarget(format!(
                        "RA '{}' must be in [0, 24) hours",
                        ra
                    )));
                }
                let dec_deg = parse_sexagesimal(dec)
                    .map_err(|e| StaraltError::InvalidTarget(format!("Dec '{}': {}", dec, e)))?;
                Self::new(ra_hours * 15.0, dec_deg, name)
            }
            _ => Err(StaraltError::InvalidTarget(
                "Unsupported RA and Dec format: both must be numbers or both strings".to_string(),
            )),
        }
    }

    pub fn ra_deg(&self) -> f64 {
        self.ra_deg
    }

    pub fn dec_deg(&self) -> f64 {
        self.dec_deg
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl PartialEq for Target {
    fn eq(&self, other: &Self) -> bool {
        self.ra_deg == other.ra_deg && self.dec_deg == other.dec_deg
    }
}

/// Parse `[+-]A[:B[:C]]` into `A + B/60 + C/3600`, keeping the sign.
///
/// Accepts `:`, whitespace, and `h m s` / `d m s` / `° ′ ″` separators.
pub fn parse_sexagesimal(text: &str) -> Result<f64, String> {
    let trimmed = text.trim();
    let (negative, body) = if let Some(rest) = trimmed
        .strip_prefix('-')
        .or_else(|| trimmed.strip_prefix('\u{2212}'))
    {
        (true, rest)
    } else if let Some(rest) = trimmed.strip_prefix('+') {
        (false, rest)
    } else {
        (false, trimmed)
    };

    let normalized: String = body
        .chars()
        .map(|c| match c {
            ':' | 'h' | 'H' | 'd' | 'D' | 'm' | 'M' | 's' | 'S' | '°' | '\'' | '"' | '′' | '″' => ' ',
            other => other,
        })
        .collect();

    let fields: Vec<&str> = normalized.split_whitespace().collect();
    if fields.is_empty() || fields.len() > 3 {
        return Err("expected 1 to 3 sexagesimal fields".to_string());
    }

    let mut value = 0.0;
    for (i, field) in fields.iter().enumerate() {
        let part: f64 = field
            .parse()
            .map_err(|_| format!("'{}' is not a number", field))?;
        if !part.is_finite() || part < 0.0 {
            return Err(format!("'{}' must be a non-negative number", field));
        }
        if i > 0 && part >= 60.0 {
            return Err(format!("'{}' must be below 60", field));
        }
        value += part / 60f64.powi(i as i32);
    }

    Ok(if negative { -value } else { value })
}
