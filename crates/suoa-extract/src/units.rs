//! Conversion of extracted area expressions to square kilometres.
//!
//! Runs after the cascade has chosen a value; the cascade itself never
//! normalises units.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaUnit {
    SquareKilometre,
    SquareMetre,
    Hectare,
    SquareMile,
}

impl AreaUnit {
    /// Recognise a unit as written in text (`km²`, `sq. mi`, `hectares`, ...).
    pub fn parse(raw: &str) -> Option<Self> {
        let compact: String = raw
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '.')
            .collect();
        let unit = match compact.as_str() {
            "km²" | "km2" | "km^2" | "sqkm" | "squarekm" | "squarekilometer" | "squarekilometers"
            | "squarekilometre" | "squarekilometres" => AreaUnit::SquareKilometre,
            "m²" | "m2" | "sqm" | "squarem" | "squaremeter" | "squaremeters" | "squaremetre"
            | "squaremetres" => AreaUnit::SquareMetre,
            "ha" | "hectare" | "hectares" => AreaUnit::Hectare,
            "mi²" | "mi2" | "sqmi" | "sqmile" | "sqmiles" | "squaremile" | "squaremiles" => {
                AreaUnit::SquareMile
            }
            _ => return None,
        };
        Some(unit)
    }

    fn to_km2(self, value: f64) -> f64 {
        match self {
            AreaUnit::SquareKilometre => value,
            AreaUnit::SquareMetre => value / 1_000_000.0,
            AreaUnit::Hectare => value / 100.0,
            AreaUnit::SquareMile => value * 2.589_988_110_336,
        }
    }
}

impl fmt::Display for AreaUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AreaUnit::SquareKilometre => "km²",
            AreaUnit::SquareMetre => "m²",
            AreaUnit::Hectare => "ha",
            AreaUnit::SquareMile => "mi²",
        })
    }
}

/// A parsed area quantity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaMeasure {
    pub value: f64,
    pub unit: AreaUnit,
}

impl AreaMeasure {
    pub fn to_km2(&self) -> f64 {
        self.unit.to_km2(self.value)
    }
}

/// At most six decimals, trailing zeros dropped.
impl fmt::Display for AreaMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fixed = format!("{:.6}", self.value);
        let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
        write!(f, "{} {}", trimmed, self.unit)
    }
}

static GRID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?P<a>\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d{1,6}(?:[.,]\d{1,6})?)\s*(?:m|km)?\s*[×x*]\s*(?P<b>\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d{1,6}(?:[.,]\d{1,6})?)\s*(?P<unit>km|kilomet(?:er|re)s?|met(?:er|re)s?|m)\b",
    )
    .expect("built-in pattern must compile")
});

static AREA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?P<num>\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d{1,6}(?:[.,]\d{1,6})?)\s*(?P<unit>km²|km2|km\^2|sq\.?\s?km|square\s+kilomet(?:er|re)s?|square\s+km|mi²|mi2|sq\.?\s?mi(?:les?)?|square\s+miles?|m²|m2|sq\.?\s?m|square\s+met(?:er|re)s?|hectares?|ha)",
    )
    .expect("built-in pattern must compile")
});

/// Parse a decimal written with a point or a comma.
///
/// Commas are thousands separators when there is more than one of them
/// (`1,234,567`), when a point is also present (`1,234.5`) or when the
/// single comma is followed by exactly three digits (`24,594`). Any other
/// comma (`0,25`) is a decimal comma.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let normalised = match raw.split_once(',') {
        None => raw.to_string(),
        Some((_, rest)) if rest.contains(',') || raw.contains('.') || rest.len() == 3 => {
            raw.replace(',', "")
        }
        Some(_) => raw.replacen(',', ".", 1),
    };
    normalised.parse::<f64>().ok()
}

/// Parse an area expression such as `2.5 km²`, `0.5 ha` or `500 × 500 m`.
pub fn parse_area(text: &str) -> Option<AreaMeasure> {
    if let Some(caps) = GRID_RE.captures(text) {
        let a = parse_decimal(&caps["a"])?;
        let b = parse_decimal(&caps["b"])?;
        let unit = caps["unit"].to_lowercase();
        let (value, unit) = if unit.starts_with('k') {
            (a * b, AreaUnit::SquareKilometre)
        } else {
            (a * b, AreaUnit::SquareMetre)
        };
        return Some(AreaMeasure { value, unit });
    }

    let caps = AREA_RE.captures(text)?;
    Some(AreaMeasure {
        value: parse_decimal(&caps["num"])?,
        unit: AreaUnit::parse(&caps["unit"])?,
    })
}

/// Mean area of one unit when the area in `total` is shared by `count` units.
pub fn per_unit_area(total: &str, count: f64) -> Option<AreaMeasure> {
    if count <= 0.0 {
        return None;
    }
    let total = parse_area(total)?;
    Some(AreaMeasure {
        value: total.value / count,
        unit: total.unit,
    })
}

/// Convenience: parse and convert in one step.
pub fn to_km2(text: &str) -> Option<f64> {
    parse_area(text).map(|m| m.to_km2())
}
