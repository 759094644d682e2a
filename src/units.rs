//! # Unit Conversion Module
//!
//! Maps free-text unit strings onto a small set of canonical tokens and
//! converts quantities between them.
//!
//! ## Resolution order
//!
//! 1. Same canonical unit: the value is returned unchanged
//! 2. Ingredient-specific weight factor (a cup of flour is not a cup of sugar)
//! 3. Direct factor `from -> to`
//! 4. Reverse factor `to -> from`, divided
//! 5. Two hops through a base unit (fluid ounces, ounces, then milliliters)
//!
//! When nothing resolves the caller gets [`PantryError::NotConvertible`]
//! back as a value; nothing in here panics or performs I/O.
//!
//! ```rust
//! use pantry::units::{convert, normalize};
//!
//! assert_eq!(normalize(" Tablespoons "), "tbsp");
//! assert_eq!(convert(1.0, "cup", "tbsp", None).unwrap(), 16.0);
//! assert!(convert(5.0, "smoot", "oz", None).is_err());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use serde::Serialize;

use crate::errors::PantryError;

/// Free-text spellings mapped to their canonical token
static UNIT_ALIASES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let groups: &[(&str, &[&str])] = &[
        // Volume units
        ("tsp", &["tsp", "tsp.", "tsps", "teaspoon", "teaspoons"]),
        (
            "tbsp",
            &["tbsp", "tbsp.", "tbsps", "tbs", "tbl", "tablespoon", "tablespoons"],
        ),
        ("cup", &["cup", "cups", "c"]),
        (
            "fl oz",
            &["fl oz", "fl. oz", "fl.oz", "floz", "fluid ounce", "fluid ounces"],
        ),
        ("pint", &["pint", "pints", "pt", "pts"]),
        ("quart", &["quart", "quarts", "qt", "qts"]),
        ("gallon", &["gallon", "gallons", "gal", "gals"]),
        (
            "ml",
            &["ml", "mls", "milliliter", "milliliters", "millilitre", "millilitres"],
        ),
        ("l", &["l", "liter", "liters", "litre", "litres"]),
        // Weight units
        ("oz", &["oz", "oz.", "ounce", "ounces"]),
        ("lb", &["lb", "lb.", "lbs", "pound", "pounds"]),
        ("g", &["g", "gr", "gram", "grams", "gramme", "grammes"]),
        ("kg", &["kg", "kgs", "kilo", "kilos", "kilogram", "kilograms"]),
        // Count units
        (
            "count",
            &[
                "count", "piece", "pieces", "pc", "pcs", "item", "items", "each", "ea", "whole",
                "unit", "units",
            ],
        ),
        ("dozen", &["dozen", "doz"]),
        // Specialized units
        ("pinch", &["pinch", "pinches"]),
        ("dash", &["dash", "dashes"]),
        ("clove", &["clove", "cloves"]),
        ("can", &["can", "cans"]),
        ("package", &["package", "packages", "pkg", "pack", "packs"]),
        ("bottle", &["bottle", "bottles"]),
        ("slice", &["slice", "slices"]),
    ];

    let mut map = HashMap::new();
    for (canonical, aliases) in groups {
        for alias in *aliases {
            map.insert(*alias, *canonical);
        }
    }
    map
});

/// Direct factors: `1 from == factor * to`. No pair appears in both directions.
const DIRECT_FACTORS: &[(&str, &str, f64)] = &[
    // US volume
    ("tbsp", "tsp", 3.0),
    ("cup", "tbsp", 16.0),
    ("cup", "tsp", 48.0),
    ("cup", "fl oz", 8.0),
    ("fl oz", "tsp", 6.0),
    ("fl oz", "tbsp", 2.0),
    ("pint", "cup", 2.0),
    ("pint", "fl oz", 16.0),
    ("quart", "pint", 2.0),
    ("quart", "cup", 4.0),
    ("quart", "fl oz", 32.0),
    ("gallon", "quart", 4.0),
    ("gallon", "cup", 16.0),
    ("gallon", "fl oz", 128.0),
    // Volume to metric
    ("tsp", "ml", 4.92892),
    ("tbsp", "ml", 14.7868),
    ("cup", "ml", 236.588),
    ("fl oz", "ml", 29.5735),
    ("l", "ml", 1000.0),
    ("l", "fl oz", 33.814),
    // Generic volume to weight (water-like density)
    ("cup", "oz", 8.0),
    // Weight
    ("lb", "oz", 16.0),
    ("oz", "g", 28.3495),
    ("lb", "g", 453.592),
    ("kg", "g", 1000.0),
    ("kg", "oz", 35.274),
    ("kg", "lb", 2.20462),
    // Count
    ("dozen", "count", 12.0),
];

/// Weight in ounces of one `unit` of `ingredient`
const INGREDIENT_FACTORS: &[(&str, &str, f64)] = &[
    ("cup", "flour", 4.25),
    ("cup", "all-purpose flour", 4.25),
    ("cup", "bread flour", 4.5),
    ("cup", "whole wheat flour", 4.0),
    ("tbsp", "flour", 0.27),
    ("cup", "sugar", 7.0),
    ("cup", "granulated sugar", 7.0),
    ("cup", "brown sugar", 7.5),
    ("cup", "powdered sugar", 4.0),
    ("cup", "butter", 8.0),
    ("tbsp", "butter", 0.5),
    ("cup", "rice", 6.5),
    ("cup", "oats", 3.0),
    ("cup", "cocoa powder", 3.0),
    ("cup", "honey", 12.0),
    ("cup", "milk", 8.6),
    ("cup", "water", 8.3),
    ("tsp", "salt", 0.2),
    ("tbsp", "salt", 0.6),
];

/// Intermediate units tried, in order, when neither direct nor reverse factors exist
const BASE_UNITS: &[&str] = &["fl oz", "oz", "ml"];

const WEIGHT_UNITS: &[&str] = &["oz", "lb", "g", "kg"];

/// How a conversion was resolved
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionPath {
    /// Both units normalize to the same token
    Identity,
    /// Per-ingredient weight factor
    IngredientSpecific,
    /// Direct table factor
    Direct,
    /// Inverse of a table factor
    Reverse,
    /// Two hops through the named base unit
    ViaBase(&'static str),
}

impl fmt::Display for ConversionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionPath::Identity => write!(f, "same unit"),
            ConversionPath::IngredientSpecific => write!(f, "ingredient-specific factor"),
            ConversionPath::Direct => write!(f, "direct factor"),
            ConversionPath::Reverse => write!(f, "reverse factor"),
            ConversionPath::ViaBase(base) => write!(f, "via {base}"),
        }
    }
}

/// Result of a successful conversion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    /// Converted value, unrounded
    pub value: f64,
    /// Canonical source unit
    pub from: String,
    /// Canonical target unit
    pub to: String,
    /// Which rule produced the value
    pub path: ConversionPath,
}

/// Normalize a free-text unit to its canonical token.
///
/// Input is trimmed, lower-cased and has inner whitespace collapsed.
/// Unrecognized units come back in that normalized form.
pub fn normalize(unit: &str) -> String {
    let cleaned = unit
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    match UNIT_ALIASES.get(cleaned.as_str()) {
        Some(canonical) => (*canonical).to_string(),
        None => cleaned,
    }
}

/// Whether a canonical unit measures weight
pub fn is_weight(canonical: &str) -> bool {
    WEIGHT_UNITS.iter().any(|unit| *unit == canonical)
}

/// Convert `value` between two free-text units
pub fn convert(
    value: f64,
    from: &str,
    to: &str,
    ingredient: Option<&str>,
) -> Result<f64, PantryError> {
    convert_detailed(value, from, to, ingredient).map(|c| c.value)
}

/// Convert `value` and report which rule resolved it
pub fn convert_detailed(
    value: f64,
    from: &str,
    to: &str,
    ingredient: Option<&str>,
) -> Result<Conversion, PantryError> {
    let from = normalize(from);
    let to = normalize(to);

    let resolved = if from == to {
        Some((value, ConversionPath::Identity))
    } else {
        ingredient
            .map(|name| name.trim().to_lowercase())
            .and_then(|name| ingredient_conversion(value, &from, &to, &name))
            .map(|v| (v, ConversionPath::IngredientSpecific))
            .or_else(|| generic_conversion(value, &from, &to))
    };

    match resolved {
        Some((value, path)) => Ok(Conversion {
            value,
            from,
            to,
            path,
        }),
        None => Err(PantryError::NotConvertible { from, to }),
    }
}

/// Round for display: 2 decimals above 0.1, otherwise 3
pub fn round_quantity(value: f64) -> f64 {
    if value.abs() > 0.1 {
        (value * 100.0).round() / 100.0
    } else {
        (value * 1000.0).round() / 1000.0
    }
}

/// Rounded quantity without a trailing `.0` for whole numbers
pub fn format_quantity(value: f64) -> String {
    let rounded = round_quantity(value);
    if rounded == 0.0 {
        "0".to_string()
    } else if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        format!("{rounded}")
    }
}

fn lookup(table: &[(&str, &str, f64)], a: &str, b: &str) -> Option<f64> {
    table
        .iter()
        .find(|(x, y, _)| *x == a && *y == b)
        .map(|(_, _, factor)| *factor)
}

/// Factor for a single hop, direct or reversed
fn one_hop(from: &str, to: &str) -> Option<(f64, ConversionPath)> {
    if let Some(factor) = lookup(DIRECT_FACTORS, from, to) {
        return Some((factor, ConversionPath::Direct));
    }
    lookup(DIRECT_FACTORS, to, from).map(|factor| (1.0 / factor, ConversionPath::Reverse))
}

fn generic_conversion(value: f64, from: &str, to: &str) -> Option<(f64, ConversionPath)> {
    if from == to {
        return Some((value, ConversionPath::Identity));
    }

    if let Some((factor, path)) = one_hop(from, to) {
        return Some((value * factor, path));
    }

    for &base in BASE_UNITS {
        if base == from || base == to {
            continue;
        }
        if let (Some((first, _)), Some((second, _))) = (one_hop(from, base), one_hop(base, to)) {
            return Some((value * first * second, ConversionPath::ViaBase(base)));
        }
    }

    None
}

/// Volume <-> weight for ingredients with a known density
fn ingredient_conversion(value: f64, from: &str, to: &str, ingredient: &str) -> Option<f64> {
    if is_weight(to) {
        if let Some(oz_per_unit) = lookup(INGREDIENT_FACTORS, from, ingredient) {
            let ounces = value * oz_per_unit;
            return generic_conversion(ounces, "oz", to).map(|(v, _)| v);
        }
    }

    if is_weight(from) {
        if let Some(oz_per_unit) = lookup(INGREDIENT_FACTORS, to, ingredient) {
            let (ounces, _) = generic_conversion(value, from, "oz")?;
            return Some(ounces / oz_per_unit);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_normalize_aliases() {
        let cases = [
            ("tbsp", "tbsp"),
            ("Tablespoon", "tbsp"),
            ("  tablespoons ", "tbsp"),
            ("TSP", "tsp"),
            ("Cups", "cup"),
            ("fl  oz", "fl oz"),
            ("Fluid Ounces", "fl oz"),
            ("litres", "l"),
            ("Pounds", "lb"),
            ("grams", "g"),
            ("pieces", "count"),
            ("doz", "dozen"),
        ];

        for (input, expected) in cases {
            assert_eq!(normalize(input), expected, "normalizing {input:?}");
        }
    }

    #[test]
    fn test_normalize_unknown_passes_through() {
        assert_eq!(normalize("Smoot"), "smoot");
        assert_eq!(normalize("  handful  "), "handful");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_conversion_is_reflexive() {
        let units = ["cup", "tbsp", "g", "count", "smoot", ""];
        for unit in units {
            for value in [0.0, 0.004, 1.0, 17.5] {
                assert_eq!(convert(value, unit, unit, None).unwrap(), value);
            }
        }
        assert_eq!(convert(3.0, "Cups", "c", None).unwrap(), 3.0);
    }

    #[test]
    fn test_round_trip_for_every_table_pair() {
        for (from, to, _) in DIRECT_FACTORS {
            let there = convert(2.5, from, to, None).unwrap();
            let back = convert(there, to, from, None).unwrap();
            assert!((back - 2.5).abs() < 0.01, "{from} -> {to} -> {from} gave {back}");
        }
    }

    #[test]
    fn test_direct_and_reverse_paths() {
        let forward = convert_detailed(1.0, "cup", "tbsp", None).unwrap();
        assert_eq!(forward.value, 16.0);
        assert_eq!(forward.path, ConversionPath::Direct);

        let reverse = convert_detailed(6.0, "tsp", "tbsp", None).unwrap();
        assert_close(reverse.value, 2.0);
        assert_eq!(reverse.path, ConversionPath::Reverse);
    }

    #[test]
    fn test_two_hop_paths() {
        let pint_in_tsp = convert_detailed(1.0, "pint", "tsp", None).unwrap();
        assert_close(pint_in_tsp.value, 96.0);
        assert_eq!(pint_in_tsp.path, ConversionPath::ViaBase("fl oz"));

        let ml_in_gallon = convert_detailed(3785.41, "ml", "gallon", None).unwrap();
        assert!((ml_in_gallon.value - 1.0).abs() < 0.001);
        assert_eq!(ml_in_gallon.path, ConversionPath::ViaBase("fl oz"));

        let cup_in_grams = convert_detailed(1.0, "cup", "g", None).unwrap();
        assert_close(cup_in_grams.value, 8.0 * 28.3495);
        assert_eq!(cup_in_grams.path, ConversionPath::ViaBase("oz"));
    }

    #[test]
    fn test_ingredient_factor_preferred() {
        let flour = convert_detailed(1.0, "cup", "oz", Some("Flour")).unwrap();
        assert_close(flour.value, 4.25);
        assert_eq!(flour.path, ConversionPath::IngredientSpecific);

        // Unknown ingredient falls back to the generic factor
        let generic = convert_detailed(1.0, "cup", "oz", Some("gravel")).unwrap();
        assert_close(generic.value, 8.0);
        assert_eq!(generic.path, ConversionPath::Direct);
    }

    #[test]
    fn test_ingredient_factor_chains_to_other_weights() {
        let grams = convert(1.0, "cup", "g", Some("sugar")).unwrap();
        assert_close(grams, 7.0 * 28.3495);

        let cups = convert(8.5, "oz", "cup", Some("flour")).unwrap();
        assert_close(cups, 2.0);
    }

    #[test]
    fn test_ingredient_factor_ignored_for_volume_targets() {
        let tbsp = convert_detailed(1.0, "cup", "tbsp", Some("flour")).unwrap();
        assert_eq!(tbsp.value, 16.0);
        assert_eq!(tbsp.path, ConversionPath::Direct);
    }

    #[test]
    fn test_not_convertible() {
        let err = convert(5.0, "smoot", "oz", None).unwrap_err();
        assert_eq!(
            err,
            PantryError::NotConvertible {
                from: "smoot".to_string(),
                to: "oz".to_string()
            }
        );
        assert!(convert(1.0, "count", "cup", None).is_err());
    }

    #[test]
    fn test_rounding_rules() {
        assert_eq!(round_quantity(4.256), 4.26);
        assert_eq!(round_quantity(0.0416), 0.042);
        assert_eq!(round_quantity(-2.346), -2.35);
        assert_eq!(format_quantity(16.0), "16");
        assert_eq!(format_quantity(4.25), "4.25");
        assert_eq!(format_quantity(1.0 / 48.0), "0.021");
    }
}
