//! # Recipe Ingredient Synthesis
//!
//! Placeholder ingredient lists for recipes that have no rows in the
//! recipe-ingredient relation. Keyword rules pick a themed base set from the
//! recipe name and tags; a generator seeded from a hash of the same text adds
//! a few pantry basics. The output is stable for a given name and tag set.
//!
//! This is not a recipe parser. Once a recipe has relation rows they are
//! used instead (see `PantryRepository::recipe_ingredients`).

use lazy_static::lazy_static;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use regex::Regex;
use tracing::debug;

use crate::models::{same_name, RecipeIngredient};

type Line = (&'static str, f64, &'static str);

const PASTA: &[Line] = &[
    ("Pasta", 8.0, "oz"),
    ("Olive Oil", 2.0, "tbsp"),
    ("Garlic", 3.0, "clove"),
    ("Parmesan", 0.5, "cup"),
];
const CHICKEN: &[Line] = &[
    ("Chicken Breast", 1.5, "lb"),
    ("Olive Oil", 1.0, "tbsp"),
    ("Onion", 1.0, "count"),
];
const BAKING: &[Line] = &[
    ("Flour", 2.0, "cup"),
    ("Sugar", 1.0, "cup"),
    ("Butter", 0.5, "cup"),
    ("Eggs", 2.0, "count"),
    ("Baking Powder", 1.0, "tsp"),
];
const BREAKFAST: &[Line] = &[
    ("Flour", 1.5, "cup"),
    ("Milk", 1.25, "cup"),
    ("Eggs", 1.0, "count"),
    ("Butter", 2.0, "tbsp"),
];
const SOUP: &[Line] = &[
    ("Chicken Broth", 4.0, "cup"),
    ("Carrots", 2.0, "count"),
    ("Celery", 2.0, "count"),
    ("Onion", 1.0, "count"),
];
const TACO: &[Line] = &[
    ("Tortillas", 8.0, "count"),
    ("Ground Beef", 1.0, "lb"),
    ("Cheddar Cheese", 1.0, "cup"),
    ("Salsa", 0.5, "cup"),
];
const RICE: &[Line] = &[
    ("Rice", 1.5, "cup"),
    ("Onion", 1.0, "count"),
    ("Garlic", 2.0, "clove"),
];
const SALAD: &[Line] = &[
    ("Lettuce", 1.0, "count"),
    ("Tomatoes", 2.0, "count"),
    ("Cucumber", 1.0, "count"),
    ("Olive Oil", 2.0, "tbsp"),
];
const EGGS: &[Line] = &[
    ("Eggs", 4.0, "count"),
    ("Milk", 0.25, "cup"),
    ("Butter", 1.0, "tbsp"),
];

/// Fallback set when no keyword matches
const STAPLES: &[Line] = &[
    ("Olive Oil", 1.0, "tbsp"),
    ("Onion", 1.0, "count"),
    ("Garlic", 2.0, "clove"),
];

/// Basics the generator draws extras from
const PANTRY_BASICS: &[Line] = &[
    ("Butter", 1.0, "tbsp"),
    ("Lemon", 1.0, "count"),
    ("Parsley", 2.0, "tbsp"),
    ("Paprika", 1.0, "tsp"),
    ("Soy Sauce", 1.0, "tbsp"),
    ("Honey", 1.0, "tbsp"),
    ("Cumin", 1.0, "tsp"),
    ("Chili Flakes", 0.5, "tsp"),
    ("Vinegar", 1.0, "tbsp"),
    ("Basil", 1.0, "tbsp"),
];

lazy_static! {
    static ref KEYWORD_RULES: Vec<(Regex, &'static [Line])> = {
        let rules: &[(&str, &'static [Line])] = &[
            (r"(?i)\b(pasta|spaghetti|linguine|penne|lasagna|noodles?)\b", PASTA),
            (r"(?i)\b(chicken|poultry)\b", CHICKEN),
            (r"(?i)\b(cakes?|cookies?|muffins?|brownies?|bread|baking|dessert)\b", BAKING),
            (r"(?i)\b(pancakes?|waffles?|crepes?|breakfast)\b", BREAKFAST),
            (r"(?i)\b(soup|stew|chowder)\b", SOUP),
            (r"(?i)\b(tacos?|burritos?|quesadillas?|mexican)\b", TACO),
            (r"(?i)\b(rice|risotto|curry|pilaf)\b", RICE),
            (r"(?i)\b(salad|slaw)\b", SALAD),
            (r"(?i)\b(omelet(te)?|frittata|scrambled|quiche)\b", EGGS),
        ];
        rules
            .iter()
            .filter_map(|(pattern, lines)| Regex::new(pattern).ok().map(|re| (re, *lines)))
            .collect()
    };
}

/// FNV-1a over the lower-cased name and tags
fn seed_for(name: &str, tags: &[String]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut text = name.trim().to_lowercase();
    for tag in tags {
        text.push('|');
        text.push_str(&tag.trim().to_lowercase());
    }

    text.bytes()
        .fold(OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
}

fn push_unique(list: &mut Vec<RecipeIngredient>, ingredient: RecipeIngredient) {
    if !list.iter().any(|i| same_name(&i.name, &ingredient.name)) {
        list.push(ingredient);
    }
}

/// Generate a deterministic ingredient list for a recipe
pub fn generate_ingredients(name: &str, tags: &[String]) -> Vec<RecipeIngredient> {
    let haystack = format!("{} {}", name, tags.join(" "));
    let mut rng = StdRng::seed_from_u64(seed_for(name, tags));
    let mut ingredients = Vec::new();

    for (pattern, lines) in KEYWORD_RULES.iter() {
        if pattern.is_match(&haystack) {
            for (item, quantity, unit) in lines.iter() {
                push_unique(&mut ingredients, RecipeIngredient::new(item, *quantity, unit));
            }
        }
    }

    if ingredients.is_empty() {
        for (item, quantity, unit) in STAPLES {
            push_unique(&mut ingredients, RecipeIngredient::new(item, *quantity, unit));
        }
    }

    let extras = rng.gen_range(1..=3);
    for (item, quantity, unit) in PANTRY_BASICS.choose_multiple(&mut rng, extras) {
        push_unique(&mut ingredients, RecipeIngredient::new(item, *quantity, unit));
    }

    push_unique(
        &mut ingredients,
        RecipeIngredient::new("Salt", 0.5, "tsp").optional(),
    );
    push_unique(
        &mut ingredients,
        RecipeIngredient::new("Black Pepper", 0.25, "tsp").optional(),
    );

    debug!(recipe = %name, count = ingredients.len(), "synthesized recipe ingredients");
    ingredients
}
