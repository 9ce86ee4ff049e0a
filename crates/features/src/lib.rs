//! Text features for field canonicalization and entity matching.
//!
//! Provides pure functions used by the schema and resolver crates:
//! - Case folding and plural reduction of record names
//! - Key transforms (underscore runs, separators, camelCase)
//! - Naming-convention variants for alias table construction
//! - Similarity measures (substring, word overlap, edit similarity)

use std::collections::BTreeSet;

/// Irregular or commonly mangled plurals from the gardening domain.
///
/// Consulted per word before the generic trailing-`s` rule.
const PLURALS: &[(&str, &str)] = &[
    ("tomatoes", "tomato"),
    ("potatoes", "potato"),
    ("mangoes", "mango"),
    ("leaves", "leaf"),
    ("cacti", "cactus"),
    ("cactuses", "cactus"),
    ("fungi", "fungus"),
    ("hibiscuses", "hibiscus"),
    ("crocuses", "crocus"),
    ("irises", "iris"),
    ("lilies", "lily"),
    ("daisies", "daisy"),
    ("peonies", "peony"),
    ("poppies", "poppy"),
    ("ivies", "ivy"),
    ("berries", "berry"),
    ("strawberries", "strawberry"),
    ("blueberries", "blueberry"),
    ("raspberries", "raspberry"),
    ("cherries", "cherry"),
    ("peaches", "peach"),
    ("radishes", "radish"),
    ("bushes", "bush"),
    ("grasses", "grass"),
];

/// Lowercase, trim and collapse internal whitespace.
pub fn fold_case(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reduce a raw record name to its comparable form.
///
/// Case-folds the input and singularizes each word. This is a matching aid,
/// not a stemmer: a false singularization only affects candidate scoring.
pub fn normalize_name(raw: &str) -> String {
    fold_case(raw)
        .split(' ')
        .map(singularize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Singularize one lowercase word.
fn singularize(word: &str) -> String {
    if let Some((_, singular)) = PLURALS.iter().find(|(plural, _)| *plural == word) {
        return (*singular).to_string();
    }

    // hibiscus, iris, moss
    let keeps_s = word.ends_with("ss") || word.ends_with("us") || word.ends_with("is");
    if word.ends_with('s') && word.chars().count() > 2 && !keeps_s {
        return word[..word.len() - 1].to_string();
    }

    word.to_string()
}

/// Lookup form of a key: lowercase with whitespace collapsed.
pub fn lookup_key(key: &str) -> String {
    fold_case(key)
}

/// Collapse each run of two or three underscores into a single space.
///
/// Single underscores and longer runs are left alone.
pub fn collapse_underscore_runs(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut run = 0usize;

    let flush = |out: &mut String, run: usize| {
        if (2..=3).contains(&run) {
            out.push(' ');
        } else {
            out.extend(std::iter::repeat('_').take(run));
        }
    };

    for c in key.chars() {
        if c == '_' {
            run += 1;
            continue;
        }
        flush(&mut out, run);
        run = 0;
        out.push(c);
    }
    flush(&mut out, run);

    out
}

/// Replace underscores and hyphens with spaces.
pub fn separators_to_spaces(key: &str) -> String {
    key.replace(['_', '-'], " ")
}

/// Split camelCase / PascalCase into space-separated lowercase words.
///
/// Acronyms stay together: `rawPhotoURL` becomes `raw photo url` and
/// `URLPhoto` becomes `url photo`.
pub fn split_camel_case(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                out.push(' ');
            }
        }
        out.extend(c.to_lowercase());
    }

    out
}

/// Split a field name or alias into lowercase words on whitespace,
/// underscores, hyphens and camelCase boundaries.
pub fn words(name: &str) -> Vec<String> {
    split_camel_case(&separators_to_spaces(name))
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Naming-convention spellings of a field name, all lowercase.
///
/// Yields the spaced, snake_case, kebab-case and compact forms. Compact
/// doubles as the lowercase form of camelCase and PascalCase.
pub fn naming_variants(name: &str) -> Vec<String> {
    let words = words(name);
    if words.is_empty() {
        return Vec::new();
    }

    let mut variants = vec![
        words.join(" "),
        words.join("_"),
        words.join("-"),
        words.concat(),
    ];
    variants.sort();
    variants.dedup();
    variants
}

/// Length ratio when one string contains the other.
///
/// Returns `None` when either string is empty or neither contains the other.
pub fn substring_ratio(a: &str, b: &str) -> Option<f32> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    if !a.contains(b) && !b.contains(a) {
        return None;
    }

    let la = a.chars().count() as f32;
    let lb = b.chars().count() as f32;
    Some(la.min(lb) / la.max(lb))
}

/// Jaccard similarity of the whitespace-separated word sets.
///
/// Returns `None` when either side has no words.
pub fn word_overlap(a: &str, b: &str) -> Option<f32> {
    let wa: BTreeSet<&str> = a.split_whitespace().collect();
    let wb: BTreeSet<&str> = b.split_whitespace().collect();
    if wa.is_empty() || wb.is_empty() {
        return None;
    }

    let intersection = wa.intersection(&wb).count() as f32;
    let union = wa.union(&wb).count() as f32;
    Some(intersection / union)
}

/// Normalized edit similarity in [0.0, 1.0] (1.0 = identical).
pub fn edit_similarity(a: &str, b: &str) -> f32 {
    strsim::normalized_levenshtein(a, b) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fold_case() {
        assert_eq!(fold_case("  Rose   Garden  "), "rose garden");
        assert_eq!(fold_case(""), "");
    }

    #[test]
    fn test_normalize_name_plurals() {
        assert_eq!(normalize_name("Roses"), "rose");
        assert_eq!(normalize_name("Tomatoes"), "tomato");
        assert_eq!(normalize_name("  Lilies "), "lily");
        assert_eq!(normalize_name("Cherry Tomatoes"), "cherry tomato");
        assert_eq!(normalize_name("Roses Mix"), "rose mix");
        assert_eq!(normalize_name("Climbing  Roses"), "climbing rose");
        assert_eq!(normalize_name("Rose"), "rose");
    }

    #[test]
    fn test_normalize_name_keeps_non_plurals() {
        assert_eq!(normalize_name("Hibiscus"), "hibiscus");
        assert_eq!(normalize_name("Iris"), "iris");
        assert_eq!(normalize_name("Moss"), "moss");
        assert_eq!(normalize_name("as"), "as");
    }

    #[test]
    fn test_collapse_underscore_runs() {
        assert_eq!(collapse_underscore_runs("Plant___Name"), "Plant Name");
        assert_eq!(collapse_underscore_runs("Plant__Name"), "Plant Name");
        assert_eq!(collapse_underscore_runs("plant_name"), "plant_name");
        assert_eq!(collapse_underscore_runs("a____b"), "a____b");
        assert_eq!(collapse_underscore_runs("trailing___"), "trailing ");
    }

    #[test]
    fn test_separators_to_spaces() {
        assert_eq!(separators_to_spaces("light_requirements"), "light requirements");
        assert_eq!(separators_to_spaces("follow-up_date"), "follow up date");
    }

    #[test]
    fn test_split_camel_case() {
        assert_eq!(split_camel_case("plantName"), "plant name");
        assert_eq!(split_camel_case("PlantName"), "plant name");
        assert_eq!(split_camel_case("rawPhotoURL"), "raw photo url");
        assert_eq!(split_camel_case("URLPhoto"), "url photo");
        assert_eq!(split_camel_case("plant name"), "plant name");
    }

    #[test]
    fn test_naming_variants() {
        assert_eq!(
            naming_variants("Follow-up Required"),
            vec![
                "follow up required",
                "follow-up-required",
                "follow_up_required",
                "followuprequired",
            ]
        );
        assert_eq!(naming_variants("water"), vec!["water"]);
        assert!(naming_variants("   ").is_empty());
    }

    #[test]
    fn test_substring_ratio() {
        assert_eq!(substring_ratio("rose", "rose"), Some(1.0));
        assert_eq!(substring_ratio("rose", "rose garden"), Some(4.0 / 11.0));
        assert_eq!(substring_ratio("rose", "tomato"), None);
        assert_eq!(substring_ratio("", "rose"), None);
    }

    #[test]
    fn test_word_overlap() {
        assert_eq!(word_overlap("cherry tomato", "tomato"), Some(0.5));
        assert_eq!(word_overlap("red rose", "rose red"), Some(1.0));
        assert_eq!(word_overlap("rose", ""), None);
    }

    #[test]
    fn test_edit_similarity() {
        assert_eq!(edit_similarity("rose", "rose"), 1.0);
        assert_eq!(edit_similarity("rose", "rise"), 0.75);
        assert!(edit_similarity("rose", "tomato") < 0.6);
    }
}
