use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use log::debug;

lazy_static! {
    /// Irregular plural nouns and their base forms
    static ref IRREGULAR: HashMap<&'static str, &'static str> = {
        debug!("Loading lemmatizer lexicon");

        HashMap::from([
            ("children", "child"),
            ("people", "person"),
            ("men", "man"),
            ("women", "woman"),
            ("feet", "foot"),
            ("teeth", "tooth"),
            ("geese", "goose"),
            ("mice", "mouse"),
            ("lice", "louse"),
            ("oxen", "ox"),
            ("wives", "wife"),
            ("lives", "life"),
            ("knives", "knife"),
            ("leaves", "leaf"),
            ("halves", "half"),
            ("shelves", "shelf"),
            ("thieves", "thief"),
            ("wolves", "wolf"),
            ("loaves", "loaf"),
            ("calves", "calf"),
            ("crises", "crisis"),
            ("analyses", "analysis"),
            ("diagnoses", "diagnosis"),
            ("bases", "basis"),
            ("criteria", "criterion"),
            ("phenomena", "phenomenon"),
            ("bacteria", "bacterium"),
            ("fungi", "fungus"),
            ("cacti", "cactus"),
            ("nuclei", "nucleus"),
            ("indices", "index"),
            ("matrices", "matrix"),
            ("dice", "die"),
        ])
    };

    /// Words ending in "s" that are already in base form
    static ref INVARIANT: HashSet<&'static str> = HashSet::from([
        "news", "series", "species", "means", "headquarters", "barracks", "physics",
        "mathematics", "economics", "politics", "ethics", "measles", "diabetes", "rabies",
        "scabies", "clothes", "thanks", "always", "perhaps", "towards", "afterwards",
        "besides", "sometimes", "whereas", "was", "has", "does", "goes", "yes", "this",
        "his", "its", "hers", "ours", "yours", "theirs", "thus", "plus", "less", "unless",
        "across", "gas", "bus", "us",
    ]);
}

/// Load the lemmatizer lexicon now rather than on first use.
///
/// Calling this more than once is harmless; the lexicon is built once per process.
pub fn init_lexicon() {
    lazy_static::initialize(&IRREGULAR);
    lazy_static::initialize(&INVARIANT);
}

/// Reduce a lowercase word to its singular noun base form.
///
/// Irregular plurals are looked up; regular plurals are reduced by suffix rules. Words that
/// are too short, not alphabetic, or known to end in "s" in their base form are returned
/// unchanged.
pub fn lemmatize(word: &str) -> String {
    if let Some(base) = IRREGULAR.get(word) {
        return (*base).to_string();
    }

    if word.len() <= 3
        || INVARIANT.contains(word)
        || !word.chars().all(|c| c.is_alphabetic())
        || !word.ends_with('s')
    {
        return word.to_string();
    }

    strip_plural(word).unwrap_or_else(|| word.to_string())
}

fn strip_plural(word: &str) -> Option<String> {
    // Singular endings that look plural
    if ["ss", "us", "is", "ous", "ics"]
        .iter()
        .any(|ending| word.ends_with(ending))
    {
        return None;
    }

    // "ties" and "lies" only lose the final "s"
    if let Some(stem) = word.strip_suffix("ies") {
        if stem.len() > 2 {
            return Some(format!("{}y", stem));
        }

        return word.strip_suffix('s').map(str::to_string);
    }

    if ["sses", "xes", "zzes", "ches", "shes"]
        .iter()
        .any(|ending| word.ends_with(ending))
    {
        return Some(word[..word.len() - 2].to_string());
    }

    word.strip_suffix('s').map(str::to_string)
}
