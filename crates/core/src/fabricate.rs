//! Fictional names for simulated devices.
//!
//! All values here are made up. Company names follow the usual shapes of real
//! manufacturer names ("Surname Suffix", "Surname-Surname", "A, B and C") so the
//! generated Device resources read plausibly in a dashboard.

use rand::seq::SliceRandom;
use rand::Rng;

const SURNAMES: &[&str] = &[
    "Abbott", "Barlow", "Castellan", "Delacroix", "Ellery", "Fairbanks", "Garnier", "Holloway",
    "Ingram", "Jessup", "Kowalski", "Lindqvist", "Marlowe", "Nakamura", "Okafor", "Pemberton",
    "Quintero", "Rasmussen", "Sandoval", "Thornbury", "Underhill", "Vasquez", "Whitcombe",
    "Yardley", "Zellner",
];

const COMPANY_SUFFIXES: &[&str] = &["Inc", "LLC", "Ltd", "Group", "PLC", "and Sons", "Medical"];

const MODEL_WORDS: &[&str] = &[
    "acorn", "alder", "amber", "anchor", "apex", "arbor", "arc", "aspen", "atlas", "aurora", "axis",
    "badger", "basil", "beacon", "birch", "blaze", "bolt", "breeze", "brook", "cadence", "canyon",
    "cedar", "cirrus", "cobalt", "comet", "coral", "cove", "crest", "cypress", "dawn", "delta",
    "dune", "drift", "eagle", "echo", "ember", "falcon", "fern", "fjord", "flare", "flint", "flux",
    "forge", "frost", "gale", "garnet", "glacier", "glide", "granite", "grove", "halo", "harbor",
    "hazel", "heron", "horizon", "ion", "iris", "ivory", "jade", "jasper", "jolt", "juniper",
    "kestrel", "kinetic", "lagoon", "lark", "laurel", "lumen", "lynx", "maple", "marble", "meadow",
    "meridian", "mesa", "mist", "nebula", "nimbus", "nova", "oak", "onyx", "opal", "orbit",
    "osprey", "pebble", "pine", "prairie", "prism", "pulse", "quartz", "quill", "rally", "raven",
    "reef", "ridge", "river", "sable", "sage", "sequoia", "sierra", "slate", "solstice", "sparrow",
    "spruce", "stellar", "summit", "talon", "tandem", "terra", "thistle", "tide", "timber", "topaz",
    "tundra", "valley", "vector", "velvet", "vista", "wave", "willow", "wren", "yarrow", "zenith",
    "zephyr",
];

fn pick<R: Rng + ?Sized>(rng: &mut R, words: &[&'static str]) -> &'static str {
    words.choose(rng).copied().unwrap_or("generic")
}

/// A fabricated manufacturer name.
pub fn company<R: Rng + ?Sized>(rng: &mut R) -> String {
    match rng.gen_range(0..3) {
        0 => format!("{} {}", pick(rng, SURNAMES), pick(rng, COMPANY_SUFFIXES)),
        1 => format!("{}-{}", pick(rng, SURNAMES), pick(rng, SURNAMES)),
        _ => format!(
            "{}, {} and {}",
            pick(rng, SURNAMES),
            pick(rng, SURNAMES),
            pick(rng, SURNAMES)
        ),
    }
}

/// A fabricated model number: a lowercase word, a hyphen and a three-digit numeral.
pub fn model_number<R: Rng + ?Sized>(rng: &mut R) -> String {
    let word = pick(rng, MODEL_WORDS);
    format!("{}-{}", word, rng.gen_range(100..=999))
}
