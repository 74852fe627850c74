//! Section-heading normalisation and canonical-role classification.
//!
//! Papers title the same section a dozen different ways ("2. Methodology",
//! "III. Our Approach", "Proposed Method"). This module turns a raw heading
//! into a stable key and maps keys onto the three canonical roles via an
//! explicit, ordered keyword table — first match wins, evaluated in a fixed
//! priority order. Everything here is pure string logic with no I/O, which
//! is why it gets the densest unit coverage in the crate.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Leading ordinal markers: `1`, `2.3`, `4.`, `IV.`, `II` — numeric or
/// roman, dot- or whitespace-terminated. Whitespace/dot termination is
/// required so headings like "3D Reconstruction" keep their digit.
static RE_ORDINAL_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:\d+(?:\.\d+)*\.(?:\s+|$|([^\d\s]))|\d+(?:\.\d+)*\s+|[IVXLC]+\.\s*|[IVXLC]+\s+)")
        .unwrap()
});

/// The three canonical roles a section can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionRole {
    Introduction,
    Methodology,
    Conclusion,
}

impl SectionRole {
    /// The canonical result key for this role.
    pub fn key(self) -> &'static str {
        match self {
            SectionRole::Introduction => "introduction",
            SectionRole::Methodology => "methodology",
            SectionRole::Conclusion => "conclusion",
        }
    }
}

/// Primary keyword table, evaluated top to bottom; within a row, any
/// containment match claims the role.
const ROLE_KEYWORDS: &[(SectionRole, &[&str])] = &[
    (SectionRole::Introduction, &["introduction"]),
    (SectionRole::Methodology, &["methodology", "method", "approach"]),
    (SectionRole::Conclusion, &["conclusion", "discussion", "summary"]),
];

/// Broader secondary keyword set for methodology only.
///
/// Methodology titles vary far more than introduction/conclusion titles
/// ("Model", "Framework", "Our Method"), so a second, looser pass runs
/// when the primary table found nothing.
const METHODOLOGY_BROAD_KEYWORDS: &[&str] = &["our_method", "model", "framework"];

/// Normalise a raw heading into a stable section key.
///
/// Strips a leading numeric/roman ordinal marker, lowercases, drops
/// punctuation, and joins the remaining words with underscores. The
/// function is idempotent: normalising an already-normalised key returns
/// it unchanged.
pub fn normalise_heading(raw: &str) -> String {
    let stripped = RE_ORDINAL_PREFIX.replace(raw.trim(), "$1");
    let lowered = stripped.to_lowercase();
    lowered
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Classify a normalised key into a canonical role via the primary table.
pub fn classify(key: &str) -> Option<SectionRole> {
    for (role, keywords) in ROLE_KEYWORDS {
        if keywords.iter().any(|kw| key.contains(kw)) {
            return Some(*role);
        }
    }
    None
}

/// Secondary methodology-only match with the broader keyword set.
pub fn matches_methodology_broad(key: &str) -> bool {
    METHODOLOGY_BROAD_KEYWORDS.iter().any(|kw| key.contains(kw))
}

/// Assign canonical roles to section keys in document order.
///
/// First discovered match wins per role; later sections with the same role
/// are ignored. When no methodology-like section is found, a second pass
/// runs with the broader keyword set over the keys not already claimed.
pub fn assign_roles<'a>(keys: impl Iterator<Item = &'a str> + Clone) -> HashMap<SectionRole, String> {
    let mut roles: HashMap<SectionRole, String> = HashMap::new();

    for key in keys.clone() {
        if let Some(role) = classify(key) {
            roles.entry(role).or_insert_with(|| key.to_string());
        }
    }

    if !roles.contains_key(&SectionRole::Methodology) {
        let claimed: Vec<&String> = roles.values().collect();
        for key in keys {
            if claimed.iter().any(|c| c.as_str() == key) {
                continue;
            }
            if matches_methodology_broad(key) {
                roles.insert(SectionRole::Methodology, key.to_string());
                break;
            }
        }
    }

    roles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalise_strips_numeric_prefixes() {
        assert_eq!(normalise_heading("1 Introduction"), "introduction");
        assert_eq!(normalise_heading("2. Methodology"), "methodology");
        assert_eq!(normalise_heading("3.1 Ablation Study"), "ablation_study");
        assert_eq!(normalise_heading("4.Conclusion"), "conclusion");
    }

    #[test]
    fn normalise_strips_roman_prefixes() {
        assert_eq!(normalise_heading("IV. Experiments"), "experiments");
        assert_eq!(normalise_heading("II Related Work"), "related_work");
    }

    #[test]
    fn normalise_keeps_embedded_digits() {
        // "3D" is content, not an ordinal
        assert_eq!(normalise_heading("3D Reconstruction"), "3d_reconstruction");
        // "VAE" starts with a roman letter but is one token
        assert_eq!(normalise_heading("VAE Models"), "vae_models");
    }

    #[test]
    fn normalise_drops_punctuation() {
        assert_eq!(
            normalise_heading("Results & Discussion: An Overview"),
            "results_discussion_an_overview"
        );
    }

    #[test]
    fn normalise_is_idempotent() {
        for raw in [
            "1 Introduction",
            "3.1 Ablation Study",
            "3D Reconstruction",
            "IV. Experiments",
            "Results & Discussion",
        ] {
            let once = normalise_heading(raw);
            assert_eq!(normalise_heading(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn classify_priority_order() {
        assert_eq!(classify("introduction"), Some(SectionRole::Introduction));
        assert_eq!(classify("proposed_method"), Some(SectionRole::Methodology));
        assert_eq!(classify("our_approach"), Some(SectionRole::Methodology));
        assert_eq!(
            classify("conclusion_and_future_work"),
            Some(SectionRole::Conclusion)
        );
        assert_eq!(classify("discussion"), Some(SectionRole::Conclusion));
        assert_eq!(classify("related_work"), None);
        // Introduction row outranks the conclusion keywords
        assert_eq!(
            classify("introduction_and_summary"),
            Some(SectionRole::Introduction)
        );
    }

    #[test]
    fn assign_first_match_wins() {
        let keys = ["introduction", "methodology", "discussion", "conclusion"];
        let roles = assign_roles(keys.iter().copied());
        assert_eq!(roles[&SectionRole::Introduction], "introduction");
        assert_eq!(roles[&SectionRole::Methodology], "methodology");
        // "discussion" appears before "conclusion" and is classified first
        assert_eq!(roles[&SectionRole::Conclusion], "discussion");
    }

    #[test]
    fn methodology_broad_pass_runs_when_primary_misses() {
        let keys = ["introduction", "model_architecture", "conclusion"];
        let roles = assign_roles(keys.iter().copied());
        assert_eq!(roles[&SectionRole::Methodology], "model_architecture");
    }

    #[test]
    fn broad_pass_skips_keys_claimed_by_other_roles() {
        // "framework_discussion" is claimed as conclusion by the primary
        // pass; the broad pass must not reassign it to methodology.
        let keys = ["introduction", "framework_discussion", "the_framework"];
        let roles = assign_roles(keys.iter().copied());
        assert_eq!(roles[&SectionRole::Conclusion], "framework_discussion");
        assert_eq!(roles[&SectionRole::Methodology], "the_framework");
    }

    #[test]
    fn no_methodology_found_leaves_role_unassigned() {
        let keys = ["introduction", "related_work", "conclusion"];
        let roles = assign_roles(keys.iter().copied());
        assert!(!roles.contains_key(&SectionRole::Methodology));
    }
}
