use serde::Serialize;

use crate::{
    detect::label::match_key,
    mapping::{
        profile::{ProfileValue, UserProfile},
        table::{FieldMapping, FieldMappingTable},
    },
};

/// Which precedence rule produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchRule {
    /// A profile key spelled exactly like the label
    ExactKey,
    /// A synonym from the mapping table
    Keyword,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldMatch {
    pub key: String,
    pub value: ProfileValue,
    pub rule: MatchRule,
    pub keyword: Option<String>,
}

/// Resolve a question label against the profile.
///
/// The winning key is chosen from the label alone:
/// 1. a profile key equal to the label (case and separators ignored);
/// 2. the table key whose matching keyword is longest;
/// 3. among equal lengths, the key declared first in the table.
///
/// A winner without a non-empty profile value is no match. Weaker keys are
/// never consulted in its place.
pub fn match_label(label: &str, profile: &UserProfile, table: &FieldMappingTable) -> Option<FieldMatch> {
    let wanted = match_key(label);
    if wanted.is_empty() {
        return None;
    }

    let mut exact = profile.entries().filter(|(k, _)| match_key(k) == wanted).peekable();
    if exact.peek().is_some() {
        let (raw_key, value) = exact.find(|(_, v)| !v.is_empty())?;
        let key = table
            .canonical_key(raw_key)
            .map(str::to_string)
            .unwrap_or_else(|| raw_key.clone());
        return Some(FieldMatch {
            key,
            value: value.clone(),
            rule: MatchRule::ExactKey,
            keyword: None,
        });
    }

    let mut best: Option<(usize, &FieldMapping, &str)> = None;
    for mapping in table.mappings() {
        let Some((len, keyword)) = mapping.best_keyword(label) else {
            continue;
        };
        if best.is_some_and(|(best_len, _, _)| best_len >= len) {
            continue;
        }
        best = Some((len, mapping, keyword));
    }

    let (_, mapping, keyword) = best?;
    let (_, value) = profile.lookup(&mapping.profile_keys())?;
    Some(FieldMatch {
        key: mapping.key.clone(),
        value: value.clone(),
        rule: MatchRule::Keyword,
        keyword: Some(keyword.to_string()),
    })
}
