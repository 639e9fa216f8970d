use std::collections::BTreeMap;

use regex::Regex;
use serde::Serialize;

use crate::detect::label::match_key;

// ============================================================================
// Field mapping table
// ============================================================================
//
// Declaration order is significant: it is the final tie-break when two
// keys match a label with keywords of equal length.

const STANDARD_FIELDS: &[(&str, &[&str], &[&str])] = &[
    (
        "email",
        &["mail", "e-mail", "courriel", "emailAddress"],
        &[
            "email", "e-mail", "mail", "courriel", "email address", "e-mail address",
            "adresse mail", "adresse email", "adresse e-mail", "adresse électronique",
        ],
    ),
    (
        "firstName",
        &["first_name", "prenom", "prénom", "givenName"],
        &["first name", "firstname", "given name", "prénom", "prenom"],
    ),
    (
        "lastName",
        &["last_name", "nom", "surname", "familyName"],
        &["last name", "lastname", "surname", "family name", "nom de famille", "nom"],
    ),
    (
        "fullName",
        &["full_name", "name", "nomComplet"],
        &["full name", "your name", "name", "nom complet", "nom et prénom", "nom prénom"],
    ),
    (
        "phone",
        &["telephone", "téléphone", "tel", "mobile", "phoneNumber"],
        &[
            "phone", "phone number", "telephone", "téléphone", "numéro de téléphone", "mobile",
            "portable", "tel", "tél", "cell",
        ],
    ),
    (
        "birthDate",
        &["dateOfBirth", "dob", "birthday", "dateNaissance"],
        &["date of birth", "birth date", "birthdate", "birthday", "date de naissance", "dob"],
    ),
    (
        "address",
        &["adresse", "street"],
        &["address", "street", "street address", "adresse", "adresse postale", "rue"],
    ),
    (
        "city",
        &["ville", "town"],
        &["city", "town", "ville", "commune"],
    ),
    (
        "postalCode",
        &["zip", "zipCode", "codePostal", "postcode"],
        &["postal code", "zip", "zip code", "postcode", "code postal"],
    ),
    (
        "country",
        &["pays", "nationality"],
        &["country", "pays", "nationality", "nationalité"],
    ),
    (
        "company",
        &["organization", "entreprise", "société"],
        &["company", "organization", "organisation", "employer", "entreprise", "société", "societe"],
    ),
    (
        "jobTitle",
        &["job_title", "position", "poste"],
        &["job title", "position", "poste", "fonction", "occupation"],
    ),
    (
        "website",
        &["url", "siteWeb", "portfolio"],
        &["website", "web site", "site web", "site internet", "url", "portfolio"],
    ),
    (
        "linkedin",
        &["linkedinUrl", "linkedin_url"],
        &["linkedin", "linkedin profile", "profil linkedin"],
    ),
    (
        "gender",
        &["sex", "genre", "sexe"],
        &["gender", "sex", "genre", "sexe", "civilité"],
    ),
    (
        "age",
        &["âge"],
        &["age", "âge"],
    ),
    (
        "fileUpload",
        &["cv", "resume", "file", "attachment"],
        &[
            "cv", "resume", "résumé", "curriculum", "curriculum vitae", "upload", "file",
            "fichier", "attachment", "pièce jointe", "document",
        ],
    ),
];

#[derive(Debug, Clone, Serialize)]
pub struct FieldMapping {
    pub key: String,
    /// Accepted spellings of this key in profile data
    pub aliases: Vec<String>,
    /// Label synonyms, matched case-insensitively on word boundaries
    pub keywords: Vec<String>,
    #[serde(skip)]
    patterns: Vec<(usize, Regex)>,
}

impl FieldMapping {
    fn new(key: &str, aliases: Vec<String>, keywords: Vec<String>) -> Result<Self, regex::Error> {
        let patterns = keywords
            .iter()
            .map(|kw| Ok((kw.chars().count(), keyword_regex(kw)?)))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self {
            key: key.to_string(),
            aliases,
            keywords,
            patterns,
        })
    }

    /// Length of the longest keyword found in `label`.
    pub fn best_keyword(&self, label: &str) -> Option<(usize, &str)> {
        self.patterns
            .iter()
            .zip(&self.keywords)
            .filter(|((_, re), _)| re.is_match(label))
            .map(|((len, _), kw)| (*len, kw.as_str()))
            .fold(None, |best, candidate| match best {
                Some((len, _)) if len >= candidate.0 => best,
                _ => Some(candidate),
            })
    }

    /// Key plus aliases, the spellings looked up in a profile.
    pub fn profile_keys(&self) -> Vec<String> {
        std::iter::once(self.key.clone())
            .chain(self.aliases.iter().cloned())
            .collect()
    }
}

/// Word-bounded, case-insensitive pattern for a keyword. Boundaries are
/// only asserted next to word characters so "e-mail" still anchors.
fn keyword_regex(keyword: &str) -> Result<Regex, regex::Error> {
    let kw = keyword.trim().to_lowercase();
    let starts_word = kw.chars().next().is_some_and(char::is_alphanumeric);
    let ends_word = kw.chars().last().is_some_and(char::is_alphanumeric);
    let escaped = regex::escape(&kw).replace(' ', r"\s+");
    Regex::new(&format!(
        "(?i){}{}{}",
        if starts_word { r"\b" } else { "" },
        escaped,
        if ends_word { r"\b" } else { "" }
    ))
}

#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct FieldMappingTable {
    mappings: Vec<FieldMapping>,
}

impl FieldMappingTable {
    pub fn standard() -> Result<Self, regex::Error> {
        Self::with_extra_keywords(&BTreeMap::new())
    }

    /// Standard table plus configured keywords. Unknown keys are appended
    /// after the standard ones, so they lose ties.
    pub fn with_extra_keywords(extra: &BTreeMap<String, Vec<String>>) -> Result<Self, regex::Error> {
        let mut mappings = Vec::new();
        for (key, aliases, keywords) in STANDARD_FIELDS {
            let mut kws: Vec<String> = keywords.iter().map(|k| k.to_string()).collect();
            if let Some(more) = extra.get(*key) {
                kws.extend(more.iter().cloned());
            }
            mappings.push(FieldMapping::new(
                key,
                aliases.iter().map(|a| a.to_string()).collect(),
                kws,
            )?);
        }
        for (key, keywords) in extra {
            if mappings.iter().any(|m| &m.key == key) {
                continue;
            }
            mappings.push(FieldMapping::new(key, Vec::new(), keywords.clone())?);
        }
        Ok(Self { mappings })
    }

    pub fn mappings(&self) -> &[FieldMapping] {
        &self.mappings
    }

    pub fn get(&self, key: &str) -> Option<&FieldMapping> {
        self.mappings.iter().find(|m| m.key == key)
    }

    /// Table key for a raw profile key, if it is a known spelling.
    pub fn canonical_key(&self, raw: &str) -> Option<&str> {
        let wanted = match_key(raw);
        self.mappings
            .iter()
            .find(|m| {
                m.profile_keys()
                    .iter()
                    .any(|k| match_key(k) == wanted)
            })
            .map(|m| m.key.as_str())
    }
}
