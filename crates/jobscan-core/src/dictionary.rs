//! Keyword dictionary: canonical terms, synonyms and their categories.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::models::embedded::DEFAULT_DICTIONARY;
use crate::models::entity::Category;
use crate::text::normalize_form;

/// Fine-grained dictionary category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeywordCategory {
    Programming,
    DataScience,
    Framework,
    Database,
    Cloud,
    Devops,
    Tool,
    SoftSkill,
    Methodology,
    Role,
    Seniority,
    Vietnamese,
}

impl KeywordCategory {
    pub const ALL: [KeywordCategory; 12] = [
        KeywordCategory::Programming,
        KeywordCategory::DataScience,
        KeywordCategory::Framework,
        KeywordCategory::Database,
        KeywordCategory::Cloud,
        KeywordCategory::Devops,
        KeywordCategory::Tool,
        KeywordCategory::SoftSkill,
        KeywordCategory::Methodology,
        KeywordCategory::Role,
        KeywordCategory::Seniority,
        KeywordCategory::Vietnamese,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            KeywordCategory::Programming => "programming",
            KeywordCategory::DataScience => "data-science",
            KeywordCategory::Framework => "framework",
            KeywordCategory::Database => "database",
            KeywordCategory::Cloud => "cloud",
            KeywordCategory::Devops => "devops",
            KeywordCategory::Tool => "tool",
            KeywordCategory::SoftSkill => "soft-skill",
            KeywordCategory::Methodology => "methodology",
            KeywordCategory::Role => "role",
            KeywordCategory::Seniority => "seniority",
            KeywordCategory::Vietnamese => "vietnamese",
        }
    }

    /// Output category that collects matches of this dictionary category.
    pub fn group(self) -> Category {
        match self {
            KeywordCategory::Programming | KeywordCategory::DataScience => Category::Skills,
            KeywordCategory::Framework
            | KeywordCategory::Database
            | KeywordCategory::Cloud
            | KeywordCategory::Devops
            | KeywordCategory::Tool => Category::Technologies,
            KeywordCategory::SoftSkill => Category::SoftSkills,
            KeywordCategory::Methodology => Category::IndustryTerms,
            KeywordCategory::Role => Category::Roles,
            KeywordCategory::Seniority => Category::SeniorityLevels,
            KeywordCategory::Vietnamese => Category::VietnameseKeywords,
        }
    }
}

impl fmt::Display for KeywordCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeywordCategory {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase().replace(['_', ' '], "-");
        KeywordCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == name)
            .ok_or_else(|| ConfigError::Dictionary(format!("unknown category '{}'", s)))
    }
}

/// A canonical dictionary term.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DictionaryEntry {
    /// Canonical form as written in the dictionary.
    pub term: String,
    pub category: KeywordCategory,
    pub synonyms: Vec<String>,
    /// Multiplies the score of every match of this entry.
    pub weight: f32,
    /// Whether approximate matches against this entry are allowed.
    pub fuzzy: bool,
}

/// A matchable surface form pointing at its entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryForm {
    /// Normalized form (lowercase, single spaces).
    pub form: String,
    /// Index into the entry table.
    pub entry: usize,
    /// Number of tokens in `form`.
    pub words: usize,
    /// True when `form` comes from a synonym.
    pub synonym: bool,
}

#[derive(Debug, Deserialize)]
struct DictionaryFile {
    #[serde(default)]
    version: Option<String>,
    categories: BTreeMap<String, Vec<EntryRecord>>,
}

#[derive(Debug, Deserialize)]
struct EntryRecord {
    #[serde(default)]
    term: Option<String>,
    #[serde(default)]
    synonyms: Vec<String>,
    #[serde(default)]
    weight: Option<f32>,
    #[serde(default)]
    fuzzy: Option<bool>,
}

/// Indexed keyword dictionary.
///
/// Each normalized form maps to at most one entry per category. The same
/// form may appear in different categories.
#[derive(Debug, Clone)]
pub struct DictionaryStore {
    version: String,
    entries: Vec<DictionaryEntry>,
    forms: Vec<DictionaryForm>,
    by_form: HashMap<String, Vec<usize>>,
    by_word_count: BTreeMap<usize, Vec<usize>>,
}

impl DictionaryStore {
    /// Load a dictionary file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let store = Self::from_json(&content)?;
        info!(
            "Loaded dictionary {} ({} entries) from {}",
            store.version,
            store.len(),
            path.display()
        );
        Ok(store)
    }

    /// The dictionary compiled into the crate.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json(DEFAULT_DICTIONARY)
    }

    /// Parse and index dictionary JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let file: DictionaryFile = serde_json::from_str(json)
            .map_err(|e| ConfigError::Dictionary(e.to_string()))?;

        let mut store = Self {
            version: file.version.unwrap_or_else(|| "unversioned".to_string()),
            entries: Vec::new(),
            forms: Vec::new(),
            by_form: HashMap::new(),
            by_word_count: BTreeMap::new(),
        };

        for (name, records) in file.categories {
            let category: KeywordCategory = name.parse()?;
            for (position, record) in records.into_iter().enumerate() {
                store.insert(category, position, record)?;
            }
        }

        debug!(
            "Indexed {} dictionary entries with {} forms",
            store.entries.len(),
            store.forms.len()
        );
        Ok(store)
    }

    fn insert(&mut self, category: KeywordCategory, position: usize, record: EntryRecord) -> Result<(), ConfigError> {
        let term = record
            .term
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ConfigError::Dictionary(format!(
                    "entry #{} in '{}' has no canonical term",
                    position + 1,
                    category
                ))
            })?;

        let weight = record.weight.unwrap_or(1.0);
        let fuzzy = record.fuzzy.unwrap_or(true);
        if !weight.is_finite() || weight <= 0.0 {
            return Err(ConfigError::Dictionary(format!(
                "entry '{}' has invalid weight {}",
                term, weight
            )));
        }

        let canonical = normalize_form(&term);
        if canonical.is_empty() {
            return Err(ConfigError::Dictionary(format!(
                "entry '{}' has no matchable characters",
                term
            )));
        }

        let id = self.entries.len();
        self.add_form(category, id, &term, canonical.clone(), false)?;

        let mut synonyms = Vec::new();
        for synonym in record.synonyms {
            let form = normalize_form(&synonym);
            if form.is_empty() || form == canonical {
                continue;
            }
            if self.forms.iter().any(|f| f.entry == id && f.form == form) {
                continue;
            }
            self.add_form(category, id, &term, form, true)?;
            synonyms.push(synonym.trim().to_string());
        }

        self.entries.push(DictionaryEntry {
            term,
            category,
            synonyms,
            weight,
            fuzzy,
        });
        Ok(())
    }

    fn add_form(
        &mut self,
        category: KeywordCategory,
        id: usize,
        term: &str,
        form: String,
        synonym: bool,
    ) -> Result<(), ConfigError> {
        if let Some(existing) = self.by_form.get(&form) {
            let clash = existing.iter().map(|&fid| &self.forms[fid]).find(|f| {
                let owner = self.entries.get(f.entry).map(|e| e.category);
                f.entry != id && owner.unwrap_or(category) == category
            });
            if let Some(other) = clash {
                let owner = self
                    .entries
                    .get(other.entry)
                    .map(|e| e.term.as_str())
                    .unwrap_or(term);
                return Err(ConfigError::Dictionary(format!(
                    "'{}' maps to both '{}' and '{}' in '{}'",
                    form, owner, term, category
                )));
            }
        }

        let words = form.split(' ').count();
        let fid = self.forms.len();
        self.by_form.entry(form.clone()).or_default().push(fid);
        self.by_word_count.entry(words).or_default().push(fid);
        self.forms.push(DictionaryForm {
            form,
            entry: id,
            words,
            synonym,
        });
        Ok(())
    }

    /// Dictionary version string.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Number of canonical entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[DictionaryEntry] {
        &self.entries
    }

    pub fn entry(&self, id: usize) -> Option<&DictionaryEntry> {
        self.entries.get(id)
    }

    /// Forms exactly equal to the normalized `phrase`, one per matching entry.
    pub fn lookup(&self, phrase: &str) -> Vec<&DictionaryForm> {
        let form = normalize_form(phrase);
        self.by_form
            .get(&form)
            .map(|ids| ids.iter().map(|&fid| &self.forms[fid]).collect())
            .unwrap_or_default()
    }

    /// Canonical entry for a phrase, preferring the earliest indexed entry
    /// when the form exists in several categories.
    pub fn canonicalize(&self, phrase: &str) -> Option<&DictionaryEntry> {
        self.lookup(phrase)
            .into_iter()
            .map(|f| f.entry)
            .min()
            .and_then(|id| self.entries.get(id))
    }

    /// All forms with exactly `words` tokens.
    pub fn forms_with_word_count(&self, words: usize) -> impl Iterator<Item = &DictionaryForm> {
        self.by_word_count
            .get(&words)
            .into_iter()
            .flat_map(move |ids| ids.iter().map(move |&fid| &self.forms[fid]))
    }

    /// Token count of the longest form.
    pub fn max_words(&self) -> usize {
        self.by_word_count.keys().next_back().copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const SMALL: &str = r#"{
        "version": "test-1",
        "categories": {
            "programming": [
                {"term": "Python", "synonyms": ["py"]},
                {"term": "Go", "synonyms": ["golang"]}
            ],
            "soft-skill": [
                {"term": "problem solving", "synonyms": ["problem-solving"], "weight": 0.5}
            ]
        }
    }"#;

    #[test]
    fn test_builtin_dictionary_loads() {
        let store = DictionaryStore::builtin().unwrap();
        assert!(store.len() > 50);
        assert!(store.canonicalize("tensorflow").is_some());
        assert_eq!(store.canonicalize("K8S").unwrap().term, "kubernetes");
    }

    #[test]
    fn test_synonyms_map_to_canonical() {
        let store = DictionaryStore::from_json(SMALL).unwrap();
        assert_eq!(store.version(), "test-1");
        assert_eq!(store.len(), 3);

        let entry = store.canonicalize("golang").unwrap();
        assert_eq!(entry.term, "Go");
        assert_eq!(entry.category.group(), Category::Skills);

        let forms = store.lookup("py");
        assert_eq!(forms.len(), 1);
        assert!(forms[0].synonym);
    }

    #[test]
    fn test_forms_by_word_count() {
        let store = DictionaryStore::from_json(SMALL).unwrap();
        let two: Vec<&str> = store.forms_with_word_count(2).map(|f| f.form.as_str()).collect();
        assert_eq!(two, vec!["problem solving"]);
        assert_eq!(store.max_words(), 2);
    }

    #[test]
    fn test_weight_and_fuzzy_flags() {
        let json = r#"{"categories": {"framework": [
            {"term": "spring", "fuzzy": false},
            {"term": "django", "weight": 0.5}
        ]}}"#;
        let store = DictionaryStore::from_json(json).unwrap();
        let spring = store.canonicalize("spring").unwrap();
        assert!(!spring.fuzzy);
        assert_eq!(spring.weight, 1.0);
        let django = store.canonicalize("django").unwrap();
        assert!(django.fuzzy);
        assert_eq!(django.weight, 0.5);
    }

    #[test]
    fn test_vietnamese_category() {
        let store = DictionaryStore::builtin().unwrap();
        let entry = store.canonicalize("Kinh nghiệm").unwrap();
        assert_eq!(entry.category, KeywordCategory::Vietnamese);
        assert_eq!(entry.category.group(), Category::VietnameseKeywords);
        assert_eq!(store.lookup("làm việc nhóm").len(), 2);
    }

    #[test]
    fn test_missing_term_is_rejected() {
        let json = r#"{"categories": {"tool": [{"synonyms": ["x"]}]}}"#;
        let err = DictionaryStore::from_json(json).unwrap_err();
        assert!(err.to_string().contains("no canonical term"));
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let json = r#"{"categories": {"hobby": [{"term": "chess"}]}}"#;
        assert!(matches!(
            DictionaryStore::from_json(json),
            Err(ConfigError::Dictionary(_))
        ));
    }

    #[test]
    fn test_conflicting_synonym_is_rejected() {
        let json = r#"{"categories": {"database": [
            {"term": "postgresql", "synonyms": ["pg"]},
            {"term": "pgvector", "synonyms": ["pg"]}
        ]}}"#;
        let err = DictionaryStore::from_json(json).unwrap_err();
        assert!(err.to_string().contains("maps to both"));
    }

    #[test]
    fn test_same_form_in_two_categories_is_allowed() {
        let json = r#"{"categories": {
            "methodology": [{"term": "devops"}],
            "role": [{"term": "devops engineer", "synonyms": ["devops"]}]
        }}"#;
        let store = DictionaryStore::from_json(json).unwrap();
        assert_eq!(store.lookup("devops").len(), 2);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SMALL.as_bytes()).unwrap();
        let store = DictionaryStore::load(file.path()).unwrap();
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_load_missing_file() {
        let err = DictionaryStore::load(Path::new("/nonexistent/dictionary.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
