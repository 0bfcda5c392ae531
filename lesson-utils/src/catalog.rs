//! Levels, lessons and sentences, plus an index so a lesson can be found by its key
//! without scanning every level.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct Sentence {
    pub id: String,
    pub en: String,
    pub ar: String,
    pub context: String,
    /// Substring of `en` that the presentation highlights.
    pub highlight: String,
    #[serde(default)]
    pub pronunciation_en: String,
    #[serde(default)]
    pub pronunciation_ar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[tsify(optional)]
    pub tip_ar: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Lesson {
    pub title: String,
    pub sentences: Vec<Sentence>,
}

impl Lesson {
    pub fn sentence_ids(&self) -> impl Iterator<Item = &str> {
        self.sentences.iter().map(|s| s.id.as_str())
    }
}

/// Lessons of one level, in display order.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Level {
    pub lessons: IndexMap<String, Lesson>,
}

/// Levels in display order. This is the shape of the catalog document.
///
/// A lesson key may appear only once in the whole document, even across levels,
/// because saved progress is keyed by lesson key alone.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct LessonLibrary {
    pub levels: IndexMap<String, Level>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    /// The same lesson key was filed under two levels.
    #[error("lesson `{lesson}` appears in both `{first_level}` and `{second_level}`")]
    DuplicateLesson {
        lesson: String,
        first_level: String,
        second_level: String,
    },
    #[error("sentence `{sentence}` appears more than once (second time in lesson `{lesson}`)")]
    DuplicateSentence { sentence: String, lesson: String },
}

#[derive(Copy, Clone, Debug)]
struct LessonLocation {
    level: usize,
    lesson: usize,
}

/// A lesson together with the keys it is filed under.
#[derive(Copy, Clone, Debug)]
pub struct LessonRef<'a> {
    pub level_key: &'a str,
    pub lesson_key: &'a str,
    pub lesson: &'a Lesson,
}

/// The read-only catalog with a lesson-key index built once at load time.
///
/// Progress is keyed by lesson key alone, so lesson keys must be unique across
/// the whole catalog, not only within their level. Sentence ids must be unique too.
#[derive(Clone, Debug)]
pub struct Catalog {
    library: LessonLibrary,
    lessons: HashMap<String, LessonLocation>,
}

impl Catalog {
    pub fn new(library: LessonLibrary) -> Result<Self, CatalogError> {
        let mut lessons: HashMap<String, LessonLocation> = HashMap::new();
        let mut sentences: HashSet<&str> = HashSet::new();

        for (level_index, (level_key, level)) in library.levels.iter().enumerate() {
            for (lesson_index, (lesson_key, lesson)) in level.lessons.iter().enumerate() {
                if let Some(existing) = lessons.get(lesson_key) {
                    let first_level = library
                        .levels
                        .get_index(existing.level)
                        .map(|(key, _)| key.clone())
                        .unwrap_or_default();
                    return Err(CatalogError::DuplicateLesson {
                        lesson: lesson_key.clone(),
                        first_level,
                        second_level: level_key.clone(),
                    });
                }
                for sentence in &lesson.sentences {
                    if !sentences.insert(sentence.id.as_str()) {
                        return Err(CatalogError::DuplicateSentence {
                            sentence: sentence.id.clone(),
                            lesson: lesson_key.clone(),
                        });
                    }
                }
                lessons.insert(
                    lesson_key.clone(),
                    LessonLocation {
                        level: level_index,
                        lesson: lesson_index,
                    },
                );
            }
        }

        Ok(Self { library, lessons })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let library: LessonLibrary = serde_json::from_str(json)?;
        Self::new(library)
    }

    /// The lesson library shipped with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(crate::BUILTIN_LIBRARY_JSON)
    }

    pub fn library(&self) -> &LessonLibrary {
        &self.library
    }

    pub fn level_keys(&self) -> impl Iterator<Item = &str> {
        self.library.levels.keys().map(String::as_str)
    }

    pub fn level(&self, level_key: &str) -> Option<&Level> {
        self.library.levels.get(level_key)
    }

    pub fn lesson(&self, lesson_key: &str) -> Option<LessonRef<'_>> {
        let location = self.lessons.get(lesson_key)?;
        let (level_key, level) = self.library.levels.get_index(location.level)?;
        let (lesson_key, lesson) = level.lessons.get_index(location.lesson)?;
        Some(LessonRef {
            level_key,
            lesson_key,
            lesson,
        })
    }

    pub fn contains_lesson(&self, lesson_key: &str) -> bool {
        self.lessons.contains_key(lesson_key)
    }

    pub fn sentence(&self, lesson_key: &str, sentence_id: &str) -> Option<&Sentence> {
        self.lesson(lesson_key)?
            .lesson
            .sentences
            .iter()
            .find(|s| s.id == sentence_id)
    }

    pub fn num_lessons(&self) -> usize {
        self.lessons.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(id: &str) -> Sentence {
        Sentence {
            id: id.to_string(),
            en: format!("english {id}"),
            ar: format!("arabic {id}"),
            context: String::new(),
            highlight: String::new(),
            pronunciation_en: String::new(),
            pronunciation_ar: String::new(),
            tip_ar: None,
        }
    }

    fn library(levels: &[(&str, &[(&str, &[&str])])]) -> LessonLibrary {
        LessonLibrary {
            levels: levels
                .iter()
                .map(|(level_key, lessons)| {
                    let lessons = lessons
                        .iter()
                        .map(|(lesson_key, ids)| {
                            (
                                lesson_key.to_string(),
                                Lesson {
                                    title: lesson_key.to_string(),
                                    sentences: ids.iter().map(|id| sentence(id)).collect(),
                                },
                            )
                        })
                        .collect();
                    (level_key.to_string(), Level { lessons })
                })
                .collect(),
        }
    }

    #[test]
    fn builtin_catalog_loads() {
        let catalog = Catalog::builtin().unwrap();
        let about = catalog.lesson("about").expect("about lesson is built in");
        assert_eq!(about.level_key, "المستوى الأول");
        assert_eq!(about.lesson.title, "about");
        assert_eq!(about.lesson.sentences.len(), 10);
        assert_eq!(about.lesson.sentences[0].id, "ab_01");
        assert!(about.lesson.sentences[0].tip_ar.is_some());
    }

    #[test]
    fn index_finds_lessons_in_any_level() {
        let catalog = Catalog::new(library(&[
            ("one", &[("a", &["a1", "a2"]), ("b", &["b1"])]),
            ("two", &[("c", &["c1"])]),
        ]))
        .unwrap();

        assert_eq!(catalog.num_lessons(), 3);
        let c = catalog.lesson("c").unwrap();
        assert_eq!(c.level_key, "two");
        assert_eq!(c.lesson_key, "c");
        assert_eq!(catalog.sentence("a", "a2").map(|s| s.en.as_str()), Some("english a2"));
        assert!(catalog.sentence("a", "b1").is_none());
        assert!(catalog.lesson("missing").is_none());
        assert_eq!(catalog.level_keys().collect::<Vec<_>>(), vec!["one", "two"]);
    }

    #[test]
    fn lesson_keys_must_be_unique_across_levels() {
        let err = Catalog::new(library(&[
            ("one", &[("a", &["a1"])]),
            ("two", &[("a", &["a2"])]),
        ]))
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateLesson { ref lesson, .. } if lesson == "a"));
    }

    #[test]
    fn sentence_ids_must_be_unique() {
        let err = Catalog::new(library(&[("one", &[("a", &["x"]), ("b", &["x"])])])).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateSentence { ref sentence, .. } if sentence == "x"));
    }

    #[test]
    fn level_order_follows_the_document() {
        let json = r#"{"z": {"b": {"title": "B", "sentences": []}, "a": {"title": "A", "sentences": []}}}"#;
        let catalog = Catalog::from_json(json).unwrap();
        let keys: Vec<&str> = catalog
            .level("z")
            .unwrap()
            .lessons
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["b", "a"]);
    }
}
