//! Classification cascade
//!
//! Ordered evaluation, first match wins:
//! 1. hardcoded bilingual income keywords
//! 2. hardcoded bilingual expense keywords per category
//! 3. the remote label classifier, validated exact-match against the
//!    dictionary
//! 4. a narrower local keyword fallback, then the unconditional "Другое"
//!    expense default
//!
//! Every call terminates with a valid category id; remote failures are
//! swallowed into step 4 and never reach the caller.

use std::sync::Arc;

use crate::domain::{CategoryDict, CategoryKind, Lang};
use crate::ports::LabelClassifier;

struct KeywordRule {
    keywords: &'static [&'static str],
    label_ru: &'static str,
}

const INCOME_KEYWORDS: &[&str] = &[
    "зарплата",
    "получил зп",
    "возврат",
    "кешбек",
    "продажа",
    "oylik",
    "maosh",
    "daromad",
    "sotuv",
    "qaytarish",
    "keshbek",
];

const EXPENSE_RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &[
            "кофе",
            "еда",
            "питание",
            "обед",
            "ужин",
            "завтрак",
            "кафе",
            "ресторан",
            "макдональдс",
            "бургер",
            "пицца",
            "kofe",
            "ovqat",
            "oziv",
            "tushlik",
            "kechki ovqat",
            "nonushta",
            "kafe",
            "restoran",
            "burger",
            "pitsa",
        ],
        label_ru: "Питание",
    },
    KeywordRule {
        keywords: &[
            "такси",
            "автобус",
            "метро",
            "проезд",
            "транспорт",
            "taksi",
            "avtobus",
            "metro",
            "transport",
        ],
        label_ru: "Такси",
    },
    KeywordRule {
        keywords: &[
            "одежда",
            "футболка",
            "брюки",
            "обувь",
            "магазин",
            "шопинг",
            "kiyim",
            "futbolka",
            "shim",
            "do'kon",
            "shopping",
        ],
        label_ru: "Одежда",
    },
    KeywordRule {
        keywords: &[
            "развлечения",
            "кино",
            "театр",
            "игра",
            "игры",
            "o'yin",
            "kino",
            "teatr",
            "ko'ngil ochar",
        ],
        label_ru: "Развлечения",
    },
];

// applied only after the remote classifier failed
const FALLBACK_RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &[
            "еда", "пища", "кушать", "пить", "напиток", "продукты", "ovqat", "oziv", "yemak",
            "ichimlik", "mahsulot",
        ],
        label_ru: "Питание",
    },
    KeywordRule {
        keywords: &["машина", "бензин", "топливо", "парковка", "стоянка"],
        label_ru: "Топливо",
    },
    KeywordRule {
        keywords: &[
            "счет",
            "коммунальные",
            "электричество",
            "газ",
            "вода",
            "интернет",
        ],
        label_ru: "Коммунальные",
    },
];

fn matches_any(lower: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| lower.contains(k))
}

#[derive(Clone)]
pub struct ClassificationService {
    classifier: Arc<dyn LabelClassifier>,
}

impl ClassificationService {
    pub fn new(classifier: Arc<dyn LabelClassifier>) -> Self {
        Self { classifier }
    }

    /// Resolve a category id for free text. Always returns a valid id
    /// from the dictionary.
    pub fn classify(&self, text: &str, dict: &CategoryDict) -> String {
        let lower = text.to_lowercase();

        if matches_any(&lower, INCOME_KEYWORDS) {
            return dict.income_id_for("Зарплата");
        }

        for rule in EXPENSE_RULES {
            if matches_any(&lower, rule.keywords) {
                return dict.expense_id_for(rule.label_ru);
            }
        }

        if let Some(id) = self.classify_remote(text, dict) {
            return id;
        }

        for rule in FALLBACK_RULES {
            if matches_any(&lower, rule.keywords) {
                return dict.expense_id_for(rule.label_ru);
            }
        }

        dict.fallback_expense_id()
    }

    /// Step 3: remote label, validated exact-match. `None` on any
    /// remote error or unrecognized label.
    fn classify_remote(&self, text: &str, dict: &CategoryDict) -> Option<String> {
        let income_labels = dict.labels_of_kind(CategoryKind::Income, Lang::Ru);
        let expense_labels = dict.labels_of_kind(CategoryKind::Expense, Lang::Ru);

        let label = self
            .classifier
            .classify(text, &income_labels, &expense_labels)
            .ok()?;
        dict.id_for_label(&label).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::result::{Error, Result};
    use crate::ports::LedgerStore;

    struct FixedClassifier(&'static str);

    impl LabelClassifier for FixedClassifier {
        fn classify(&self, _: &str, _: &[String], _: &[String]) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingClassifier;

    impl LabelClassifier for FailingClassifier {
        fn classify(&self, _: &str, _: &[String], _: &[String]) -> Result<String> {
            Err(Error::ClassificationUnavailable("HTTP 500".into()))
        }
    }

    fn dict() -> CategoryDict {
        let store = InMemoryStore::with_seed_categories();
        CategoryDict::new(store.categories().unwrap())
    }

    #[test]
    fn test_keyword_rules_win_over_remote() {
        let svc = ClassificationService::new(Arc::new(FixedClassifier("Другое")));
        let d = dict();
        assert_eq!(svc.classify("такси до дома", &d), "2");
        assert_eq!(svc.classify("обед в кафе", &d), "1");
        assert_eq!(svc.classify("получил зарплата за май", &d), "101");
        assert_eq!(svc.classify("oylik keldi", &d), "101");
    }

    #[test]
    fn test_remote_label_validated_exact_match() {
        let d = dict();

        let svc = ClassificationService::new(Arc::new(FixedClassifier("Коммунальные")));
        assert_eq!(svc.classify("оплата за свет", &d), "6");

        // unknown label falls through to the default
        let svc = ClassificationService::new(Arc::new(FixedClassifier("Нечто странное")));
        assert_eq!(svc.classify("что-то непонятное", &d), "7");
    }

    #[test]
    fn test_remote_failure_uses_local_fallback() {
        let svc = ClassificationService::new(Arc::new(FailingClassifier));
        let d = dict();
        assert_eq!(svc.classify("бензин на заправке", &d), "5");
        assert_eq!(svc.classify("электричество за месяц", &d), "6");
        assert_eq!(svc.classify("загадочная трата", &d), "7");
    }

    #[test]
    fn test_classification_is_idempotent() {
        let svc = ClassificationService::new(Arc::new(FailingClassifier));
        let d = dict();
        let first = svc.classify("бензин", &d);
        let second = svc.classify("бензин", &d);
        assert_eq!(first, second);
    }
}
