//! Concrete implementations of the ports

pub mod csv_store;
pub mod gemini;
pub mod memory;

pub use csv_store::CsvStore;
pub use gemini::{GeminiClient, OfflineClassifier};
pub use memory::InMemoryStore;

use crate::domain::{CategoryEntry, CategoryKind};

/// The category dictionary a fresh installation starts with
pub(crate) fn seed_categories() -> Vec<CategoryEntry> {
    let expense = [
        ("1", "Питание", "Ovqatlanish"),
        ("2", "Такси", "Taksi"),
        ("3", "Одежда", "Kiyim"),
        ("4", "Развлечения", "Ko'ngilochar"),
        ("5", "Топливо", "Yoqilg'i"),
        ("6", "Коммунальные", "Kommunal"),
        ("7", "Другое", "Boshqa"),
    ];
    let income = [
        ("101", "Зарплата", "Maosh"),
        ("102", "Продажа", "Sotuv"),
        ("103", "Возврат", "Qaytarish"),
        ("104", "Кешбек", "Keshbek"),
        ("105", "Прочее", "Boshqa daromad"),
    ];
    let mut entries = Vec::new();
    for (id, ru, uz) in expense {
        entries.push(CategoryEntry {
            id: id.to_string(),
            label_ru: ru.to_string(),
            label_uz: uz.to_string(),
            kind: CategoryKind::Expense,
        });
    }
    for (id, ru, uz) in income {
        entries.push(CategoryEntry {
            id: id.to_string(),
            label_ru: ru.to_string(),
            label_uz: uz.to_string(),
            kind: CategoryKind::Income,
        });
    }
    entries
}
