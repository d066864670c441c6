//! Article and personnel lookups used for labels and request checks.
//!
//! Lookups never take part in matching; a movement whose article or person
//! is missing here still reconciles and simply renders with fallback text.

use std::collections::BTreeMap;

use bdg_schemas::{ArticleRecord, PersonnelRecord};

use crate::types::{ArticleId, PersonId};

pub const ARTICLE_NOT_FOUND: &str = "Artículo no encontrado";
pub const NO_NAME: &str = "Sin Nombre";
pub const NO_EMAIL: &str = "Sin Correo";
pub const NO_SECTION: &str = "Sin Sección";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferenceTables {
    pub articles: BTreeMap<ArticleId, ArticleRecord>,
    pub personnel: BTreeMap<PersonId, PersonnelRecord>,
}

impl ReferenceTables {
    /// Personnel sharing a `correo_institucional` collapse to the last one
    /// listed. People without an email are kept as-is.
    pub fn from_records(articles: &[ArticleRecord], personnel: &[PersonnelRecord]) -> Self {
        let articles = articles
            .iter()
            .map(|a| (ArticleId(a.id), a.clone()))
            .collect();

        let mut by_email: BTreeMap<String, &PersonnelRecord> = BTreeMap::new();
        let mut people: BTreeMap<PersonId, PersonnelRecord> = BTreeMap::new();
        for p in personnel {
            match p.correo_institucional.as_deref() {
                Some(email) if !email.is_empty() => {
                    by_email.insert(email.to_string(), p);
                }
                _ => {
                    people.insert(PersonId(p.id), p.clone());
                }
            }
        }
        for p in by_email.into_values() {
            people.insert(PersonId(p.id), p.clone());
        }

        Self {
            articles,
            personnel: people,
        }
    }

    pub fn article(&self, id: ArticleId) -> Option<&ArticleRecord> {
        self.articles.get(&id)
    }

    pub fn person(&self, id: PersonId) -> Option<&PersonnelRecord> {
        self.personnel.get(&id)
    }

    pub fn article_label(&self, id: ArticleId) -> String {
        self.article(id)
            .map(article_label)
            .unwrap_or_else(|| ARTICLE_NOT_FOUND.to_string())
    }

    pub fn person_email(&self, id: PersonId) -> &str {
        self.person(id)
            .and_then(|p| non_empty(&p.correo_institucional))
            .unwrap_or(NO_EMAIL)
    }

    pub fn person_name(&self, id: PersonId) -> &str {
        self.person(id)
            .and_then(|p| non_empty(&p.nombre))
            .unwrap_or(NO_NAME)
    }

    pub fn person_section(&self, id: PersonId) -> &str {
        self.person(id)
            .and_then(|p| non_empty(&p.seccion))
            .unwrap_or(NO_SECTION)
    }

    /// Articles that can appear in a loan form: something in stock or
    /// something currently lent.
    pub fn lendable_articles(&self) -> impl Iterator<Item = &ArticleRecord> {
        self.articles
            .values()
            .filter(|a| a.stock_actual > 0 || a.stock_prestado > 0)
    }
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

/// `nombre - Modelo: .. - Marca: .. - Código Interno: ..` with only the
/// parts that are present.
pub fn article_label(a: &ArticleRecord) -> String {
    let mut label = non_empty(&a.nombre).unwrap_or(NO_NAME).to_string();
    let parts: [(&str, &Option<String>); 6] = [
        ("Modelo", &a.modelo_nombre),
        ("Marca", &a.marca_nombre),
        ("Código Interno", &a.codigo_interno),
        ("Código MINVU", &a.codigo_minvu),
        ("Nº Serie", &a.numero_serie),
        ("MAC", &a.mac),
    ];
    for (name, value) in parts {
        if let Some(v) = non_empty(value) {
            label.push_str(&format!(" - {name}: {v}"));
        }
    }
    label
}
