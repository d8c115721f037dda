use thiserror::Error;

use crate::model::ids::ModuleId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("module id cannot be empty")]
    EmptyId,

    #[error("module name cannot be empty")]
    EmptyName,

    #[error("duplicate module id: {0}")]
    DuplicateId(ModuleId),
}

//
// ─── MODULE ────────────────────────────────────────────────────────────────────
//

/// One topic category learners practise in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    id: ModuleId,
    name: String,
    description: String,
}

impl Module {
    /// Creates a module entry.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the id or name is blank.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, CatalogError> {
        let id = id.into().trim().to_owned();
        let name = name.into().trim().to_owned();
        if id.is_empty() {
            return Err(CatalogError::EmptyId);
        }
        if name.is_empty() {
            return Err(CatalogError::EmptyName);
        }
        Ok(Self {
            id: ModuleId::new(id),
            name,
            description: description.into(),
        })
    }

    #[must_use]
    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// Closed, ordered set of modules.
///
/// Order matters: every "first wins" tie-break in the metrics follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleCatalog {
    modules: Vec<Module>,
}

impl ModuleCatalog {
    /// Builds a catalog from the given modules, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateId` if two modules share an id.
    pub fn new(modules: Vec<Module>) -> Result<Self, CatalogError> {
        for (idx, module) in modules.iter().enumerate() {
            if modules[..idx].iter().any(|m| m.id == module.id) {
                return Err(CatalogError::DuplicateId(module.id.clone()));
            }
        }
        Ok(Self { modules })
    }

    /// The five product-management interview modules.
    #[must_use]
    pub fn product_management() -> Self {
        let modules = PM_MODULES
            .iter()
            .map(|(id, name, description)| Module {
                id: ModuleId::new(*id),
                name: (*name).to_owned(),
                description: (*description).to_owned(),
            })
            .collect();
        Self { modules }
    }

    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn iter(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.id.as_str() == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl Default for ModuleCatalog {
    fn default() -> Self {
        Self::product_management()
    }
}

const PM_MODULES: [(&str, &str, &str); 5] = [
    (
        "product-design",
        "Product Design",
        "User-centric design thinking, user journeys, pain point analysis, and solution generation",
    ),
    (
        "product-strategy",
        "Product Strategy",
        "Market analysis, competitive positioning, business models, and growth strategy",
    ),
    (
        "analytical-metrics",
        "Analytical / Metrics",
        "Metric definition, data diagnosis, A/B testing, and experiment design",
    ),
    (
        "behavioral-leadership",
        "Behavioral / Leadership",
        "Stakeholder management, conflict resolution, STAR stories, and influence",
    ),
    (
        "technical-execution",
        "Technical / Execution",
        "PRD writing, roadmapping, prioritization frameworks, and launch planning",
    ),
];
