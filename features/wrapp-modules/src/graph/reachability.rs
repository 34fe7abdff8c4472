use std::collections::{HashMap, HashSet};

use crate::types::Token;

/// What a single module provides, exports and imports
#[derive(Debug, Default)]
struct ModuleScope {
    /// Token of the module type, re-exports may refer to a module by it
    class: Option<Token>,
    provided: HashSet<Token>,
    exports: Vec<Token>,
    imports: Vec<Token>,
}

/// Export visibility table of one compilation
///
/// Global modules are a side table of this compilation only.
#[derive(Debug, Default)]
pub struct ExportTable {
    modules: HashMap<Token, ModuleScope>,
    globals: Vec<Token>,
}

impl ExportTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_module(
        &mut self,
        id: Token,
        class: Token,
        provided: impl IntoIterator<Item = Token>,
        exports: impl IntoIterator<Item = Token>,
        global: bool,
    ) {
        if global {
            self.globals.push(id.clone());
        }
        let scope = self.modules.entry(id).or_default();
        scope.class = Some(class);
        scope.provided.extend(provided);
        scope.exports.extend(exports);
    }

    pub fn add_import(&mut self, importer: &Token, child: Token) {
        self.modules.entry(importer.clone()).or_default().imports.push(child);
    }

    pub fn globals(&self) -> &[Token] {
        &self.globals
    }

    /// True if `dependency` is visible to providers of `module`
    ///
    /// Visible means provided in the module itself, exported by a global
    /// module, or exported (also through re-exported modules) by one of the
    /// modules it imports.
    pub fn is_reachable(&self, dependency: &Token, module: &Token) -> bool {
        let Some(scope) = self.modules.get(module) else {
            return false;
        };

        if scope.provided.contains(dependency) {
            return true;
        }

        let mut visited = HashSet::new();
        if self
            .globals
            .iter()
            .any(|global| self.exported_by(global, dependency, &mut visited))
        {
            return true;
        }

        scope
            .imports
            .iter()
            .any(|import| self.exported_by(import, dependency, &mut visited))
    }

    /// Follows the export chain of `module`, each module is visited once
    fn exported_by(
        &self,
        module: &Token,
        dependency: &Token,
        visited: &mut HashSet<Token>,
    ) -> bool {
        if !visited.insert(module.clone()) {
            return false;
        }
        let Some(scope) = self.modules.get(module) else {
            return false;
        };

        for export in &scope.exports {
            if export == dependency {
                return true;
            }
            // Re-exported module, identified by its token or by its module type
            for import in &scope.imports {
                let matches = import == export
                    || self
                        .modules
                        .get(import)
                        .is_some_and(|imported| imported.class.as_ref() == Some(export));
                if matches && self.exported_by(import, dependency, visited) {
                    return true;
                }
            }
        }
        false
    }
}
