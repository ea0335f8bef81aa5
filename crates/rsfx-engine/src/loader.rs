//! Source loading and the recursive import walk.

use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use rsfx_lang::{Header, Interpreter, StreamReader, Toplevel, parse_header, parse_toplevel, preprocess};

use crate::environment::Environment;
use crate::error::EngineError;
use crate::fileid::FileId;
use crate::resolve::resolve_import_path;

/// Maximum allowed `import` nesting.
pub const MAX_IMPORT_DEPTH: u32 = 32;

/// Loader behavior switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Parse the main file only, without walking its imports.
    pub skip_imports: bool,
}

/// One parsed translation unit.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    /// Path the unit was loaded from.
    pub path: PathBuf,
    /// Preprocessed source text.
    pub preprocessed: String,
    /// Split sections.
    pub toplevel: Toplevel,
    /// Parsed header metadata.
    pub header: Header,
}

/// A main unit plus its dependency-closed imports.
///
/// Units are ordered dependencies-first: every unit appears after the units
/// it imports, and the main unit is last.
#[derive(Debug, Clone)]
pub struct Program {
    units: Vec<SourceUnit>,
}

impl Program {
    /// All units, dependencies first.
    pub fn units(&self) -> &[SourceUnit] {
        &self.units
    }

    /// The main (last) unit.
    pub fn main(&self) -> &SourceUnit {
        // load_program never builds an empty program
        &self.units[self.units.len() - 1]
    }
}

/// Load `path` and its import closure into a [`Program`].
pub fn load_program(
    path: &Path,
    env: &Environment,
    options: LoadOptions,
) -> Result<Program, EngineError> {
    let mut walk = ImportWalk {
        env,
        options,
        visited: HashSet::new(),
        units: Vec::new(),
    };
    if let Some(id) = FileId::of(path) {
        walk.visited.insert(id);
    }
    walk.load_unit(path, 0)?;

    let mut program = Program { units: walk.units };
    apply_default_pins(&mut program);
    Ok(program)
}

struct ImportWalk<'a> {
    env: &'a Environment,
    options: LoadOptions,
    visited: HashSet<FileId>,
    units: Vec<SourceUnit>,
}

impl ImportWalk<'_> {
    fn load_unit(&mut self, path: &Path, depth: u32) -> Result<(), EngineError> {
        if depth > MAX_IMPORT_DEPTH {
            return Err(EngineError::TooManyImportLevels {
                importer: path.to_path_buf(),
            });
        }

        tracing::debug!(path = %path.display(), depth, "loading unit");
        let unit = self.parse_unit(path)?;

        if !self.options.skip_imports {
            let origin_dir = path.parent().unwrap_or(Path::new("."));
            let mut roots: Vec<&Path> = vec![origin_dir];
            if let Some(root) = self.env.import_root() {
                roots.push(root);
            }

            for name in &unit.header.imports {
                let Some(resolved) = resolve_import_path(name, &roots) else {
                    return Err(EngineError::import_not_found(path, name));
                };
                // Identity-based dedupe: a file reached twice, by any path
                // spelling, is processed once.
                if let Some(id) = FileId::of(&resolved) {
                    if !self.visited.insert(id) {
                        continue;
                    }
                }
                self.load_unit(&resolved, depth + 1)?;
            }
        }

        // Dependencies land before their importer.
        self.units.push(unit);
        Ok(())
    }

    fn parse_unit(&self, path: &Path) -> Result<SourceUnit, EngineError> {
        let file = File::open(path).map_err(|e| EngineError::read_file(path, e))?;
        let mut reader = StreamReader::new(file).map_err(|e| EngineError::read_file(path, e))?;

        // Config items declared in the raw header are visible to the unit's
        // own meta-code, under any host-set values of the same name.
        let mut vars = self.env.preprocessor_vars().clone();
        for (name, value) in config_defaults(path)? {
            vars.entry(name).or_insert(value);
        }

        let mut eval = Interpreter::with_values(vars);
        let mut preprocessed = String::new();
        preprocess(&mut reader, &mut eval, &mut preprocessed)
            .map_err(|e| EngineError::parse(path, e))?;

        let toplevel = parse_toplevel(&mut rsfx_lang::StringReader::new(&preprocessed), false)
            .map_err(|e| EngineError::parse(path, e))?;
        let header = parse_header(&toplevel.header).map_err(|e| EngineError::parse(path, e))?;

        Ok(SourceUnit {
            path: path.to_path_buf(),
            preprocessed,
            toplevel,
            header,
        })
    }

}

/// Scan the raw (unpreprocessed) header for `config:` defaults.
fn config_defaults(path: &Path) -> Result<Vec<(String, f64)>, EngineError> {
    let file = File::open(path).map_err(|e| EngineError::read_file(path, e))?;
    let mut reader = StreamReader::new(file).map_err(|e| EngineError::read_file(path, e))?;
    let toplevel =
        parse_toplevel(&mut reader, true).map_err(|e| EngineError::parse(path, e))?;
    let header = parse_header(&toplevel.header).map_err(|e| EngineError::parse(path, e))?;
    Ok(header
        .config_items
        .into_iter()
        .map(|item| (item.identifier, item.default_value))
        .collect())
}

/// Scripts with a `@sample` section and no explicit pin lines get the
/// classic stereo default.
fn apply_default_pins(program: &mut Program) {
    let last = program.units.len() - 1;
    let main = &mut program.units[last];
    if !main.header.explicit_pins && main.toplevel.sample.is_some() {
        main.header.in_pins = vec![String::new(), String::new()];
        main.header.out_pins = vec![String::new(), String::new()];
    }
}
