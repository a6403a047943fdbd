use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::MappingError;

#[derive(Deserialize)]
struct ClassMappingFile {
    class_to_id: HashMap<String, usize>,
    id_to_class: HashMap<String, String>,
}

/// Model class index <-> canonical food name.
#[derive(Debug, Clone, Default)]
pub struct ClassMapping {
    id_to_class: BTreeMap<usize, String>,
    class_to_id: HashMap<String, usize>,
}

impl ClassMapping {
    pub fn from_json_str(json: &str) -> Result<Self, MappingError> {
        let file: ClassMappingFile = serde_json::from_str(json)?;
        let id_to_class = file
            .id_to_class
            .into_iter()
            .map(|(id, name)| {
                id.trim()
                    .parse::<usize>()
                    .map(|id| (id, name))
                    .map_err(|_| MappingError::InvalidId(id))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(Self {
            id_to_class,
            class_to_id: file.class_to_id,
        })
    }

    /// Name for a class id, `class_<id>` when the mapping has no entry.
    pub fn name_of(&self, class_id: usize) -> String {
        match self.id_to_class.get(&class_id) {
            Some(name) => name.clone(),
            None => format!("class_{}", class_id),
        }
    }

    pub fn id_of(&self, name: &str) -> Option<usize> {
        self.class_to_id.get(name).copied()
    }

    pub fn classes(&self) -> &BTreeMap<usize, String> {
        &self.id_to_class
    }

    pub fn len(&self) -> usize {
        self.id_to_class.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_class.is_empty()
    }

    /// Pairs where the two directions of the file disagree.
    pub fn inconsistencies(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for (id, name) in &self.id_to_class {
            match self.class_to_id.get(name) {
                Some(back) if back == id => {}
                Some(back) => problems.push(format!(
                    "id_to_class[{}] = {:?} but class_to_id[{:?}] = {}",
                    id, name, name, back
                )),
                None => problems.push(format!(
                    "id_to_class[{}] = {:?} is missing from class_to_id",
                    id, name
                )),
            }
        }
        let mut reverse: Vec<_> = self
            .class_to_id
            .iter()
            .filter(|(_, id)| !self.id_to_class.contains_key(id))
            .collect();
        reverse.sort();
        for (name, id) in reverse {
            problems.push(format!(
                "class_to_id[{:?}] = {} is missing from id_to_class",
                name, id
            ));
        }
        problems
    }
}

pub fn load_class_mapping(file_path: impl AsRef<Path>) -> Result<ClassMapping, MappingError> {
    let path = file_path.as_ref();
    let json = fs::read_to_string(path).map_err(|source| MappingError::Io {
        path: path.display().to_string(),
        source,
    })?;
    ClassMapping::from_json_str(&json)
}
