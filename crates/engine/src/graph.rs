//! Stage dependency-graph validation
//!
//! Validation runs before any task executes: duplicate stage names,
//! dependencies on stages not present in the run, and cycles are all
//! configuration errors, never runtime failures.

use crate::stage::Stage;
use gantry_core::{Error, Result};
use std::collections::{HashMap, HashSet};

/// Validate a stage set: unique names, known dependencies, acyclic
pub fn validate(stages: &[Stage]) -> Result<()> {
    let mut by_name: HashMap<&str, &Stage> = HashMap::with_capacity(stages.len());
    for stage in stages {
        if by_name.insert(stage.name.as_str(), stage).is_some() {
            return Err(Error::Graph(format!(
                "Duplicate stage name '{}'",
                stage.name
            )));
        }
    }

    for stage in stages {
        for dep in &stage.dependencies {
            if !by_name.contains_key(dep.as_str()) {
                return Err(Error::Graph(format!(
                    "Stage '{}' depends on unknown stage '{dep}'",
                    stage.name
                )));
            }
        }
    }

    detect_cycle(stages, &by_name)
}

/// True when `stage` transitively depends on `target`
#[must_use]
pub fn depends_transitively(stage: &Stage, target: &str, stages: &[Stage]) -> bool {
    let by_name: HashMap<&str, &Stage> =
        stages.iter().map(|s| (s.name.as_str(), s)).collect();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut queue: Vec<&str> = stage.dependencies.iter().map(String::as_str).collect();

    while let Some(name) = queue.pop() {
        if name == target {
            return true;
        }
        if !seen.insert(name) {
            continue;
        }
        if let Some(dep) = by_name.get(name) {
            queue.extend(dep.dependencies.iter().map(String::as_str));
        }
    }
    false
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Visiting,
    Done,
}

/// DFS three-color cycle detection over the dependency edges
fn detect_cycle(stages: &[Stage], by_name: &HashMap<&str, &Stage>) -> Result<()> {
    let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(stages.len());

    for stage in stages {
        if !marks.contains_key(stage.name.as_str()) {
            let mut path = Vec::new();
            visit(stage, by_name, &mut marks, &mut path)?;
        }
    }
    Ok(())
}

fn visit<'a>(
    stage: &'a Stage,
    by_name: &HashMap<&str, &'a Stage>,
    marks: &mut HashMap<&'a str, Mark>,
    path: &mut Vec<&'a str>,
) -> Result<()> {
    marks.insert(&stage.name, Mark::Visiting);
    path.push(&stage.name);

    for dep in &stage.dependencies {
        let dep_stage = by_name[dep.as_str()];
        match marks.get(dep.as_str()) {
            Some(Mark::Visiting) => {
                path.push(dep);
                return Err(Error::Graph(format!(
                    "Cyclic stage dependencies: {}",
                    path.join(" -> ")
                )));
            }
            Some(Mark::Done) => {}
            None => visit(dep_stage, by_name, marks, path)?,
        }
    }

    path.pop();
    marks.insert(&stage.name, Mark::Done);
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_valid_chain() {
        let stages = vec![
            Stage::new("a"),
            Stage::new("b").depends_on("a"),
            Stage::new("c").depends_on("b"),
        ];
        assert!(validate(&stages).is_ok());
    }

    #[test]
    fn test_valid_diamond() {
        let stages = vec![
            Stage::new("root"),
            Stage::new("left").depends_on("root"),
            Stage::new("right").depends_on("root"),
            Stage::new("join").depends_on("left").depends_on("right"),
        ];
        assert!(validate(&stages).is_ok());
    }

    #[test]
    fn test_duplicate_name() {
        let stages = vec![Stage::new("a"), Stage::new("a")];
        let err = validate(&stages).unwrap_err();
        assert!(err.to_string().contains("Duplicate stage name 'a'"));
    }

    #[test]
    fn test_unknown_dependency() {
        let stages = vec![Stage::new("a").depends_on("ghost")];
        let err = validate(&stages).unwrap_err();
        assert!(err.to_string().contains("unknown stage 'ghost'"));
        assert!(err.to_string().contains("'a'"));
    }

    #[test]
    fn test_two_stage_cycle() {
        let stages = vec![
            Stage::new("a").depends_on("b"),
            Stage::new("b").depends_on("a"),
        ];
        let err = validate(&stages).unwrap_err();
        assert!(err.to_string().contains("Cyclic"));
    }

    #[test]
    fn test_self_cycle() {
        let stages = vec![Stage::new("a").depends_on("a")];
        assert!(validate(&stages).is_err());
    }

    #[test]
    fn test_long_cycle() {
        let stages = vec![
            Stage::new("a").depends_on("c"),
            Stage::new("b").depends_on("a"),
            Stage::new("c").depends_on("b"),
        ];
        assert!(validate(&stages).is_err());
    }

    #[test]
    fn test_transitive_dependency() {
        let stages = vec![
            Stage::new("a"),
            Stage::new("b").depends_on("a"),
            Stage::new("c").depends_on("b"),
            Stage::new("d"),
        ];
        assert!(depends_transitively(&stages[2], "a", &stages));
        assert!(depends_transitively(&stages[1], "a", &stages));
        assert!(!depends_transitively(&stages[3], "a", &stages));
        assert!(!depends_transitively(&stages[0], "c", &stages));
    }
}
