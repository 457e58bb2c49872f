//! Problem registry for lookup and discovery.

use crate::config::ProblemOptions;
use crate::problem::{DynProblem, Problem};
use crate::vector_addition::VectorAddition;
use std::sync::Arc;

#[derive(Default, Clone)]
pub struct ProblemRegistry {
    problems: Vec<DynProblem>,
}

impl ProblemRegistry {
    pub fn new() -> Self {
        Self {
            problems: Vec::new(),
        }
    }

    pub fn with_default_problems(options: ProblemOptions) -> Self {
        let mut registry = Self::new();
        registry.register(VectorAddition::with_options(options));
        registry
    }

    pub fn register<P>(&mut self, problem: P)
    where
        P: Problem + 'static,
    {
        self.problems.push(Arc::new(problem));
    }

    pub fn problems(&self) -> &[DynProblem] {
        &self.problems
    }

    pub fn names(&self) -> Vec<&str> {
        self.problems.iter().map(|problem| problem.name()).collect()
    }

    pub fn find(&self, name: &str) -> Option<DynProblem> {
        self.problems
            .iter()
            .find(|problem| problem.name() == name)
            .map(Arc::clone)
    }
}
