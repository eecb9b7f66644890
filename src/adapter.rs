//! [`NlpProblem`] adapter over a [`Formulation`].

use crate::bounds::Bounds;
use crate::config::DistanceApproachConfig;
use crate::engine::DerivativeEngine;
use crate::error::{ConfigError, EvalError, NlpError, UsageError};
use crate::formulation::Formulation;
use crate::nlp::{IndexStyle, NlpInfo, NlpProblem};
use crate::problem::ProblemData;
use crate::solution::{SolutionRecord, SolverStatus};

/// Where the problem is in its solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Constructed; structure not yet queried.
    Uninitialized,
    /// Tape built and sizes reported.
    StructureDeclared,
    /// At least one evaluation callback has run.
    Evaluating,
    /// Solution recorded. Terminal.
    Finalized,
}

/// Distance-approach problem instance driven by an external solver.
#[derive(Debug)]
pub struct DistanceApproachProblem {
    formulation: Formulation,
    engine: Option<DerivativeEngine>,
    lifecycle: Lifecycle,
    solution: Option<SolutionRecord>,
}

impl DistanceApproachProblem {
    /// Validate the inputs and compute the layouts. The tape is built on
    /// the first [`describe_structure`](NlpProblem::describe_structure).
    pub fn new(data: ProblemData, config: DistanceApproachConfig) -> Result<Self, ConfigError> {
        let formulation = Formulation::new(data, config)?;
        tracing::debug!(
            n = formulation.num_variables(),
            m = formulation.num_constraints(),
            horizon = formulation.layout().horizon(),
            obstacles = formulation.obstacles().len(),
            "distance approach problem constructed"
        );
        Ok(Self {
            formulation,
            engine: None,
            lifecycle: Lifecycle::Uninitialized,
            solution: None,
        })
    }

    pub fn formulation(&self) -> &Formulation {
        &self.formulation
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// The derivative engine, once the structure has been declared.
    pub fn engine(&self) -> Option<&DerivativeEngine> {
        self.engine.as_ref()
    }

    /// The recorded solution. Only available after finalization.
    pub fn solution(&self) -> Result<&SolutionRecord, UsageError> {
        self.solution.as_ref().ok_or(UsageError::NotFinalized)
    }

    fn ensure_open(&self) -> Result<(), UsageError> {
        match self.lifecycle {
            Lifecycle::Finalized => Err(UsageError::AlreadyFinalized),
            Lifecycle::Uninitialized => Err(UsageError::StructureNotDeclared),
            _ => Ok(()),
        }
    }

    fn engine_ref(&self) -> Result<&DerivativeEngine, UsageError> {
        self.ensure_open()?;
        self.engine.as_ref().ok_or(UsageError::StructureNotDeclared)
    }

    /// Engine for an evaluation callback; moves the lifecycle to `Evaluating`.
    fn evaluating(&mut self) -> Result<&mut DerivativeEngine, UsageError> {
        self.ensure_open()?;
        self.lifecycle = Lifecycle::Evaluating;
        self.engine.as_mut().ok_or(UsageError::StructureNotDeclared)
    }
}

impl NlpProblem for DistanceApproachProblem {
    fn describe_structure(&mut self) -> Result<NlpInfo, NlpError> {
        if self.lifecycle == Lifecycle::Finalized {
            return Err(UsageError::AlreadyFinalized.into());
        }
        let engine = match self.engine.take() {
            Some(engine) => engine,
            None => {
                let x0 = self.formulation.starting_point();
                DerivativeEngine::generate(&self.formulation, &x0)?
            }
        };
        let info = NlpInfo {
            n: self.formulation.num_variables(),
            m: self.formulation.num_constraints(),
            nnz_jac: engine.jacobian_structure().len(),
            nnz_hess: engine.hessian_structure().len(),
            index_style: IndexStyle::Zero,
        };
        self.engine = Some(engine);
        if self.lifecycle == Lifecycle::Uninitialized {
            self.lifecycle = Lifecycle::StructureDeclared;
        }
        Ok(info)
    }

    fn bounds(&self) -> Result<(Bounds, Bounds), NlpError> {
        self.ensure_open()?;
        Ok((
            self.formulation.variable_bounds(),
            self.formulation.constraint_bounds(),
        ))
    }

    fn starting_point(&self) -> Result<Vec<f64>, NlpError> {
        self.ensure_open()?;
        Ok(self.formulation.starting_point())
    }

    fn objective(&mut self, x: &[f64], new_x: bool) -> Result<f64, NlpError> {
        Ok(self.evaluating()?.objective(x, new_x)?)
    }

    fn gradient(&mut self, x: &[f64], new_x: bool, grad: &mut [f64]) -> Result<(), NlpError> {
        Ok(self.evaluating()?.gradient(x, new_x, grad)?)
    }

    fn constraints(&mut self, x: &[f64], new_x: bool, g: &mut [f64]) -> Result<(), NlpError> {
        Ok(self.evaluating()?.constraints(x, new_x, g)?)
    }

    fn jacobian_structure(&self) -> Result<&[(usize, usize)], NlpError> {
        Ok(self.engine_ref()?.jacobian_structure())
    }

    fn jacobian_values(
        &mut self,
        x: &[f64],
        new_x: bool,
        values: &mut [f64],
    ) -> Result<(), NlpError> {
        Ok(self.evaluating()?.jacobian_values(x, new_x, values)?)
    }

    fn hessian_structure(&self) -> Result<&[(usize, usize)], NlpError> {
        Ok(self.engine_ref()?.hessian_structure())
    }

    fn hessian_values(
        &mut self,
        x: &[f64],
        new_x: bool,
        obj_factor: f64,
        lambda: &[f64],
        values: &mut [f64],
    ) -> Result<(), NlpError> {
        Ok(self
            .evaluating()?
            .hessian_values(x, new_x, obj_factor, lambda, values)?)
    }

    fn finalize(
        &mut self,
        status: SolverStatus,
        x: &[f64],
        multipliers: &[f64],
        objective: f64,
    ) -> Result<(), NlpError> {
        if self.lifecycle == Lifecycle::Finalized {
            return Err(UsageError::AlreadyFinalized.into());
        }
        let n = self.formulation.num_variables();
        if x.len() != n {
            return Err(EvalError::BufferLength {
                what: "x",
                expected: n,
                got: x.len(),
            }
            .into());
        }
        let m = self.formulation.num_constraints();
        if multipliers.len() != m {
            return Err(EvalError::BufferLength {
                what: "multiplier",
                expected: m,
                got: multipliers.len(),
            }
            .into());
        }

        let record = SolutionRecord::extract(&self.formulation, status, x, multipliers, objective);
        tracing::info!(%status, objective, "distance approach finalized");
        self.solution = Some(record);
        self.lifecycle = Lifecycle::Finalized;
        Ok(())
    }
}
