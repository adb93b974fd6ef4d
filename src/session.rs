//! An explicit fitting session.
//!
//! [`Session`] owns the dataset registry, the active statistic and optimizer,
//! one [`EstimatorConfig`] per error-estimation method, and the last result of
//! each method. It is the context object passed around instead of any global
//! state.

use crate::data::Data1D;
use crate::error::{EstError, Result};
use crate::joint::JointFitContext;
use crate::model::{Guess, ModelRef};
use crate::optimize::{NelderMead, Reoptimizer};
use crate::registry::{join_ids, DatasetId, Registry};
use crate::resolve::{resolve, ErrorArg};
use crate::stats::{StatKind, Statistic};
use crate::uncertainty::{ErrorEstimationResult, ErrorEstimator, ErrorMethod, EstimatorConfig};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Summary of the last fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitResults {
    pub datasets: Vec<DatasetId>,
    pub methodname: String,
    pub statname: String,
    pub succeeded: bool,
    pub parnames: Vec<String>,
    pub parvals: Vec<f64>,
    pub statval: f64,
    pub numpoints: usize,
    /// Degrees of freedom, `numpoints - len(parnames)`
    pub dof: i64,
    /// Reduced statistic; `None` when `dof <= 0`
    pub rstat: Option<f64>,
    pub nfev: usize,
    pub message: String,
}

impl fmt::Display for FitResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Datasets              = {}", join_ids(&self.datasets))?;
        writeln!(f, "Method                = {}", self.methodname)?;
        writeln!(f, "Statistic             = {}", self.statname)?;
        writeln!(f, "Final fit statistic   = {}", self.statval)?;
        writeln!(f, "Data points           = {}", self.numpoints)?;
        writeln!(f, "Degrees of freedom    = {}", self.dof)?;
        if let Some(rstat) = self.rstat {
            writeln!(f, "Reduced statistic     = {}", rstat)?;
        }
        writeln!(f, "Function evaluations  = {}", self.nfev)?;
        writeln!(f, "Change in statistic   = {}", self.message)?;
        for (name, value) in self.parnames.iter().zip(self.parvals.iter()) {
            writeln!(f, "   {:<12} {:>14.6}", name, value)?;
        }
        Ok(())
    }
}

/// Fitting and error-estimation session.
pub struct Session {
    registry: Registry,
    stat: Arc<dyn Statistic>,
    method: Arc<dyn Reoptimizer>,
    options: HashMap<ErrorMethod, EstimatorConfig>,
    results: HashMap<ErrorMethod, ErrorEstimationResult>,
    fit_results: Option<FitResults>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A session with the default statistic (`chi2gehrels`) and optimizer
    /// (`neldermead`).
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            stat: Arc::new(StatKind::default()),
            method: Arc::new(NelderMead::new()),
            options: ErrorMethod::ALL
                .iter()
                .map(|&m| (m, EstimatorConfig::default()))
                .collect(),
            results: HashMap::new(),
            fit_results: None,
        }
    }

    /// Load a dataset from arrays; the dataset is named after its id.
    pub fn load_arrays(
        &mut self,
        id: impl Into<DatasetId>,
        x: impl Into<Array1<f64>>,
        y: impl Into<Array1<f64>>,
    ) -> Result<()> {
        let id = id.into();
        let data = Data1D::new(&id.to_string(), x.into(), y.into())?;
        self.registry.load(id, data);
        Ok(())
    }

    pub fn load_data(&mut self, id: impl Into<DatasetId>, data: Data1D) {
        self.registry.load(id, data);
    }

    pub fn set_source(&mut self, id: impl Into<DatasetId>, model: ModelRef) -> Result<()> {
        self.registry.set_source(id, model)
    }

    /// Same as [`Session::set_source`].
    pub fn set_model(&mut self, id: impl Into<DatasetId>, model: ModelRef) -> Result<()> {
        self.set_source(id, model)
    }

    pub fn set_stat<S: Statistic + 'static>(&mut self, stat: S) {
        self.stat = Arc::new(stat);
    }

    pub fn set_method<R: Reoptimizer + 'static>(&mut self, method: R) {
        self.method = Arc::new(method);
    }

    pub fn stat_name(&self) -> &str {
        self.stat.name()
    }

    pub fn method_name(&self) -> &str {
        self.method.name()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn get_data(&self, id: impl Into<DatasetId>) -> Result<&Data1D> {
        self.registry.data(&id.into())
    }

    pub fn get_source(&self, id: impl Into<DatasetId>) -> Result<&ModelRef> {
        let (_, model) = self.registry.lookup(&id.into())?;
        Ok(model)
    }

    /// Options of one error-estimation method.
    pub fn options(&self, method: ErrorMethod) -> &EstimatorConfig {
        &self.options[&method]
    }

    pub fn options_mut(&mut self, method: ErrorMethod) -> &mut EstimatorConfig {
        self.options.entry(method).or_default()
    }

    /// Joint statistic over the selected datasets at the current parameter values.
    pub fn calc_stat(&self, args: &[ErrorArg]) -> Result<f64> {
        let resolved = resolve(&self.registry, args)?;
        let ctx = JointFitContext::build(&self.registry, &resolved.ids, Arc::clone(&self.stat))?;
        ctx.statistic(&ctx.values())
    }

    /// Minimize the joint statistic over the free parameters of the selected
    /// datasets and leave the parameters at the best fit.
    pub fn fit(&mut self, args: &[ErrorArg]) -> Result<&FitResults> {
        let resolved = resolve(&self.registry, args)?;
        let ctx = JointFitContext::build(&self.registry, &resolved.ids, Arc::clone(&self.stat))?;
        if ctx.free_params().is_empty() {
            return Err(EstError::Parameter("no thawed parameters found".to_string()));
        }

        let start = ctx.values();
        let initial = ctx.statistic(&start)?;
        let objective = |x: &Array1<f64>| ctx.statistic(x);
        let result = self.method.reoptimize(&objective, &start, &ctx.bounds())?;
        ctx.apply(&result.params)?;

        if !result.success {
            log::warn!("fit did not converge: {}", result.message);
        }

        let numpoints = ctx.numpoints();
        let nfree = ctx.free_params().len();
        let dof = numpoints as i64 - nfree as i64;
        let fit = FitResults {
            datasets: resolved.ids,
            methodname: self.method.name().to_string(),
            statname: ctx.stat_name().to_string(),
            succeeded: result.success,
            parnames: ctx.free_params().iter().map(|p| p.fullname()).collect(),
            parvals: result.params.to_vec(),
            statval: result.cost,
            numpoints,
            dof,
            rstat: if dof > 0 { Some(result.cost / dof as f64) } else { None },
            nfev: result.nfev,
            message: format!("{} -> {}", initial, result.cost),
        };
        log::info!(
            "fit of data set(s) {}: {} = {} after {} evaluations",
            join_ids(&fit.datasets),
            fit.statname,
            fit.statval,
            fit.nfev
        );

        Ok(&*self.fit_results.insert(fit))
    }

    pub fn get_fit_results(&self) -> Result<&FitResults> {
        self.fit_results
            .as_ref()
            .ok_or_else(|| EstError::Session("fit has not been performed".to_string()))
    }

    /// Set starting values of the source model of `id` from its data.
    pub fn guess(&self, id: impl Into<DatasetId>) -> Result<Guess> {
        let id = id.into();
        let (data, model) = self.registry.lookup(&id)?;
        guess_with(model, data)
    }

    /// Set starting values of `model` from the data of `id`.
    pub fn guess_model(&self, id: impl Into<DatasetId>, model: &ModelRef) -> Result<Guess> {
        let data = self.registry.data(&id.into())?;
        guess_with(model, data)
    }

    /// Run one error-estimation method and keep its result for
    /// [`Session::get_results`].
    pub fn estimate_errors(&mut self, method: ErrorMethod, args: &[ErrorArg]) -> Result<&ErrorEstimationResult> {
        let config = self.options(method).clone();
        let estimator = ErrorEstimator::new(
            &self.registry,
            Arc::clone(&self.stat),
            self.method.as_ref(),
            &config,
        );
        let result = estimator.estimate(method, args)?;
        log::info!("{}", result);

        self.results.insert(method, result);
        self.get_results(method)
    }

    pub fn covar(&mut self, args: &[ErrorArg]) -> Result<&ErrorEstimationResult> {
        self.estimate_errors(ErrorMethod::Covariance, args)
    }

    pub fn conf(&mut self, args: &[ErrorArg]) -> Result<&ErrorEstimationResult> {
        self.estimate_errors(ErrorMethod::Confidence, args)
    }

    pub fn proj(&mut self, args: &[ErrorArg]) -> Result<&ErrorEstimationResult> {
        self.estimate_errors(ErrorMethod::Projection, args)
    }

    /// Last result of `method`.
    pub fn get_results(&self, method: ErrorMethod) -> Result<&ErrorEstimationResult> {
        self.results
            .get(&method)
            .ok_or_else(|| EstError::Session(format!("{} has not been performed", method)))
    }

    pub fn get_covar_results(&self) -> Result<&ErrorEstimationResult> {
        self.get_results(ErrorMethod::Covariance)
    }

    pub fn get_conf_results(&self) -> Result<&ErrorEstimationResult> {
        self.get_results(ErrorMethod::Confidence)
    }

    pub fn get_proj_results(&self) -> Result<&ErrorEstimationResult> {
        self.get_results(ErrorMethod::Projection)
    }
}

fn guess_with(model: &ModelRef, data: &Data1D) -> Result<Guess> {
    let outcome = model.guess(data)?;
    if outcome == Guess::Unavailable {
        log::info!("WARNING: No guess found for {}", model.name());
    }
    Ok(outcome)
}
