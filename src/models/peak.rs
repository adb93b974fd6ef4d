//! Peak models.

use crate::data::Data1D;
use crate::error::Result;
use crate::model::{check_parameter_count, Guess, Model};
use crate::parameters::{ParamRef, ParameterBinding, ParameterLike};
use ndarray::Array1;
use std::f64::consts::LN_2;
use std::sync::Arc;

/// A one-dimensional Gaussian parameterised by its full width at half maximum:
///
/// f(x) = ampl * exp(-4 ln2 (x - pos)^2 / fwhm^2)
pub struct Gauss1D {
    name: String,
    fwhm: Arc<ParameterBinding>,
    pos: Arc<ParameterBinding>,
    ampl: Arc<ParameterBinding>,
    parameters: Vec<ParamRef>,
}

impl Gauss1D {
    pub fn new(name: &str) -> Self {
        // fwhm must stay strictly positive
        let fwhm = Arc::new(
            ParameterBinding::with_bounds(name, "fwhm", 10.0, f64::EPSILON, f64::INFINITY)
                .unwrap_or_else(|_| ParameterBinding::new(name, "fwhm", 10.0)),
        );
        let pos = Arc::new(ParameterBinding::new(name, "pos", 0.0));
        let ampl = Arc::new(ParameterBinding::new(name, "ampl", 1.0));
        let parameters: Vec<ParamRef> = vec![
            Arc::clone(&fwhm) as ParamRef,
            Arc::clone(&pos) as ParamRef,
            Arc::clone(&ampl) as ParamRef,
        ];

        Self {
            name: name.to_string(),
            fwhm,
            pos,
            ampl,
            parameters,
        }
    }

    pub fn fwhm(&self) -> &Arc<ParameterBinding> {
        &self.fwhm
    }

    pub fn pos(&self) -> &Arc<ParameterBinding> {
        &self.pos
    }

    pub fn ampl(&self) -> &Arc<ParameterBinding> {
        &self.ampl
    }
}

impl Model for Gauss1D {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> &[ParamRef] {
        &self.parameters
    }

    fn calc(&self, pars: &[f64], x: &Array1<f64>) -> Result<Array1<f64>> {
        check_parameter_count(self, pars)?;
        let (fwhm, pos, ampl) = (pars[0], pars[1], pars[2]);
        let scale = 4.0 * LN_2 / (fwhm * fwhm);
        Ok(x.mapv(|xv| {
            let d = xv - pos;
            ampl * (-scale * d * d).exp()
        }))
    }

    fn guess(&self, data: &Data1D) -> Result<Guess> {
        let x = data.x();
        let y = data.y();

        let (imax, &ymax) = y
            .iter()
            .enumerate()
            .fold((0, &f64::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best });

        // width between the outermost points above half maximum
        let half = 0.5 * ymax;
        let above: Vec<f64> = x
            .iter()
            .zip(y.iter())
            .filter(|(_, yv)| **yv >= half)
            .map(|(xv, _)| *xv)
            .collect();
        let lo = above.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = above.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let xrange = x.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
            - x.iter().cloned().fold(f64::INFINITY, f64::min);
        let width = if hi > lo { hi - lo } else { 0.5 * xrange };

        if !self.pos.is_frozen() {
            self.pos.set_value(self.pos.bounds().clamp(x[imax]))?;
        }
        for (param, value) in [(&self.ampl, ymax), (&self.fwhm, width)] {
            if !param.is_frozen() && value.is_finite() && value > 0.0 {
                param.set_value(param.bounds().clamp(value))?;
            }
        }
        Ok(Guess::Applied)
    }
}
