//! Initial value problems over a single annual step.
//!
//! A component describes its derivatives through [`IVP`]. [`IVPBuilder`]
//! binds the component to the drivers that are constant over the step and
//! hands the problem to the `ode_solvers` RK4 integrator.

use cicf_core::timeseries::FloatValue;
use ode_solvers::{Rk4, System, Vector3};

pub type Time = FloatValue;
pub type ModelState = Vector3<FloatValue>;

pub trait IVP<D> {
    fn calculate_dy_dt(&self, t: Time, drivers: &D, y: &ModelState, dy_dt: &mut ModelState);
}

pub struct IVPBuilder<'a, C, D> {
    component: &'a C,
    drivers: D,
    y0: ModelState,
}

impl<'a, C: IVP<D>, D> System<Time, ModelState> for IVPBuilder<'a, C, D> {
    fn system(&self, t: Time, y: &ModelState, dy: &mut ModelState) {
        self.component.calculate_dy_dt(t, &self.drivers, y, dy);
    }
}

impl<'a, C: IVP<D>, D> IVPBuilder<'a, C, D> {
    pub fn new(component: &'a C, drivers: D, y0: ModelState) -> Self {
        Self {
            component,
            drivers,
            y0,
        }
    }

    /// Integrate from `t_current` to `t_next` and return the final state.
    pub fn solve_rk4(self, t_current: Time, t_next: Time, step_size: Time) -> Result<ModelState, String> {
        let y0 = self.y0;
        let mut solver = Rk4::new(self, t_current, y0, t_next, step_size);
        solver
            .integrate()
            .map_err(|e| format!("integration from {t_current} to {t_next} failed: {e:?}"))?;

        let (_, states) = solver.results().get();
        states
            .last()
            .copied()
            .ok_or_else(|| format!("no steps taken between {t_current} and {t_next}"))
    }
}
