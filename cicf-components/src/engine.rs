use crate::components::{CarbonCycle, CarbonCycleDrivers, Forcing, ForcingDrivers, GasCycle, TwoLayer};
use crate::parameters::{
    CarbonCycleParameters, ForcingParameters, MethaneParameters, NitrousOxideParameters,
    SolverOptions, TwoLayerParameters,
};
use cicf_core::engine::{ClimateEngine, EngineFault, EngineInputs, EngineOutputs};
use cicf_core::standard_variables::{
    VariableDefinition, VAR_BC_EMISSIONS, VAR_CH4_CONCENTRATION, VAR_CH4_EMISSIONS,
    VAR_CO2_CONCENTRATION, VAR_CO2_EMISSIONS, VAR_N2O_CONCENTRATION, VAR_N2O_EMISSIONS,
    VAR_OC_EMISSIONS, VAR_SULFUR_EMISSIONS, VAR_SURFACE_TEMPERATURE, VAR_TOTAL_ERF,
};
use cicf_core::timeseries::FloatValue;
use cicf_core::units;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Emissions-driven reduced-complexity climate model.
///
/// Each year, in order:
///
/// 1. CO2 concentration from the one-box carbon cycle, using the previous
///    year's temperature for the uptake feedback
/// 2. CH4 and N2O concentrations from their one-box cycles
/// 3. Total effective radiative forcing
/// 4. Surface temperature from the two-layer energy balance
///
/// Values reported for a year are the state at the end of that year.
///
/// CO2, CH4 and N2O emissions are required. Sulfur, BC and OC emissions are
/// optional and contribute no aerosol forcing when absent. Inputs may be in
/// any unit convertible to the one each component works in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReducedComplexityEngine {
    pub carbon_cycle: CarbonCycleParameters,
    pub methane: MethaneParameters,
    pub nitrous_oxide: NitrousOxideParameters,
    pub forcing: ForcingParameters,
    pub climate: TwoLayerParameters,
    pub solver: SolverOptions,
}

/// Input species with the unit the components expect.
const CO2_INPUT: (&VariableDefinition, &str) = (&VAR_CO2_EMISSIONS, "GtC/yr");
const CH4_INPUT: (&VariableDefinition, &str) = (&VAR_CH4_EMISSIONS, "Mt CH4/yr");
const N2O_INPUT: (&VariableDefinition, &str) = (&VAR_N2O_EMISSIONS, "Mt N2O/yr");
const SULFUR_INPUT: (&VariableDefinition, &str) = (&VAR_SULFUR_EMISSIONS, "Mt SO2/yr");
const BC_INPUT: (&VariableDefinition, &str) = (&VAR_BC_EMISSIONS, "Mt BC/yr");
const OC_INPUT: (&VariableDefinition, &str) = (&VAR_OC_EMISSIONS, "Mt OC/yr");

impl ReducedComplexityEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn input(
        &self,
        inputs: &EngineInputs,
        (variable, unit): (&VariableDefinition, &str),
    ) -> Result<Option<Array1<FloatValue>>, EngineFault> {
        let Some(values) = inputs.get(variable.name) else {
            return Ok(None);
        };
        if values.len() != inputs.len() {
            return Err(EngineFault::for_variable(
                variable.name,
                format!("{} values for {} years", values.len(), inputs.len()),
            ));
        }
        let from = inputs.unit(variable.name).unwrap_or(variable.unit);
        let factor = units::conversion_factor(from, unit).map_err(|e| {
            EngineFault::for_variable(variable.name, format!("cannot convert {from} to {unit}: {e}"))
        })?;
        Ok(Some(values.mapv(|v| v * factor)))
    }

    fn required(
        &self,
        inputs: &EngineInputs,
        definition: (&VariableDefinition, &str),
    ) -> Result<Array1<FloatValue>, EngineFault> {
        self.input(inputs, definition)?.ok_or_else(|| {
            EngineFault::for_variable(definition.0.name, "required input is missing")
        })
    }
}

fn optional_at(values: &Option<Array1<FloatValue>>, index: usize) -> Option<FloatValue> {
    values.as_ref().map(|v| v[index])
}

#[typetag::serde]
impl ClimateEngine for ReducedComplexityEngine {
    fn outputs(&self) -> Vec<(String, String)> {
        [
            VAR_SURFACE_TEMPERATURE,
            VAR_CO2_CONCENTRATION,
            VAR_CH4_CONCENTRATION,
            VAR_N2O_CONCENTRATION,
            VAR_TOTAL_ERF,
        ]
        .iter()
        .map(|v| (v.name.to_string(), v.unit.to_string()))
        .collect()
    }

    fn required_inputs(&self) -> Vec<String> {
        [CO2_INPUT, CH4_INPUT, N2O_INPUT]
            .iter()
            .map(|(v, _)| v.name.to_string())
            .collect()
    }

    fn run(&self, inputs: &EngineInputs) -> Result<EngineOutputs, EngineFault> {
        let co2_emissions = self.required(inputs, CO2_INPUT)?;
        let ch4_emissions = self.required(inputs, CH4_INPUT)?;
        let n2o_emissions = self.required(inputs, N2O_INPUT)?;
        let sulfur = self.input(inputs, SULFUR_INPUT)?;
        let bc = self.input(inputs, BC_INPUT)?;
        let oc = self.input(inputs, OC_INPUT)?;

        let carbon_cycle =
            CarbonCycle::from_parameters(self.carbon_cycle.clone(), self.solver.clone());
        let methane = GasCycle::methane(&self.methane);
        let nitrous_oxide = GasCycle::nitrous_oxide(&self.nitrous_oxide);
        let forcing = Forcing::from_parameters(self.forcing.clone());
        let climate = TwoLayer::from_parameters(self.climate.clone(), self.solver.clone());

        let n = inputs.len();
        let mut temperature = Array1::zeros(n);
        let mut co2 = Array1::zeros(n);
        let mut ch4 = Array1::zeros(n);
        let mut n2o = Array1::zeros(n);
        let mut erf = Array1::zeros(n);

        let mut carbon_state = carbon_cycle.initial_state();
        let mut climate_state = climate.initial_state();
        let mut ch4_conc = methane.initial_concentration();
        let mut n2o_conc = nitrous_oxide.initial_concentration();

        for (i, year) in inputs.years.iter().enumerate() {
            let t = *year as FloatValue;

            carbon_state = carbon_cycle
                .step(
                    t,
                    &carbon_state,
                    CarbonCycleDrivers {
                        emissions: co2_emissions[i],
                        temperature: climate_state[0],
                    },
                )
                .map_err(|e| EngineFault::for_variable(VAR_CO2_CONCENTRATION.name, e))?;
            ch4_conc = methane.step(ch4_conc, ch4_emissions[i]);
            n2o_conc = nitrous_oxide.step(n2o_conc, n2o_emissions[i]);

            let total_erf = forcing.total(&ForcingDrivers {
                co2: carbon_state[0],
                ch4: ch4_conc,
                n2o: n2o_conc,
                sulfur: optional_at(&sulfur, i),
                bc: optional_at(&bc, i),
                oc: optional_at(&oc, i),
            });

            climate_state = climate
                .step(t, &climate_state, total_erf)
                .map_err(|e| EngineFault::for_variable(VAR_SURFACE_TEMPERATURE.name, e))?;

            temperature[i] = climate_state[0];
            co2[i] = carbon_state[0];
            ch4[i] = ch4_conc;
            n2o[i] = n2o_conc;
            erf[i] = total_erf;
        }

        debug!(
            years = n,
            final_temperature = last(temperature.view()),
            final_co2 = last(co2.view()),
            "Reduced-complexity engine finished"
        );

        let mut outputs = EngineOutputs::default();
        outputs.insert(VAR_SURFACE_TEMPERATURE.name, VAR_SURFACE_TEMPERATURE.unit, temperature);
        outputs.insert(VAR_CO2_CONCENTRATION.name, VAR_CO2_CONCENTRATION.unit, co2);
        outputs.insert(VAR_CH4_CONCENTRATION.name, VAR_CH4_CONCENTRATION.unit, ch4);
        outputs.insert(VAR_N2O_CONCENTRATION.name, VAR_N2O_CONCENTRATION.unit, n2o);
        outputs.insert(VAR_TOTAL_ERF.name, VAR_TOTAL_ERF.unit, erf);
        Ok(outputs)
    }
}

fn last(values: ArrayView1<'_, FloatValue>) -> FloatValue {
    values.iter().last().copied().unwrap_or(FloatValue::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn inputs(co2: FloatValue, n: usize) -> EngineInputs {
        let mut species = BTreeMap::new();
        let mut units = BTreeMap::new();
        for (name, unit, value) in [
            ("Emissions|CO2", "Mt CO2/yr", co2),
            ("Emissions|CH4", "Mt CH4/yr", 0.0),
            ("Emissions|N2O", "kt N2O/yr", 0.0),
        ] {
            species.insert(name.to_string(), Array1::from_elem(n, value));
            units.insert(name.to_string(), unit.to_string());
        }
        EngineInputs {
            years: (2000..2000 + n as i32).collect(),
            species,
            units,
        }
    }

    #[test]
    fn preindustrial_emissions_give_no_warming() {
        let outputs = ReducedComplexityEngine::default().run(&inputs(0.0, 10)).unwrap();
        let temperature = &outputs.get("Surface Temperature").unwrap().values;
        assert!(temperature.iter().all(|t| t.abs() < 1e-12));
        let co2 = &outputs.get("Atmospheric Concentration|CO2").unwrap().values;
        assert!(co2.iter().all(|c| (c - 278.0).abs() < 1e-9));
    }

    #[test]
    fn co2_emissions_warm_the_surface() {
        let outputs = ReducedComplexityEngine::default()
            .run(&inputs(36_000.0, 50))
            .unwrap();
        let temperature = &outputs.get("Surface Temperature").unwrap().values;
        assert_eq!(temperature.len(), 50);
        assert!(temperature[49] > temperature[10]);
        assert!(temperature[49] > 0.0);

        let erf = &outputs.get("Effective Radiative Forcing").unwrap().values;
        assert!(erf[49] > 0.0);
        assert_eq!(outputs.get("Effective Radiative Forcing").unwrap().unit, "W/m^2");
    }

    #[test]
    fn missing_required_species() {
        let mut inputs = inputs(0.0, 3);
        inputs.species.remove("Emissions|N2O");
        let fault = ReducedComplexityEngine::default().run(&inputs).unwrap_err();
        assert_eq!(fault.variable.as_deref(), Some("Emissions|N2O"));
    }

    #[test]
    fn unconvertible_input_unit() {
        let mut inputs = inputs(0.0, 3);
        inputs
            .units
            .insert("Emissions|CO2".to_string(), "ppm".to_string());
        let fault = ReducedComplexityEngine::default().run(&inputs).unwrap_err();
        assert_eq!(fault.variable.as_deref(), Some("Emissions|CO2"));
        assert!(fault.message.contains("cannot convert"), "{fault}");
    }

    #[test]
    fn declares_required_inputs() {
        assert_eq!(
            ReducedComplexityEngine::default().required_inputs(),
            vec!["Emissions|CO2", "Emissions|CH4", "Emissions|N2O"]
        );
    }

    #[test]
    fn declares_its_outputs() {
        let engine = ReducedComplexityEngine::default();
        let outputs = engine.run(&inputs(1000.0, 2)).unwrap();
        for (name, unit) in engine.outputs() {
            assert_eq!(outputs.get(&name).unwrap().unit, unit);
        }
    }
}
