use approx::assert_relative_eq;
use cicf::{Pipeline, PipelineConfig, PipelineError};
use cicf_core::errors::{CICFError, Stage};
use cicf_core::normalize::RawTable;
use std::fs;
use tempfile::TempDir;

const CONFIG: &str = r#"
[grid]
start = 1974
end = 1976

[[sources]]
path = "emissions.csv"
mappings = [
    { source = "co2", species = "Emissions|CO2", unit = "Gt CO2/yr" },
    { source = "ch4", species = "Emissions|CH4", unit = "Mt CH4/yr" },
    { source = "n2o", species = "Emissions|N2O", unit = "Mt N2O/yr" },
]

[[sources]]
path = "economics.csv"
mappings = [
    { source = "gdp", species = "GDP", unit = "trillion USD/yr" },
    { source = "ci", species = "Carbon Intensity|CO2", unit = "kg CO2/USD" },
]

[output]
directory = "out"
"#;

const EMISSIONS: &str = "Year,co2,ch4,n2o
1974,10,300,7
1975,11,310,7.1
1976,12,320,7.2
";

const ECONOMICS: &str = "Year,gdp,ci
1974,100,0.5
1975,110,0.4
1976,121,0.3
";

fn tables(emissions: &str) -> Vec<RawTable> {
    vec![
        RawTable::from_reader("emissions.csv", emissions.as_bytes()).unwrap(),
        RawTable::from_reader("economics.csv", ECONOMICS.as_bytes()).unwrap(),
    ]
}

fn project_dir(with_emissions: bool) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), CONFIG).unwrap();
    fs::write(dir.path().join("economics.csv"), ECONOMICS).unwrap();
    if with_emissions {
        fs::write(dir.path().join("emissions.csv"), EMISSIONS).unwrap();
    }
    dir
}

#[test]
fn fixed_intensity_counterfactual() {
    let pipeline = Pipeline::new(PipelineConfig::from_toml_str(CONFIG).unwrap());
    let output = pipeline.run_tables(&tables(EMISSIONS)).unwrap();

    // Anchor intensity 0.4 kg CO2/USD at 1975
    let counterfactual = &output.counterfactual;
    assert_eq!(counterfactual.unit(), "Mt CO2/yr");
    assert_relative_eq!(counterfactual.at(1974).unwrap(), 40_000.0, max_relative = 1e-12);
    assert_relative_eq!(counterfactual.at(1975).unwrap(), 44_000.0, max_relative = 1e-12);
    assert_relative_eq!(counterfactual.at(1976).unwrap(), 48_400.0, max_relative = 1e-12);

    let gdp = &output.dense["GDP"];
    for ((_, c), (_, g)) in counterfactual.iter().zip(gdp.iter()) {
        assert_relative_eq!(c / g / 1000.0, 0.4, max_relative = 1e-12);
    }

    let scenarios = &output.scenarios;
    assert_eq!(scenarios.baseline.name(), "historical");
    assert_eq!(scenarios.counterfactual.name(), "fixed-intensity");
    assert_eq!(scenarios.replaced, "Emissions|CO2");
    for species in ["Emissions|CH4", "Emissions|N2O"] {
        assert_eq!(
            scenarios.baseline.get(species),
            scenarios.counterfactual.get(species)
        );
    }
    assert_ne!(
        scenarios.baseline.get("Emissions|CO2"),
        scenarios.counterfactual.get("Emissions|CO2")
    );
}

#[test]
fn counterfactual_ignores_actual_emissions() {
    let pipeline = Pipeline::new(PipelineConfig::from_toml_str(CONFIG).unwrap());
    let low = pipeline.run_tables(&tables(EMISSIONS)).unwrap();
    let high = pipeline
        .run_tables(&tables(
            "Year,co2,ch4,n2o\n1974,30,300,7\n1975,35,310,7.1\n1976,40,320,7.2\n",
        ))
        .unwrap();
    assert_eq!(low.counterfactual.values(), high.counterfactual.values());
}

#[test]
fn comparison_reports_input_and_outputs() {
    let pipeline = Pipeline::new(PipelineConfig::from_toml_str(CONFIG).unwrap());
    let comparison = pipeline.run_tables(&tables(EMISSIONS)).unwrap().comparison;

    let names: Vec<&str> = comparison.iter().map(|q| q.quantity.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Emissions|CO2",
            "Surface Temperature",
            "Atmospheric Concentration|CO2"
        ]
    );

    let emissions = comparison.get("Emissions|CO2").unwrap();
    assert_relative_eq!(emissions.delta[0], 30_000.0, max_relative = 1e-12);
    assert_relative_eq!(emissions.peak_delta, 36_400.0, max_relative = 1e-12);
    assert_eq!(emissions.peak_delta_year, 1976);
    assert_relative_eq!(emissions.cumulative_delta, 99_400.0, max_relative = 1e-12);

    // Higher emissions in every year give a warmer, higher-CO2 world
    let temperature = comparison.get("Surface Temperature").unwrap();
    assert!(temperature.delta.iter().all(|d| *d > 0.0));
    assert!(comparison.get("Atmospheric Concentration|CO2").unwrap().final_delta > 0.0);
}

#[test]
fn grid_wider_than_samples_is_held() {
    let config = CONFIG.replace("start = 1974\nend = 1976", "start = 1970\nend = 1980");
    let pipeline = Pipeline::new(PipelineConfig::from_toml_str(&config).unwrap());
    let output = pipeline.run_tables(&tables(EMISSIONS)).unwrap();

    assert_eq!(output.grid.len(), 11);
    let gdp = &output.dense["GDP"];
    assert_eq!(gdp.at(1970), Some(100.0));
    assert_eq!(gdp.at(1980), Some(121.0));
    assert_relative_eq!(output.counterfactual.at(1980).unwrap(), 48_400.0, max_relative = 1e-12);
    assert_eq!(output.comparison.get("Surface Temperature").unwrap().years.len(), 11);
}

#[test]
fn forbidden_extrapolation_halts_before_counterfactual() {
    let config = CONFIG.replace(
        "start = 1974\nend = 1976",
        "start = 1970\nend = 1976\nboundary = \"forbid\"",
    );
    let pipeline = Pipeline::new(PipelineConfig::from_toml_str(&config).unwrap());
    let err = pipeline.run_tables(&tables(EMISSIONS)).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Interpolate));
    assert!(matches!(
        err,
        PipelineError::Stage(CICFError::ExtrapolationNotAllowed { year: 1970, .. })
    ));
}

#[test]
fn anchor_off_grid() {
    let config = format!("{CONFIG}\n[counterfactual]\nanchor_year = 1960\n");
    let pipeline = Pipeline::new(PipelineConfig::from_toml_str(&config).unwrap());
    let err = pipeline.run_tables(&tables(EMISSIONS)).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Counterfactual));
    assert!(matches!(
        err,
        PipelineError::Stage(CICFError::InvalidAnchor {
            year: 1960,
            value: None
        })
    ));
}

#[test]
fn zero_anchor_intensity() {
    let economics = "Year,gdp,ci\n1974,100,0.5\n1975,110,0\n1976,121,0.3\n";
    let pipeline = Pipeline::new(PipelineConfig::from_toml_str(CONFIG).unwrap());
    let err = pipeline
        .run_tables(&[
            RawTable::from_reader("emissions.csv", EMISSIONS.as_bytes()).unwrap(),
            RawTable::from_reader("economics.csv", economics.as_bytes()).unwrap(),
        ])
        .unwrap_err();
    assert!(err.to_string().contains("1975"), "{err}");
    assert_eq!(err.stage(), Some(Stage::Counterfactual));
}

#[test]
fn run_from_files_and_export() {
    let dir = project_dir(true);
    let output = Pipeline::from_path(dir.path().join("config.toml"))
        .unwrap()
        .run()
        .unwrap();

    let out = dir.path().join("out");
    assert_eq!(
        output.exported,
        vec![
            out.join("emissions_co2.csv"),
            out.join("surface_temperature.csv"),
            out.join("atmospheric_concentration_co2.csv"),
            out.join("summary.csv"),
        ]
    );
    let emissions = fs::read_to_string(out.join("emissions_co2.csv")).unwrap();
    let lines: Vec<&str> = emissions.lines().collect();
    assert_eq!(lines[0], "year,baseline,counterfactual,delta");
    let last: Vec<f64> = lines[3].split(',').map(|c| c.parse().unwrap()).collect();
    assert_eq!(last[0], 1976.0);
    assert_relative_eq!(last[2], 48_400.0, max_relative = 1e-12);
    assert_relative_eq!(last[3], 36_400.0, max_relative = 1e-12);

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert_eq!(summary.lines().count(), 4);
}

#[test]
fn missing_source_file() {
    let dir = project_dir(false);
    let err = Pipeline::from_path(dir.path().join("config.toml"))
        .unwrap()
        .run()
        .unwrap_err();
    match err {
        PipelineError::Io { path, .. } => assert_eq!(path, dir.path().join("emissions.csv")),
        other => panic!("unexpected error {other:?}"),
    }
}
