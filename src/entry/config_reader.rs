use crate::entry::*;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_DATA_PATH: &str = "data.csv";
pub const DEFAULT_FIRST_YEAR: u16 = 2020;
pub const DEFAULT_LAST_YEAR: u16 = 2025;

/// The content of the JSON configuration file. All the fields are optional.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryConfig {
    #[serde(rename = "dataPath")]
    pub data_path: Option<String>,
    pub metrics: Option<Vec<String>>,
    pub regions: Option<Vec<String>>,
    #[serde(rename = "firstYear")]
    pub first_year: Option<u16>,
    #[serde(rename = "lastYear")]
    pub last_year: Option<u16>,
}

/// The resolved settings of a run.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Settings {
    pub data_path: PathBuf,
    pub layout: Layout,
    /// The years that can be selected, in increasing order.
    pub years: Vec<u16>,
}

impl Settings {
    /// Builds a period, checking that the year is one of the selectable years.
    pub fn period(&self, year: u16, month: Month) -> EntryResult<Period> {
        if !self.years.contains(&year) {
            whatever!(
                "Year {} is not available (choose between {} and {})",
                year,
                self.years.first().copied().unwrap_or_default(),
                self.years.last().copied().unwrap_or_default()
            )
        }
        Ok(Period::new(year, month))
    }
}

impl EntryConfig {
    /// Resolves the settings.
    ///
    /// `root` is the directory of the configuration file, against which a
    /// relative data path is read. `data_override` replaces the data path.
    pub fn settings(
        &self,
        root: Option<&Path>,
        data_override: Option<String>,
    ) -> EntryResult<Settings> {
        let data_path: PathBuf = match (data_override, &self.data_path) {
            (Some(p), _) => PathBuf::from(p),
            (None, Some(p)) => match root {
                Some(r) if Path::new(p).is_relative() => r.join(p),
                _ => PathBuf::from(p),
            },
            (None, None) => PathBuf::from(DEFAULT_DATA_PATH),
        };

        let default_layout = Layout::default();
        let metrics = self
            .metrics
            .clone()
            .unwrap_or_else(|| default_layout.metrics().to_vec());
        let regions = self
            .regions
            .clone()
            .unwrap_or_else(|| default_layout.regions().to_vec());
        let layout = Layout::new(&metrics, &regions).context(InvalidSettingsSnafu {})?;

        let first_year = self.first_year.unwrap_or(DEFAULT_FIRST_YEAR);
        let last_year = self.last_year.unwrap_or(DEFAULT_LAST_YEAR);
        if !(1000..=9999).contains(&first_year) || !(1000..=9999).contains(&last_year) {
            whatever!(
                "Years must have four digits (firstYear: {}, lastYear: {})",
                first_year,
                last_year
            )
        }
        if first_year > last_year {
            whatever!(
                "firstYear ({}) is after lastYear ({})",
                first_year,
                last_year
            )
        }

        Ok(Settings {
            data_path,
            layout,
            years: (first_year..=last_year).collect(),
        })
    }
}

pub fn read_config(path: &str) -> EntryResult<EntryConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let config: EntryConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    info!("config: {:?}", config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = EntryConfig::default().settings(None, None).unwrap();
        assert_eq!(s.data_path, PathBuf::from("data.csv"));
        assert_eq!(s.layout, Layout::default());
        assert_eq!(s.years, vec![2020, 2021, 2022, 2023, 2024, 2025]);
    }

    #[test]
    fn data_path_resolution() {
        let config: EntryConfig =
            serde_json::from_str(r#"{"dataPath": "monthly.csv", "lastYear": 2030}"#).unwrap();
        let s = config.settings(Some(Path::new("/srv/leer")), None).unwrap();
        assert_eq!(s.data_path, PathBuf::from("/srv/leer/monthly.csv"));
        assert_eq!(s.years.last(), Some(&2030));

        let s = config
            .settings(Some(Path::new("/srv/leer")), Some("other.csv".to_string()))
            .unwrap();
        assert_eq!(s.data_path, PathBuf::from("other.csv"));
    }

    #[test]
    fn custom_layout() {
        let config: EntryConfig =
            serde_json::from_str(r#"{"metrics": ["Loads"], "regions": ["North", "South"]}"#)
                .unwrap();
        let s = config.settings(None, None).unwrap();
        assert_eq!(s.layout.num_cells(), 2);

        let bad: EntryConfig = serde_json::from_str(r#"{"regions": []}"#).unwrap();
        assert!(bad.settings(None, None).is_err());
    }

    #[test]
    fn year_range() {
        let s = EntryConfig::default().settings(None, None).unwrap();
        assert!(s.period(2024, Month::June).is_ok());
        assert!(s.period(2019, Month::June).is_err());

        let backwards = EntryConfig {
            first_year: Some(2025),
            last_year: Some(2020),
            ..EntryConfig::default()
        };
        assert!(backwards.settings(None, None).is_err());
    }

    #[test]
    fn read_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("leer.json");
        fs::write(&p, r#"{"firstYear": 2022}"#).unwrap();
        let config = read_config(p.to_str().unwrap()).unwrap();
        assert_eq!(config.first_year, Some(2022));

        fs::write(&p, "{not json").unwrap();
        assert!(matches!(
            read_config(p.to_str().unwrap()),
            Err(EntryError::ParsingJson { .. })
        ));
    }
}
