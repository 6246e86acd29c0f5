use crate::data::GeographyFields;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Choropleth of aid projects per recipient country")]
pub struct Args {
    /// Directory holding the geography and project files
    #[arg(short, long, default_value = "data")]
    pub data_dir: PathBuf,

    /// GeoJSON FeatureCollection of countries, relative to the data directory
    #[arg(short, long, default_value = "world.geojson")]
    pub geography: PathBuf,

    /// Project table (CSV), relative to the data directory
    #[arg(short, long, default_value = "aiddata.csv")]
    pub projects: PathBuf,

    /// Feature property holding the ISO-3 country code
    #[arg(long, default_value = "ISO3166-1-Alpha-3")]
    pub iso_field: String,

    /// Feature property holding the country display name
    #[arg(long, default_value = "name")]
    pub name_field: String,

    /// Log file (the terminal is taken by the map)
    #[arg(long, default_value = "aidmap.log")]
    pub log_file: PathBuf,
}

impl Args {
    pub fn geography_path(&self) -> PathBuf {
        self.data_dir.join(&self.geography)
    }

    pub fn projects_path(&self) -> PathBuf {
        self.data_dir.join(&self.projects)
    }

    pub fn fields(&self) -> GeographyFields {
        GeographyFields {
            iso: self.iso_field.clone(),
            name: self.name_field.clone(),
        }
    }
}
