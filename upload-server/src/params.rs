use std::path::PathBuf;
use std::time::Duration;
use clap::{Parser, ValueEnum};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StorageBackend {
    S3,
    Local,
    Memory,
}

#[derive(Parser, Debug)]
pub struct Args {
    #[clap(long, env = "PORT", default_value_t = 8080)]
    pub(crate) port: u16,
    #[clap(long, env = "NAME")]
    pub(crate) name: Option<String>,
    #[clap(long, env = "BUCKET", default_value = "photo-uploads")]
    pub(crate) bucket: String,
    #[clap(long, env = "STORAGE_BACKEND", value_enum, default_value_t = StorageBackend::S3)]
    pub(crate) storage: StorageBackend,
    #[clap(long, env = "S3_ENDPOINT_URL")]
    pub(crate) endpoint_url: Option<String>,
    #[clap(long, env = "LOCAL_STORAGE_DIR", default_value = "./objects")]
    pub(crate) local_dir: PathBuf,
    #[clap(long, env = "STORAGE_WRITE_TIMEOUT_SECS", default_value_t = 30)]
    pub(crate) write_timeout_secs: u64,
    #[clap(long, env = "CREATE_BUCKET")]
    pub(crate) create_bucket: bool,
}

impl Args {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    /// The greeting subject, `World` when `NAME` is unset or empty.
    pub fn greeting_name(&self) -> String {
        greeting_name(self.name.as_deref())
    }
}

pub fn greeting_name(name: Option<&str>) -> String {
    match name {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => String::from("World"),
    }
}
