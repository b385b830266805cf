use std::{
    error::Error,
    fmt::{self, Display},
    fs, io,
    path::Path,
};

use log::info;
use serde::{Deserialize, Serialize};

use crate::{ActFn, Network, NnErr};

/// A JSON description of a network to build.
///
/// ```json
/// { "layers": [784, 16, 10], "act_fn": { "sigmoid": { "amp": 1.0 } }, "seed": 0 }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub layers: Vec<usize>,
    #[serde(default)]
    pub act_fn: ActFn,
    /// Seed for the weights, drawn from the thread local generator when missing.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Errors produced while loading a `NetworkConfig`.
#[derive(Debug)]
pub enum ConfigErr {
    Io(io::Error),
    Parse(serde_json::Error),
}

impl Display for ConfigErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "cannot read config: {e}"),
            Self::Parse(e) => write!(f, "invalid config: {e}"),
        }
    }
}

impl Error for ConfigErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
        }
    }
}

impl From<io::Error> for ConfigErr {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for ConfigErr {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e)
    }
}

impl NetworkConfig {
    pub fn from_json(s: &str) -> Result<Self, ConfigErr> {
        Ok(serde_json::from_str(s)?)
    }

    /// Reads and parses the config file at `path`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigErr> {
        let path = path.as_ref();
        info!("loading network config from {}", path.display());

        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Builds the described network.
    ///
    /// # Errors
    /// The same errors `Network::new` reports for invalid layer sizes.
    pub fn build(&self) -> Result<Network, NnErr> {
        match self.seed {
            Some(seed) => Network::with_seed(&self.layers, self.act_fn, seed),
            None => Network::new(&self.layers, self.act_fn, &mut rand::rng()),
        }
    }
}
